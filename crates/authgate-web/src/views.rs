//! Minimal server-rendered pages.
//!
//! Every form carries the session's CSRF token in a hidden `_csrf` field.

use authgate_core::csrf::CSRF_FORM_FIELD;
use axum::response::Html;

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    ))
}

fn error_block(error: Option<&str>) -> String {
    error
        .map(|e| format!("<p class=\"error\" role=\"alert\">{}</p>\n", escape(e)))
        .unwrap_or_default()
}

fn csrf_input(token: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{CSRF_FORM_FIELD}\" value=\"{}\">",
        escape(token)
    )
}

pub fn index_page(username: Option<&str>, flash: Option<&str>) -> Html<String> {
    let flash = flash
        .map(|m| format!("<p class=\"flash\">{}</p>\n", escape(m)))
        .unwrap_or_default();
    let body = match username {
        Some(name) => format!(
            "{flash}<h1>Welcome, {}</h1>\n<p><a href=\"/logout\">Log out</a></p>",
            escape(name)
        ),
        None => format!(
            "{flash}<h1>Welcome</h1>\n<p><a href=\"/login\">Log in</a> | <a href=\"/register\">Register</a></p>"
        ),
    };
    layout("Home", &body)
}

pub fn login_page(error: Option<&str>, csrf_token: &str) -> Html<String> {
    let body = format!(
        "<h1>Log in</h1>\n{}<form method=\"post\" action=\"/login\">\n{}\n\
         <label>Username <input name=\"username\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <button type=\"submit\">Log in</button>\n</form>\n<p><a href=\"/register\">Register</a></p>",
        error_block(error),
        csrf_input(csrf_token)
    );
    layout("Log in", &body)
}

pub fn register_page(error: Option<&str>, csrf_token: &str) -> Html<String> {
    let body = format!(
        "<h1>Register</h1>\n{}<form method=\"post\" action=\"/register\">\n{}\n\
         <label>Username <input name=\"username\" required></label>\n\
         <label>Email <input type=\"email\" name=\"email\" required></label>\n\
         <label>Age <input type=\"number\" name=\"age\" min=\"0\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" minlength=\"12\" required></label>\n\
         <button type=\"submit\">Register</button>\n</form>\n<p><a href=\"/login\">Log in</a></p>",
        error_block(error),
        csrf_input(csrf_token)
    );
    layout("Register", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn index_shows_username_escaped() {
        let Html(page) = index_page(Some("<b>eve</b>"), None);
        assert!(page.contains("Welcome, &lt;b&gt;eve&lt;/b&gt;"));
        assert!(page.contains("/logout"));
    }

    #[test]
    fn index_anonymous_links_to_login() {
        let Html(page) = index_page(None, Some("Registration successful"));
        assert!(page.contains("href=\"/login\""));
        assert!(page.contains("Registration successful"));
    }

    #[test]
    fn forms_embed_csrf_token() {
        let Html(login) = login_page(None, "tok.en");
        assert!(login.contains("name=\"_csrf\" value=\"tok.en\""));
        let Html(register) = register_page(Some("bad"), "tok.en");
        assert!(register.contains("name=\"_csrf\" value=\"tok.en\""));
        assert!(register.contains("class=\"error\""));
    }
}
