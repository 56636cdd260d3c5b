use axum::body::Body;
use axum::http::{Request, header::HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

fn add_common_headers(response: &mut Response) {
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("same-origin"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'self'; form-action 'self'; frame-ancestors 'none'"),
    );
    headers.insert("cache-control", HeaderValue::from_static("no-store"));
}

pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    add_common_headers(&mut response);
    response
}

pub async fn security_headers_with_hsts(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    add_common_headers(&mut response);
    response.headers_mut().insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    response
}

#[cfg(test)]
mod tests {
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;

    async fn headers_for(router: Router) -> axum::http::HeaderMap {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        router.oneshot(req).await.unwrap().headers().clone()
    }

    #[tokio::test]
    async fn adds_hardening_headers() {
        let router = Router::new()
            .route("/", get(|| async { "page" }))
            .layer(from_fn(security_headers));
        let headers = headers_for(router).await;

        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["cache-control"], "no-store");
        assert!(headers["content-security-policy"]
            .to_str()
            .unwrap()
            .contains("form-action 'self'"));
        assert!(headers.get("strict-transport-security").is_none());
    }

    #[tokio::test]
    async fn hsts_only_in_tls_variant() {
        let router = Router::new()
            .route("/", get(|| async { "page" }))
            .layer(from_fn(security_headers_with_hsts));
        let headers = headers_for(router).await;
        assert!(headers.get("strict-transport-security").is_some());
    }
}
