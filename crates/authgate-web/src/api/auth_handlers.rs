use authgate_core::{csrf, GateError, NewUser};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;

use crate::dto::{LoginForm, RegisterForm};
use crate::error::AppError;
use crate::middleware::session::{CurrentSession, SessionChange};
use crate::state::AppState;
use crate::views;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Incorrect username or password";
pub const USERNAME_TAKEN_MESSAGE: &str = "That username is already taken";
pub const WEAK_PASSWORD_MESSAGE: &str = "The password must be at least 12 characters long and \
     include an uppercase letter, a lowercase letter, a number and a symbol";
pub const LOGIN_SUCCESS_FLASH: &str = "Login successful";
pub const REGISTER_SUCCESS_FLASH: &str = "Registration successful. Please log in.";

pub async fn login_form(CurrentSession(session): CurrentSession) -> Html<String> {
    views::login_page(None, &csrf::issue_token(&session))
}

pub async fn login(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let LoginForm { username, password } = form;
    let credentials = state.credentials.clone();
    let attempted = username.clone();
    let verified = tokio::task::spawn_blocking(move || {
        credentials.verify_credentials(&attempted, &password)
    })
    .await?;

    let user = match verified {
        Ok(user) => user,
        Err(GateError::InvalidCredentials) => {
            tracing::warn!("Failed login attempt for user: {username}");
            return Ok(login_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS_MESSAGE, &session));
        }
        Err(e) => return Err(e.into()),
    };

    let rotated = match state.sessions.authenticate(&session.id, &user.username) {
        Ok(rotated) => rotated,
        Err(GateError::SessionExpired) => {
            return Ok(login_error(
                StatusCode::UNAUTHORIZED,
                "Your session expired. Please try again.",
                &session,
            ));
        }
        Err(e) => return Err(e.into()),
    };
    state.sessions.set_flash(&rotated.id, LOGIN_SUCCESS_FLASH)?;
    tracing::info!("User logged in: {}", user.username);

    let mut response = Redirect::to("/").into_response();
    response.extensions_mut().insert(SessionChange::Rotated(rotated));
    Ok(response)
}

fn login_error(status: StatusCode, message: &str, session: &authgate_core::Session) -> Response {
    (status, views::login_page(Some(message), &csrf::issue_token(session))).into_response()
}

pub async fn register_form(CurrentSession(session): CurrentSession) -> Html<String> {
    views::register_page(None, &csrf::issue_token(&session))
}

pub async fn register(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let rerender = |status: StatusCode, message: &str| {
        (status, views::register_page(Some(message), &csrf::issue_token(&session))).into_response()
    };

    let Ok(age) = form.age.trim().parse::<u32>() else {
        return Ok(rerender(StatusCode::UNPROCESSABLE_ENTITY, "Age must be a whole number"));
    };

    let credentials = state.credentials.clone();
    let new_user = NewUser {
        username: form.username,
        email: form.email,
        age,
        password: form.password,
    };
    let registered = tokio::task::spawn_blocking(move || credentials.register(new_user)).await?;

    match registered {
        Ok(_) => {}
        Err(GateError::UsernameTaken) => {
            return Ok(rerender(StatusCode::CONFLICT, USERNAME_TAKEN_MESSAGE));
        }
        Err(GateError::WeakPassword(reason)) => {
            tracing::debug!("Registration rejected: {reason}");
            return Ok(rerender(StatusCode::UNPROCESSABLE_ENTITY, WEAK_PASSWORD_MESSAGE));
        }
        Err(GateError::InvalidInput(reason)) => {
            return Ok(rerender(StatusCode::UNPROCESSABLE_ENTITY, reason.as_str()));
        }
        Err(e) => return Err(e.into()),
    }

    if let Err(e) = state.sessions.set_flash(&session.id, REGISTER_SUCCESS_FLASH) {
        tracing::debug!("Could not store registration flash: {e}");
    }
    Ok(Redirect::to("/login").into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Response {
    if let Some(username) = session.username.as_deref() {
        tracing::info!("User logged out: {username}");
    }
    state.sessions.end(&session.id);

    let mut response = Redirect::to("/").into_response();
    response.extensions_mut().insert(SessionChange::Ended);
    response
}
