use crate::ops;
use crate::session::{ADMIN_COOKIE, SESSION_COOKIE};
use crate::state;
use crate::templates;
use crate::types::User;

use axum::Json;
use axum::body::Body;
use axum::extract::Form;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Serialize)]
struct AuthErrorResponse {
    error: &'static str,
}

/// Gatekeeper for the three surfaces: the admin panel (admin cookie), the
/// signed-in customer pages (customer cookie) and the public storefront.
/// While maintenance mode is on, everything except the admin panel renders
/// the maintenance page for visitors without an admin session.
pub(crate) async fn session_middleware(
    State(state): State<state::AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if path == "/health" || path.starts_with("/static/") {
        return next.run(req).await;
    }

    let admin_session = session_cookie(req.headers(), ADMIN_COOKIE)
        .is_some_and(|token| state.session.verify_admin_token(token).is_ok());

    if is_admin_path(&path) {
        if path == "/admin/login" || admin_session {
            return next.run(req).await;
        }
        return Redirect::to("/admin/login").into_response();
    }

    if path.starts_with("/api/") {
        if admin_session {
            return next.run(req).await;
        }
        return (
            StatusCode::UNAUTHORIZED,
            Json(AuthErrorResponse {
                error: "unauthorized",
            }),
        )
            .into_response();
    }

    if state.snapshot().settings.is_maintenance && !admin_session {
        return templates::MaintenanceTemplate {
            app_name: state.config.app_name.clone(),
        }
        .into_response();
    }

    if requires_customer_session(&path) {
        let signed_in = session_cookie(req.headers(), SESSION_COOKIE)
            .is_some_and(|token| state.session.verify_user_token(token).is_ok());
        if !signed_in {
            return Redirect::to("/login").into_response();
        }
    }

    next.run(req).await
}

fn is_admin_path(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/")
}

fn requires_customer_session(path: &str) -> bool {
    path == "/orders" || path == "/chat" || path == "/profile" || path.starts_with("/order/")
}

pub(crate) fn session_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for header in headers.get_all(COOKIE).iter() {
        if let Ok(raw) = header.to_str()
            && let Some(value) = cookie_from_header(raw, name)
        {
            return Some(value);
        }
    }
    None
}

fn cookie_from_header<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let trimmed = part.trim();
        if let Some((cookie_name, cookie_value)) = trimmed.split_once('=')
            && cookie_name == name
        {
            return Some(cookie_value);
        }
    }
    None
}

/// Resolves the signed-in customer from the cookie against the current
/// mirror. The token only carries the user id; the profile itself is always
/// re-read so later document changes win.
pub(crate) fn current_user(state: &state::AppState, headers: &HeaderMap) -> Option<User> {
    let token = session_cookie(headers, SESSION_COOKIE)?;
    let user_id = state.session.verify_user_token(token).ok()?;
    state
        .snapshot()
        .users
        .into_iter()
        .find(|user| user.id == user_id)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterForm {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdminLoginForm {
    password: String,
}

pub(crate) async fn login_form(State(state): State<state::AppState>) -> templates::LoginTemplate {
    templates::LoginTemplate {
        app_name: state.config.app_name,
        error: String::new(),
    }
}

pub(crate) async fn login_submit(
    State(state): State<state::AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, (StatusCode, templates::LoginTemplate)> {
    let document = state.snapshot();
    let user = ops::login(&document, form.email.trim(), &form.password).map_err(|err| {
        (
            StatusCode::UNAUTHORIZED,
            templates::LoginTemplate {
                app_name: state.config.app_name.clone(),
                error: err.to_string(),
            },
        )
    })?;

    let token = state.session.issue_user_token(&user.id).map_err(|err| {
        eprintln!("failed to issue session token: {err}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            templates::LoginTemplate {
                app_name: state.config.app_name.clone(),
                error: "Failed to sign in.".to_string(),
            },
        )
    })?;

    Ok(signed_in_redirect(&state, &token, "/"))
}

pub(crate) async fn register_form(
    State(state): State<state::AppState>,
) -> templates::RegisterTemplate {
    templates::RegisterTemplate {
        app_name: state.config.app_name,
        error: String::new(),
    }
}

pub(crate) async fn register_submit(
    State(state): State<state::AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, (StatusCode, templates::RegisterTemplate)> {
    let name = form.name.trim();
    let email = form.email.trim();
    if name.is_empty() || email.is_empty() || form.password.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            templates::RegisterTemplate {
                app_name: state.config.app_name.clone(),
                error: "Name, email and password are all required.".to_string(),
            },
        ));
    }

    let user = state
        .apply(|document| {
            ops::register(
                document,
                ops::entity_id(),
                name,
                email,
                &form.password,
                OffsetDateTime::now_utc(),
            )
        })
        .map_err(|err| {
            (
                StatusCode::CONFLICT,
                templates::RegisterTemplate {
                    app_name: state.config.app_name.clone(),
                    error: err.to_string(),
                },
            )
        })?;

    let token = state.session.issue_user_token(&user.id).map_err(|err| {
        eprintln!("failed to issue session token: {err}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            templates::RegisterTemplate {
                app_name: state.config.app_name.clone(),
                error: "Failed to sign in.".to_string(),
            },
        )
    })?;

    Ok(signed_in_redirect(&state, &token, "/"))
}

fn signed_in_redirect(state: &state::AppState, token: &str, target: &str) -> Response {
    let mut response = Redirect::to(target).into_response();
    let cookie = state.session.user_cookie(token);
    response.headers_mut().append(
        SET_COOKIE,
        HeaderValue::from_str(&cookie).expect("session cookie header"),
    );
    response
}

// Clears both cookies; logging out of the storefront also drops any admin
// session held in the same browser.
pub(crate) async fn logout(State(state): State<state::AppState>) -> Response {
    let mut response = Redirect::to("/").into_response();
    for cookie in [
        state.session.clear_user_cookie(),
        state.session.clear_admin_cookie(),
    ] {
        response.headers_mut().append(
            SET_COOKIE,
            HeaderValue::from_str(&cookie).expect("logout cookie header"),
        );
    }
    response
}

pub(crate) async fn profile(
    State(state): State<state::AppState>,
    headers: HeaderMap,
) -> Result<templates::ProfileTemplate, Redirect> {
    let user = current_user(&state, &headers).ok_or_else(|| Redirect::to("/login"))?;
    Ok(templates::ProfileTemplate {
        app_name: state.config.app_name,
        name: user.name,
        email: user.email,
        register_date: templates::format_timestamp(user.register_date),
    })
}

pub(crate) async fn admin_login_form(
    State(state): State<state::AppState>,
) -> templates::AdminLoginTemplate {
    templates::AdminLoginTemplate {
        app_name: state.config.app_name,
        error: String::new(),
    }
}

pub(crate) async fn admin_login_submit(
    State(state): State<state::AppState>,
    Form(form): Form<AdminLoginForm>,
) -> Result<Response, (StatusCode, templates::AdminLoginTemplate)> {
    if !ops::admin_login(&state.snapshot(), &form.password) {
        return Err((
            StatusCode::UNAUTHORIZED,
            templates::AdminLoginTemplate {
                app_name: state.config.app_name.clone(),
                error: "Wrong admin password.".to_string(),
            },
        ));
    }

    let token = state.session.issue_admin_token().map_err(|err| {
        eprintln!("failed to issue admin token: {err}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            templates::AdminLoginTemplate {
                app_name: state.config.app_name.clone(),
                error: "Failed to sign in.".to_string(),
            },
        )
    })?;

    let mut response = Redirect::to("/admin").into_response();
    let cookie = state.session.admin_cookie(&token);
    response.headers_mut().append(
        SET_COOKIE,
        HeaderValue::from_str(&cookie).expect("admin cookie header"),
    );
    Ok(response)
}

pub(crate) async fn admin_logout(State(state): State<state::AppState>) -> Response {
    let mut response = Redirect::to("/admin/login").into_response();
    let cookie = state.session.clear_admin_cookie();
    response.headers_mut().append(
        SET_COOKIE,
        HeaderValue::from_str(&cookie).expect("logout cookie header"),
    );
    response
}
