use crate::auth::{self, CurrentDriver};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, Session};
use axum::{
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, Json},
};
use model::entities::driver;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request body for logging in
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for a successful login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub id: i32,
    pub username: String,
}

fn invalid_credentials() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid username or password".to_string(),
            code: "INVALID_CREDENTIALS".to_string(),
            success: false,
        }),
    )
}

/// Log in and start a session
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<
    (AppendHeaders<[(axum::http::HeaderName, String); 1]>, Json<ApiResponse<LoginResponse>>),
    (StatusCode, Json<ErrorResponse>),
> {
    trace!("Entering login function");
    debug!("Login attempt for username: {}", request.username);

    let driver = match driver::Entity::find()
        .filter(driver::Column::Username.eq(request.username.as_str()))
        .one(&state.db)
        .await
    {
        Ok(Some(driver)) => driver,
        Ok(None) => {
            // Same response as a bad password so usernames cannot be probed.
            warn!("Login attempt for unknown username: {}", request.username);
            return Err(invalid_credentials());
        }
        Err(db_error) => {
            error!("Failed to look up driver '{}': {}", request.username, db_error);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error during login".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ));
        }
    };

    if !auth::verify_password(&request.password, &driver.password_hash) {
        warn!("Bad password for username: {}", request.username);
        return Err(invalid_credentials());
    }

    let token = Uuid::new_v4().to_string();
    state.sessions.insert(token.clone(), Session::new(driver.id)).await;

    info!("Driver '{}' logged in", driver.username);
    let response = ApiResponse {
        data: LoginResponse {
            id: driver.id,
            username: driver.username,
        },
        message: "Logged in successfully".to_string(),
        success: true,
    };

    Ok((
        AppendHeaders([(SET_COOKIE, auth::session_cookie(&token))]),
        Json(response),
    ))
}

/// Log out and drop the session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out, session dropped", body = ApiResponse<String>),
        (status = 303, description = "Not logged in, redirected to login")
    )
)]
#[instrument(skip(state, current))]
pub async fn logout(
    current: CurrentDriver,
    State(state): State<AppState>,
) -> (AppendHeaders<[(axum::http::HeaderName, String); 1]>, Json<ApiResponse<String>>) {
    trace!("Entering logout function");

    state.sessions.invalidate(&current.session_token).await;
    info!("Driver '{}' logged out", current.driver.username);

    let response = ApiResponse {
        data: "Logged out".to_string(),
        message: "Logged out successfully".to_string(),
        success: true,
    };

    (
        AppendHeaders([(SET_COOKIE, auth::expired_session_cookie())]),
        Json(response),
    )
}
