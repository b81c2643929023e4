use crate::auth::CurrentDriver;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use model::entities::{car, driver, manufacturer};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace};
use utoipa::ToSchema;

/// Fleet overview shown on the index page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexResponse {
    pub username: String,
    pub num_manufacturers: u64,
    pub num_cars: u64,
    pub num_drivers: u64,
    /// Visits of the index page within the current session
    pub num_visits: u64,
    /// Rendered as "1 time." / "2 times." and so on
    pub visits_text: String,
}

fn visits_text(num_visits: u64) -> String {
    if num_visits == 1 {
        format!("{num_visits} time.")
    } else {
        format!("{num_visits} times.")
    }
}

/// Index page: fleet totals plus the per-session visit counter
#[utoipa::path(
    get,
    path = "/",
    tag = "index",
    responses(
        (status = 200, description = "Fleet overview", body = ApiResponse<IndexResponse>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn index(
    current: CurrentDriver,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<IndexResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering index function");

    let count_error = |db_error: sea_orm::DbErr| {
        error!("Failed to count fleet entities: {}", db_error);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to load fleet overview".to_string(),
                code: "DATABASE_ERROR".to_string(),
                success: false,
            }),
        )
    };

    let num_manufacturers = manufacturer::Entity::find()
        .count(&state.db)
        .await
        .map_err(count_error)?;
    let num_cars = car::Entity::find().count(&state.db).await.map_err(count_error)?;
    let num_drivers = driver::Entity::find().count(&state.db).await.map_err(count_error)?;

    // Bump the session-scoped visit counter by exactly one per render.
    let mut session = current.session;
    session.num_visits += 1;
    let num_visits = session.num_visits;
    state
        .sessions
        .insert(current.session_token.clone(), session)
        .await;

    debug!(
        "Index rendered for '{}', visit {} of this session",
        current.driver.username, num_visits
    );
    info!("Index page viewed by '{}'", current.driver.username);

    let response = ApiResponse {
        data: IndexResponse {
            username: current.driver.username,
            num_manufacturers,
            num_cars,
            num_drivers,
            num_visits,
            visits_text: visits_text(num_visits),
        },
        message: "Fleet overview retrieved successfully".to_string(),
        success: true,
    };

    Ok(Json(response))
}
