use std::collections::BTreeMap;

use crate::auth::{self, CurrentDriver};
use crate::handlers::PAGE_SIZE;
use crate::handlers::cars::CarResponse;
use crate::query_transform::page_links;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ListResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::driver;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, DbErr, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Validator-rule wrapper around the license number format.
fn validate_license_number(value: &str) -> Result<(), ValidationError> {
    if model::license::is_valid(value) {
        Ok(())
    } else {
        let mut error = ValidationError::new("license_number");
        error.message =
            Some("must be 3 uppercase letters followed by 5 digits, e.g. ABC12345".into());
        Err(error)
    }
}

/// Request body for creating a driver
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 1))]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(custom(function = validate_license_number))]
    pub license_number: String,
}

/// Request body for updating a driver's license number
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateDriverLicenseRequest {
    #[validate(custom(function = validate_license_number))]
    pub license_number: String,
}

/// Driver response model; never exposes the password hash
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DriverResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
}

impl From<driver::Model> for DriverResponse {
    fn from(model: driver::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            license_number: model.license_number,
        }
    }
}

/// Driver detail, including assigned cars
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DriverDetailResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub cars: Vec<CarResponse>,
}

/// Query parameters for listing drivers
#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct ListDriversQuery {
    /// Case-insensitive substring filter on the username
    pub username: Option<String>,
    /// Page number (1-based)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
}

fn db_error_response(context: &str, db_error: DbErr) -> (StatusCode, Json<ErrorResponse>) {
    error!("{}: {}", context, db_error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: context.to_string(),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

fn unique_violation_response(db_error: &DbErr) -> Option<(StatusCode, Json<ErrorResponse>)> {
    let message = db_error.to_string();
    if !message.to_lowercase().contains("unique") {
        return None;
    }
    let (error, code) = if message.contains("license_number") {
        ("License number already registered", "LICENSE_NUMBER_ALREADY_EXISTS")
    } else if message.contains("username") {
        ("Username already taken", "USERNAME_ALREADY_EXISTS")
    } else {
        ("Driver violates a database constraint", "DATABASE_CONSTRAINT_ERROR")
    };
    Some((
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
            success: false,
        }),
    ))
}

/// List drivers, optionally filtered by username
#[utoipa::path(
    get,
    path = "/api/v1/drivers",
    tag = "drivers",
    params(ListDriversQuery),
    responses(
        (status = 200, description = "Drivers retrieved successfully", body = ApiResponse<ListResponse<DriverResponse>>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn list_drivers(
    _current: CurrentDriver,
    Valid(Query(query)): Valid<Query<ListDriversQuery>>,
    Query(raw_params): Query<BTreeMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ListResponse<DriverResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering list_drivers function");

    let page = query.page.unwrap_or(1);
    debug!("Listing drivers - filter: {:?}, page: {}", query.username, page);

    let mut finder = driver::Entity::find();
    if let Some(username) = &query.username {
        let pattern = format!("%{}%", username.to_lowercase());
        finder = finder.filter(
            Expr::expr(Func::lower(Expr::col((driver::Entity, driver::Column::Username))))
                .like(pattern),
        );
    }

    let paginator = finder
        .order_by_asc(driver::Column::Username)
        .paginate(&state.db, PAGE_SIZE);

    let num_pages = paginator
        .num_pages()
        .await
        .map_err(|e| db_error_response("Failed to count drivers", e))?;
    let drivers = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| db_error_response("Failed to retrieve drivers", e))?;

    info!("Retrieved {} drivers on page {}", drivers.len(), page);

    let (next, previous) = page_links(&raw_params, page, num_pages);
    let response = ApiResponse {
        data: ListResponse {
            items: drivers.into_iter().map(DriverResponse::from).collect(),
            page,
            num_pages,
            next,
            previous,
        },
        message: "Drivers retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific driver with their assigned cars
#[utoipa::path(
    get,
    path = "/api/v1/drivers/{driver_id}",
    tag = "drivers",
    params(
        ("driver_id" = i32, Path, description = "Driver ID"),
    ),
    responses(
        (status = 200, description = "Driver retrieved successfully", body = ApiResponse<DriverDetailResponse>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 404, description = "Driver not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn get_driver(
    _current: CurrentDriver,
    Path(driver_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DriverDetailResponse>>, StatusCode> {
    trace!("Entering get_driver function for driver_id: {}", driver_id);

    let driver_model = match driver::Entity::find_by_id(driver_id).one(&state.db).await {
        Ok(Some(driver_model)) => driver_model,
        Ok(None) => {
            warn!("Driver with ID {} not found", driver_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to retrieve driver {}: {}", driver_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let cars = match driver_model
        .find_related(model::entities::car::Entity)
        .all(&state.db)
        .await
    {
        Ok(cars) => cars,
        Err(db_error) => {
            error!("Failed to retrieve cars of driver {}: {}", driver_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    info!("Retrieved driver {} with {} assigned cars", driver_id, cars.len());
    let response = ApiResponse {
        data: DriverDetailResponse {
            id: driver_model.id,
            username: driver_model.username,
            first_name: driver_model.first_name,
            last_name: driver_model.last_name,
            license_number: driver_model.license_number,
            cars: cars.into_iter().map(CarResponse::from).collect(),
        },
        message: "Driver retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Create a new driver account
#[utoipa::path(
    post,
    path = "/api/v1/drivers",
    tag = "drivers",
    request_body = CreateDriverRequest,
    responses(
        (status = 201, description = "Driver created successfully", body = ApiResponse<DriverResponse>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 400, description = "Invalid request (bad license number)", body = ErrorResponse),
        (status = 409, description = "Username or license already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current, request))]
pub async fn create_driver(
    _current: CurrentDriver,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateDriverRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<DriverResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_driver function");
    debug!("Creating driver with username: {}", request.username);

    let password_hash = auth::hash_password(&request.password).map_err(|e| {
        error!("Failed to hash password for new driver: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to process the password".to_string(),
                code: "PASSWORD_HASH_ERROR".to_string(),
                success: false,
            }),
        )
    })?;

    let new_driver = driver::ActiveModel {
        username: Set(request.username.clone()),
        first_name: Set(request.first_name),
        last_name: Set(request.last_name),
        password_hash: Set(password_hash),
        license_number: Set(request.license_number),
        ..Default::default()
    };

    match new_driver.insert(&state.db).await {
        Ok(driver_model) => {
            info!(
                "Driver created successfully with ID: {}, username: {}",
                driver_model.id, driver_model.username
            );
            let response = ApiResponse {
                data: DriverResponse::from(driver_model),
                message: "Driver created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            warn!("Failed to create driver '{}': {}", request.username, db_error);
            match unique_violation_response(&db_error) {
                Some(conflict) => Err(conflict),
                None => Err(db_error_response("Failed to create driver", db_error)),
            }
        }
    }
}

/// Update a driver's license number
#[utoipa::path(
    put,
    path = "/api/v1/drivers/{driver_id}",
    tag = "drivers",
    params(
        ("driver_id" = i32, Path, description = "Driver ID"),
    ),
    request_body = UpdateDriverLicenseRequest,
    responses(
        (status = 200, description = "License number updated successfully", body = ApiResponse<DriverResponse>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 400, description = "Invalid license number", body = ErrorResponse),
        (status = 404, description = "Driver not found", body = ErrorResponse),
        (status = 409, description = "License already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn update_driver_license(
    _current: CurrentDriver,
    Path(driver_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateDriverLicenseRequest>>,
) -> Result<Json<ApiResponse<DriverResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_driver_license function for driver_id: {}", driver_id);

    let existing = match driver::Entity::find_by_id(driver_id).one(&state.db).await {
        Ok(Some(driver_model)) => driver_model,
        Ok(None) => {
            warn!("Driver with ID {} not found for license update", driver_id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Driver {} not found", driver_id),
                    code: "DRIVER_NOT_FOUND".to_string(),
                    success: false,
                }),
            ));
        }
        Err(db_error) => {
            return Err(db_error_response("Failed to look up driver", db_error));
        }
    };

    let mut active: driver::ActiveModel = existing.into();
    active.license_number = Set(request.license_number);

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("License number of driver {} updated successfully", driver_id);
            let response = ApiResponse {
                data: DriverResponse::from(updated),
                message: "License number updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            warn!("Failed to update license of driver {}: {}", driver_id, db_error);
            match unique_violation_response(&db_error) {
                Some(conflict) => Err(conflict),
                None => Err(db_error_response("Failed to update license number", db_error)),
            }
        }
    }
}

/// Delete a driver account
#[utoipa::path(
    delete,
    path = "/api/v1/drivers/{driver_id}",
    tag = "drivers",
    params(
        ("driver_id" = i32, Path, description = "Driver ID"),
    ),
    responses(
        (status = 200, description = "Driver deleted successfully", body = ApiResponse<String>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 404, description = "Driver not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn delete_driver(
    _current: CurrentDriver,
    Path(driver_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_driver function for driver_id: {}", driver_id);

    match driver::Entity::delete_by_id(driver_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Driver with ID {} deleted successfully", driver_id);
                let response = ApiResponse {
                    data: format!("Driver {} deleted", driver_id),
                    message: "Driver deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Driver with ID {} not found for deletion", driver_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete driver {}: {}", driver_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
