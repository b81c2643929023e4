use std::collections::BTreeMap;

use crate::auth::CurrentDriver;
use crate::handlers::PAGE_SIZE;
use crate::handlers::drivers::DriverResponse;
use crate::handlers::manufacturers::ManufacturerResponse;
use crate::query_transform::page_links;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ListResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::{car, car_driver, manufacturer};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, DbErr, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for creating a car
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCarRequest {
    #[validate(length(min = 1))]
    pub model: String,
    pub manufacturer_id: i32,
}

/// Request body for updating a car
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCarRequest {
    pub model: Option<String>,
    pub manufacturer_id: Option<i32>,
}

/// Car response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarResponse {
    pub id: i32,
    pub model: String,
    pub manufacturer_id: i32,
}

impl From<car::Model> for CarResponse {
    fn from(model: car::Model) -> Self {
        Self {
            id: model.id,
            model: model.model,
            manufacturer_id: model.manufacturer_id,
        }
    }
}

/// Car detail, including its manufacturer and assigned drivers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarDetailResponse {
    pub id: i32,
    pub model: String,
    pub manufacturer: ManufacturerResponse,
    pub drivers: Vec<DriverResponse>,
}

/// Result of a toggle-assign call
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleAssignResponse {
    pub car_id: i32,
    /// Whether the current driver is assigned to the car after the call
    pub assigned: bool,
}

/// Query parameters for listing cars
#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct ListCarsQuery {
    /// Case-insensitive substring filter on the model
    pub model: Option<String>,
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

/// List cars, optionally filtered by model
#[utoipa::path(
    get,
    path = "/api/v1/cars",
    tag = "cars",
    params(ListCarsQuery),
    responses(
        (status = 200, description = "Cars retrieved successfully", body = ApiResponse<ListResponse<CarResponse>>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn list_cars(
    _current: CurrentDriver,
    Valid(Query(query)): Valid<Query<ListCarsQuery>>,
    Query(raw_params): Query<BTreeMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ListResponse<CarResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering list_cars function");

    let page = query.page.unwrap_or(1);
    debug!("Listing cars - filter: {:?}, page: {}", query.model, page);

    let mut finder = car::Entity::find();
    if let Some(model) = &query.model {
        let pattern = format!("%{}%", model.to_lowercase());
        finder = finder.filter(
            Expr::expr(Func::lower(Expr::col((car::Entity, car::Column::Model)))).like(pattern),
        );
    }

    let paginator = finder
        .order_by_asc(car::Column::Model)
        .paginate(&state.db, PAGE_SIZE);

    let num_pages = paginator
        .num_pages()
        .await
        .map_err(|e| db_error_response("Failed to count cars", e))?;
    let cars = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| db_error_response("Failed to retrieve cars", e))?;

    info!("Retrieved {} cars on page {}", cars.len(), page);

    let (next, previous) = page_links(&raw_params, page, num_pages);
    let response = ApiResponse {
        data: ListResponse {
            items: cars.into_iter().map(CarResponse::from).collect(),
            page,
            num_pages,
            next,
            previous,
        },
        message: "Cars retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a specific car with its manufacturer and assigned drivers
#[utoipa::path(
    get,
    path = "/api/v1/cars/{car_id}",
    tag = "cars",
    params(
        ("car_id" = i32, Path, description = "Car ID"),
    ),
    responses(
        (status = 200, description = "Car retrieved successfully", body = ApiResponse<CarDetailResponse>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 404, description = "Car not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn get_car(
    _current: CurrentDriver,
    Path(car_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CarDetailResponse>>, StatusCode> {
    trace!("Entering get_car function for car_id: {}", car_id);

    let car_model = match car::Entity::find_by_id(car_id).one(&state.db).await {
        Ok(Some(car_model)) => car_model,
        Ok(None) => {
            warn!("Car with ID {} not found", car_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to retrieve car {}: {}", car_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let manufacturer_model = match car_model
        .find_related(manufacturer::Entity)
        .one(&state.db)
        .await
    {
        Ok(Some(manufacturer_model)) => manufacturer_model,
        Ok(None) => {
            // The FK guarantees a manufacturer; treat a hole as a server error.
            error!("Car {} has no manufacturer row", car_id);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        Err(db_error) => {
            error!("Failed to retrieve manufacturer of car {}: {}", car_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let drivers = match car_model
        .find_related(model::entities::driver::Entity)
        .all(&state.db)
        .await
    {
        Ok(drivers) => drivers,
        Err(db_error) => {
            error!("Failed to retrieve drivers of car {}: {}", car_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    info!("Retrieved car {} with {} assigned drivers", car_id, drivers.len());
    let response = ApiResponse {
        data: CarDetailResponse {
            id: car_model.id,
            model: car_model.model,
            manufacturer: ManufacturerResponse::from(manufacturer_model),
            drivers: drivers.into_iter().map(DriverResponse::from).collect(),
        },
        message: "Car retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Create a new car
#[utoipa::path(
    post,
    path = "/api/v1/cars",
    tag = "cars",
    request_body = CreateCarRequest,
    responses(
        (status = 201, description = "Car created successfully", body = ApiResponse<CarResponse>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn create_car(
    _current: CurrentDriver,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateCarRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CarResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_car function");
    debug!("Creating car: {} (manufacturer {})", request.model, request.manufacturer_id);

    // Validate that the manufacturer exists
    match manufacturer::Entity::find_by_id(request.manufacturer_id)
        .one(&state.db)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Manufacturer {} does not exist", request.manufacturer_id);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Manufacturer {} does not exist", request.manufacturer_id),
                    code: "MANUFACTURER_NOT_FOUND".to_string(),
                    success: false,
                }),
            ));
        }
        Err(db_error) => {
            return Err(db_error_response("Failed to look up manufacturer", db_error));
        }
    }

    let new_car = car::ActiveModel {
        model: Set(request.model),
        manufacturer_id: Set(request.manufacturer_id),
        ..Default::default()
    };

    match new_car.insert(&state.db).await {
        Ok(car_model) => {
            info!("Car created successfully with ID: {}", car_model.id);
            let response = ApiResponse {
                data: CarResponse::from(car_model),
                message: "Car created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => Err(db_error_response("Failed to create car", db_error)),
    }
}

/// Update a car
#[utoipa::path(
    put,
    path = "/api/v1/cars/{car_id}",
    tag = "cars",
    params(
        ("car_id" = i32, Path, description = "Car ID"),
    ),
    request_body = UpdateCarRequest,
    responses(
        (status = 200, description = "Car updated successfully", body = ApiResponse<CarResponse>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 404, description = "Car not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn update_car(
    _current: CurrentDriver,
    Path(car_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateCarRequest>,
) -> Result<Json<ApiResponse<CarResponse>>, StatusCode> {
    trace!("Entering update_car function for car_id: {}", car_id);

    let existing = match car::Entity::find_by_id(car_id).one(&state.db).await {
        Ok(Some(car_model)) => car_model,
        Ok(None) => {
            warn!("Car with ID {} not found for update", car_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to look up car {}: {}", car_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut active: car::ActiveModel = existing.into();
    if let Some(model_name) = request.model {
        active.model = Set(model_name);
    }
    if let Some(manufacturer_id) = request.manufacturer_id {
        active.manufacturer_id = Set(manufacturer_id);
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Car with ID {} updated successfully", car_id);
            let response = ApiResponse {
                data: CarResponse::from(updated),
                message: "Car updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update car {}: {}", car_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a car
#[utoipa::path(
    delete,
    path = "/api/v1/cars/{car_id}",
    tag = "cars",
    params(
        ("car_id" = i32, Path, description = "Car ID"),
    ),
    responses(
        (status = 200, description = "Car deleted successfully", body = ApiResponse<String>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 404, description = "Car not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn delete_car(
    _current: CurrentDriver,
    Path(car_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_car function for car_id: {}", car_id);

    match car::Entity::delete_by_id(car_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Car with ID {} deleted successfully", car_id);
                let response = ApiResponse {
                    data: format!("Car {} deleted", car_id),
                    message: "Car deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Car with ID {} not found for deletion", car_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete car {}: {}", car_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Toggle the current driver's assignment to a car
///
/// If the driver is assigned, the assignment is removed; otherwise it is
/// added. Repeated calls alternate state and never fail. Only the
/// assignment table is touched.
#[utoipa::path(
    post,
    path = "/api/v1/cars/{car_id}/toggle-assign",
    tag = "cars",
    params(
        ("car_id" = i32, Path, description = "Car ID"),
    ),
    responses(
        (status = 200, description = "Assignment toggled", body = ApiResponse<ToggleAssignResponse>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 404, description = "Car not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn toggle_car_assign(
    current: CurrentDriver,
    Path(car_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ToggleAssignResponse>>, StatusCode> {
    trace!("Entering toggle_car_assign function for car_id: {}", car_id);
    let driver_id = current.driver.id;

    // 404 for a car that does not exist; the toggle itself cannot fail.
    match car::Entity::find_by_id(car_id).one(&state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Car with ID {} not found for toggle", car_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to look up car {}: {}", car_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    let existing_link = match car_driver::Entity::find_by_id((car_id, driver_id))
        .one(&state.db)
        .await
    {
        Ok(link) => link,
        Err(db_error) => {
            error!("Failed to look up assignment for car {}: {}", car_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let assigned = match existing_link {
        Some(link) => {
            if let Err(db_error) = link.delete(&state.db).await {
                error!("Failed to remove assignment for car {}: {}", car_id, db_error);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
            debug!("Driver {} unassigned from car {}", driver_id, car_id);
            false
        }
        None => {
            let link = car_driver::ActiveModel {
                car_id: Set(car_id),
                driver_id: Set(driver_id),
            };
            if let Err(db_error) = link.insert(&state.db).await {
                error!("Failed to add assignment for car {}: {}", car_id, db_error);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
            debug!("Driver {} assigned to car {}", driver_id, car_id);
            true
        }
    };

    info!(
        "Driver '{}' toggled car {}: assigned={}",
        current.driver.username, car_id, assigned
    );
    let response = ApiResponse {
        data: ToggleAssignResponse { car_id, assigned },
        message: "Assignment toggled successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
