use std::collections::BTreeMap;

use crate::auth::CurrentDriver;
use crate::handlers::PAGE_SIZE;
use crate::query_transform::page_links;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ListResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::manufacturer;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for creating a manufacturer
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateManufacturerRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub country: String,
}

/// Request body for updating a manufacturer
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateManufacturerRequest {
    pub name: Option<String>,
    pub country: Option<String>,
}

/// Manufacturer response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ManufacturerResponse {
    pub id: i32,
    pub name: String,
    pub country: String,
}

impl From<manufacturer::Model> for ManufacturerResponse {
    fn from(model: manufacturer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            country: model.country,
        }
    }
}

/// Query parameters for listing manufacturers
#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct ListManufacturersQuery {
    /// Case-insensitive substring filter on the name
    pub name: Option<String>,
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

/// List manufacturers, optionally filtered by name
#[utoipa::path(
    get,
    path = "/api/v1/manufacturers",
    tag = "manufacturers",
    params(ListManufacturersQuery),
    responses(
        (status = 200, description = "Manufacturers retrieved successfully", body = ApiResponse<ListResponse<ManufacturerResponse>>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn list_manufacturers(
    _current: CurrentDriver,
    Valid(Query(query)): Valid<Query<ListManufacturersQuery>>,
    Query(raw_params): Query<BTreeMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ListResponse<ManufacturerResponse>>>, (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering list_manufacturers function");

    let page = query.page.unwrap_or(1);
    debug!("Listing manufacturers - filter: {:?}, page: {}", query.name, page);

    let mut finder = manufacturer::Entity::find();
    if let Some(name) = &query.name {
        let pattern = format!("%{}%", name.to_lowercase());
        finder = finder.filter(
            Expr::expr(Func::lower(Expr::col((
                manufacturer::Entity,
                manufacturer::Column::Name,
            ))))
            .like(pattern),
        );
    }

    let paginator = finder
        .order_by_asc(manufacturer::Column::Name)
        .paginate(&state.db, PAGE_SIZE);

    let num_pages = paginator
        .num_pages()
        .await
        .map_err(|e| db_error_response("Failed to count manufacturers", e))?;
    let manufacturers = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| db_error_response("Failed to retrieve manufacturers", e))?;

    info!("Retrieved {} manufacturers on page {}", manufacturers.len(), page);

    let (next, previous) = page_links(&raw_params, page, num_pages);
    let response = ApiResponse {
        data: ListResponse {
            items: manufacturers.into_iter().map(ManufacturerResponse::from).collect(),
            page,
            num_pages,
            next,
            previous,
        },
        message: "Manufacturers retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Create a new manufacturer
#[utoipa::path(
    post,
    path = "/api/v1/manufacturers",
    tag = "manufacturers",
    request_body = CreateManufacturerRequest,
    responses(
        (status = 201, description = "Manufacturer created successfully", body = ApiResponse<ManufacturerResponse>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn create_manufacturer(
    _current: CurrentDriver,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateManufacturerRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ManufacturerResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering create_manufacturer function");
    debug!("Creating manufacturer: {} ({})", request.name, request.country);

    let new_manufacturer = manufacturer::ActiveModel {
        name: Set(request.name.clone()),
        country: Set(request.country),
        ..Default::default()
    };

    match new_manufacturer.insert(&state.db).await {
        Ok(manufacturer_model) => {
            info!(
                "Manufacturer created successfully with ID: {}, name: {}",
                manufacturer_model.id, manufacturer_model.name
            );
            let response = ApiResponse {
                data: ManufacturerResponse::from(manufacturer_model),
                message: "Manufacturer created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            let message = db_error.to_string().to_lowercase();
            if message.contains("unique") || message.contains("constraint") {
                warn!("Manufacturer name '{}' already exists", request.name);
                Err((
                    StatusCode::CONFLICT,
                    Json(ErrorResponse {
                        error: format!("Manufacturer '{}' already exists", request.name),
                        code: "MANUFACTURER_ALREADY_EXISTS".to_string(),
                        success: false,
                    }),
                ))
            } else {
                Err(db_error_response("Failed to create manufacturer", db_error))
            }
        }
    }
}

/// Update a manufacturer
#[utoipa::path(
    put,
    path = "/api/v1/manufacturers/{manufacturer_id}",
    tag = "manufacturers",
    params(
        ("manufacturer_id" = i32, Path, description = "Manufacturer ID"),
    ),
    request_body = UpdateManufacturerRequest,
    responses(
        (status = 200, description = "Manufacturer updated successfully", body = ApiResponse<ManufacturerResponse>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 404, description = "Manufacturer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn update_manufacturer(
    _current: CurrentDriver,
    Path(manufacturer_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateManufacturerRequest>,
) -> Result<Json<ApiResponse<ManufacturerResponse>>, StatusCode> {
    trace!("Entering update_manufacturer function for id: {}", manufacturer_id);

    let existing = match manufacturer::Entity::find_by_id(manufacturer_id)
        .one(&state.db)
        .await
    {
        Ok(Some(manufacturer_model)) => manufacturer_model,
        Ok(None) => {
            warn!("Manufacturer with ID {} not found for update", manufacturer_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to look up manufacturer {}: {}", manufacturer_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut active: manufacturer::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(country) = request.country {
        active.country = Set(country);
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Manufacturer with ID {} updated successfully", manufacturer_id);
            let response = ApiResponse {
                data: ManufacturerResponse::from(updated),
                message: "Manufacturer updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update manufacturer {}: {}", manufacturer_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a manufacturer (cascades to its cars)
#[utoipa::path(
    delete,
    path = "/api/v1/manufacturers/{manufacturer_id}",
    tag = "manufacturers",
    params(
        ("manufacturer_id" = i32, Path, description = "Manufacturer ID"),
    ),
    responses(
        (status = 200, description = "Manufacturer deleted successfully", body = ApiResponse<String>),
        (status = 303, description = "Not logged in, redirected to login"),
        (status = 404, description = "Manufacturer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _current))]
pub async fn delete_manufacturer(
    _current: CurrentDriver,
    Path(manufacturer_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_manufacturer function for id: {}", manufacturer_id);

    match manufacturer::Entity::delete_by_id(manufacturer_id)
        .exec(&state.db)
        .await
    {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Manufacturer with ID {} deleted successfully", manufacturer_id);
                let response = ApiResponse {
                    data: format!("Manufacturer {} deleted", manufacturer_id),
                    message: "Manufacturer deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Manufacturer with ID {} not found for deletion", manufacturer_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete manufacturer {}: {}", manufacturer_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
