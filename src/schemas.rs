use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Session store, keyed by the opaque session token from the cookie
    pub sessions: Cache<String, Session>,
}

/// Per-session state. Lives only as long as the session store entry.
#[derive(Clone, Debug)]
pub struct Session {
    pub driver_id: i32,
    /// Index-page visit counter, starts at 0 for a fresh session.
    pub num_visits: u64,
}

impl Session {
    pub fn new(driver_id: i32) -> Self {
        Self {
            driver_id,
            num_visits: 0,
        }
    }
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// One page of a filtered list, with query strings for the sibling pages.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u64,
    pub num_pages: u64,
    /// Query string for the next page, current filter preserved
    pub next: Option<String>,
    /// Query string for the previous page, current filter preserved
    pub previous: Option<String>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::index::index,
        crate::handlers::manufacturers::list_manufacturers,
        crate::handlers::manufacturers::create_manufacturer,
        crate::handlers::manufacturers::update_manufacturer,
        crate::handlers::manufacturers::delete_manufacturer,
        crate::handlers::cars::list_cars,
        crate::handlers::cars::get_car,
        crate::handlers::cars::create_car,
        crate::handlers::cars::update_car,
        crate::handlers::cars::delete_car,
        crate::handlers::cars::toggle_car_assign,
        crate::handlers::drivers::list_drivers,
        crate::handlers::drivers::get_driver,
        crate::handlers::drivers::create_driver,
        crate::handlers::drivers::update_driver_license,
        crate::handlers::drivers::delete_driver,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            ApiResponse<crate::handlers::index::IndexResponse>,
            ApiResponse<crate::handlers::auth::LoginResponse>,
            ApiResponse<crate::handlers::manufacturers::ManufacturerResponse>,
            ApiResponse<ListResponse<crate::handlers::manufacturers::ManufacturerResponse>>,
            ApiResponse<crate::handlers::cars::CarResponse>,
            ApiResponse<crate::handlers::cars::CarDetailResponse>,
            ApiResponse<ListResponse<crate::handlers::cars::CarResponse>>,
            ApiResponse<crate::handlers::cars::ToggleAssignResponse>,
            ApiResponse<crate::handlers::drivers::DriverResponse>,
            ApiResponse<crate::handlers::drivers::DriverDetailResponse>,
            ApiResponse<ListResponse<crate::handlers::drivers::DriverResponse>>,
            ApiResponse<String>,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::index::IndexResponse,
            crate::handlers::manufacturers::CreateManufacturerRequest,
            crate::handlers::manufacturers::UpdateManufacturerRequest,
            crate::handlers::manufacturers::ManufacturerResponse,
            crate::handlers::cars::CreateCarRequest,
            crate::handlers::cars::UpdateCarRequest,
            crate::handlers::cars::CarResponse,
            crate::handlers::cars::CarDetailResponse,
            crate::handlers::cars::ToggleAssignResponse,
            crate::handlers::drivers::CreateDriverRequest,
            crate::handlers::drivers::UpdateDriverLicenseRequest,
            crate::handlers::drivers::DriverResponse,
            crate::handlers::drivers::DriverDetailResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Session login and logout"),
        (name = "index", description = "Fleet overview and visit counter"),
        (name = "manufacturers", description = "Manufacturer CRUD endpoints"),
        (name = "cars", description = "Car CRUD and assignment endpoints"),
        (name = "drivers", description = "Driver CRUD endpoints"),
    ),
    info(
        title = "Taxipark API",
        description = "Fleet management service - manufacturers, cars, and drivers with session-gated CRUD",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
