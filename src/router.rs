use crate::handlers::{
    auth::{login, logout},
    cars::{create_car, delete_car, get_car, list_cars, toggle_car_assign, update_car},
    drivers::{create_driver, delete_driver, get_driver, list_drivers, update_driver_license},
    health::health_check,
    index::index,
    manufacturers::{
        create_manufacturer, delete_manufacturer, list_manufacturers, update_manufacturer,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Session login/logout
        .route("/login", post(login))
        .route("/logout", post(logout))
        // Index page with the visit counter
        .route("/", get(index))
        // Manufacturer CRUD routes
        .route("/api/v1/manufacturers", get(list_manufacturers))
        .route("/api/v1/manufacturers", post(create_manufacturer))
        .route("/api/v1/manufacturers/:manufacturer_id", put(update_manufacturer))
        .route("/api/v1/manufacturers/:manufacturer_id", delete(delete_manufacturer))
        // Car CRUD routes
        .route("/api/v1/cars", get(list_cars))
        .route("/api/v1/cars", post(create_car))
        .route("/api/v1/cars/:car_id", get(get_car))
        .route("/api/v1/cars/:car_id", put(update_car))
        .route("/api/v1/cars/:car_id", delete(delete_car))
        .route("/api/v1/cars/:car_id/toggle-assign", post(toggle_car_assign))
        // Driver CRUD routes
        .route("/api/v1/drivers", get(list_drivers))
        .route("/api/v1/drivers", post(create_driver))
        .route("/api/v1/drivers/:driver_id", get(get_driver))
        .route("/api/v1/drivers/:driver_id", put(update_driver_license))
        .route("/api/v1/drivers/:driver_id", delete(delete_driver))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
