#[cfg(test)]
pub mod test_utils {
    use crate::auth::hash_password;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum_test::{TestServer, TestServerConfig};
    use migration::{Migrator, MigratorTrait};
    use moka::future::Cache;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Password shared by all seeded test drivers.
    pub const TEST_PASSWORD: &str = "s3cur3 p4ssw0rd";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Insert a driver with the shared test password
    pub async fn seed_driver(
        db: &DatabaseConnection,
        username: &str,
        first_name: &str,
        last_name: &str,
        license_number: &str,
    ) -> model::entities::driver::Model {
        model::entities::driver::ActiveModel {
            username: Set(username.to_string()),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            password_hash: Set(hash_password(TEST_PASSWORD).expect("Failed to hash password")),
            license_number: Set(license_number.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed test driver")
    }

    /// Create AppState for testing, pre-seeded with two driver accounts
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;

        seed_driver(&db, "test", "Test", "User", "ABC04308").await;
        seed_driver(&db, "kate", "Kate", "Smith", "KTE54321").await;

        let sessions = Cache::new(100);

        AppState { db, sessions }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Build a cookie-saving test server over the given state
    pub fn test_server(state: AppState) -> TestServer {
        let config = TestServerConfig {
            save_cookies: true,
            ..TestServerConfig::default()
        };
        TestServer::new_with_config(create_router(state), config)
            .expect("Failed to build test server")
    }

    /// Create an axum test server with a fresh seeded database
    pub async fn setup_test_server() -> TestServer {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        test_server(state)
    }

    /// Log in as a seeded driver and return their id
    pub async fn login_as(server: &TestServer, username: &str) -> i32 {
        let response = server
            .post("/login")
            .json(&serde_json::json!({
                "username": username,
                "password": TEST_PASSWORD,
            }))
            .await;
        response.assert_status_ok();

        let body: crate::schemas::ApiResponse<serde_json::Value> = response.json();
        body.data["id"].as_i64().expect("login response has no id") as i32
    }
}
