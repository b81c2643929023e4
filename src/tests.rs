#[cfg(test)]
mod integration_tests {
    use crate::schemas::{ApiResponse, ErrorResponse, ListResponse};
    use crate::test_utils::test_utils::{
        login_as, seed_driver, setup_test_app_state, setup_test_server, test_server,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    async fn create_manufacturer(server: &TestServer, name: &str, country: &str) -> i32 {
        let response = server
            .post("/api/v1/manufacturers")
            .json(&json!({ "name": name, "country": country }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["id"].as_i64().unwrap() as i32
    }

    async fn create_car(server: &TestServer, model: &str, manufacturer_id: i32) -> i32 {
        let response = server
            .post("/api/v1/cars")
            .json(&json!({ "model": model, "manufacturer_id": manufacturer_id }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["id"].as_i64().unwrap() as i32
    }

    #[tokio::test]
    async fn test_health_check_without_login() {
        let server = setup_test_server().await;

        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_redirect_when_logged_out() {
        let server = setup_test_server().await;

        let get_routes = [
            "/",
            "/api/v1/manufacturers",
            "/api/v1/cars",
            "/api/v1/cars/1",
            "/api/v1/drivers",
            "/api/v1/drivers/1",
        ];
        for route in get_routes {
            let response = server.get(route).await;
            response.assert_status(StatusCode::SEE_OTHER);
            assert_eq!(
                response.header("location"),
                "/login",
                "route {route} must redirect to login"
            );
        }

        let post_routes = [
            "/logout",
            "/api/v1/manufacturers",
            "/api/v1/cars",
            "/api/v1/cars/1/toggle-assign",
            "/api/v1/drivers",
        ];
        for route in post_routes {
            let response = server.post(route).await;
            response.assert_status(StatusCode::SEE_OTHER);
        }

        let response = server.delete("/api/v1/cars/1").await;
        response.assert_status(StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials() {
        let server = setup_test_server().await;

        let response = server
            .post("/login")
            .json(&json!({ "username": "test", "password": "wrong password" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/login")
            .json(&json!({ "username": "nobody", "password": "whatever" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_then_logout_closes_the_session() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        // Logged in: the index is reachable
        server.get("/").await.assert_status(StatusCode::OK);

        let response = server.post("/logout").await;
        response.assert_status(StatusCode::OK);

        // Session dropped: back to the redirect
        let response = server.get("/").await;
        response.assert_status(StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_index_visit_counter_increments_per_render() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let response = server.get("/").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["num_visits"], 1);
        assert_eq!(body.data["visits_text"], "1 time.");

        let response = server.get("/").await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["num_visits"], 2);
        assert_eq!(body.data["visits_text"], "2 times.");
    }

    #[tokio::test]
    async fn test_visit_counter_is_scoped_to_the_session() {
        let state = setup_test_app_state().await;
        let server1 = test_server(state.clone());
        let server2 = test_server(state);

        login_as(&server1, "test").await;
        login_as(&server2, "kate").await;

        server1.get("/").await.assert_status(StatusCode::OK);
        server1.get("/").await.assert_status(StatusCode::OK);

        // The second session still starts at one
        let response = server2.get("/").await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["visits_text"], "1 time.");
    }

    #[tokio::test]
    async fn test_index_reports_fleet_totals() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let manufacturer_id = create_manufacturer(&server, "Toyota", "Japan").await;
        create_car(&server, "Corolla", manufacturer_id).await;

        let response = server.get("/").await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["num_manufacturers"], 1);
        assert_eq!(body.data["num_cars"], 1);
        assert_eq!(body.data["num_drivers"], 2);
        assert_eq!(body.data["username"], "test");
    }

    #[tokio::test]
    async fn test_manufacturer_list_filters_by_name() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        create_manufacturer(&server, "Abc", "Japan").await;
        create_manufacturer(&server, "Def", "Germany").await;

        let response = server.get("/api/v1/manufacturers").add_query_param("name", "a").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ListResponse<Value>> = response.json();
        assert_eq!(body.data.items.len(), 1);
        assert_eq!(body.data.items[0]["name"], "Abc");

        // Without the parameter the full collection comes back
        let response = server.get("/api/v1/manufacturers").await;
        let body: ApiResponse<ListResponse<Value>> = response.json();
        assert_eq!(body.data.items.len(), 2);
    }

    #[tokio::test]
    async fn test_car_list_filters_by_model() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let manufacturer_id = create_manufacturer(&server, "Toyota", "Japan").await;
        create_car(&server, "Abc", manufacturer_id).await;
        create_car(&server, "Def", manufacturer_id).await;

        let response = server.get("/api/v1/cars").add_query_param("model", "a").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ListResponse<Value>> = response.json();
        assert_eq!(body.data.items.len(), 1);
        assert_eq!(body.data.items[0]["model"], "Abc");
    }

    #[tokio::test]
    async fn test_driver_list_filters_by_username() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let response = server.get("/api/v1/drivers").add_query_param("username", "es").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ListResponse<Value>> = response.json();
        assert_eq!(body.data.items.len(), 1);
        assert_eq!(body.data.items[0]["username"], "test");
    }

    #[tokio::test]
    async fn test_pagination_links_preserve_the_filter() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        for i in 0..7 {
            create_manufacturer(&server, &format!("Carmaker {i}"), "Japan").await;
        }
        create_manufacturer(&server, "Other", "USA").await;

        let response = server.get("/api/v1/manufacturers").add_query_param("name", "car").await;
        let body: ApiResponse<ListResponse<Value>> = response.json();
        assert_eq!(body.data.page, 1);
        assert_eq!(body.data.num_pages, 2);
        assert_eq!(body.data.items.len(), 5);
        assert_eq!(body.data.next.as_deref(), Some("name=car&page=2"));
        assert_eq!(body.data.previous, None);

        // Follow the provided query string to the second page
        let response = server
            .get(&format!("/api/v1/manufacturers?{}", body.data.next.unwrap()))
            .await;
        let body: ApiResponse<ListResponse<Value>> = response.json();
        assert_eq!(body.data.page, 2);
        assert_eq!(body.data.items.len(), 2);
        assert_eq!(body.data.previous.as_deref(), Some("name=car&page=1"));
        assert_eq!(body.data.next, None);
    }

    #[tokio::test]
    async fn test_manufacturer_crud_round_trip() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let id = create_manufacturer(&server, "Toyota", "Japan").await;

        let response = server
            .put(&format!("/api/v1/manufacturers/{id}"))
            .json(&json!({ "country": "Nippon" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["name"], "Toyota");
        assert_eq!(body.data["country"], "Nippon");

        let response = server.delete(&format!("/api/v1/manufacturers/{id}")).await;
        response.assert_status(StatusCode::OK);

        // Gone now
        let response = server
            .put(&format!("/api/v1/manufacturers/{id}"))
            .json(&json!({ "country": "Japan" }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_manufacturer_name_conflict() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        create_manufacturer(&server, "Toyota", "Japan").await;
        let response = server
            .post("/api/v1/manufacturers")
            .json(&json!({ "name": "Toyota", "country": "Japan" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: ErrorResponse = response.json();
        assert!(!body.success);
        assert_eq!(body.code, "MANUFACTURER_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_deleting_manufacturer_cascades_to_cars() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let manufacturer_id = create_manufacturer(&server, "Ford", "USA").await;
        create_car(&server, "Focus", manufacturer_id).await;

        server
            .delete(&format!("/api/v1/manufacturers/{manufacturer_id}"))
            .await
            .assert_status(StatusCode::OK);

        let response = server.get("/api/v1/cars").await;
        let body: ApiResponse<ListResponse<Value>> = response.json();
        assert!(body.data.items.is_empty());
    }

    #[tokio::test]
    async fn test_car_detail_includes_manufacturer_and_drivers() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let manufacturer_id = create_manufacturer(&server, "Toyota", "Japan").await;
        let car_id = create_car(&server, "Corolla", manufacturer_id).await;

        let response = server.get(&format!("/api/v1/cars/{car_id}")).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["model"], "Corolla");
        assert_eq!(body.data["manufacturer"]["name"], "Toyota");
        assert_eq!(body.data["drivers"].as_array().unwrap().len(), 0);

        server
            .post(&format!("/api/v1/cars/{car_id}/toggle-assign"))
            .await
            .assert_status(StatusCode::OK);

        let response = server.get(&format!("/api/v1/cars/{car_id}")).await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["drivers"].as_array().unwrap().len(), 1);
        assert_eq!(body.data["drivers"][0]["username"], "test");
    }

    #[tokio::test]
    async fn test_car_detail_not_found() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let response = server.get("/api/v1/cars/99999").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_toggle_assignment_twice_restores_original_state() {
        let server = setup_test_server().await;
        let driver_id = login_as(&server, "test").await;

        let manufacturer_id = create_manufacturer(&server, "Toyota", "Japan").await;
        let car_id = create_car(&server, "Corolla", manufacturer_id).await;

        // Absent -> present
        let response = server.post(&format!("/api/v1/cars/{car_id}/toggle-assign")).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["assigned"], true);

        let response = server.get(&format!("/api/v1/drivers/{driver_id}")).await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["cars"].as_array().unwrap().len(), 1);

        // Present -> absent
        let response = server.post(&format!("/api/v1/cars/{car_id}/toggle-assign")).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["assigned"], false);

        let response = server.get(&format!("/api/v1/drivers/{driver_id}")).await;
        let body: ApiResponse<Value> = response.json();
        assert!(body.data["cars"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_assignment_on_missing_car() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let response = server.post("/api/v1/cars/99999/toggle-assign").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_driver_with_valid_license() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let response = server
            .post("/api/v1/drivers")
            .json(&json!({
                "username": "newdriver",
                "first_name": "New",
                "last_name": "Driver",
                "password": "s3cur3 p4ssw0rd",
                "license_number": "QWE12345",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["username"], "newdriver");
        assert_eq!(body.data["license_number"], "QWE12345");
        assert!(body.data.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_create_driver_with_invalid_license_is_rejected() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        for bad_license in ["ABC4308", "ABC043081", "12345678", "AB304308", "04308ABC", "ABCDEFGH"] {
            let response = server
                .post("/api/v1/drivers")
                .json(&json!({
                    "username": "newdriver",
                    "first_name": "New",
                    "last_name": "Driver",
                    "password": "s3cur3 p4ssw0rd",
                    "license_number": bad_license,
                }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }

        // Nothing was persisted
        let response = server.get("/api/v1/drivers").await;
        let body: ApiResponse<ListResponse<Value>> = response.json();
        assert_eq!(body.data.items.len(), 2);
    }

    #[tokio::test]
    async fn test_create_driver_with_duplicate_license_conflicts() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let response = server
            .post("/api/v1/drivers")
            .json(&json!({
                "username": "someoneelse",
                "first_name": "Some",
                "last_name": "One",
                "password": "s3cur3 p4ssw0rd",
                // Already taken by the seeded "test" driver
                "license_number": "ABC04308",
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_driver_license() {
        let server = setup_test_server().await;
        let driver_id = login_as(&server, "test").await;

        let response = server
            .put(&format!("/api/v1/drivers/{driver_id}"))
            .json(&json!({ "license_number": "XYZ98765" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["license_number"], "XYZ98765");

        // Invalid replacement is rejected and nothing changes
        let response = server
            .put(&format!("/api/v1/drivers/{driver_id}"))
            .json(&json!({ "license_number": "xyz98765" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server.get(&format!("/api/v1/drivers/{driver_id}")).await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["license_number"], "XYZ98765");
    }

    #[tokio::test]
    async fn test_update_driver_license_not_found() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let response = server
            .put("/api/v1/drivers/99999")
            .json(&json!({ "license_number": "XYZ98765" }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_driver_drops_their_session() {
        let state = setup_test_app_state().await;
        let server = test_server(state.clone());
        let kate_server = test_server(state.clone());

        login_as(&server, "test").await;
        let kate_id = login_as(&kate_server, "kate").await;

        let response = server.delete(&format!("/api/v1/drivers/{kate_id}")).await;
        response.assert_status(StatusCode::OK);

        // Kate's live session no longer resolves to an account
        let response = kate_server.get("/").await;
        response.assert_status(StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_create_car_with_missing_manufacturer() {
        let server = setup_test_server().await;
        login_as(&server, "test").await;

        let response = server
            .post("/api/v1/cars")
            .json(&json!({ "model": "Ghost", "manufacturer_id": 4242 }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_seeded_driver_fixture_helper() {
        let state = setup_test_app_state().await;
        let extra = seed_driver(&state.db, "driver3", "Third", "Driver", "ZZZ00001").await;
        assert_eq!(extra.to_string(), "driver3 (Third Driver)");
    }
}
