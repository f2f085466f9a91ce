pub mod dto;
pub mod errors;
pub mod extract;
pub mod handlers;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::AppState;
use handlers::ApiDoc;

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/users", get(handlers::users::list_users))
        .route(
            "/users/profile",
            get(handlers::users::get_profile).put(handlers::users::update_profile),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user).delete(handlers::users::delete_user),
        )
        .route(
            "/homes",
            get(handlers::homes::list_homes).post(handlers::homes::create_home),
        )
        .route(
            "/homes/{id}",
            get(handlers::homes::get_home)
                .put(handlers::homes::update_home)
                .delete(handlers::homes::delete_home),
        )
        .route(
            "/rooms",
            get(handlers::rooms::list_rooms).post(handlers::rooms::create_room),
        )
        .route("/rooms/home/{home_id}", get(handlers::rooms::list_home_rooms))
        .route(
            "/rooms/{id}",
            get(handlers::rooms::get_room)
                .put(handlers::rooms::update_room)
                .delete(handlers::rooms::delete_room),
        )
        .route(
            "/devices",
            get(handlers::devices::list_devices).post(handlers::devices::create_device),
        )
        .route("/devices/home/{home_id}", get(handlers::devices::list_home_devices))
        .route(
            "/devices/home/{home_id}/power-consumption",
            get(handlers::devices::home_power_consumption),
        )
        .route("/devices/{id}/status", patch(handlers::devices::update_device_status))
        .route("/devices/{id}", delete(handlers::devices::delete_device))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use sqlx::PgPool;
    use uuid::Uuid;

    use crate::api::router;
    use crate::auth::jwt::JwtKeys;
    use crate::cache::Cache;
    use crate::AppState;

    fn test_state(pool: PgPool) -> AppState {
        // Cache disabled: these tests pin down store semantics. Cache logic
        // is fail-open, so the disabled layer exercises the same code paths
        // minus Redis round trips.
        AppState::new(
            pool,
            Cache::disabled(),
            JwtKeys::new("test-secret", 3600, 604_800),
            false,
        )
    }

    fn test_server(pool: PgPool) -> TestServer {
        TestServer::new(router(test_state(pool))).unwrap()
    }

    async fn register(server: &TestServer, username: &str) -> (String, Uuid) {
        let resp = server
            .post("/auth/register")
            .json(&json!({
                "username": username,
                "password": "hunter22",
                "email": format!("{username}@example.com"),
                "firstName": "Test",
                "lastName": "User",
            }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        (
            body["token"].as_str().unwrap().to_owned(),
            body["id"].as_str().unwrap().parse().unwrap(),
        )
    }

    async fn create_home(server: &TestServer, token: &str, name: &str) -> Uuid {
        let resp = server
            .post("/homes")
            .authorization_bearer(token)
            .json(&json!({ "name": name }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    async fn create_device(
        server: &TestServer,
        token: &str,
        home_id: Uuid,
        external_id: &str,
        watts: f64,
    ) -> Uuid {
        let resp = server
            .post("/devices")
            .authorization_bearer(token)
            .json(&json!({
                "name": format!("Device {external_id}"),
                "deviceId": external_id,
                "type": "PLUG",
                "homeId": home_id,
                "powerConsumption": watts,
            }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    async fn set_status(server: &TestServer, token: &str, device_id: Uuid, status: &str) {
        let resp = server
            .patch(&format!("/devices/{device_id}/status?status={status}"))
            .authorization_bearer(token)
            .await;
        resp.assert_status_ok();
    }

    // -----------------------------------------------------------------------
    // System
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn health_returns_ok(pool: PgPool) {
        let server = test_server(pool);
        let resp = server.get("/health").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["status"], "ok");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn openapi_spec_is_served(pool: PgPool) {
        let server = test_server(pool);
        let resp = server.get("/api-docs/openapi.json").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["info"]["title"], "Smart Home API");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn protected_routes_require_a_token(pool: PgPool) {
        let server = test_server(pool);
        for path in ["/homes", "/rooms", "/devices", "/users"] {
            let resp = server.get(path).await;
            resp.assert_status_unauthorized();
            let body: Value = resp.json();
            assert_eq!(body["status"], 401);
            assert!(body["timestamp"].is_string());
        }
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn register_then_login(pool: PgPool) {
        let server = test_server(pool);
        let (_, id) = register(&server, "alice").await;

        let resp = server
            .post("/auth/login")
            .json(&json!({ "username": "alice", "password": "hunter22" }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["id"].as_str().unwrap(), id.to_string());
        assert_eq!(body["type"], "Bearer");
        assert_eq!(body["roles"], json!(["USER"]));
        assert!(body["token"].as_str().unwrap().len() > 20);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_username_conflicts_without_creating_a_row(pool: PgPool) {
        let server = test_server(pool.clone());
        register(&server, "alice").await;

        let resp = server
            .post("/auth/register")
            .json(&json!({
                "username": "alice",
                "password": "different",
                "email": "other@example.com",
                "firstName": "Other",
                "lastName": "Person",
            }))
            .await;
        resp.assert_status(axum::http::StatusCode::CONFLICT);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_email_conflicts(pool: PgPool) {
        let server = test_server(pool);
        register(&server, "alice").await;

        let resp = server
            .post("/auth/register")
            .json(&json!({
                "username": "someoneelse",
                "password": "hunter22",
                "email": "alice@example.com",
                "firstName": "Other",
                "lastName": "Person",
            }))
            .await;
        resp.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn login_failure_is_generic_for_unknown_user_and_wrong_password(pool: PgPool) {
        let server = test_server(pool);
        register(&server, "alice").await;

        let unknown = server
            .post("/auth/login")
            .json(&json!({ "username": "nobody", "password": "hunter22" }))
            .await;
        let wrong = server
            .post("/auth/login")
            .json(&json!({ "username": "alice", "password": "wrong-password" }))
            .await;

        unknown.assert_status_unauthorized();
        wrong.assert_status_unauthorized();
        let a: Value = unknown.json();
        let b: Value = wrong.json();
        assert_eq!(a["message"], b["message"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn refresh_token_issues_a_new_pair(pool: PgPool) {
        let server = test_server(pool);
        let resp = server
            .post("/auth/register")
            .json(&json!({
                "username": "alice",
                "password": "hunter22",
                "email": "alice@example.com",
                "firstName": "Alice",
                "lastName": "Smith",
            }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        let refresh_token = body["refreshToken"].as_str().unwrap();

        let resp = server
            .post("/auth/refresh")
            .json(&json!({ "refreshToken": refresh_token }))
            .await;
        resp.assert_status_ok();
        let refreshed: Value = resp.json();
        assert_eq!(refreshed["username"], "alice");

        // the fresh access token is accepted on protected routes
        let homes = server
            .get("/homes")
            .authorization_bearer(refreshed["token"].as_str().unwrap())
            .await;
        homes.assert_status_ok();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn access_token_is_rejected_as_refresh_token(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;

        let resp = server
            .post("/auth/refresh")
            .json(&json!({ "refreshToken": token }))
            .await;
        resp.assert_status_unauthorized();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn register_sets_refresh_cookie(pool: PgPool) {
        let server = test_server(pool);
        let resp = server
            .post("/auth/register")
            .json(&json!({
                "username": "alice",
                "password": "hunter22",
                "email": "alice@example.com",
                "firstName": "Alice",
                "lastName": "Smith",
            }))
            .await;
        resp.assert_status_ok();
        let cookie = resp.cookie("refreshToken");
        assert_eq!(cookie.path(), Some("/auth/refresh"));
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn short_password_is_a_validation_error(pool: PgPool) {
        let server = test_server(pool);
        let resp = server
            .post("/auth/register")
            .json(&json!({
                "username": "alice",
                "password": "12345",
                "email": "alice@example.com",
                "firstName": "Alice",
                "lastName": "Smith",
            }))
            .await;
        resp.assert_status_bad_request();
    }

    // -----------------------------------------------------------------------
    // Homes
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn created_home_appears_exactly_once_in_listing(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;
        let home_id = create_home(&server, &token, "Main house").await;

        let resp = server.get("/homes").authorization_bearer(&token).await;
        resp.assert_status_ok();
        let homes: Vec<Value> = resp.json();
        let matching: Vec<_> = homes
            .iter()
            .filter(|h| h["id"].as_str().unwrap() == home_id.to_string())
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0]["name"], "Main house");
        assert_eq!(matching[0]["timezone"], "UTC");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn foreign_home_reads_and_writes_report_not_found(pool: PgPool) {
        let server = test_server(pool);
        let (owner, _) = register(&server, "alice").await;
        let (intruder, _) = register(&server, "mallory").await;
        let home_id = create_home(&server, &owner, "Main house").await;

        let get = server
            .get(&format!("/homes/{home_id}"))
            .authorization_bearer(&intruder)
            .await;
        get.assert_status_not_found();

        let update = server
            .put(&format!("/homes/{home_id}"))
            .authorization_bearer(&intruder)
            .json(&json!({ "name": "Stolen house" }))
            .await;
        update.assert_status_not_found();

        let delete = server
            .delete(&format!("/homes/{home_id}"))
            .authorization_bearer(&intruder)
            .await;
        delete.assert_status_not_found();

        // the owner still sees the original
        let get = server
            .get(&format!("/homes/{home_id}"))
            .authorization_bearer(&owner)
            .await;
        get.assert_status_ok();
        let body: Value = get.json();
        assert_eq!(body["name"], "Main house");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_a_home_cascades_to_rooms_and_devices(pool: PgPool) {
        let server = test_server(pool.clone());
        let (token, _) = register(&server, "alice").await;
        let home_id = create_home(&server, &token, "Main house").await;

        let room = server
            .post("/rooms")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Kitchen",
                "roomType": "KITCHEN",
                "homeId": home_id,
            }))
            .await;
        room.assert_status_ok();
        let room: Value = room.json();
        let room_id = room["id"].as_str().unwrap();

        // warm the direct room lookup before the cascade
        server
            .get(&format!("/rooms/{room_id}"))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
        create_device(&server, &token, home_id, "ext-1", 5.0).await;

        let resp = server
            .delete(&format!("/homes/{home_id}"))
            .authorization_bearer(&token)
            .await;
        resp.assert_status(axum::http::StatusCode::NO_CONTENT);

        let rooms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
            .fetch_one(&pool)
            .await
            .unwrap();
        let devices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rooms, 0);
        assert_eq!(devices, 0);

        // the cascaded room is gone from reads too
        server
            .get(&format!("/rooms/{room_id}"))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }

    // -----------------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn room_round_trips_submitted_attributes(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;
        let home_id = create_home(&server, &token, "Main house").await;

        let created = server
            .post("/rooms")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Master bedroom",
                "description": "Upstairs, east side",
                "roomType": "MASTER_BEDROOM",
                "homeId": home_id,
            }))
            .await;
        created.assert_status_ok();
        let created: Value = created.json();
        let room_id = created["id"].as_str().unwrap();

        let fetched = server
            .get(&format!("/rooms/{room_id}"))
            .authorization_bearer(&token)
            .await;
        fetched.assert_status_ok();
        let fetched: Value = fetched.json();
        assert_eq!(fetched["name"], "Master bedroom");
        assert_eq!(fetched["description"], "Upstairs, east side");
        assert_eq!(fetched["roomType"], "MASTER_BEDROOM");
        assert_eq!(fetched["homeId"].as_str().unwrap(), home_id.to_string());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn creating_a_room_in_a_foreign_home_reports_not_found(pool: PgPool) {
        let server = test_server(pool);
        let (owner, _) = register(&server, "alice").await;
        let (intruder, _) = register(&server, "mallory").await;
        let home_id = create_home(&server, &owner, "Main house").await;

        let resp = server
            .post("/rooms")
            .authorization_bearer(&intruder)
            .json(&json!({
                "name": "Kitchen",
                "roomType": "KITCHEN",
                "homeId": home_id,
            }))
            .await;
        resp.assert_status_not_found();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn home_room_listing_is_empty_for_a_foreign_home(pool: PgPool) {
        let server = test_server(pool);
        let (owner, _) = register(&server, "alice").await;
        let (other, _) = register(&server, "mallory").await;
        let home_id = create_home(&server, &owner, "Main house").await;

        server
            .post("/rooms")
            .authorization_bearer(&owner)
            .json(&json!({ "name": "Kitchen", "roomType": "KITCHEN", "homeId": home_id }))
            .await
            .assert_status_ok();

        let resp = server
            .get(&format!("/rooms/home/{home_id}"))
            .authorization_bearer(&other)
            .await;
        resp.assert_status_ok();
        let rooms: Vec<Value> = resp.json();
        assert!(rooms.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn updated_room_is_returned_on_subsequent_reads(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;
        let home_id = create_home(&server, &token, "Main house").await;

        let created = server
            .post("/rooms")
            .authorization_bearer(&token)
            .json(&json!({ "name": "Den", "roomType": "OTHER", "homeId": home_id }))
            .await;
        let created: Value = created.json();
        let room_id = created["id"].as_str().unwrap();

        let updated = server
            .put(&format!("/rooms/{room_id}"))
            .authorization_bearer(&token)
            .json(&json!({ "name": "Office", "roomType": "OFFICE" }))
            .await;
        updated.assert_status_ok();

        let fetched = server
            .get(&format!("/rooms/{room_id}"))
            .authorization_bearer(&token)
            .await;
        let fetched: Value = fetched.json();
        assert_eq!(fetched["name"], "Office");
        assert_eq!(fetched["roomType"], "OFFICE");
    }

    // -----------------------------------------------------------------------
    // Devices
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn new_devices_start_offline(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;
        let home_id = create_home(&server, &token, "Main house").await;
        create_device(&server, &token, home_id, "ext-1", 9.5).await;

        let resp = server.get("/devices").authorization_bearer(&token).await;
        let devices: Vec<Value> = resp.json();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0]["status"], "OFFLINE");
        assert_eq!(devices[0]["powerConsumption"], 9.5);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_external_device_id_conflicts(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;
        let home_id = create_home(&server, &token, "Main house").await;
        create_device(&server, &token, home_id, "ext-1", 5.0).await;

        let resp = server
            .post("/devices")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Second plug",
                "deviceId": "ext-1",
                "type": "PLUG",
                "homeId": home_id,
            }))
            .await;
        resp.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sequential_status_updates_leave_the_last_value(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;
        let home_id = create_home(&server, &token, "Main house").await;
        let device_id = create_device(&server, &token, home_id, "ext-1", 5.0).await;

        set_status(&server, &token, device_id, "ONLINE").await;
        set_status(&server, &token, device_id, "IDLE").await;

        let resp = server
            .get(&format!("/devices/home/{home_id}"))
            .authorization_bearer(&token)
            .await;
        let devices: Vec<Value> = resp.json();
        assert_eq!(devices[0]["status"], "IDLE");
        // two updates bumped the optimistic-lock counter twice
        assert_eq!(devices[0]["version"], 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn foreign_device_status_update_reports_not_found(pool: PgPool) {
        let server = test_server(pool);
        let (owner, _) = register(&server, "alice").await;
        let (intruder, _) = register(&server, "mallory").await;
        let home_id = create_home(&server, &owner, "Main house").await;
        let device_id = create_device(&server, &owner, home_id, "ext-1", 5.0).await;

        let resp = server
            .patch(&format!("/devices/{device_id}/status?status=ERROR"))
            .authorization_bearer(&intruder)
            .await;
        resp.assert_status_not_found();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn power_consumption_sums_only_online_devices(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;
        let home_id = create_home(&server, &token, "Main house").await;

        let lamp = create_device(&server, &token, home_id, "lamp", 12.5).await;
        let heater = create_device(&server, &token, home_id, "heater", 1500.0).await;
        let idle_tv = create_device(&server, &token, home_id, "tv", 80.0).await;

        // nothing online yet
        let resp = server
            .get(&format!("/devices/home/{home_id}/power-consumption"))
            .authorization_bearer(&token)
            .await;
        resp.assert_status_ok();
        let total: f64 = resp.json();
        assert_eq!(total, 0.0);

        set_status(&server, &token, lamp, "ONLINE").await;
        set_status(&server, &token, heater, "ONLINE").await;
        set_status(&server, &token, idle_tv, "IDLE").await;

        let resp = server
            .get(&format!("/devices/home/{home_id}/power-consumption"))
            .authorization_bearer(&token)
            .await;
        let total: f64 = resp.json();
        assert_eq!(total, 1512.5);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn power_consumption_of_a_foreign_home_reports_not_found(pool: PgPool) {
        let server = test_server(pool);
        let (owner, _) = register(&server, "alice").await;
        let (intruder, _) = register(&server, "mallory").await;
        let home_id = create_home(&server, &owner, "Main house").await;

        let resp = server
            .get(&format!("/devices/home/{home_id}/power-consumption"))
            .authorization_bearer(&intruder)
            .await;
        resp.assert_status_not_found();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleted_device_disappears_from_listings(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;
        let home_id = create_home(&server, &token, "Main house").await;
        let device_id = create_device(&server, &token, home_id, "ext-1", 5.0).await;

        let resp = server
            .delete(&format!("/devices/{device_id}"))
            .authorization_bearer(&token)
            .await;
        resp.assert_status(axum::http::StatusCode::NO_CONTENT);

        let resp = server.get("/devices").authorization_bearer(&token).await;
        let devices: Vec<Value> = resp.json();
        assert!(devices.is_empty());
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn profile_reflects_partial_updates(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;

        let resp = server
            .put("/users/profile")
            .authorization_bearer(&token)
            .json(&json!({ "firstName": "Alicia" }))
            .await;
        resp.assert_status_ok();

        let resp = server
            .get("/users/profile")
            .authorization_bearer(&token)
            .await;
        let profile: Value = resp.json();
        assert_eq!(profile["firstName"], "Alicia");
        // untouched fields survive
        assert_eq!(profile["lastName"], "User");
        assert_eq!(profile["email"], "alice@example.com");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn profile_email_update_conflicts_with_existing_account(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;
        register(&server, "bobby").await;

        let resp = server
            .put("/users/profile")
            .authorization_bearer(&token)
            .json(&json!({ "email": "bobby@example.com" }))
            .await;
        resp.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_another_account_reports_not_found(pool: PgPool) {
        let server = test_server(pool);
        let (token, _) = register(&server, "alice").await;
        let (_, bob_id) = register(&server, "bobby").await;

        let resp = server
            .delete(&format!("/users/{bob_id}"))
            .authorization_bearer(&token)
            .await;
        resp.assert_status_not_found();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn self_delete_removes_the_account_and_its_data(pool: PgPool) {
        let server = test_server(pool.clone());
        let (token, id) = register(&server, "alice").await;
        let home_id = create_home(&server, &token, "Main house").await;
        create_device(&server, &token, home_id, "ext-1", 5.0).await;

        let resp = server
            .delete(&format!("/users/{id}"))
            .authorization_bearer(&token)
            .await;
        resp.assert_status(axum::http::StatusCode::NO_CONTENT);

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        let devices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(users, 0);
        assert_eq!(devices, 0);

        let login = server
            .post("/auth/login")
            .json(&json!({ "username": "alice", "password": "hunter22" }))
            .await;
        login.assert_status_unauthorized();

        // the unexpired access token stops working with the account gone
        let homes = server.get("/homes").authorization_bearer(&token).await;
        homes.assert_status_unauthorized();
    }
}
