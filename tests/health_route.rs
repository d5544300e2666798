use archive_server::routes::health::{HealthResponse, health_check};
use archive_server::store::{ArchiveContext, StorageMode};
use archive_server::test_support::TestRocketBuilder;
use rocket::http::Status;
use rocket::routes;

#[test]
fn health_endpoint_reports_storage_mode() {
    let client = TestRocketBuilder::new()
        .manage_context(ArchiveContext::in_memory())
        .mount_routes(routes![health_check])
        .blocking_client();

    let response = client.get("/health").dispatch();
    assert_eq!(response.status(), Status::Ok);

    let payload: HealthResponse = response.into_json().expect("valid JSON payload");
    assert_eq!(payload.status, "ok");
    assert_eq!(payload.storage, StorageMode::Memory);
}
