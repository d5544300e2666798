use archive_server::models::{CountResponse, EmailPage, MessageResponse};
use archive_server::routes::admin::populate;
use archive_server::routes::emails::{count_emails, get_email_body, list_emails};
use archive_server::store::ArchiveContext;
use archive_server::test_support::TestRocketBuilder;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use rocket::routes;
use rocket::serde::json::json;

fn client() -> Client {
    TestRocketBuilder::new()
        .manage_context(ArchiveContext::in_memory())
        .mount_routes(routes![list_emails, count_emails, get_email_body, populate])
        .blocking_client()
}

fn populate_with(client: &Client, count: u64) -> MessageResponse {
    let response = client
        .post("/populate")
        .header(ContentType::JSON)
        .body(json!({ "count": count }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    response.into_json().expect("populate payload")
}

fn list(client: &Client, query: &str) -> EmailPage {
    let response = client.get(format!("/emails{query}")).dispatch();
    assert_eq!(response.status(), Status::Ok);
    response.into_json().expect("listing payload")
}

fn body_uri(message_id: &str) -> String {
    let encoded = message_id.replace('<', "%3C").replace('>', "%3E");
    format!("/emails/{encoded}/body")
}

#[test]
fn pagination_windows_over_250_records() {
    let client = client();
    let message = populate_with(&client, 250);
    assert_eq!(message.message, "Generated 250 emails in memory");

    let first = list(&client, "?page=1&limit=100");
    assert_eq!(first.emails.len(), 100);
    assert_eq!(first.total, 250);
    assert_eq!(first.page, 1);
    assert_eq!(first.limit, 100);

    let third = list(&client, "?page=3&limit=100");
    assert_eq!(third.emails.len(), 50);
    assert_eq!(third.emails[0].id, 201);
    assert_eq!(third.total, 250);

    let fourth = list(&client, "?page=4&limit=100");
    assert!(fourth.emails.is_empty());
    assert_eq!(fourth.total, 250);
}

#[test]
fn malformed_page_behaves_like_missing_page() {
    let client = client();
    populate_with(&client, 120);

    let garbage = list(&client, "?page=abc&limit=oops");
    let omitted = list(&client, "");

    assert_eq!(garbage.page, 1);
    assert_eq!(garbage.limit, 100);
    assert_eq!(garbage.total, omitted.total);
    assert_eq!(garbage.emails, omitted.emails);
}

#[test]
fn listings_exclude_bodies() {
    let client = client();
    populate_with(&client, 2);

    let response = client.get("/emails?limit=1").dispatch();
    let raw: serde_json::Value = response.into_json().expect("raw listing");
    let first = &raw["emails"][0];

    assert!(first.get("Body").is_none());
    assert_eq!(first["id"], 1);
    assert_eq!(first["From"], "user1@test.com");
    assert_eq!(first["Subject"], "Project Update 1");
    assert!(first["Message-ID"].as_str().is_some());
    let received_at = first["Received_at"].as_str().expect("timestamp string");
    assert_eq!(received_at.len(), "2025-03-14T11:55:00.000Z".len());
    assert_eq!(&received_at[19..20], ".");
    assert!(received_at.ends_with('Z'));
}

#[test]
fn end_to_end_three_records() {
    let client = client();
    populate_with(&client, 3);

    let count: CountResponse = client
        .get("/emails/count")
        .dispatch()
        .into_json()
        .expect("count payload");
    assert_eq!(count.count, 3);

    let page = list(&client, "?page=1&limit=10");
    let ids: Vec<i64> = page.emails.iter().map(|email| email.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let second = &page.emails[1];
    let response = client.get(body_uri(&second.message_id)).dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::Plain));

    let expected = format!(
        "This is the body of email 2.\n\nIt contains some content that will be stored on disk.\n\nGenerated at {}",
        second
            .received_at
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    );
    assert_eq!(response.into_string().as_deref(), Some(expected.as_str()));
}

#[test]
fn unknown_message_id_is_not_found() {
    let client = client();
    populate_with(&client, 5);

    let response = client.get(body_uri("<nonexistent@example.com>")).dispatch();
    assert_eq!(response.status(), Status::NotFound);

    let payload: serde_json::Value = response.into_json().expect("error payload");
    assert_eq!(payload["error"], "Email not found");
}

#[test]
fn populate_without_body_uses_default_count() {
    let client = client();

    let response = client.post("/populate").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let message: MessageResponse = response.into_json().expect("populate payload");
    assert_eq!(message.message, "Generated 100000 emails in memory");
}

#[test]
fn populate_replaces_previous_list() {
    let client = client();
    populate_with(&client, 40);
    populate_with(&client, 7);

    let page = list(&client, "");
    assert_eq!(page.total, 7);
    assert_eq!(page.emails.len(), 7);
}
