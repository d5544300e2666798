//! Read-only email endpoints.

use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;

use crate::error::ApiError;
use crate::models::{CountResponse, EmailPage};
use crate::store::{ArchiveContext, PageRequest};

/// List emails in ascending id order, without bodies.
///
/// `page` and `limit` are taken as raw strings so malformed values fall back
/// to their defaults instead of rejecting the request.
#[openapi(tag = "Emails")]
#[get("/emails?<page>&<limit>")]
pub async fn list_emails(
    page: Option<String>,
    limit: Option<String>,
    context: &State<ArchiveContext>,
) -> Result<Json<EmailPage>, ApiError> {
    let request = PageRequest::from_query(page.as_deref(), limit.as_deref());
    let emails = context.list_emails(request).await?;
    Ok(Json(emails))
}

/// Plain-text body of the email with the given message id.
#[openapi(tag = "Emails")]
#[get("/emails/<message_id>/body")]
pub async fn get_email_body(
    message_id: String,
    context: &State<ArchiveContext>,
) -> Result<String, ApiError> {
    context
        .get_body(&message_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Email not found".to_string()))
}

/// Total number of archived emails.
#[openapi(tag = "Emails")]
#[get("/emails/count")]
pub async fn count_emails(context: &State<ArchiveContext>) -> Result<Json<CountResponse>, ApiError> {
    let count = context.count().await?;
    Ok(Json(CountResponse { count }))
}
