//! Administrative endpoints.

use rocket::serde::json::Json;
use rocket::{State, post};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::MessageResponse;
use crate::seed::{DEFAULT_SEED_COUNT, current_anchor};
use crate::store::{ArchiveContext, PopulateOutcome, leading_integer};

/// Request body for regenerating the in-memory archive.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct PopulateRequest {
    /// Number of emails to generate, as a number or numeric string.
    #[serde(default)]
    pub count: Option<serde_json::Value>,
}

impl PopulateRequest {
    /// Requested count, or [`DEFAULT_SEED_COUNT`] when missing or unusable.
    pub fn count(&self) -> u64 {
        let parsed = match &self.count {
            Some(serde_json::Value::Number(number)) => number
                .as_u64()
                .or_else(|| number.as_f64().filter(|v| *v >= 1.0).map(|v| v as u64)),
            Some(serde_json::Value::String(raw)) => {
                leading_integer(raw).and_then(|value| u64::try_from(value).ok())
            }
            _ => None,
        };
        parsed.filter(|count| *count > 0).unwrap_or(DEFAULT_SEED_COUNT)
    }
}

/// Replace the in-memory archive with freshly synthesized emails.
///
/// Against PostgreSQL this does nothing; the `seed` binary owns that path.
#[openapi(tag = "Admin")]
#[post("/populate", data = "<request>")]
pub async fn populate(
    request: Option<Json<PopulateRequest>>,
    context: &State<ArchiveContext>,
) -> Result<Json<MessageResponse>, ApiError> {
    let count = request.map(|body| body.count()).unwrap_or(DEFAULT_SEED_COUNT);
    log::info!("Populating {} emails...", count);

    let outcome = context
        .populate_in_memory(count, current_anchor())
        .await
        .map_err(|e| ApiError::InternalError(format!("populate task failed: {e}")))?;

    let message = match outcome {
        PopulateOutcome::Generated(generated) => {
            format!("Generated {generated} emails in memory")
        }
        PopulateOutcome::Delegated => "Use the seed binary to populate PostgreSQL".to_string(),
    };

    Ok(Json(MessageResponse { message }))
}
