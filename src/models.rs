use chrono::{DateTime, SecondsFormat, Utc};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ===== Email Records =====

/// Render timestamps as `2025-03-14T11:55:00.000Z`, always with milliseconds.
fn serialize_millis<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// A stored email including its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct EmailRecord {
    pub id: i64,
    #[serde(rename = "Message-ID")]
    pub message_id: String,
    #[serde(rename = "From")]
    pub from_address: String,
    #[serde(rename = "To")]
    pub to_address: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Received_at", serialize_with = "serialize_millis")]
    pub received_at: DateTime<Utc>,
    #[serde(rename = "Body")]
    pub body: String,
}

/// Listing projection of [`EmailRecord`]; bodies are fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct EmailSummary {
    pub id: i64,
    #[serde(rename = "Message-ID")]
    pub message_id: String,
    #[serde(rename = "From")]
    pub from_address: String,
    #[serde(rename = "To")]
    pub to_address: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Received_at", serialize_with = "serialize_millis")]
    pub received_at: DateTime<Utc>,
}

impl From<&EmailRecord> for EmailSummary {
    fn from(record: &EmailRecord) -> Self {
        Self {
            id: record.id,
            message_id: record.message_id.clone(),
            from_address: record.from_address.clone(),
            to_address: record.to_address.clone(),
            subject: record.subject.clone(),
            received_at: record.received_at,
        }
    }
}

/// A synthesized email that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmail {
    pub message_id: String,
    pub from_address: String,
    pub to_address: String,
    pub subject: String,
    pub received_at: DateTime<Utc>,
    pub body: String,
}

impl NewEmail {
    pub fn into_record(self, id: i64) -> EmailRecord {
        EmailRecord {
            id,
            message_id: self.message_id,
            from_address: self.from_address,
            to_address: self.to_address,
            subject: self.subject,
            received_at: self.received_at,
            body: self.body,
        }
    }
}

// ===== API Responses =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmailPage {
    pub emails: Vec<EmailSummary>,
    /// Size of the whole archive, independent of the page window.
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}
