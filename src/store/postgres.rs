use sqlx::PgPool;

use crate::models::EmailSummary;

pub async fn page(
    pool: &PgPool,
    offset: i64,
    limit: i64,
) -> Result<(Vec<EmailSummary>, i64), sqlx::Error> {
    let emails: Vec<EmailSummary> = sqlx::query_as(
        r#"SELECT id, message_id, from_address, to_address, subject, received_at
           FROM emails
           ORDER BY id ASC
           LIMIT $1 OFFSET $2"#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total = count(pool).await?;

    Ok((emails, total))
}

pub async fn body(pool: &PgPool, message_id: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT body FROM emails WHERE message_id = $1")
        .bind(message_id)
        .fetch_optional(pool)
        .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM emails")
        .fetch_one(pool)
        .await
}
