use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Content table filled by the file-processing worker
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS universities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            university TEXT,
            program TEXT,
            tuition INTEGER,
            location TEXT,
            visa_service TEXT
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Conversation log, written by the chat handler for analytics
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conversation_history (
            id TEXT PRIMARY KEY,
            query TEXT NOT NULL,
            response TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Append-only contact form log
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact_messages (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_conversation_history_created_at \
         ON conversation_history(created_at DESC)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_contact_messages_created_at \
         ON contact_messages(created_at DESC)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
