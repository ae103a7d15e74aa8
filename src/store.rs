//! On-disk pipeline state.
//!
//! The store owns everything the workers produce and consume: uploaded
//! source files and the SQLite store under the data directory, scraper
//! output under the scraped directory, and the vector index artifacts
//! under the vectorstore directory. Assets feed the index only through an
//! explicit reindex; no operation patches the index incrementally.
//!
//! A single mutation lock serializes every pipeline-mutating operation
//! (upload, scrape, delete, reindex, clear). Reindexing while a delete is
//! removing files would otherwise produce an index referencing assets
//! that no longer exist. Reads stay unlocked and fully parallel.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::{Row, SqlitePool};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{Config, StorageConfig};
use crate::db;
use crate::models::{AssetLocation, BatchDeleteOutcome, DataAsset, IndexState, QueryCount};
use crate::worker::{WorkerOp, WorkerOutcome, WorkerPool};

pub struct PipelineStore {
    storage: StorageConfig,
    pool: SqlitePool,
    mutation: Mutex<()>,
}

impl PipelineStore {
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        Ok(Self {
            storage: config.storage.clone(),
            pool,
            mutation: Mutex::new(()),
        })
    }

    /// Enumerate assets in both locations. The scraped location is created
    /// on first use instead of failing when absent.
    pub async fn list_assets(&self) -> Result<Vec<DataAsset>> {
        let mut assets = Vec::new();

        self.collect_assets(&self.storage.data_dir, AssetLocation::Uploaded, &mut assets)
            .await?;

        if !self.storage.scraped_dir.exists() {
            tokio::fs::create_dir_all(&self.storage.scraped_dir)
                .await
                .with_context(|| {
                    format!(
                        "Failed to create scraped data directory: {}",
                        self.storage.scraped_dir.display()
                    )
                })?;
            tracing::warn!(
                dir = %self.storage.scraped_dir.display(),
                "created missing scraped data directory"
            );
        }
        self.collect_assets(
            &self.storage.scraped_dir,
            AssetLocation::Scraped,
            &mut assets,
        )
        .await?;

        assets.sort_by(|a, b| (a.location, &a.name).cmp(&(b.location, &b.name)));
        Ok(assets)
    }

    async fn collect_assets(
        &self,
        dir: &Path,
        location: AssetLocation,
        out: &mut Vec<DataAsset>,
    ) -> Result<()> {
        if !dir.exists() {
            return Ok(());
        }

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if location == AssetLocation::Uploaded && self.is_db_artifact(&name) {
                continue;
            }

            let modified_at = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            let extension = Path::new(&name)
                .extension()
                .map(|e| e.to_string_lossy().to_uppercase())
                .unwrap_or_default();

            out.push(DataAsset {
                name,
                size_bytes: meta.len(),
                extension,
                modified_at,
                location,
            });
        }
        Ok(())
    }

    /// The SQLite file (and its WAL/SHM siblings) lives in the data
    /// directory but is not a data asset.
    fn is_db_artifact(&self, name: &str) -> bool {
        let db_name = self
            .storage
            .db_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        !db_name.is_empty()
            && (name == db_name
                || name == format!("{}-wal", db_name)
                || name == format!("{}-shm", db_name))
    }

    /// Write an upload into the uploaded location (last-write-wins on name
    /// collision), then drive the file-processing worker over it. The
    /// upload does not touch the index; that happens on the next reindex.
    pub async fn ingest_upload(
        &self,
        workers: &dyn WorkerPool,
        name: &str,
        bytes: &[u8],
    ) -> Result<(DataAsset, Value)> {
        let _guard = self.mutation.lock().await;

        let name = sanitize_file_name(name)
            .with_context(|| format!("Invalid upload file name: {:?}", name))?;
        tokio::fs::create_dir_all(&self.storage.data_dir).await?;
        let path = self.storage.data_dir.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to save upload: {}", path.display()))?;
        tracing::info!(file = %name, size = bytes.len(), "saved upload");

        let payload = json!({
            "filePath": path.to_string_lossy(),
            "fileName": name,
        });
        let result = match workers.invoke(WorkerOp::FileProcess, payload).await {
            WorkerOutcome::Json(value) => value,
            // Ran to completion but mangled its reply; the file is saved
            WorkerOutcome::Degraded { .. } | WorkerOutcome::Binary(_) => {
                json!({"processed": true})
            }
            WorkerOutcome::Failed(failure) => bail!("File processing failed: {}", failure),
        };

        let extension = Path::new(&name)
            .extension()
            .map(|e| e.to_string_lossy().to_uppercase())
            .unwrap_or_default();
        let asset = DataAsset {
            name,
            size_bytes: bytes.len() as u64,
            extension,
            modified_at: Utc::now(),
            location: AssetLocation::Uploaded,
        };
        Ok((asset, result))
    }

    /// Drive the scrape worker and persist whatever text assets it
    /// returns. Unless `keep_old_data` is set, the scraped location is
    /// cleared first so the new crawl replaces the old one.
    pub async fn scrape(
        &self,
        workers: &dyn WorkerPool,
        url: &str,
        keep_old_data: bool,
    ) -> Result<u64> {
        let _guard = self.mutation.lock().await;

        tokio::fs::create_dir_all(&self.storage.scraped_dir).await?;
        if !keep_old_data {
            remove_dir_files(&self.storage.scraped_dir).await?;
        }

        let payload = json!({"url": url, "keepOldData": keep_old_data});
        match workers.invoke(WorkerOp::Scrape, payload).await {
            WorkerOutcome::Json(reply) => {
                let pages = reply.get("pages").and_then(Value::as_u64).unwrap_or(0);
                if let Some(assets) = reply.get("assets").and_then(Value::as_array) {
                    self.record_scrape(assets).await?;
                }
                tracing::info!(url, pages, "scrape completed");
                Ok(pages)
            }
            WorkerOutcome::Degraded { .. } | WorkerOutcome::Binary(_) => Ok(0),
            WorkerOutcome::Failed(failure) => bail!("Web scraping failed: {}", failure),
        }
    }

    /// Persist scraper-produced text assets into the scraped location.
    /// Entries without a usable name or content are skipped, not fatal.
    async fn record_scrape(&self, assets: &[Value]) -> Result<()> {
        for asset in assets {
            let Some(name) = asset
                .get("name")
                .and_then(Value::as_str)
                .and_then(sanitize_file_name)
            else {
                tracing::warn!("skipping scraped asset without a valid name");
                continue;
            };
            let content = asset.get("content").and_then(Value::as_str).unwrap_or("");
            let path = self.storage.scraped_dir.join(&name);
            tokio::fs::write(&path, content)
                .await
                .with_context(|| format!("Failed to save scraped asset: {}", path.display()))?;
        }
        Ok(())
    }

    /// Bulk delete by name: uploaded location first, then scraped. A name
    /// found in neither becomes a per-item error; the batch never aborts.
    /// Every requested name ends up in exactly one of deleted or errors.
    pub async fn delete_assets(&self, names: &[String]) -> BatchDeleteOutcome {
        let _guard = self.mutation.lock().await;

        let mut outcome = BatchDeleteOutcome::default();
        for raw in names {
            let Some(name) = sanitize_file_name(raw) else {
                outcome.errors.push(format!("File not found: {}", raw));
                continue;
            };
            if self.is_db_artifact(&name) {
                outcome.errors.push(format!("File not found: {}", name));
                continue;
            }

            let uploaded = self.storage.data_dir.join(&name);
            if tokio::fs::remove_file(&uploaded).await.is_ok() {
                outcome.deleted_count += 1;
                continue;
            }

            let scraped = self.storage.scraped_dir.join(&name);
            match tokio::fs::remove_file(&scraped).await {
                Ok(()) => outcome.deleted_count += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    outcome.errors.push(format!("File not found: {}", name));
                }
                Err(e) => {
                    outcome.errors.push(format!("Error deleting {}: {}", name, e));
                }
            }
        }

        tracing::info!(
            deleted = outcome.deleted_count,
            errors = outcome.errors.len(),
            "asset deletion finished"
        );
        outcome
    }

    /// Rebuild the index wholesale from the current asset set via the
    /// reindex worker. A worker that ran but produced no usable counters
    /// reports an empty index rather than a stale one.
    pub async fn reindex(&self, workers: &dyn WorkerPool) -> Result<IndexState> {
        let _guard = self.mutation.lock().await;

        match workers.invoke(WorkerOp::Reindex, json!({})).await {
            WorkerOutcome::Json(reply) => {
                let state = IndexState {
                    chunk_count: reply.get("chunks").and_then(Value::as_u64).unwrap_or(0),
                    file_count: reply.get("files").and_then(Value::as_u64).unwrap_or(0),
                };
                tracing::info!(chunks = state.chunk_count, files = state.file_count, "reindexed");
                Ok(state)
            }
            WorkerOutcome::Degraded { .. } | WorkerOutcome::Binary(_) => Ok(IndexState::default()),
            WorkerOutcome::Failed(failure) => bail!("Data reindexing failed: {}", failure),
        }
    }

    /// Wipe the relational content/history tables, all scraped assets, and
    /// the vector index artifacts. The three steps are independent: a
    /// failure in one is reported as a warning and never blocks the others.
    pub async fn clear_all(&self) -> Vec<String> {
        let _guard = self.mutation.lock().await;

        let mut warnings = Vec::new();

        for table in ["universities", "conversation_history"] {
            let statement = format!("DELETE FROM {}", table);
            if let Err(e) = sqlx::query(&statement).execute(&self.pool).await {
                warnings.push(format!("Failed to clear table {}: {}", table, e));
            }
        }

        match remove_dir_files(&self.storage.scraped_dir).await {
            Ok(()) => {}
            Err(e) => warnings.push(format!("Failed to clear scraped data: {}", e)),
        }

        for artifact in [&self.storage.index_file, &self.storage.chunks_file] {
            let path = self.storage.vectorstore_dir.join(artifact);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warnings.push(format!("Failed to remove {}: {}", path.display(), e)),
            }
        }

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        warnings
    }

    /// Append-only contact form insert; never read back by the gateway.
    pub async fn record_contact_message(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO contact_messages (id, name, email, message, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(email)
        .bind(message)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Analytics insert for one chat exchange.
    pub async fn record_conversation(&self, query: &str, response: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO conversation_history (id, query, response, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(query)
        .bind(response)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most frequent chat queries, for the analytics endpoint.
    pub async fn top_queries(&self, limit: i64) -> Result<Vec<QueryCount>> {
        let rows = sqlx::query(
            "SELECT query, COUNT(*) as count FROM conversation_history \
             GROUP BY query ORDER BY count DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| QueryCount {
                query: row.get::<String, _>("query"),
                count: row.get::<i64, _>("count"),
            })
            .collect())
    }
}

/// Reduce a client-supplied name to its final path component so uploads
/// and deletions can never escape the asset directories.
fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = Path::new(raw).file_name()?.to_string_lossy().to_string();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name)
}

/// Remove every regular file directly inside `dir`. Missing directory is
/// not an error.
async fn remove_dir_files(dir: &PathBuf) -> Result<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read directory: {}", dir.display()))
        }
    };
    while let Some(entry) = entries.next_entry().await? {
        if entry.metadata().await?.is_file() {
            tokio::fs::remove_file(entry.path())
                .await
                .with_context(|| format!("Failed to remove {}", entry.path().display()))?;
        }
    }
    Ok(())
}
