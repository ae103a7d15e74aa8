use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HMAC key used to sign session tokens. Rotating it invalidates all
    /// outstanding tokens.
    #[serde(default = "default_secret")]
    pub secret: String,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            admin_email: default_admin_email(),
            admin_password: default_admin_password(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

fn default_secret() -> String {
    "your-secret-key".to_string()
}
fn default_admin_email() -> String {
    "admin@visamonk.ai".to_string()
}
fn default_admin_password() -> String {
    "admin123".to_string()
}
fn default_token_ttl() -> i64 {
    86_400
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Uploaded source files plus the SQLite store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Text assets produced by the scrape worker.
    #[serde(default = "default_scraped_dir")]
    pub scraped_dir: PathBuf,
    /// Vector index artifacts written by the reindex worker.
    #[serde(default = "default_vectorstore_dir")]
    pub vectorstore_dir: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_chunks_file")]
    pub chunks_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            scraped_dir: default_scraped_dir(),
            vectorstore_dir: default_vectorstore_dir(),
            db_path: default_db_path(),
            index_file: default_index_file(),
            chunks_file: default_chunks_file(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_scraped_dir() -> PathBuf {
    PathBuf::from("scraped_data")
}
fn default_vectorstore_dir() -> PathBuf {
    PathBuf::from("vectorstore")
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/gateway.sqlite")
}
fn default_index_file() -> String {
    "index.faiss".to_string()
}
fn default_chunks_file() -> String {
    "chunks.pkl".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkersConfig {
    /// Interpreter used to launch every worker script.
    #[serde(default = "default_worker_command")]
    pub command: String,
    #[serde(default = "default_chat_worker")]
    pub chat: WorkerConfig,
    #[serde(default = "default_scrape_worker")]
    pub scrape: WorkerConfig,
    #[serde(default = "default_reindex_worker")]
    pub reindex: WorkerConfig,
    #[serde(default = "default_file_process_worker")]
    pub file_process: WorkerConfig,
    #[serde(default = "default_tts_worker")]
    pub tts: WorkerConfig,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            command: default_worker_command(),
            chat: default_chat_worker(),
            scrape: default_scrape_worker(),
            reindex: default_reindex_worker(),
            file_process: default_file_process_worker(),
            tts: default_tts_worker(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    pub script: PathBuf,
    #[serde(default = "default_worker_timeout")]
    pub timeout_secs: u64,
}

fn default_worker_command() -> String {
    "python3".to_string()
}
fn default_worker_timeout() -> u64 {
    60
}
fn default_chat_worker() -> WorkerConfig {
    WorkerConfig {
        script: PathBuf::from("scripts/chat_processor.py"),
        timeout_secs: 60,
    }
}
fn default_scrape_worker() -> WorkerConfig {
    WorkerConfig {
        script: PathBuf::from("scripts/web_scraper.py"),
        timeout_secs: 300,
    }
}
fn default_reindex_worker() -> WorkerConfig {
    WorkerConfig {
        script: PathBuf::from("scripts/data_indexer.py"),
        timeout_secs: 300,
    }
}
fn default_file_process_worker() -> WorkerConfig {
    WorkerConfig {
        script: PathBuf::from("scripts/file_processor.py"),
        timeout_secs: 120,
    }
}
fn default_tts_worker() -> WorkerConfig {
    WorkerConfig {
        script: PathBuf::from("scripts/tts_generator.py"),
        timeout_secs: 30,
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if config.auth.secret.is_empty() {
        anyhow::bail!("auth.secret must not be empty");
    }
    if config.auth.admin_email.is_empty() {
        anyhow::bail!("auth.admin_email must not be empty");
    }
    if config.auth.token_ttl_secs < 1 {
        anyhow::bail!("auth.token_ttl_secs must be >= 1");
    }

    for (name, worker) in [
        ("chat", &config.workers.chat),
        ("scrape", &config.workers.scrape),
        ("reindex", &config.workers.reindex),
        ("file_process", &config.workers.file_process),
        ("tts", &config.workers.tts),
    ] {
        if worker.timeout_secs == 0 {
            anyhow::bail!("workers.{}.timeout_secs must be > 0", name);
        }
    }

    Ok(())
}
