use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub bootstrap_url: String,
    pub enrichment_url: String,
    pub enrichment_api_key: String,
    pub download_dir: PathBuf,
    pub db_connection_string: String,
    pub bind_addr: String,
}

pub const DEFAULT_BOOTSTRAP_URL: &str =
    "https://raw.githubusercontent.com/starry-shivam/stuffs/main/myne-api-url";
pub const DEFAULT_ENRICHMENT_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
const DEFAULT_DB_CONNECTION_STRING: &str = "sqlite://gutenfetch.sqlite?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

impl Config {
    pub fn load() -> Self {
        Config {
            bootstrap_url: env_or("GUTENFETCH_BOOTSTRAP_URL", DEFAULT_BOOTSTRAP_URL),
            enrichment_url: env_or("GUTENFETCH_ENRICHMENT_URL", DEFAULT_ENRICHMENT_URL),
            enrichment_api_key: std::env::var("GUTENFETCH_ENRICHMENT_API_KEY").unwrap_or_default(),
            download_dir: env_or("GUTENFETCH_DOWNLOAD_DIR", DEFAULT_DOWNLOAD_DIR).into(),
            db_connection_string: env_or("DB_CONNECTION_STRING", DEFAULT_DB_CONNECTION_STRING),
            bind_addr: env_or("GUTENFETCH_BIND_ADDR", DEFAULT_BIND_ADDR),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bootstrap_url.trim().is_empty() {
            return Err("GUTENFETCH_BOOTSTRAP_URL is empty".into());
        }
        if self.enrichment_url.trim().is_empty() {
            return Err("GUTENFETCH_ENRICHMENT_URL is empty".into());
        }
        if self.download_dir.as_os_str().is_empty() {
            return Err("GUTENFETCH_DOWNLOAD_DIR is empty".into());
        }
        Ok(())
    }
}
