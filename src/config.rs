//! Configuration management for the Estante server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub library: LibraryConfig,
    pub arxiv: ArxivConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Filesystem layout of the library: downloaded PDFs, generated thumbnails
/// and the flat JSON metadata store.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    pub storage_dir: PathBuf,
    pub thumbnails_dir: PathBuf,
    pub database_file: PathBuf,
}

/// Origin of the arXiv site. Overridable so tests can point the ingestion
/// pipeline at a local fixture server.
#[derive(Debug, Clone, Deserialize)]
pub struct ArxivConfig {
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            library: LibraryConfig {
                storage_dir: PathBuf::from("./storage"),
                thumbnails_dir: PathBuf::from("./thumbnails"),
                database_file: PathBuf::from("./database.json"),
            },
            arxiv: ArxivConfig {
                base_url: "https://arxiv.org".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            library: LibraryConfig {
                storage_dir: env::var("STORAGE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.library.storage_dir),
                thumbnails_dir: env::var("THUMBNAILS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.library.thumbnails_dir),
                database_file: env::var("DATABASE_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.library.database_file),
            },
            arxiv: ArxivConfig {
                base_url: env::var("ARXIV_BASE_URL").unwrap_or(defaults.arxiv.base_url),
            },
        }
    }

    /// Create the storage and thumbnail directories if they do not exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.library.storage_dir)?;
        std::fs::create_dir_all(&self.library.thumbnails_dir)?;
        Ok(())
    }

    /// Path of the stored PDF file for a record id.
    pub fn pdf_path(&self, id: &str) -> PathBuf {
        self.library.storage_dir.join(format!("{id}.pdf"))
    }

    /// Path of the thumbnail file for a record id.
    pub fn thumbnail_path(&self, id: &str) -> PathBuf {
        self.library.thumbnails_dir.join(format!("{id}.png"))
    }
}
