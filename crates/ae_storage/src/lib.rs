use std::str::FromStr;
use std::sync::Arc;

use ae_core::{ArticleStorage, Error, Result};
use async_trait::async_trait;
use tracing::info;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: ArticleStorage + Sized + 'static {
    fn backend_name() -> &'static str;

    /// Opens the backend. `location` is backend specific (a database path for
    /// SQLite, ignored in memory).
    async fn connect(location: Option<&str>) -> Result<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::storage(format!(
                "Unknown storage backend: {} (expected memory or sqlite)",
                other
            ))),
        }
    }
}

pub async fn create_storage(kind: StorageKind, location: Option<&str>) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        StorageKind::Memory => open::<InMemoryStorage>(location).await,
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => open::<SQLiteStorage>(location).await,
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => Err(Error::storage(
            "SQLite support is not compiled in, rebuild with the `sqlite` feature",
        )),
    }
}

async fn open<T: StorageBackend>(location: Option<&str>) -> Result<Arc<dyn ArticleStorage>> {
    let storage = T::connect(location).await?;
    info!("🏦 Storage backend initialized (using {})", T::backend_name());
    Ok(Arc::new(storage))
}
