// Local library/progress persistence; sea-orm sqlite implementation in `sea_orm_store`

pub mod sea_orm_store;

pub use sea_orm_store::SeaOrmStore;

use crate::domain::models::{LibraryItem, ReaderProgress};

#[async_trait::async_trait]
pub trait LibraryRepo: Send + Sync {
    async fn get_item_by_id(&self, book_id: i64) -> anyhow::Result<Option<LibraryItem>>;
    /// Inserts or replaces the record for `item.book_id`.
    async fn insert(&self, item: LibraryItem) -> anyhow::Result<()>;
    async fn delete(&self, book_id: i64) -> anyhow::Result<()>;
    async fn list(&self) -> anyhow::Result<Vec<LibraryItem>>;
}

#[async_trait::async_trait]
pub trait ReaderRepo: Send + Sync {
    async fn get_reader_item(&self, book_id: i64) -> anyhow::Result<Option<ReaderProgress>>;
    /// Fails if there is no library item for `progress.book_id`.
    async fn upsert(&self, progress: ReaderProgress) -> anyhow::Result<()>;
}
