use std::sync::Arc;

use anyhow::Context;
use entities::{library_item, reader_item};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, sea_query::OnConflict};

use super::{LibraryRepo, ReaderRepo};
use crate::domain::{
    mapping::{
        library_item_from_entity, library_item_to_active, reader_progress_from_entity,
        reader_progress_to_active,
    },
    models::{LibraryItem, ReaderProgress},
};

#[derive(Clone, Debug)]
pub struct SeaOrmStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        SeaOrmStore { db }
    }
}

#[async_trait::async_trait]
impl LibraryRepo for SeaOrmStore {
    async fn get_item_by_id(&self, book_id: i64) -> anyhow::Result<Option<LibraryItem>> {
        let found = library_item::Entity::find_by_id(book_id)
            .one(self.db.as_ref())
            .await
            .with_context(|| format!("Failed to load library item {}", book_id))?;
        Ok(found.map(library_item_from_entity))
    }

    #[tracing::instrument(level = "debug", skip(self, item), fields(book_id = item.book_id))]
    async fn insert(&self, item: LibraryItem) -> anyhow::Result<()> {
        library_item::Entity::insert(library_item_to_active(&item))
            .on_conflict(
                OnConflict::column(library_item::Column::Id)
                    .update_columns([
                        library_item::Column::Title,
                        library_item::Column::Authors,
                        library_item::Column::FilePath,
                        library_item::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .with_context(|| format!("Failed to insert library item {}", item.book_id))?;
        Ok(())
    }

    async fn delete(&self, book_id: i64) -> anyhow::Result<()> {
        library_item::Entity::delete_by_id(book_id)
            .exec(self.db.as_ref())
            .await
            .with_context(|| format!("Failed to delete library item {}", book_id))?;
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<LibraryItem>> {
        let rows = library_item::Entity::find()
            .order_by_desc(library_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .context("Failed to list library items")?;
        Ok(rows.into_iter().map(library_item_from_entity).collect())
    }
}

#[async_trait::async_trait]
impl ReaderRepo for SeaOrmStore {
    async fn get_reader_item(&self, book_id: i64) -> anyhow::Result<Option<ReaderProgress>> {
        let found = reader_item::Entity::find_by_id(book_id)
            .one(self.db.as_ref())
            .await
            .with_context(|| format!("Failed to load reader progress {}", book_id))?;
        Ok(found.map(reader_progress_from_entity))
    }

    #[tracing::instrument(level = "debug", skip(self, progress), fields(book_id = progress.book_id))]
    async fn upsert(&self, progress: ReaderProgress) -> anyhow::Result<()> {
        if self.get_item_by_id(progress.book_id).await?.is_none() {
            anyhow::bail!(
                "cannot record progress for book {} which is not in the library",
                progress.book_id
            );
        }
        reader_item::Entity::insert(reader_progress_to_active(&progress))
            .on_conflict(
                OnConflict::column(reader_item::Column::BookId)
                    .update_columns([
                        reader_item::Column::LastChapterIndex,
                        reader_item::Column::LastChapterOffset,
                        reader_item::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .with_context(|| format!("Failed to save reader progress {}", progress.book_id))?;
        Ok(())
    }
}
