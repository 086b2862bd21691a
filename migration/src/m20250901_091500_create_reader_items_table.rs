use crate::m20250901_090000_create_library_items_table::LibraryItems;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReaderItems::Table)
                    .if_not_exists()
                    .col(big_integer(ReaderItems::BookId).primary_key())
                    .col(integer(ReaderItems::LastChapterIndex))
                    .col(integer(ReaderItems::LastChapterOffset))
                    .col(big_integer(ReaderItems::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reader_items_book_id")
                            .from(ReaderItems::Table, ReaderItems::BookId)
                            .to(LibraryItems::Table, LibraryItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReaderItems::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ReaderItems {
    Table,
    BookId,
    LastChapterIndex,
    LastChapterOffset,
    UpdatedAt,
}
