use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LibraryItems::Table)
                    .if_not_exists()
                    .col(big_integer(LibraryItems::Id).primary_key())
                    .col(string(LibraryItems::Title))
                    .col(string(LibraryItems::Authors))
                    .col(string(LibraryItems::FilePath))
                    .col(big_integer(LibraryItems::CreatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LibraryItems::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum LibraryItems {
    Table,
    Id,
    Title,
    Authors,
    FilePath,
    CreatedAt,
}
