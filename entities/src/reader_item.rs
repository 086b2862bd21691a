use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reader_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub book_id: i64,
    pub last_chapter_index: i32,
    pub last_chapter_offset: i32,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::library_item::Entity",
        from = "Column::BookId",
        to = "super::library_item::Column::Id",
        on_delete = "Cascade"
    )]
    LibraryItem,
}

impl Related<super::library_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LibraryItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
