use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "library_items")]
pub struct Model {
    /// Catalog id of the downloaded book
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub title: String,
    pub authors: String,
    pub file_path: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::reader_item::Entity")]
    ReaderItem,
}

impl Related<super::reader_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReaderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
