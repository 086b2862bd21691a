pub mod library_item;
pub mod reader_item;
