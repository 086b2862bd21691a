pub mod catalog;
pub mod downloads;
pub mod reader;
