// Domain models shared by the catalog/enrichment clients, the local store and the reader

use std::{collections::HashMap, path::PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Author {
    pub name: String,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
}

/// A single catalog record. Never mutated locally once fetched.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub translators: Vec<Author>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub bookshelves: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub copyright: Option<bool>,
    pub media_type: Option<String>,
    /// MIME type -> download URL
    #[serde(default)]
    pub formats: HashMap<String, String>,
    #[serde(default)]
    pub download_count: i64,
}

/// One page of catalog results.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BookSet {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(rename = "results")]
    pub books: Vec<Book>,
}

impl BookSet {
    pub fn first(&self) -> Option<&Book> {
        self.books.first()
    }
}

/// Best-effort metadata from the enrichment service, matched by title.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentInfo {
    pub cover_image: String,
    pub page_count: i64,
    pub description: String,
}

/// Local record marking a book as downloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryItem {
    pub book_id: i64,
    pub title: String,
    pub authors: String,
    pub file_path: PathBuf,
    /// Unix epoch millis
    pub created_at: i64,
}

impl LibraryItem {
    pub fn file_exists(&self) -> bool {
        self.file_path.is_file()
    }
}

/// Last reading position for a downloaded book.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderProgress {
    pub book_id: i64,
    pub last_chapter_index: i32,
    pub last_chapter_offset: i32,
    /// Unix epoch millis
    pub updated_at: i64,
}

impl ReaderProgress {
    /// Percent of chapters read, capped at 100.
    pub fn percent_complete(&self, total_chapters: usize) -> u8 {
        if total_chapters == 0 {
            return 0;
        }
        let pct = (self.last_chapter_index.max(0) as f64 / total_chapters as f64 * 100.0).round();
        pct.min(100.0) as u8
    }
}

/// Aggregated data for the book detail view. Rebuilt on every load.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDetails {
    pub book: Book,
    pub enrichment: Option<EnrichmentInfo>,
    pub library_item: Option<LibraryItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoverImage {
    /// Remote image URL (from the enrichment service)
    Remote(String),
    /// Image bytes embedded in the downloaded artifact
    Embedded { data: Vec<u8>, mime: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub index: usize,
    pub title: String,
    pub content: String,
}

/// Structured result of parsing a downloaded artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: Option<String>,
    pub author: Option<String>,
    pub chapters: Vec<Chapter>,
    pub cover: Option<(Vec<u8>, String)>,
}

/// Everything the reader needs to open a downloaded book.
#[derive(Debug, Clone, PartialEq)]
pub struct EbookData {
    pub cover_image: Option<CoverImage>,
    pub title: String,
    pub author: String,
    pub document: Document,
    pub progress: Option<ReaderProgress>,
}

impl EbookData {
    pub fn percent_complete(&self) -> Option<u8> {
        self.progress
            .as_ref()
            .map(|p| p.percent_complete(self.document.chapters.len()))
    }
}
