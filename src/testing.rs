// Shared fixtures and in-memory fakes for unit tests

use std::{collections::HashMap, path::Path};

use tokio::sync::Mutex;

use crate::{
    domain::models::{Book, Chapter, Document, LibraryItem, ReaderProgress},
    parser::{DocumentParser, ParseError},
    storage::{LibraryRepo, ReaderRepo},
};

pub const THREE_BOOKS: &str = r#"{
    "count": 3,
    "next": null,
    "previous": null,
    "results": [
        {
            "id": 84,
            "title": "Frankenstein; Or, The Modern Prometheus",
            "authors": [{ "name": "Shelley, Mary Wollstonecraft", "birth_year": 1797, "death_year": 1851 }],
            "translators": [],
            "subjects": ["Science fiction"],
            "bookshelves": ["Gothic Fiction"],
            "languages": ["en"],
            "copyright": false,
            "media_type": "Text",
            "formats": { "application/epub+zip": "https://www.gutenberg.org/ebooks/84.epub3.images" },
            "download_count": 61394
        },
        {
            "id": 42324,
            "title": "Frankenstein; Or, The Modern Prometheus",
            "authors": [{ "name": "Shelley, Mary Wollstonecraft", "birth_year": 1797, "death_year": 1851 }],
            "languages": ["en"],
            "copyright": false,
            "media_type": "Text",
            "formats": {},
            "download_count": 3001
        },
        {
            "id": 41445,
            "title": "Frankenstein",
            "authors": [],
            "languages": ["en"],
            "copyright": null,
            "media_type": "Text",
            "formats": {},
            "download_count": 512
        }
    ]
}"#;

pub const ENRICHMENT_HIT: &str = r#"{
    "kind": "books#volumes",
    "totalItems": 1,
    "items": [{
        "volumeInfo": {
            "title": "Frankenstein",
            "imageLinks": {
                "smallThumbnail": "http://books.google.com/books/content?id=abc&img=1&zoom=5",
                "thumbnail": "http://books.google.com/books/content?id=abc&printsec=frontcover&img=1"
            },
            "pageCount": 280,
            "description": "A classic of gothic horror."
        }
    }]
}"#;

pub fn book_with_formats(id: i64, title: &str, formats: HashMap<String, String>) -> Book {
    Book {
        id,
        title: title.into(),
        authors: vec![],
        translators: vec![],
        subjects: vec![],
        bookshelves: vec![],
        languages: vec!["en".into()],
        copyright: Some(false),
        media_type: Some("Text".into()),
        formats,
        download_count: 0,
    }
}

pub fn document(chapters: usize, cover: Option<(Vec<u8>, String)>) -> Document {
    Document {
        title: None,
        author: None,
        chapters: (0..chapters)
            .map(|index| Chapter {
                index,
                title: format!("Chapter {}", index + 1),
                content: format!("<p>chapter {index}</p>"),
            })
            .collect(),
        cover,
    }
}

#[derive(Default)]
pub struct MemoryStore {
    library: Mutex<HashMap<i64, LibraryItem>>,
    progress: Mutex<HashMap<i64, ReaderProgress>>,
}

#[async_trait::async_trait]
impl LibraryRepo for MemoryStore {
    async fn get_item_by_id(&self, book_id: i64) -> anyhow::Result<Option<LibraryItem>> {
        Ok(self.library.lock().await.get(&book_id).cloned())
    }

    async fn insert(&self, item: LibraryItem) -> anyhow::Result<()> {
        self.library.lock().await.insert(item.book_id, item);
        Ok(())
    }

    async fn delete(&self, book_id: i64) -> anyhow::Result<()> {
        self.library.lock().await.remove(&book_id);
        self.progress.lock().await.remove(&book_id);
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<LibraryItem>> {
        Ok(self.library.lock().await.values().cloned().collect())
    }
}

#[async_trait::async_trait]
impl ReaderRepo for MemoryStore {
    async fn get_reader_item(&self, book_id: i64) -> anyhow::Result<Option<ReaderProgress>> {
        Ok(self.progress.lock().await.get(&book_id).cloned())
    }

    async fn upsert(&self, progress: ReaderProgress) -> anyhow::Result<()> {
        if !self.library.lock().await.contains_key(&progress.book_id) {
            anyhow::bail!("book {} is not in the library", progress.book_id);
        }
        self.progress.lock().await.insert(progress.book_id, progress);
        Ok(())
    }
}

/// Returns a fixed document for any existing path.
pub struct FakeParser {
    pub document: Document,
}

impl DocumentParser for FakeParser {
    fn parse(&self, path: &Path) -> Result<Document, ParseError> {
        if !path.exists() {
            return Err(ParseError::FileNotFound(path.to_path_buf()));
        }
        Ok(self.document.clone())
    }
}
