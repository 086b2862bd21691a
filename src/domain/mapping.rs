// Mapping between catalog DTOs, local entities and domain models

use std::path::PathBuf;

use sea_orm::ActiveValue::Set;

use super::models::{Author, Book, LibraryItem, ReaderProgress};

const EPUB_MIME: &str = "application/epub+zip";

/// "Shelley, Mary Wollstonecraft" -> "Mary Wollstonecraft Shelley"
fn display_name(author: &Author) -> String {
    match author.name.split_once(',') {
        Some((last, first)) if !first.trim().is_empty() => {
            format!("{} {}", first.trim(), last.trim())
        }
        _ => author.name.trim().to_string(),
    }
}

pub fn authors_as_string(authors: &[Author]) -> String {
    if authors.is_empty() {
        return "Unknown Author".into();
    }
    authors
        .iter()
        .map(display_name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Picks the EPUB download link, preferring the plain mime key over
/// parameterised variants such as "application/epub+zip; charset=...".
pub fn epub_download_url(book: &Book) -> Option<&str> {
    if let Some(url) = book.formats.get(EPUB_MIME) {
        return Some(url.as_str());
    }
    let mut variants: Vec<(&String, &String)> = book
        .formats
        .iter()
        .filter(|(mime, _)| mime.starts_with(EPUB_MIME))
        .collect();
    variants.sort();
    variants.first().map(|(_, url)| url.as_str())
}

/// Deterministic on-disk name for a book's artifact.
pub fn filename_for_book(book: &Book) -> String {
    let head = book.title.split(',').next().unwrap_or_default().trim();
    let safe: String = head
        .chars()
        .filter(|c| *c != '"')
        .map(|c| match c {
            ':' => ';',
            '/' | '\\' | '<' | '>' | '|' | '?' | '*' => '-',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    if safe.is_empty() {
        format!("book_{}.epub", book.id)
    } else {
        format!("{}_{}.epub", safe, book.id)
    }
}

pub fn library_item_from_entity(m: entities::library_item::Model) -> LibraryItem {
    LibraryItem {
        book_id: m.id,
        title: m.title,
        authors: m.authors,
        file_path: PathBuf::from(m.file_path),
        created_at: m.created_at,
    }
}

pub fn library_item_to_active(item: &LibraryItem) -> entities::library_item::ActiveModel {
    entities::library_item::ActiveModel {
        id: Set(item.book_id),
        title: Set(item.title.clone()),
        authors: Set(item.authors.clone()),
        file_path: Set(item.file_path.to_string_lossy().into_owned()),
        created_at: Set(item.created_at),
    }
}

pub fn reader_progress_from_entity(m: entities::reader_item::Model) -> ReaderProgress {
    ReaderProgress {
        book_id: m.book_id,
        last_chapter_index: m.last_chapter_index,
        last_chapter_offset: m.last_chapter_offset,
        updated_at: m.updated_at,
    }
}

pub fn reader_progress_to_active(p: &ReaderProgress) -> entities::reader_item::ActiveModel {
    entities::reader_item::ActiveModel {
        book_id: Set(p.book_id),
        last_chapter_index: Set(p.last_chapter_index),
        last_chapter_offset: Set(p.last_chapter_offset),
        updated_at: Set(p.updated_at),
    }
}
