use poem_openapi::{ApiResponse, Enum, Object, payload::Json};
use uuid::Uuid;

use crate::domain::{
    mapping::{authors_as_string, epub_download_url},
    models::{Book, BookDetails, BookSet, CoverImage, EbookData, EnrichmentInfo, LibraryItem, ReaderProgress},
};

#[derive(Debug, Clone, Object)]
pub struct BookDto {
    pub id: i64,
    pub title: String,
    pub authors: String,
    pub subjects: Vec<String>,
    pub languages: Vec<String>,
    pub download_count: i64,
    pub epub_url: Option<String>,
}

impl From<&Book> for BookDto {
    fn from(b: &Book) -> Self {
        BookDto {
            id: b.id,
            title: b.title.clone(),
            authors: authors_as_string(&b.authors),
            subjects: b.subjects.clone(),
            languages: b.languages.clone(),
            download_count: b.download_count,
            epub_url: epub_download_url(b).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct BookSetDto {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub books: Vec<BookDto>,
}

impl From<BookSet> for BookSetDto {
    fn from(set: BookSet) -> Self {
        BookSetDto {
            books: set.books.iter().map(BookDto::from).collect(),
            count: set.count,
            next: set.next,
            previous: set.previous,
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct EnrichmentDto {
    pub cover_image: String,
    pub page_count: i64,
    pub description: String,
}

impl From<EnrichmentInfo> for EnrichmentDto {
    fn from(e: EnrichmentInfo) -> Self {
        EnrichmentDto {
            cover_image: e.cover_image,
            page_count: e.page_count,
            description: e.description,
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct LibraryItemDto {
    pub book_id: i64,
    pub title: String,
    pub authors: String,
    pub file_path: String,
    /// Unix epoch millis
    pub created_at: i64,
}

impl From<LibraryItem> for LibraryItemDto {
    fn from(i: LibraryItem) -> Self {
        LibraryItemDto {
            book_id: i.book_id,
            title: i.title,
            authors: i.authors,
            file_path: i.file_path.to_string_lossy().into_owned(),
            created_at: i.created_at,
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct BookDetailsDto {
    pub book: BookDto,
    pub enrichment: Option<EnrichmentDto>,
    pub library_item: Option<LibraryItemDto>,
}

impl From<BookDetails> for BookDetailsDto {
    fn from(d: BookDetails) -> Self {
        BookDetailsDto {
            book: BookDto::from(&d.book),
            enrichment: d.enrichment.map(Into::into),
            library_item: d.library_item.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct ProgressDto {
    pub book_id: i64,
    pub last_chapter_index: i32,
    pub last_chapter_offset: i32,
    pub updated_at: i64,
}

impl From<ReaderProgress> for ProgressDto {
    fn from(p: ReaderProgress) -> Self {
        ProgressDto {
            book_id: p.book_id,
            last_chapter_index: p.last_chapter_index,
            last_chapter_offset: p.last_chapter_offset,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct ProgressUpdateDto {
    pub chapter_index: i32,
    pub chapter_offset: i32,
}

#[derive(Debug, Clone, Object)]
pub struct ChapterDto {
    pub index: u32,
    pub title: String,
}

#[derive(Debug, Clone, Object)]
pub struct ReaderSessionDto {
    pub title: String,
    pub author: String,
    /// Remote cover URL, when the enrichment service had one
    pub cover_url: Option<String>,
    pub has_embedded_cover: bool,
    pub chapters: Vec<ChapterDto>,
    pub progress: Option<ProgressDto>,
    pub percent_complete: Option<u8>,
}

impl From<EbookData> for ReaderSessionDto {
    fn from(data: EbookData) -> Self {
        let percent_complete = data.percent_complete();
        let (cover_url, has_embedded_cover) = match &data.cover_image {
            Some(CoverImage::Remote(url)) => (Some(url.clone()), false),
            Some(CoverImage::Embedded { .. }) => (None, true),
            None => (None, false),
        };
        ReaderSessionDto {
            title: data.title,
            author: data.author,
            cover_url,
            has_embedded_cover,
            chapters: data
                .document
                .chapters
                .into_iter()
                .map(|c| ChapterDto {
                    index: c.index as u32,
                    title: c.title,
                })
                .collect(),
            progress: data.progress.map(Into::into),
            percent_complete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[oai(rename_all = "lowercase")]
pub enum DownloadStateDto {
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Object)]
pub struct DownloadJobDto {
    pub job_id: Uuid,
    pub book_id: i64,
    pub state: DownloadStateDto,
    /// 0.0 - 1.0 fraction
    pub fraction: f32,
    pub bytes: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Object)]
pub struct ErrorDto {
    /// Human-readable error message
    pub message: String,
}

impl From<String> for ErrorDto {
    fn from(message: String) -> Self {
        ErrorDto { message }
    }
}

#[derive(ApiResponse)]
pub enum BookSetResponse {
    #[oai(status = 200)]
    Ok(Json<BookSetDto>),

    /// Catalog unreachable
    #[oai(status = 502)]
    BadGateway(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum BookDetailsResponse {
    #[oai(status = 200)]
    Ok(Json<BookDetailsDto>),

    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),

    /// Catalog unreachable
    #[oai(status = 502)]
    BadGateway(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum DownloadStartResponse {
    /// Download started in the background
    #[oai(status = 202)]
    Accepted(Json<DownloadJobDto>),

    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),

    #[oai(status = 422)]
    NotDownloadable(Json<ErrorDto>),

    #[oai(status = 502)]
    BadGateway(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum DownloadJobResponse {
    #[oai(status = 200)]
    Ok(Json<DownloadJobDto>),

    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum LibraryListResponse {
    #[oai(status = 200)]
    Ok(Json<Vec<LibraryItemDto>>),

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum NoContentResponse {
    #[oai(status = 204)]
    NoContent,

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ReaderSessionResponse {
    #[oai(status = 200)]
    Ok(Json<ReaderSessionDto>),

    /// Not in the library
    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),

    /// In the library, but the file is gone; re-download it
    #[oai(status = 410)]
    Gone(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ProgressResponse {
    #[oai(status = 200)]
    Ok(Json<ProgressDto>),

    /// Not in the library
    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}
