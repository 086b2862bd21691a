use std::sync::Arc;

use poem_openapi::{
    OpenApi,
    param::{Path, Query},
    payload::{Json, PlainText},
};
use uuid::Uuid;

use super::models::{
    BookDetailsResponse, BookSetResponse, DownloadJobResponse, DownloadStartResponse,
    LibraryListResponse, NoContentResponse, ProgressResponse, ProgressUpdateDto,
    ReaderSessionResponse,
};
use super::services::{
    catalog::CatalogService,
    downloads::{DownloadJobs, DownloadService},
    reader::ReaderService,
};
use crate::{acquisition::AcquisitionCoordinator, reader::ReadingSessionLoader, storage::LibraryRepo};

pub struct GutenfetchApi {
    pub coordinator: Arc<AcquisitionCoordinator>,
    pub reader: Arc<ReadingSessionLoader>,
    pub library: Arc<dyn LibraryRepo>,
    pub jobs: Arc<DownloadJobs>,
}

#[OpenApi]
impl GutenfetchApi {
    #[oai(path = "/status", method = "get")]
    #[tracing::instrument(level = "debug", skip(self))]
    async fn status(&self) -> PlainText<String> {
        match self.coordinator.catalog().base_url() {
            Some(url) => PlainText(format!("catalog={url}")),
            None => PlainText("catalog=unresolved".to_string()),
        }
    }

    // ===== Catalog =====

    /// Unfiltered catalog listing
    #[oai(path = "/v1/books", method = "get")]
    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_books(
        &self,
        /// Page number starting at 1
        Query(page): Query<Option<u32>>,
    ) -> BookSetResponse {
        CatalogService::new(&self.coordinator)
            .list_all(page.unwrap_or(1))
            .await
    }

    #[oai(path = "/v1/books/search", method = "get")]
    #[tracing::instrument(level = "debug", skip(self))]
    async fn search_books(
        &self,
        /// Free text matched against titles and authors
        Query(q): Query<String>,
    ) -> BookSetResponse {
        CatalogService::new(&self.coordinator).search(&q).await
    }

    #[oai(path = "/v1/books/topic/:topic", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, topic))]
    async fn books_by_topic(
        &self,
        topic: Path<String>,
        Query(page): Query<Option<u32>>,
    ) -> BookSetResponse {
        CatalogService::new(&self.coordinator)
            .by_topic(&topic.0, page.unwrap_or(1))
            .await
    }

    /// Catalog record plus best-effort enrichment and the local library record
    #[oai(path = "/v1/books/:book_id", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, book_id))]
    async fn book_details(&self, book_id: Path<i64>) -> BookDetailsResponse {
        CatalogService::new(&self.coordinator)
            .details(book_id.0)
            .await
    }

    // ===== Downloads =====

    #[oai(path = "/v1/books/:book_id/download", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, book_id))]
    async fn start_download(&self, book_id: Path<i64>) -> DownloadStartResponse {
        DownloadService::new(&self.coordinator, &self.jobs)
            .start(book_id.0)
            .await
    }

    #[oai(path = "/v1/downloads/:job_id", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, job_id))]
    async fn download_status(&self, job_id: Path<Uuid>) -> DownloadJobResponse {
        DownloadService::new(&self.coordinator, &self.jobs).status(job_id.0)
    }

    /// Cancel a running download; the partial file is discarded
    #[oai(path = "/v1/downloads/:job_id", method = "delete")]
    #[tracing::instrument(level = "debug", skip(self, job_id))]
    async fn cancel_download(&self, job_id: Path<Uuid>) -> DownloadJobResponse {
        DownloadService::new(&self.coordinator, &self.jobs).cancel(job_id.0)
    }

    // ===== Library and reader =====

    #[oai(path = "/v1/library", method = "get")]
    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_library(&self) -> LibraryListResponse {
        ReaderService::new(&self.reader, &self.library)
            .list_library()
            .await
    }

    /// Forget a downloaded book. The file itself stays on disk.
    #[oai(path = "/v1/library/:book_id", method = "delete")]
    #[tracing::instrument(level = "debug", skip(self, book_id))]
    async fn remove_from_library(&self, book_id: Path<i64>) -> NoContentResponse {
        ReaderService::new(&self.reader, &self.library)
            .remove(book_id.0)
            .await
    }

    #[oai(path = "/v1/library/:book_id/reader", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, book_id))]
    async fn open_reader(&self, book_id: Path<i64>) -> ReaderSessionResponse {
        ReaderService::new(&self.reader, &self.library)
            .open(book_id.0)
            .await
    }

    #[oai(path = "/v1/library/:book_id/progress", method = "put")]
    #[tracing::instrument(level = "debug", skip(self, book_id, body))]
    async fn save_progress(
        &self,
        book_id: Path<i64>,
        body: Json<ProgressUpdateDto>,
    ) -> ProgressResponse {
        ReaderService::new(&self.reader, &self.library)
            .save_progress(book_id.0, body.0.chapter_index, body.0.chapter_offset)
            .await
    }
}
