use std::sync::Arc;

use poem_openapi::payload::Json;

use crate::{
    api::models::{
        ErrorDto, LibraryListResponse, NoContentResponse, ProgressResponse, ReaderSessionResponse,
    },
    error::AcquisitionError,
    reader::ReadingSessionLoader,
    storage::LibraryRepo,
};

pub struct ReaderService<'a> {
    pub reader: &'a ReadingSessionLoader,
    pub library: &'a Arc<dyn LibraryRepo>,
}

impl<'a> ReaderService<'a> {
    pub fn new(reader: &'a ReadingSessionLoader, library: &'a Arc<dyn LibraryRepo>) -> Self {
        Self { reader, library }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn open(&self, book_id: i64) -> ReaderSessionResponse {
        match self.reader.load(book_id).await {
            Ok(data) => ReaderSessionResponse::Ok(Json(data.into())),
            Err(e @ AcquisitionError::LibraryItemMissing(_)) => {
                ReaderSessionResponse::NotFound(Json(ErrorDto::from(e.to_string())))
            }
            Err(e @ AcquisitionError::FileNotFound(_)) => {
                ReaderSessionResponse::Gone(Json(ErrorDto::from(e.to_string())))
            }
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), book_id, "failed to open book");
                ReaderSessionResponse::InternalError(Json(ErrorDto::from(e.to_string())))
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn save_progress(
        &self,
        book_id: i64,
        chapter_index: i32,
        chapter_offset: i32,
    ) -> ProgressResponse {
        match self
            .reader
            .save_progress(book_id, chapter_index, chapter_offset)
            .await
        {
            Ok(progress) => ProgressResponse::Ok(Json(progress.into())),
            Err(e @ AcquisitionError::LibraryItemMissing(_)) => {
                ProgressResponse::NotFound(Json(ErrorDto::from(e.to_string())))
            }
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), book_id, "failed to save progress");
                ProgressResponse::InternalError(Json(ErrorDto::from(e.to_string())))
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list_library(&self) -> LibraryListResponse {
        match self.library.list().await {
            Ok(items) => LibraryListResponse::Ok(Json(items.into_iter().map(Into::into).collect())),
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), "failed to list library");
                LibraryListResponse::InternalError(Json(ErrorDto::from(e.to_string())))
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn remove(&self, book_id: i64) -> NoContentResponse {
        match self.library.delete(book_id).await {
            Ok(()) => NoContentResponse::NoContent,
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), book_id, "failed to remove library item");
                NoContentResponse::InternalError(Json(ErrorDto::from(e.to_string())))
            }
        }
    }
}
