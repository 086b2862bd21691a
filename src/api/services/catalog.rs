use poem_openapi::payload::Json;

use crate::{
    acquisition::AcquisitionCoordinator,
    api::models::{BookDetailsResponse, BookSetResponse, ErrorDto},
    domain::models::BookSet,
    error::{AcquisitionError, AcquisitionResult},
};

pub struct CatalogService<'a> {
    pub coordinator: &'a AcquisitionCoordinator,
}

fn book_set_response(res: AcquisitionResult<BookSet>) -> BookSetResponse {
    match res {
        Ok(set) => BookSetResponse::Ok(Json(set.into())),
        Err(e) if e.is_transport() => {
            tracing::warn!(error = %e, "catalog unreachable");
            BookSetResponse::BadGateway(Json(ErrorDto::from(e.to_string())))
        }
        Err(e) => {
            tracing::error!(error = %format!("{:?}", e), "catalog query failed");
            BookSetResponse::InternalError(Json(ErrorDto::from(e.to_string())))
        }
    }
}

impl<'a> CatalogService<'a> {
    pub fn new(coordinator: &'a AcquisitionCoordinator) -> Self {
        Self { coordinator }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list_all(&self, page: u32) -> BookSetResponse {
        book_set_response(self.coordinator.catalog().list_all(page).await)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn search(&self, query: &str) -> BookSetResponse {
        book_set_response(self.coordinator.catalog().search(query).await)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn by_topic(&self, topic: &str, page: u32) -> BookSetResponse {
        book_set_response(self.coordinator.catalog().list_by_category(topic, page).await)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn details(&self, book_id: i64) -> BookDetailsResponse {
        match self.coordinator.load_details(book_id).await {
            Ok(details) => BookDetailsResponse::Ok(Json(details.into())),
            Err(e @ AcquisitionError::BookNotFound(_)) => {
                BookDetailsResponse::NotFound(Json(ErrorDto::from(e.to_string())))
            }
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, book_id, "catalog unreachable");
                BookDetailsResponse::BadGateway(Json(ErrorDto::from(e.to_string())))
            }
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), book_id, "failed to load details");
                BookDetailsResponse::InternalError(Json(ErrorDto::from(e.to_string())))
            }
        }
    }
}
