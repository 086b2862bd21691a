use std::sync::Arc;

use chrono::Utc;

use crate::{
    domain::models::{CoverImage, EbookData, ReaderProgress},
    enrichment::EnrichmentClient,
    error::{AcquisitionError, AcquisitionResult},
    parser::{DocumentParser, ParseError},
    storage::{LibraryRepo, ReaderRepo},
};

/// Opens previously downloaded books for reading.
#[derive(Clone)]
pub struct ReadingSessionLoader {
    library: Arc<dyn LibraryRepo>,
    progress: Arc<dyn ReaderRepo>,
    enrichment: EnrichmentClient,
    parser: Arc<dyn DocumentParser>,
}

impl ReadingSessionLoader {
    pub fn new(
        library: Arc<dyn LibraryRepo>,
        progress: Arc<dyn ReaderRepo>,
        enrichment: EnrichmentClient,
        parser: Arc<dyn DocumentParser>,
    ) -> Self {
        ReadingSessionLoader {
            library,
            progress,
            enrichment,
            parser,
        }
    }

    /// Callers should only ask for ids they know are in the library; an
    /// unknown id is reported as `LibraryItemMissing`. A library record whose
    /// file has disappeared is reported as `FileNotFound`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load(&self, book_id: i64) -> AcquisitionResult<EbookData> {
        let item = self
            .library
            .get_item_by_id(book_id)
            .await?
            .ok_or(AcquisitionError::LibraryItemMissing(book_id))?;

        let parser = Arc::clone(&self.parser);
        let path = item.file_path.clone();
        let (enrichment, parsed) = tokio::join!(
            self.enrichment.fetch_best_effort(&item.title),
            tokio::task::spawn_blocking(move || parser.parse(&path)),
        );

        let document = match parsed {
            Ok(Ok(document)) => document,
            Ok(Err(ParseError::FileNotFound(path))) => {
                tracing::warn!(book_id, path = %path.display(), "library item points at a missing file");
                return Err(AcquisitionError::FileNotFound(path));
            }
            Ok(Err(e)) => return Err(AcquisitionError::Parse(e.to_string())),
            Err(e) => return Err(AcquisitionError::Parse(format!("parser task failed: {e}"))),
        };

        let progress = self.progress.get_reader_item(book_id).await?;
        let cover_image = pick_cover(
            enrichment.map(|e| e.cover_image),
            document.cover.clone(),
        );

        Ok(EbookData {
            cover_image,
            title: item.title,
            author: item.authors,
            document,
            progress,
        })
    }

    /// Record the current reading position. Only books in the library can
    /// carry progress.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn save_progress(
        &self,
        book_id: i64,
        chapter_index: i32,
        chapter_offset: i32,
    ) -> AcquisitionResult<ReaderProgress> {
        if self.library.get_item_by_id(book_id).await?.is_none() {
            return Err(AcquisitionError::LibraryItemMissing(book_id));
        }
        let progress = ReaderProgress {
            book_id,
            last_chapter_index: chapter_index,
            last_chapter_offset: chapter_offset,
            updated_at: Utc::now().timestamp_millis(),
        };
        self.progress.upsert(progress.clone()).await?;
        Ok(progress)
    }
}

/// Fresh enrichment image, else the artifact's own cover, else nothing.
fn pick_cover(remote: Option<String>, embedded: Option<(Vec<u8>, String)>) -> Option<CoverImage> {
    remote
        .map(CoverImage::Remote)
        .or_else(|| embedded.map(|(data, mime)| CoverImage::Embedded { data, mime }))
}
