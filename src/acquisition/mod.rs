// "View details" and "download" flows on top of the catalog, enrichment and local library

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::{
    catalog_client::CatalogClient,
    domain::{
        mapping::authors_as_string,
        models::{Book, BookDetails, LibraryItem},
    },
    download::DownloadPipeline,
    enrichment::EnrichmentClient,
    error::{AcquisitionError, AcquisitionResult},
    storage::LibraryRepo,
};

#[derive(Clone)]
pub struct AcquisitionCoordinator {
    catalog: CatalogClient,
    enrichment: EnrichmentClient,
    library: Arc<dyn LibraryRepo>,
    downloads: DownloadPipeline,
}

impl AcquisitionCoordinator {
    pub fn new(
        catalog: CatalogClient,
        enrichment: EnrichmentClient,
        library: Arc<dyn LibraryRepo>,
        downloads: DownloadPipeline,
    ) -> Self {
        AcquisitionCoordinator {
            catalog,
            enrichment,
            library,
            downloads,
        }
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Catalog record (mandatory) + enrichment (best effort) + library record.
    ///
    /// A catalog failure fails the whole load; enrichment problems only leave
    /// `enrichment` empty.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load_details(&self, book_id: i64) -> AcquisitionResult<BookDetails> {
        let set = self.catalog.get_by_id(book_id).await?;
        let book = set
            .books
            .into_iter()
            .next()
            .ok_or(AcquisitionError::BookNotFound(book_id))?;

        let (enrichment, library_item) = tokio::join!(
            self.enrichment.fetch_best_effort(&book.title),
            self.library.get_item_by_id(book_id),
        );

        Ok(BookDetails {
            book,
            enrichment,
            library_item: library_item?,
        })
    }

    /// Download the artifact, then record it in the library. The record is
    /// written only after the file is complete.
    #[tracing::instrument(level = "debug", skip_all, fields(book_id = book.id))]
    pub async fn download_book<P>(
        &self,
        book: &Book,
        cancel: &CancellationToken,
        on_progress: P,
    ) -> AcquisitionResult<LibraryItem>
    where
        P: FnMut(f32, u64),
    {
        self.downloads
            .download(book, cancel, on_progress, |done| async move {
                let item = LibraryItem {
                    book_id: book.id,
                    title: book.title.clone(),
                    authors: authors_as_string(&book.authors),
                    file_path: done.path,
                    created_at: Utc::now().timestamp_millis(),
                };
                self.library.insert(item.clone()).await?;
                tracing::info!(book_id = item.book_id, path = %item.file_path.display(), "added to library");
                Ok::<_, AcquisitionError>(item)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mockito::{Matcher, Server, ServerGuard};

    use super::*;
    use crate::{
        catalog_client::EndpointResolver,
        testing::{ENRICHMENT_HIT, MemoryStore, THREE_BOOKS, book_with_formats},
    };

    const ONE_BOOK: &str = r#"{
        "count": 1, "next": null, "previous": null,
        "results": [{
            "id": 84,
            "title": "Frankenstein; Or, The Modern Prometheus",
            "authors": [{ "name": "Shelley, Mary Wollstonecraft", "birth_year": 1797, "death_year": 1851 }],
            "languages": ["en"],
            "formats": {}
        }]
    }"#;

    fn coordinator(server: &ServerGuard, store: Arc<MemoryStore>, dir: &std::path::Path) -> AcquisitionCoordinator {
        let http = reqwest::Client::new();
        let resolver = Arc::new(EndpointResolver::new(
            http.clone(),
            format!("{}/pointer", server.url()),
        ));
        AcquisitionCoordinator::new(
            CatalogClient::new(resolver, http.clone()),
            EnrichmentClient::new(http.clone(), format!("{}/volumes", server.url())),
            store,
            DownloadPipeline::new(http, dir),
        )
    }

    async fn mock_pointer(server: &mut ServerGuard) -> mockito::Mock {
        let body = format!(r#"{{ "api_url": "{}/books/" }}"#, server.url());
        server
            .mock("GET", "/pointer")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body)
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn search_then_details_without_enrichment_or_download() {
        let mut server = Server::new_async().await;
        let pointer = mock_pointer(&mut server).await;
        let _search = server
            .mock("GET", "/books/")
            .match_query(Matcher::UrlEncoded("search".into(), "foo".into()))
            .with_status(200)
            .with_body(THREE_BOOKS)
            .create_async()
            .await;
        let _by_id = server
            .mock("GET", "/books/")
            .match_query(Matcher::UrlEncoded("ids".into(), "84".into()))
            .with_status(200)
            .with_body(ONE_BOOK)
            .create_async()
            .await;
        let _volumes = server
            .mock("GET", "/volumes")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"kind":"books#volumes","totalItems":0}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&server, Arc::new(MemoryStore::default()), dir.path());

        let found = coordinator.catalog().search("foo").await.unwrap();
        assert_eq!(found.books.len(), 3);
        let first_id = found.books[0].id;

        let details = coordinator.load_details(first_id).await.unwrap();
        assert_eq!(details.book.id, 84);
        assert_eq!(details.enrichment, None);
        assert_eq!(details.library_item, None);
        pointer.assert_async().await;
    }

    #[tokio::test]
    async fn enrichment_and_library_item_are_attached() {
        let mut server = Server::new_async().await;
        let _pointer = mock_pointer(&mut server).await;
        let _by_id = server
            .mock("GET", "/books/")
            .match_query(Matcher::UrlEncoded("ids".into(), "84".into()))
            .with_status(200)
            .with_body(ONE_BOOK)
            .create_async()
            .await;
        let _volumes = server
            .mock("GET", "/volumes")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "Frankenstein; Or, The Modern Prometheus".into(),
            ))
            .with_status(200)
            .with_body(ENRICHMENT_HIT)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::default());
        let existing = LibraryItem {
            book_id: 84,
            title: "Frankenstein; Or, The Modern Prometheus".into(),
            authors: "Mary Wollstonecraft Shelley".into(),
            file_path: "/books/Frankenstein_84.epub".into(),
            created_at: 1,
        };
        store.insert(existing.clone()).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let details = coordinator(&server, store, dir.path())
            .load_details(84)
            .await
            .unwrap();
        assert_eq!(details.enrichment.map(|e| e.page_count), Some(280));
        assert_eq!(details.library_item, Some(existing));
    }

    #[tokio::test]
    async fn enrichment_outage_still_yields_catalog_data() {
        let mut server = Server::new_async().await;
        let _pointer = mock_pointer(&mut server).await;
        let _by_id = server
            .mock("GET", "/books/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(ONE_BOOK)
            .create_async()
            .await;

        let http = reqwest::Client::new();
        let dir = tempfile::tempdir().unwrap();
        let coordinator = AcquisitionCoordinator::new(
            CatalogClient::new(
                Arc::new(EndpointResolver::new(http.clone(), format!("{}/pointer", server.url()))),
                http.clone(),
            ),
            EnrichmentClient::new(http.clone(), "http://127.0.0.1:1/volumes"),
            Arc::new(MemoryStore::default()),
            DownloadPipeline::new(http, dir.path()),
        );

        let details = coordinator.load_details(84).await.unwrap();
        assert_eq!(details.book.title, "Frankenstein; Or, The Modern Prometheus");
        assert_eq!(details.enrichment, None);
    }

    #[tokio::test]
    async fn catalog_failures_fail_the_load() {
        let mut server = Server::new_async().await;
        let _pointer = mock_pointer(&mut server).await;
        let _empty = server
            .mock("GET", "/books/")
            .match_query(Matcher::UrlEncoded("ids".into(), "7".into()))
            .with_status(200)
            .with_body(r#"{"count":0,"next":null,"previous":null,"results":[]}"#)
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/books/")
            .match_query(Matcher::UrlEncoded("ids".into(), "8".into()))
            .with_status(500)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&server, Arc::new(MemoryStore::default()), dir.path());
        assert!(matches!(
            coordinator.load_details(7).await.unwrap_err(),
            AcquisitionError::BookNotFound(7)
        ));
        assert!(coordinator.load_details(8).await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn download_records_library_item_after_file_is_written() {
        let mut server = Server::new_async().await;
        let _file = server
            .mock("GET", "/ebooks/84.epub")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(vec![1u8; 1024])
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::default());
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&server, store.clone(), dir.path());
        let mut book = book_with_formats(
            84,
            "Frankenstein; Or, The Modern Prometheus",
            HashMap::from([(
                "application/epub+zip".to_string(),
                format!("{}/ebooks/84.epub", server.url()),
            )]),
        );
        book.authors = serde_json::from_str(r#"[{ "name": "Shelley, Mary Wollstonecraft" }]"#).unwrap();

        let mut last = 0.0;
        let item = coordinator
            .download_book(&book, &CancellationToken::new(), |f, _| last = f)
            .await
            .unwrap();

        assert_eq!(last, 1.0);
        assert_eq!(item.authors, "Mary Wollstonecraft Shelley");
        assert!(item.file_exists());
        assert_eq!(store.get_item_by_id(84).await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn cancelled_download_creates_no_library_item() {
        let server = Server::new_async().await;
        let store = Arc::new(MemoryStore::default());
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&server, store.clone(), dir.path());
        let book = book_with_formats(
            84,
            "Frankenstein",
            HashMap::from([(
                "application/epub+zip".to_string(),
                format!("{}/ebooks/84.epub", server.url()),
            )]),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = coordinator
            .download_book(&book, &cancel, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::Cancelled));
        assert_eq!(store.get_item_by_id(84).await.unwrap(), None);
    }
}
