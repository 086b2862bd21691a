use std::{
    future::Future,
    path::{Path, PathBuf},
};

use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    domain::{
        mapping::{epub_download_url, filename_for_book},
        models::Book,
    },
    error::{AcquisitionError, AcquisitionResult},
};

/// A fully written artifact, handed to the success callback.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDownload {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Streams book artifacts into the download directory.
///
/// The pipeline never touches the local library: persisting a record is the
/// job of the `on_success` callback, which only runs once the file has been
/// completely written and moved to its final name.
#[derive(Clone, Debug)]
pub struct DownloadPipeline {
    client: reqwest::Client,
    download_dir: PathBuf,
}

impl DownloadPipeline {
    pub fn new(client: reqwest::Client, download_dir: impl Into<PathBuf>) -> Self {
        DownloadPipeline {
            client,
            download_dir: download_dir.into(),
        }
    }

    pub fn destination_for(&self, book: &Book) -> PathBuf {
        self.download_dir.join(filename_for_book(book))
    }

    /// Download `book`'s EPUB, reporting `(fraction, bytes_received)` as
    /// chunks arrive, then call `on_success` exactly once.
    #[tracing::instrument(level = "debug", skip_all, fields(book_id = book.id))]
    pub async fn download<P, S, Fut, T>(
        &self,
        book: &Book,
        cancel: &CancellationToken,
        on_progress: P,
        on_success: S,
    ) -> AcquisitionResult<T>
    where
        P: FnMut(f32, u64),
        S: FnOnce(CompletedDownload) -> Fut,
        Fut: Future<Output = AcquisitionResult<T>>,
    {
        let url = epub_download_url(book).ok_or(AcquisitionError::NoDownloadLink(book.id))?;
        let dest = self.destination_for(book);
        tracing::debug!(%url, dest = %dest.display(), "starting download");

        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AcquisitionError::Cancelled),
            resp = self.client.get(url).send() => resp?,
        };
        let status = resp.status();
        if !status.is_success() {
            return Err(AcquisitionError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let total = resp.content_length();

        let completed = write_stream(resp.bytes_stream(), total, &dest, cancel, on_progress).await?;
        tracing::info!(path = %completed.path.display(), bytes = completed.bytes, "download complete");
        on_success(completed).await
    }
}

/// A partial file private to one transfer, so concurrent downloads of the
/// same book never write into each other.
fn part_path(dest: &Path) -> PathBuf {
    let mut part = dest.as_os_str().to_owned();
    part.push(format!(".{}.part", Uuid::new_v4().simple()));
    PathBuf::from(part)
}

fn io_failure(e: std::io::Error) -> AcquisitionError {
    AcquisitionError::DownloadFailed(e.to_string())
}

/// Write a byte stream to `dest` via a per-transfer `.part` file.
///
/// With a known, non-zero `total` every chunk reports `received / total`, so
/// the last report is 1.0. Without one, chunks report 0.0 and a single 1.0
/// report follows the final chunk. On error or cancellation the partial file
/// is removed and `dest` is left untouched.
pub async fn write_stream<St, B, E, P>(
    stream: St,
    total: Option<u64>,
    dest: &Path,
    cancel: &CancellationToken,
    mut on_progress: P,
) -> AcquisitionResult<CompletedDownload>
where
    St: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    P: FnMut(f32, u64),
{
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_failure)?;
    }
    let part = part_path(dest);
    let known_total = total.filter(|t| *t > 0);

    let written = async {
        let mut stream = std::pin::pin!(stream);
        let mut file = tokio::fs::File::create(&part).await.map_err(io_failure)?;
        let mut received: u64 = 0;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AcquisitionError::Cancelled),
                next = stream.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(|e| AcquisitionError::DownloadFailed(e.to_string()))?;
            let bytes = chunk.as_ref();
            file.write_all(bytes).await.map_err(io_failure)?;
            received += bytes.len() as u64;
            let fraction = match known_total {
                Some(t) => (received as f32 / t as f32).min(1.0),
                None => 0.0,
            };
            on_progress(fraction, received);
        }
        if let Some(t) = known_total {
            if received < t {
                return Err(AcquisitionError::DownloadFailed(format!(
                    "transfer ended after {received} of {t} bytes"
                )));
            }
        }
        file.flush().await.map_err(io_failure)?;
        file.sync_all().await.map_err(io_failure)?;
        Ok(received)
    }
    .await;

    let received = match written {
        Ok(received) => received,
        Err(e) => {
            tracing::warn!(error = %e, part = %part.display(), "discarding partial download");
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }
    };

    if let Err(e) = tokio::fs::rename(&part, dest).await {
        tracing::warn!(error = %e, part = %part.display(), "could not move download into place");
        let _ = tokio::fs::remove_file(&part).await;
        return Err(io_failure(e));
    }
    if known_total.is_none() {
        on_progress(1.0, received);
    }
    let path = tokio::fs::canonicalize(dest)
        .await
        .unwrap_or_else(|_| dest.to_path_buf());
    Ok(CompletedDownload {
        path,
        bytes: received,
    })
}
