use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use poem_openapi::payload::Json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    acquisition::AcquisitionCoordinator,
    api::models::{DownloadJobDto, DownloadJobResponse, DownloadStartResponse, DownloadStateDto, ErrorDto},
    domain::{mapping::epub_download_url, models::LibraryItem},
    error::{AcquisitionError, AcquisitionResult},
};

#[derive(Debug, Clone)]
struct JobEntry {
    book_id: i64,
    state: DownloadStateDto,
    fraction: f32,
    bytes: u64,
    error: Option<String>,
    cancel: CancellationToken,
    finished_at: Option<Instant>,
}

/// How long a finished job stays visible to pollers.
const JOB_RETENTION: Duration = Duration::from_secs(15 * 60);

/// In-flight and finished background downloads, keyed by job id.
///
/// Finished jobs are forgotten once they are older than the retention window.
#[derive(Debug)]
pub struct DownloadJobs {
    jobs: Mutex<HashMap<Uuid, JobEntry>>,
    retention: Duration,
}

impl Default for DownloadJobs {
    fn default() -> Self {
        DownloadJobs::with_retention(JOB_RETENTION)
    }
}

impl DownloadJobs {
    pub fn with_retention(retention: Duration) -> Self {
        DownloadJobs {
            jobs: Mutex::new(HashMap::new()),
            retention,
        }
    }

    /// Locks the registry, dropping expired finished jobs on the way.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, JobEntry>> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.retain(|_, job| {
            job.finished_at
                .is_none_or(|finished| finished.elapsed() < self.retention)
        });
        jobs
    }

    pub fn start(&self, book_id: i64) -> (Uuid, CancellationToken) {
        let job_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        self.lock().insert(
            job_id,
            JobEntry {
                book_id,
                state: DownloadStateDto::Running,
                fraction: 0.0,
                bytes: 0,
                error: None,
                cancel: cancel.clone(),
                finished_at: None,
            },
        );
        (job_id, cancel)
    }

    pub fn report(&self, job_id: Uuid, fraction: f32, bytes: u64) {
        if let Some(job) = self.lock().get_mut(&job_id) {
            job.fraction = fraction;
            job.bytes = bytes;
        }
    }

    pub fn finish(&self, job_id: Uuid, result: &AcquisitionResult<LibraryItem>) {
        let mut jobs = self.lock();
        let Some(job) = jobs.get_mut(&job_id) else { return };
        job.finished_at = Some(Instant::now());
        match result {
            Ok(_) => {
                job.state = DownloadStateDto::Completed;
                job.fraction = 1.0;
            }
            Err(AcquisitionError::Cancelled) => job.state = DownloadStateDto::Cancelled,
            Err(e) => {
                job.state = DownloadStateDto::Failed;
                job.error = Some(e.to_string());
            }
        }
    }

    /// Returns false when the job is unknown or already finished.
    pub fn cancel(&self, job_id: Uuid) -> bool {
        match self.lock().get(&job_id) {
            Some(job) if job.state == DownloadStateDto::Running => {
                job.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, job_id: Uuid) -> Option<DownloadJobDto> {
        self.lock().get(&job_id).map(|job| DownloadJobDto {
            job_id,
            book_id: job.book_id,
            state: job.state,
            fraction: job.fraction,
            bytes: job.bytes,
            error: job.error.clone(),
        })
    }
}

pub struct DownloadService<'a> {
    pub coordinator: &'a Arc<AcquisitionCoordinator>,
    pub jobs: &'a Arc<DownloadJobs>,
}

impl<'a> DownloadService<'a> {
    pub fn new(coordinator: &'a Arc<AcquisitionCoordinator>, jobs: &'a Arc<DownloadJobs>) -> Self {
        Self { coordinator, jobs }
    }

    /// Look the book up, then download it in the background. Progress is
    /// polled through [`DownloadService::status`].
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn start(&self, book_id: i64) -> DownloadStartResponse {
        let set = match self.coordinator.catalog().get_by_id(book_id).await {
            Ok(set) => set,
            Err(e) if e.is_transport() => {
                return DownloadStartResponse::BadGateway(Json(ErrorDto::from(e.to_string())));
            }
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), book_id, "catalog lookup failed");
                return DownloadStartResponse::InternalError(Json(ErrorDto::from(e.to_string())));
            }
        };
        let Some(book) = set.books.into_iter().next() else {
            return DownloadStartResponse::NotFound(Json(ErrorDto::from(
                AcquisitionError::BookNotFound(book_id).to_string(),
            )));
        };
        if epub_download_url(&book).is_none() {
            return DownloadStartResponse::NotDownloadable(Json(ErrorDto::from(
                AcquisitionError::NoDownloadLink(book_id).to_string(),
            )));
        }

        let (job_id, cancel) = self.jobs.start(book.id);
        let coordinator = Arc::clone(self.coordinator);
        let jobs = Arc::clone(self.jobs);
        tokio::spawn(async move {
            let progress = Arc::clone(&jobs);
            let result = coordinator
                .download_book(&book, &cancel, move |fraction, bytes| {
                    progress.report(job_id, fraction, bytes)
                })
                .await;
            if let Err(e) = &result {
                tracing::warn!(error = %e, book_id = book.id, %job_id, "download did not complete");
            }
            jobs.finish(job_id, &result);
        });

        match self.jobs.get(job_id) {
            Some(job) => DownloadStartResponse::Accepted(Json(job)),
            None => DownloadStartResponse::InternalError(Json(ErrorDto::from(format!(
                "download job {job_id} vanished"
            )))),
        }
    }

    pub fn status(&self, job_id: Uuid) -> DownloadJobResponse {
        match self.jobs.get(job_id) {
            Some(job) => DownloadJobResponse::Ok(Json(job)),
            None => DownloadJobResponse::NotFound(Json(ErrorDto::from(format!(
                "no download job {job_id}"
            )))),
        }
    }

    pub fn cancel(&self, job_id: Uuid) -> DownloadJobResponse {
        self.jobs.cancel(job_id);
        self.status(job_id)
    }
}
