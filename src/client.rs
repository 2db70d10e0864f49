use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::export::ExportPage;
use crate::frame::{Frame, ImportInput};
use crate::hierarchy::{DimensionMember, HierarchyReply};
use crate::jobs::{IdReply, ImportReceipt, Job, JobStatus};
use crate::util::{hub_base_url, urljoin};

const DEFAULT_PAGE_SIZE: usize = 50_000;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking client for the Vena ETL API.
///
/// One instance holds one immutable credential bundle and issues
/// independent HTTP calls; there is no shared state between instances and
/// no internal concurrency. Every method blocks until the server answers
/// (or, for [`Client::wait_for_job_completion`], until the job reaches a
/// terminal status or the timeout elapses).
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    api_user: String,
    api_key: String,
    template_id: String,
    model_id: Option<String>,

    timeout: Duration,
    page_size: usize,
    progress: bool,

    http: HttpClient,
}

impl Client {
    /// Creates a client from environment variables and/or `.venarc`.
    ///
    /// This is equivalent to `Client::new(ClientConfig::load()?)`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::load()?)
    }

    /// Creates a client from an explicit configuration.
    ///
    /// Fails with [`Error::Configuration`] when credentials are empty or
    /// the hub does not look like a regional identifier.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("vepi-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("vepi-rs")),
        );
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        let base_url = config
            .url
            .unwrap_or_else(|| hub_base_url(&config.hub))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            base_url,
            api_user: config.api_user,
            api_key: config.api_key,
            template_id: config.template_id,
            model_id: config.model_id,
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            progress: false,
            http,
        })
    }

    /// Per-request HTTP timeout (default 60s). This bounds individual
    /// requests, not the job-polling loop.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Default export page size (default 50 000 records).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Enables a terminal spinner during export pagination and job polling.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    // ------------------------------------------------------------------
    // Data import
    // ------------------------------------------------------------------

    /// Starts an ETL load from an in-memory frame.
    ///
    /// The frame is serialized to canonical CSV and POSTed to the
    /// template's import endpoint; the server starts a job and returns its
    /// id in the receipt. Non-success responses fail with
    /// [`Error::Upload`]. One network call, no retries.
    pub fn start_with_data(&self, frame: &Frame) -> Result<ImportReceipt> {
        self.start_import(ImportInput::Frame(frame))
    }

    /// Starts an ETL load from any [`ImportInput`] (frame, CSV file path,
    /// or caller-owned reader).
    ///
    /// All variants normalize to the same canonical CSV payload, so for
    /// equivalent inputs this sends a request body identical to
    /// [`Client::start_with_data`].
    pub fn start_with_file(&self, input: ImportInput<'_>) -> Result<ImportReceipt> {
        self.start_import(input)
    }

    /// Convenience: start an import from a frame and block until the
    /// started job reaches a terminal status.
    pub fn import_frame(
        &self,
        frame: &Frame,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Job> {
        let receipt = self.start_with_data(frame)?;
        self.wait_for_job_completion(&receipt.id, poll_interval, timeout)
    }

    fn start_import(&self, input: ImportInput<'_>) -> Result<ImportReceipt> {
        let csv = input.into_csv()?;
        let url = self.endpoint(&format!("etl/templates/{}/startWithData", self.template_id));

        let req = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "text/csv; charset=utf-8")
            .body(csv);
        let (status, body) = self.send(req, &url)?;
        if !status.is_success() {
            return Err(Error::Upload { status, body });
        }

        let receipt: ImportReceipt = decode(&url, &body)?;
        info!(job_id = %receipt.id, "import accepted");
        Ok(receipt)
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Exports all intersections of the configured model as one frame.
    ///
    /// Pages through `models/{model_id}/intersections`, following the
    /// server's explicit `nextPage` link until it is absent; that link is
    /// authoritative over any page-size heuristic. A failure on any page
    /// aborts the whole export with [`Error::Export`] — the caller never
    /// receives partial data.
    pub fn export_data(&self, page_size: Option<usize>) -> Result<Frame> {
        let model_id = self.require_model_id()?;
        let page_size = page_size.unwrap_or(self.page_size);
        if page_size == 0 {
            return Err(Error::Configuration("page_size must be positive".into()));
        }

        let spinner = self.spinner("exporting intersections");
        let mut next_url =
            Some(self.endpoint(&format!("models/{model_id}/intersections?pageSize={page_size}")));
        let mut headers: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();

        while let Some(url) = next_url {
            let (status, body) = self.send(self.http.get(&url), &url)?;
            if !status.is_success() {
                return Err(Error::Export { status, body });
            }

            let page: ExportPage = decode(&url, &body)?;
            if headers.is_empty() {
                headers = page.metadata.headers.clone();
            }
            let next = page.metadata.next_page.clone();
            rows.extend(page.records());

            if let Some(pb) = &spinner {
                pb.set_message(format!("exported {} record(s)", rows.len()));
            }
            if next.is_some() {
                debug!(records = rows.len(), "fetching next export page");
            }
            next_url = next.map(|n| urljoin(&self.base_url, &n));
        }

        if let Some(pb) = &spinner {
            pb.finish_and_clear();
        }
        info!(records = rows.len(), "export complete");
        Frame::from_rows(headers, rows)
    }

    // ------------------------------------------------------------------
    // Dimension hierarchy
    // ------------------------------------------------------------------

    /// Fetches the configured model's dimension hierarchy members.
    ///
    /// Parent links on the returned rows encode the tree. Fails with
    /// [`Error::Query`] on a non-success response.
    pub fn get_dimension_hierarchy(&self) -> Result<Vec<DimensionMember>> {
        let model_id = self.require_model_id()?;
        let url = self.endpoint(&format!("models/{model_id}/hierarchy"));

        let (status, body) = self.send(self.http.get(&url), &url)?;
        if !status.is_success() {
            return Err(Error::Query { status, body });
        }

        let reply: HierarchyReply = decode(&url, &body)?;
        Ok(reply.data)
    }

    // ------------------------------------------------------------------
    // Job lifecycle
    // ------------------------------------------------------------------

    /// Creates a new job from the configured template and returns its id.
    /// The job starts in the editable stage; stage data with
    /// [`Client::upload_job_data`], then [`Client::submit_job`].
    pub fn create_job(&self) -> Result<String> {
        let url = self.endpoint(&format!("etl/templates/{}/jobs", self.template_id));
        let (status, body) = self.send(self.http.post(&url), &url)?;
        if !status.is_success() {
            return Err(Error::JobCreation { status, body });
        }

        let reply: IdReply = decode(&url, &body)?;
        info!(job_id = %reply.id, "job created");
        Ok(reply.id)
    }

    /// Current status snapshot of a job. HTTP 404 maps to
    /// [`Error::JobNotFound`].
    pub fn get_job_status(&self, job_id: &str) -> Result<Job> {
        let url = self.endpoint(&format!("etl/jobs/{job_id}"));
        let (status, body) = self.send(self.http.get(&url), &url)?;
        if status == StatusCode::NOT_FOUND {
            return Err(Error::JobNotFound {
                job_id: job_id.to_string(),
                body,
            });
        }
        if !status.is_success() {
            return Err(Error::Query { status, body });
        }
        decode(&url, &body)
    }

    /// Stages frame data onto a created (still editable) job.
    pub fn upload_job_data(&self, job_id: &str, frame: &Frame) -> Result<()> {
        if frame.is_empty() {
            return Err(Error::InvalidData("frame has no rows".into()));
        }

        let url = self.endpoint(&format!("etl/jobs/{job_id}/data"));
        let payload = serde_json::json!({ "data": frame.to_records() });
        let (status, body) = self.send(self.http.post(&url).json(&payload), &url)?;
        if !status.is_success() {
            return Err(Error::Upload { status, body });
        }
        Ok(())
    }

    /// Submits a created job for processing. The server rejects jobs that
    /// are not in a submittable state; that rejection surfaces as
    /// [`Error::JobSubmission`].
    pub fn submit_job(&self, job_id: &str) -> Result<Job> {
        let url = self.endpoint(&format!("etl/jobs/{job_id}/submit"));
        let (status, body) = self.send(self.http.post(&url), &url)?;
        if !status.is_success() {
            return Err(Error::JobSubmission {
                job_id: job_id.to_string(),
                status,
                body,
            });
        }

        info!(job_id, "job submitted");
        decode(&url, &body)
    }

    /// Polls a job at a fixed interval until it reaches a terminal status,
    /// returning the terminal snapshot.
    ///
    /// Polls are independent; there is no backoff. When `timeout` elapses
    /// before a terminal status is observed the call fails with
    /// [`Error::JobTimeout`] — the job itself keeps running server-side,
    /// the client merely stops observing it.
    pub fn wait_for_job_completion(
        &self,
        job_id: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Job> {
        let started = Instant::now();
        let spinner = self.spinner(&format!("waiting for job {job_id}"));
        let mut last_status: Option<JobStatus> = None;

        loop {
            let job = self.get_job_status(job_id)?;

            if last_status.as_ref() != Some(&job.status) {
                info!(job_id, status = %job.status, "job status");
                if let Some(pb) = &spinner {
                    pb.set_message(format!("job {job_id}: {}", job.status));
                }
                last_status = Some(job.status.clone());
            }

            if job.status.is_terminal() {
                if let Some(pb) = &spinner {
                    pb.finish_and_clear();
                }
                return Ok(job);
            }

            if started.elapsed() >= timeout {
                if let Some(pb) = &spinner {
                    pb.finish_and_clear();
                }
                return Err(Error::JobTimeout {
                    job_id: job_id.to_string(),
                    timeout,
                    last_status: job.status,
                });
            }

            thread::sleep(poll_interval);
        }
    }

    /// Requests cancellation of a job.
    ///
    /// The request is always issued; if the job is already terminal the
    /// server's rejection surfaces verbatim as [`Error::JobCancellation`].
    pub fn cancel_job(&self, job_id: &str) -> Result<Job> {
        let url = self.endpoint(&format!("etl/jobs/{job_id}/cancel"));
        let (status, body) = self.send(self.http.post(&url), &url)?;
        if !status.is_success() {
            return Err(Error::JobCancellation {
                job_id: job_id.to_string(),
                status,
                body,
            });
        }

        info!(job_id, "job cancelled");
        decode(&url, &body)
    }

    /// Convenience: create → submit → wait for completion.
    ///
    /// Any underlying failure propagates unchanged; if submission fails
    /// after creation, the created job is left as-is server-side.
    pub fn run_job(&self, poll_interval: Duration, timeout: Duration) -> Result<Job> {
        let job_id = self.create_job()?;
        self.submit_job(&job_id)?;
        self.wait_for_job_completion(&job_id, poll_interval, timeout)
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn require_model_id(&self) -> Result<&str> {
        self.model_id.as_deref().ok_or_else(|| {
            Error::Configuration("model_id is required for model operations".into())
        })
    }

    fn endpoint(&self, path: &str) -> String {
        urljoin(&self.base_url, path)
    }

    fn send(&self, req: RequestBuilder, url: &str) -> Result<(StatusCode, String)> {
        let resp = req
            .basic_auth(&self.api_user, Some(&self.api_key))
            .timeout(self.timeout)
            .send()
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        let body = resp.text().map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;
        Ok((status, body))
    }

    fn spinner(&self, msg: &str) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}").unwrap());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(msg.to_string());
        Some(pb)
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}
