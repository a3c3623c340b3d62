//! Shared test doubles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fileagent_record::{FileHandle, FileRecord};
use fileagent_uploader::{
    FormDataBuilder, ProgressCallback, RequestOptions, TransportError, UploadFuture,
    UploadProgress, UploadRequest, UploadResponse, Uploader,
};
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::agent::{FileAgent, FileAgentBuilder};
use crate::config::AgentConfig;
use crate::events::AgentEvents;
use crate::surface::{MemorySurface, SharedSurface};

/// In-memory text file of `size` bytes.
pub fn text_file(name: &str, size: u64) -> FileHandle {
    FileHandle::from_bytes(name, "text/plain", 0, vec![b'x'; size as usize])
}

/// Uploader that succeeds unless a failure was queued, and records every call.
#[derive(Default)]
pub struct MockUploader {
    upload_failures: Mutex<Vec<String>>,
    delete_failures: Mutex<Vec<String>>,
    update_failures: Mutex<Vec<String>>,
    /// Held calls signal `entered` and wait for `release`.
    delete_hold: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
    update_hold: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
    /// Answer uploads with one response fewer than requested.
    short: AtomicBool,
    pub calls: Mutex<Vec<String>>,
    pub options: Mutex<Vec<RequestOptions>>,
    /// Record progress observed right after each report.
    pub progress_seen: Mutex<Vec<u8>>,
}

impl MockUploader {
    pub fn fail_next_upload(&self, message: &str) {
        self.upload_failures.lock().unwrap().push(message.into());
    }

    pub fn fail_next_delete(&self, message: &str) {
        self.delete_failures.lock().unwrap().push(message.into());
    }

    pub fn fail_next_update(&self, message: &str) {
        self.update_failures.lock().unwrap().push(message.into());
    }

    pub fn respond_short(&self) {
        self.short.store(true, Ordering::SeqCst);
    }

    pub fn hold_deletes(&self, entered: Arc<Notify>, release: Arc<Notify>) {
        *self.delete_hold.lock().unwrap() = Some((entered, release));
    }

    pub fn hold_updates(&self, entered: Arc<Notify>, release: Arc<Notify>) {
        *self.update_hold.lock().unwrap() = Some((entered, release));
    }

    async fn wait_if_held(hold: &Mutex<Option<(Arc<Notify>, Arc<Notify>)>>) {
        let hold = hold.lock().unwrap().clone();
        if let Some((entered, release)) = hold {
            entered.notify_one();
            release.notified().await;
        }
    }

    fn take_failure(queue: &Mutex<Vec<String>>) -> Result<(), TransportError> {
        let mut queue = queue.lock().unwrap();
        if queue.is_empty() {
            return Ok(());
        }
        Err(TransportError::Rejected(queue.remove(0)))
    }
}

impl Uploader for MockUploader {
    fn upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        records: &'a [Arc<FileRecord>],
        _form: Option<&'a FormDataBuilder>,
        progress: ProgressCallback,
    ) -> UploadFuture<'a, Vec<UploadResponse>> {
        Box::pin(async move {
            self.options.lock().unwrap().push(request.options());
            for record in records {
                self.calls
                    .lock()
                    .unwrap()
                    .push(format!("upload {}", record.name()));
            }
            Self::take_failure(&self.upload_failures)?;

            for record in records {
                progress(UploadProgress {
                    record: record.id(),
                    percent: 50,
                    overall: 50,
                });
                self.progress_seen
                    .lock()
                    .unwrap()
                    .push(record.progress().unwrap_or_default());
            }
            let answered = if self.short.load(Ordering::SeqCst) {
                records.len().saturating_sub(1)
            } else {
                records.len()
            };
            Ok(records[..answered]
                .iter()
                .map(|r| {
                    UploadResponse::new(
                        200,
                        json!({ "url": format!("https://cdn.example/{}", r.name()) }),
                    )
                })
                .collect())
        })
    }

    fn delete_upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        record: &'a Arc<FileRecord>,
        _upload_data: Option<&'a Value>,
    ) -> UploadFuture<'a, UploadResponse> {
        Box::pin(async move {
            self.options.lock().unwrap().push(request.options());
            self.calls
                .lock()
                .unwrap()
                .push(format!("delete {}", record.name()));
            Self::wait_if_held(&self.delete_hold).await;
            Self::take_failure(&self.delete_failures)?;
            Ok(UploadResponse::new(204, Value::Null))
        })
    }

    fn update_upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        record: &'a Arc<FileRecord>,
        _upload_data: Option<&'a Value>,
    ) -> UploadFuture<'a, UploadResponse> {
        Box::pin(async move {
            self.options.lock().unwrap().push(request.options());
            self.calls
                .lock()
                .unwrap()
                .push(format!("update {}", record.name()));
            Self::wait_if_held(&self.update_hold).await;
            Self::take_failure(&self.update_failures)?;
            Ok(UploadResponse::new(200, json!({ "name": record.name() })))
        })
    }
}

/// An agent on a memory surface with a mock uploader.
pub struct Fixture {
    pub agent: Arc<FileAgent>,
    pub memory: Arc<Mutex<MemorySurface>>,
    pub uploader: Arc<MockUploader>,
}

impl Fixture {
    pub fn new(config: AgentConfig) -> Self {
        Self::with_events(config, AgentEvents::new())
    }

    pub fn with_events(config: AgentConfig, events: AgentEvents) -> Self {
        Self::build(config, events, |b| b)
    }

    pub fn with_uploader(
        config: AgentConfig,
        events: AgentEvents,
        uploader: Arc<MockUploader>,
    ) -> Self {
        Self::assemble(config, events, uploader, |b| b)
    }

    /// `extra` can add collaborators before the agent is built.
    pub fn build(
        config: AgentConfig,
        events: AgentEvents,
        extra: impl FnOnce(FileAgentBuilder) -> FileAgentBuilder,
    ) -> Self {
        Self::assemble(config, events, Arc::new(MockUploader::default()), extra)
    }

    fn assemble(
        config: AgentConfig,
        events: AgentEvents,
        uploader: Arc<MockUploader>,
        extra: impl FnOnce(FileAgentBuilder) -> FileAgentBuilder,
    ) -> Self {
        let memory = MemorySurface::shared();
        let surface: SharedSurface = memory.clone();
        let builder = FileAgent::builder(config)
            .surface(surface)
            .uploader(uploader.clone())
            .events(events);
        let agent = extra(builder).build().unwrap();
        Self {
            agent: Arc::new(agent),
            memory,
            uploader,
        }
    }
}
