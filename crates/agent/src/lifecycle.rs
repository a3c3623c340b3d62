//! Upload lifecycle: upload, delete and rename.
//!
//! Deletes and renames are optimistic. The collection (or display name)
//! changes first, then the transport call and the caller's confirmation
//! hook run together; a rejection from either restores the previous state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

use fileagent_record::{FileRecord, RecordId, UploadState};
use fileagent_uploader::{
    FormDataBuilder, ProgressCallback, RequestConfigurator, TransportError, UploadProgress,
    UploadRequest, UploadResponse, compose_configurator,
};
use futures_util::future::join;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::agent::{FileAgent, SharedRecords};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::events::{Predicate, check};

/// Why an optimistic change was undone.
#[derive(Debug)]
pub enum RollbackReason {
    Transport(TransportError),
    /// The `on_delete` / `on_rename` hook answered `false`.
    Vetoed,
}

/// Result of a delete or rename request.
#[derive(Debug)]
pub enum LifecycleOutcome {
    Committed,
    /// A pre-check hook declined; nothing was changed.
    Cancelled,
    RolledBack { reason: RollbackReason },
}

impl LifecycleOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, LifecycleOutcome::Committed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LifecycleOutcome::Cancelled)
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, LifecycleOutcome::RolledBack { .. })
    }
}

/// Enough state to undo one optimistic change.
pub(crate) enum Rollback {
    Delete {
        record: Arc<FileRecord>,
        index: usize,
        state: UploadState,
    },
    Rename {
        record: Arc<FileRecord>,
        state: UploadState,
    },
}

impl Rollback {
    fn record(&self) -> &Arc<FileRecord> {
        match self {
            Rollback::Delete { record, .. } | Rollback::Rename { record, .. } => record,
        }
    }

    fn commit(&self) {
        match self {
            Rollback::Delete { record, .. } => record.set_upload_state(UploadState::Idle),
            Rollback::Rename { record, state } => {
                record.commit_rename();
                record.set_upload_state(*state);
            }
        }
    }

    /// Restores the previous state. Returns `false` if there was nothing
    /// left to restore.
    fn undo(&self, records: &SharedRecords) -> bool {
        match self {
            Rollback::Delete {
                record,
                index,
                state,
            } => {
                let mut records = records.lock().unwrap();
                if records.iter().any(|r| Arc::ptr_eq(r, record)) {
                    return false;
                }
                let at = (*index).min(records.len());
                records.insert(at, record.clone());
                record.set_upload_state(*state);
                true
            }
            Rollback::Rename { record, state } => {
                record.set_upload_state(*state);
                record.revert_rename()
            }
        }
    }
}

/// Ids of records with a lifecycle action in flight.
#[derive(Clone, Default)]
pub(crate) struct InFlight(Arc<Mutex<HashSet<RecordId>>>);

impl InFlight {
    pub fn acquire(&self, id: RecordId) -> Result<FlightGuard, AgentError> {
        if !self.0.lock().unwrap().insert(id) {
            return Err(AgentError::Busy(id));
        }
        Ok(FlightGuard {
            ids: self.0.clone(),
            id,
        })
    }
}

/// Releases the record's token on drop.
pub(crate) struct FlightGuard {
    ids: Arc<Mutex<HashSet<RecordId>>>,
    id: RecordId,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.ids.lock().unwrap().remove(&self.id);
    }
}

fn build_request(
    config: &AgentConfig,
    endpoint: &str,
    headers: BTreeMap<String, String>,
    configure: Option<RequestConfigurator>,
) -> UploadRequest {
    UploadRequest::new(endpoint)
        .with_headers(headers)
        .with_upload_config(config.upload_config.clone())
        .with_configurator(compose_configurator(config.upload_with_credentials, configure))
}

impl FileAgent {
    // -----------------------------------------------------------------------
    // Transport calls
    // -----------------------------------------------------------------------

    /// Uploads the valid records among `records`.
    ///
    /// Records with a validation error, and records that already have an
    /// action in flight, are skipped. Progress reports are written into each
    /// record as they arrive.
    pub async fn upload(
        &self,
        endpoint: &str,
        headers: BTreeMap<String, String>,
        records: &[Arc<FileRecord>],
        form: Option<FormDataBuilder>,
        configure: Option<RequestConfigurator>,
    ) -> Result<Vec<UploadResponse>, AgentError> {
        let uploader = self.uploader.as_ref().ok_or(AgentError::NoUploader)?;

        let mut guards = Vec::new();
        let mut batch = Vec::new();
        for record in records.iter().filter(|r| r.is_valid()) {
            match self.in_flight.acquire(record.id()) {
                Ok(guard) => {
                    guards.push(guard);
                    batch.push(record.clone());
                }
                Err(_) => debug!(record = %record.id(), "record busy, not uploading"),
            }
        }
        if batch.is_empty() {
            debug!("nothing to upload");
            return Ok(Vec::new());
        }

        for record in &batch {
            record.set_upload_state(UploadState::Uploading);
        }
        let by_id: HashMap<RecordId, Arc<FileRecord>> =
            batch.iter().map(|r| (r.id(), r.clone())).collect();
        let progress: ProgressCallback = Arc::new(move |report: UploadProgress| {
            if let Some(record) = by_id.get(&report.record) {
                record.set_progress(report.percent);
            }
        });

        let request = build_request(&self.config(), endpoint, headers, configure);
        info!(endpoint, files = batch.len(), "uploading");
        let result = uploader
            .upload(&request, &batch, form.as_ref(), progress)
            .await
            .and_then(|responses| {
                if responses.len() == batch.len() {
                    Ok(responses)
                } else {
                    Err(TransportError::Rejected(format!(
                        "expected {} responses, got {}",
                        batch.len(),
                        responses.len()
                    )))
                }
            });
        match result {
            Ok(responses) => {
                for (record, response) in batch.iter().zip(&responses) {
                    record.set_progress(100);
                    record.set_upload_data(Some(response.data.clone()));
                    record.set_url(response.url().map(str::to_string));
                    record.set_upload_state(UploadState::Uploaded);
                }
                if let Some(hook) = &self.events.on_upload {
                    hook(&batch, &responses);
                }
                Ok(responses)
            }
            Err(e) => {
                for record in &batch {
                    record.set_upload_state(UploadState::Idle);
                    record.clear_progress();
                }
                warn!(endpoint, files = batch.len(), error = %e, "upload failed");
                if let Some(hook) = &self.events.on_upload_error {
                    hook(&batch, &e);
                }
                Err(AgentError::Transport(e))
            }
        }
    }

    /// Deletes a record's upload on the server.
    pub async fn delete_upload(
        &self,
        endpoint: &str,
        headers: BTreeMap<String, String>,
        record: &Arc<FileRecord>,
        upload_data: Option<Value>,
        configure: Option<RequestConfigurator>,
    ) -> Result<UploadResponse, AgentError> {
        let uploader = self.uploader.as_ref().ok_or(AgentError::NoUploader)?;
        let request = build_request(&self.config(), endpoint, headers, configure);
        match uploader
            .delete_upload(&request, record, upload_data.as_ref())
            .await
        {
            Ok(response) => {
                debug!(record = %record.id(), status = response.status, "upload deleted");
                if let Some(hook) = &self.events.on_upload_delete {
                    hook(record, &response);
                }
                Ok(response)
            }
            Err(e) => {
                warn!(record = %record.id(), error = %e, "delete upload failed");
                if let Some(hook) = &self.events.on_upload_delete_error {
                    hook(record, &e);
                }
                Err(AgentError::Transport(e))
            }
        }
    }

    /// Pushes a record's current name to the server.
    pub async fn update_upload(
        &self,
        endpoint: &str,
        headers: BTreeMap<String, String>,
        record: &Arc<FileRecord>,
        upload_data: Option<Value>,
        configure: Option<RequestConfigurator>,
    ) -> Result<UploadResponse, AgentError> {
        let uploader = self.uploader.as_ref().ok_or(AgentError::NoUploader)?;
        let request = build_request(&self.config(), endpoint, headers, configure);
        match uploader
            .update_upload(&request, record, upload_data.as_ref())
            .await
        {
            Ok(response) => {
                debug!(record = %record.id(), status = response.status, "upload updated");
                if let Some(hook) = &self.events.on_upload_update {
                    hook(record, &response);
                }
                Ok(response)
            }
            Err(e) => {
                warn!(record = %record.id(), error = %e, "update upload failed");
                if let Some(hook) = &self.events.on_upload_update_error {
                    hook(record, &e);
                }
                Err(AgentError::Transport(e))
            }
        }
    }

    /// Uploads to the configured endpoint. `Ok(None)` when auto upload is
    /// off or no endpoint is set.
    pub async fn auto_upload(
        &self,
        records: &[Arc<FileRecord>],
    ) -> Result<Option<Vec<UploadResponse>>, AgentError> {
        let config = self.config();
        let Some(endpoint) = config.auto_upload_url() else {
            debug!(files = records.len(), "auto upload skipped");
            return Ok(None);
        };
        self.upload(
            endpoint,
            config.upload_headers.clone(),
            records,
            None,
            self.configure.clone(),
        )
        .await
        .map(Some)
    }

    pub async fn auto_delete_upload(
        &self,
        record: &Arc<FileRecord>,
    ) -> Result<Option<UploadResponse>, AgentError> {
        let config = self.config();
        let Some(endpoint) = config.auto_upload_url() else {
            return Ok(None);
        };
        self.delete_upload(
            endpoint,
            config.upload_headers.clone(),
            record,
            config.upload_config.clone(),
            self.configure.clone(),
        )
        .await
        .map(Some)
    }

    pub async fn auto_update_upload(
        &self,
        record: &Arc<FileRecord>,
    ) -> Result<Option<UploadResponse>, AgentError> {
        let config = self.config();
        let Some(endpoint) = config.auto_upload_url() else {
            return Ok(None);
        };
        self.update_upload(
            endpoint,
            config.upload_headers.clone(),
            record,
            config.upload_config.clone(),
            self.configure.clone(),
        )
        .await
        .map(Some)
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Deletes a record after the `on_before_delete` pre-check.
    ///
    /// The record leaves the collection immediately and comes back at its
    /// old index if the server or `on_delete` rejects.
    pub async fn request_delete(&self, id: RecordId) -> Result<LifecycleOutcome, AgentError> {
        if !self.config().is_active() {
            return Err(AgentError::Inactive);
        }
        let record = self.find(id)?;
        let _guard = self.in_flight.acquire(id)?;
        if !check(self.events.on_before_delete.as_ref(), &record).await {
            debug!(record = %id, "delete cancelled by pre-check");
            return Ok(LifecycleOutcome::Cancelled);
        }
        self.run_delete(record).await
    }

    /// Deletes a record without running the pre-check.
    pub async fn delete_record(&self, id: RecordId) -> Result<LifecycleOutcome, AgentError> {
        if !self.config().is_active() {
            return Err(AgentError::Inactive);
        }
        let record = self.find(id)?;
        let _guard = self.in_flight.acquire(id)?;
        self.run_delete(record).await
    }

    async fn run_delete(&self, record: Arc<FileRecord>) -> Result<LifecycleOutcome, AgentError> {
        let rollback = {
            let mut records = self.records.lock().unwrap();
            let Some(index) = records.iter().position(|r| Arc::ptr_eq(r, &record)) else {
                return Err(AgentError::NotFound(record.id()));
            };
            records.remove(index);
            let state = record.upload_state();
            record.set_upload_state(UploadState::Deleting);
            Rollback::Delete {
                record: record.clone(),
                index,
                state,
            }
        };
        debug!(record = %record.id(), "record removed");
        self.render();
        self.fire_input();

        self.confirm(
            rollback,
            self.auto_delete_upload(&record),
            self.events.on_delete.as_ref(),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Rename
    // -----------------------------------------------------------------------

    /// Renames a record (keeping its extension) after the
    /// `on_before_rename` pre-check. The pre-check sees the record before
    /// the new name is applied.
    pub async fn request_rename(
        &self,
        id: RecordId,
        name_without_extension: &str,
    ) -> Result<LifecycleOutcome, AgentError> {
        if !self.config().is_active() {
            return Err(AgentError::Inactive);
        }
        let record = self.find(id)?;
        let _guard = self.in_flight.acquire(id)?;
        if !check(self.events.on_before_rename.as_ref(), &record).await {
            debug!(record = %id, "rename cancelled by pre-check");
            return Ok(LifecycleOutcome::Cancelled);
        }
        self.run_rename(record, name_without_extension).await
    }

    /// Renames a record without running the pre-check.
    pub async fn rename_record(
        &self,
        id: RecordId,
        name_without_extension: &str,
    ) -> Result<LifecycleOutcome, AgentError> {
        if !self.config().is_active() {
            return Err(AgentError::Inactive);
        }
        let record = self.find(id)?;
        let _guard = self.in_flight.acquire(id)?;
        self.run_rename(record, name_without_extension).await
    }

    async fn run_rename(
        &self,
        record: Arc<FileRecord>,
        name_without_extension: &str,
    ) -> Result<LifecycleOutcome, AgentError> {
        let state = record.upload_state();
        record.rename(name_without_extension);
        record.set_upload_state(UploadState::Renaming);
        debug!(record = %record.id(), name = %record.name(), "record renamed");

        self.confirm(
            Rollback::Rename {
                record: record.clone(),
                state,
            },
            self.auto_update_upload(&record),
            self.events.on_rename.as_ref(),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Confirmation
    // -----------------------------------------------------------------------

    /// Waits for both the transport call and the confirmation hook, then
    /// commits or undoes `rollback` once.
    async fn confirm(
        &self,
        rollback: Rollback,
        transport: impl Future<Output = Result<Option<UploadResponse>, AgentError>>,
        hook: Option<&Predicate>,
    ) -> Result<LifecycleOutcome, AgentError> {
        let record = rollback.record().clone();
        let (sent, proceed) = join(transport, check(hook, &record)).await;

        let outcome = match sent {
            Err(AgentError::Transport(e)) => Ok(LifecycleOutcome::RolledBack {
                reason: RollbackReason::Transport(e),
            }),
            Err(e) => Err(e),
            Ok(_) if !proceed => Ok(LifecycleOutcome::RolledBack {
                reason: RollbackReason::Vetoed,
            }),
            Ok(_) => Ok(LifecycleOutcome::Committed),
        };

        if matches!(outcome, Ok(LifecycleOutcome::Committed)) {
            rollback.commit();
            info!(record = %record.id(), "change committed");
        } else {
            warn!(record = %record.id(), "rolling back");
            if rollback.undo(&self.records) {
                self.render();
                self.fire_input();
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AgentEvents, Verdict};
    use crate::testing::{Fixture, MockUploader, text_file};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn with_url() -> AgentConfig {
        AgentConfig {
            multiple: true,
            upload_url: Some("https://up.example".into()),
            ..AgentConfig::default()
        }
    }

    async fn seeded(fx: &Fixture, names: &[&str]) -> Vec<Arc<FileRecord>> {
        fx.agent
            .handle_files(names.iter().map(|n| text_file(n, 1)).collect())
            .await
            .unwrap()
    }

    fn names(fx: &Fixture) -> Vec<String> {
        fx.agent.records().iter().map(|r| r.name()).collect()
    }

    #[tokio::test]
    async fn delete_commits() {
        let fx = Fixture::new(with_url());
        let added = seeded(&fx, &["a.txt", "b.txt"]).await;

        let outcome = fx.agent.request_delete(added[0].id()).await.unwrap();
        assert!(outcome.is_committed());
        assert_eq!(names(&fx), vec!["b.txt"]);
        assert!(fx.agent.node_of(added[0].id()).is_none());
        assert!(
            fx.uploader
                .calls
                .lock()
                .unwrap()
                .contains(&"delete a.txt".to_string())
        );
    }

    #[tokio::test]
    async fn rejected_delete_restores_index() {
        let fx = Fixture::new(with_url());
        let added = seeded(&fx, &["a.txt", "b.txt", "c.txt"]).await;
        fx.uploader.fail_next_delete("gone away");

        let outcome = fx.agent.request_delete(added[1].id()).await.unwrap();
        assert!(matches!(
            outcome,
            LifecycleOutcome::RolledBack {
                reason: RollbackReason::Transport(_)
            }
        ));
        assert_eq!(names(&fx), vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(added[1].upload_state(), UploadState::Uploaded);

        // Reinstated records render again in their old slot.
        let node = fx.agent.node_of(added[1].id()).unwrap();
        assert_eq!(fx.memory.lock().unwrap().list()[1], node);
    }

    #[tokio::test]
    async fn pre_check_cancels_without_mutation() {
        let inputs = Arc::new(AtomicUsize::new(0));
        let i = inputs.clone();
        let events = AgentEvents::new()
            .on_before_delete(|_| false)
            .on_input(move |_| {
                i.fetch_add(1, Ordering::SeqCst);
            });
        let fx = Fixture::with_events(with_url(), events);
        let added = seeded(&fx, &["a.txt"]).await;
        let before = inputs.load(Ordering::SeqCst);
        let node = fx.agent.node_of(added[0].id());
        let (list, created) = {
            let memory = fx.memory.lock().unwrap();
            (memory.list().to_vec(), memory.created())
        };

        let outcome = fx.agent.request_delete(added[0].id()).await.unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(names(&fx), vec!["a.txt"]);
        assert_eq!(inputs.load(Ordering::SeqCst), before);
        assert!(node.is_some());
        assert_eq!(fx.agent.node_of(added[0].id()), node);
        {
            let memory = fx.memory.lock().unwrap();
            assert_eq!(memory.list(), list.as_slice());
            assert_eq!(memory.created(), created);
        }
        assert!(
            !fx.uploader
                .calls
                .lock()
                .unwrap()
                .iter()
                .any(|c| c.starts_with("delete"))
        );
    }

    #[tokio::test]
    async fn async_veto_rolls_back() {
        let events = AgentEvents::new().on_delete(|_| Verdict::pending(async { false }));
        let fx = Fixture::with_events(with_url(), events);
        let added = seeded(&fx, &["a.txt", "b.txt"]).await;

        let outcome = fx.agent.request_delete(added[0].id()).await.unwrap();
        assert!(matches!(
            outcome,
            LifecycleOutcome::RolledBack {
                reason: RollbackReason::Vetoed
            }
        ));
        assert_eq!(names(&fx), vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn delete_without_endpoint_commits() {
        let fx = Fixture::new(AgentConfig {
            multiple: true,
            ..AgentConfig::default()
        });
        let added = seeded(&fx, &["a.txt"]).await;
        let outcome = fx.agent.delete_record(added[0].id()).await.unwrap();
        assert!(outcome.is_committed());
        assert!(fx.agent.records().is_empty());
        assert!(fx.uploader.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let fx = Fixture::new(with_url());
        let stray = FileRecord::new(text_file("x.txt", 1), 360);
        assert!(matches!(
            fx.agent.request_delete(stray.id()).await,
            Err(AgentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn readonly_agent_refuses_lifecycle() {
        let fx = Fixture::new(with_url());
        let added = seeded(&fx, &["a.txt"]).await;
        fx.agent
            .set_config(AgentConfig {
                readonly: true,
                ..with_url()
            })
            .unwrap();
        assert!(matches!(
            fx.agent.request_delete(added[0].id()).await,
            Err(AgentError::Inactive)
        ));
    }

    #[tokio::test]
    async fn rejected_rename_reverts() {
        let fx = Fixture::new(with_url());
        let added = seeded(&fx, &["report.txt"]).await;
        fx.uploader.fail_next_update("conflict");

        let outcome = fx
            .agent
            .request_rename(added[0].id(), "final")
            .await
            .unwrap();
        assert!(outcome.is_rolled_back());
        assert_eq!(added[0].name(), "report.txt");
        assert!(!added[0].is_renaming());
        assert_eq!(added[0].upload_state(), UploadState::Uploaded);
    }

    #[tokio::test]
    async fn rename_commits_and_keeps_extension() {
        let fx = Fixture::new(with_url());
        let added = seeded(&fx, &["report.txt"]).await;

        let outcome = fx.agent.rename_record(added[0].id(), "final").await.unwrap();
        assert!(outcome.is_committed());
        assert_eq!(added[0].name(), "final.txt");
        assert!(!added[0].is_renaming());

        let node = fx.agent.node_of(added[0].id()).unwrap();
        assert_eq!(
            fx.memory.lock().unwrap().view(node).unwrap().name,
            "final.txt"
        );
    }

    #[tokio::test]
    async fn rename_pre_check_sees_old_name() {
        let seen = Arc::new(Mutex::new(String::new()));
        let s = seen.clone();
        let events = AgentEvents::new().on_before_rename(move |r: &Arc<FileRecord>| {
            *s.lock().unwrap() = r.name();
            false
        });
        let fx = Fixture::with_events(with_url(), events);
        let added = seeded(&fx, &["a.txt"]).await;

        let outcome = fx.agent.request_rename(added[0].id(), "b").await.unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(*seen.lock().unwrap(), "a.txt");
        assert_eq!(added[0].name(), "a.txt");
    }

    #[tokio::test]
    async fn second_action_on_busy_record_fails_fast() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let uploader = Arc::new(MockUploader::default());
        let fx = Fixture::with_uploader(with_url(), AgentEvents::new(), uploader.clone());
        let added = seeded(&fx, &["a.txt"]).await;
        uploader.hold_updates(entered.clone(), release.clone());

        let agent = fx.agent.clone();
        let id = added[0].id();
        let first = tokio::spawn(async move { agent.request_rename(id, "other").await });
        entered.notified().await;

        // Still in the collection, so only the flight token stops it.
        assert!(fx.agent.record(id).is_some());
        assert!(matches!(
            fx.agent.request_delete(id).await,
            Err(AgentError::Busy(_))
        ));
        release.notify_one();
        assert!(first.await.unwrap().unwrap().is_committed());
        assert_eq!(fx.agent.records().len(), 1);
        assert_eq!(added[0].name(), "other.txt");
    }

    #[tokio::test]
    async fn action_on_record_being_deleted_is_not_found() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let uploader = Arc::new(MockUploader::default());
        let fx = Fixture::with_uploader(with_url(), AgentEvents::new(), uploader.clone());
        let added = seeded(&fx, &["a.txt"]).await;
        uploader.hold_deletes(entered.clone(), release.clone());

        let agent = fx.agent.clone();
        let id = added[0].id();
        let first = tokio::spawn(async move { agent.request_delete(id).await });
        entered.notified().await;

        assert!(matches!(
            fx.agent.request_rename(id, "other").await,
            Err(AgentError::NotFound(_))
        ));
        release.notify_one();
        assert!(first.await.unwrap().unwrap().is_committed());
    }

    #[tokio::test]
    async fn short_response_list_resets_records() {
        let fx = Fixture::new(with_url());
        let added = seeded(&fx, &["a.txt", "b.txt"]).await;
        fx.uploader.respond_short();

        let result = fx
            .agent
            .upload("https://up.example", BTreeMap::new(), &added, None, None)
            .await;
        assert!(matches!(
            result,
            Err(AgentError::Transport(TransportError::Rejected(_)))
        ));
        for record in &added {
            assert_eq!(record.upload_state(), UploadState::Idle);
            assert!(record.url().is_none());
        }
    }

    #[tokio::test]
    async fn upload_failure_resets_records() {
        let errors = Arc::new(AtomicUsize::new(0));
        let e = errors.clone();
        let events = AgentEvents::new().on_upload_error(move |records, _| {
            e.fetch_add(records.len(), Ordering::SeqCst);
        });
        let fx = Fixture::with_events(with_url(), events);
        fx.uploader.fail_next_upload("server down");

        // Auto upload fails, the record stays in the collection.
        let added = seeded(&fx, &["a.txt"]).await;
        assert_eq!(fx.agent.records().len(), 1);
        assert_eq!(added[0].upload_state(), UploadState::Idle);
        assert_eq!(added[0].progress(), None);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn explicit_upload_reports_progress_and_credentials() {
        let uploads = Arc::new(AtomicUsize::new(0));
        let u = uploads.clone();
        let events = AgentEvents::new().on_upload(move |records, responses| {
            assert_eq!(records.len(), responses.len());
            u.fetch_add(1, Ordering::SeqCst);
        });
        let fx = Fixture::with_events(
            AgentConfig {
                multiple: true,
                upload_with_credentials: Some(true),
                ..AgentConfig::default()
            },
            events,
        );
        let added = seeded(&fx, &["a.txt"]).await;

        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer t".to_string());
        let responses = fx
            .agent
            .upload("https://up.example", headers, &added, None, None)
            .await
            .unwrap();

        assert_eq!(responses.len(), 1);
        assert_eq!(added[0].progress(), Some(100));
        assert_eq!(added[0].upload_state(), UploadState::Uploaded);
        assert_eq!(uploads.load(Ordering::SeqCst), 1);
        // The mock saw the intermediate report.
        assert_eq!(*fx.uploader.progress_seen.lock().unwrap(), vec![50]);

        let options = fx.uploader.options.lock().unwrap();
        assert!(options[0].with_credentials);
        assert_eq!(
            options[0].headers,
            vec![("Authorization".to_string(), "Bearer t".to_string())]
        );
    }

    #[tokio::test]
    async fn upload_without_uploader_fails() {
        let agent = FileAgent::builder(with_url()).build().unwrap();
        let record = Arc::new(FileRecord::new(text_file("a.txt", 1), 360));
        assert!(matches!(
            agent
                .upload("https://up.example", BTreeMap::new(), &[record], None, None)
                .await,
            Err(AgentError::NoUploader)
        ));
    }
}
