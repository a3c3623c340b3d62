//! Caller event hooks.
//!
//! Every hook is optional. The cancellable ones (`on_before_*`, `on_delete`,
//! `on_rename`) return a [`Verdict`]: `false` vetoes the action, anything
//! else lets it proceed. They never signal cancellation through an error.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use fileagent_record::{FileHandle, FileRecord};
use fileagent_uploader::{TransportError, UploadResponse};
use futures_util::future::BoxFuture;

use crate::drop::DropPayload;

/// Answer of a cancellable hook, either immediate or deferred.
pub enum Verdict {
    Ready(bool),
    Pending(BoxFuture<'static, bool>),
}

impl Verdict {
    pub fn pending(fut: impl Future<Output = bool> + Send + 'static) -> Self {
        Verdict::Pending(Box::pin(fut))
    }

    pub async fn resolve(self) -> bool {
        match self {
            Verdict::Ready(proceed) => proceed,
            Verdict::Pending(fut) => fut.await,
        }
    }
}

impl From<bool> for Verdict {
    fn from(proceed: bool) -> Self {
        Verdict::Ready(proceed)
    }
}

impl fmt::Debug for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ready(proceed) => f.debug_tuple("Ready").field(proceed).finish(),
            Verdict::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Raw input-change notification: what the file input reported.
#[derive(Debug, Clone, Default)]
pub struct InputChange {
    pub files: Vec<FileHandle>,
}

pub type Predicate = Arc<dyn Fn(&Arc<FileRecord>) -> Verdict + Send + Sync>;
pub type RecordsHook = Arc<dyn Fn(&[Arc<FileRecord>]) + Send + Sync>;
pub type UploadHook = Arc<dyn Fn(&[Arc<FileRecord>], &[UploadResponse]) + Send + Sync>;
pub type UploadErrorHook = Arc<dyn Fn(&[Arc<FileRecord>], &TransportError) + Send + Sync>;
pub type ResponseHook = Arc<dyn Fn(&Arc<FileRecord>, &UploadResponse) + Send + Sync>;
pub type ResponseErrorHook = Arc<dyn Fn(&Arc<FileRecord>, &TransportError) + Send + Sync>;
pub type ChangeHook = Arc<dyn Fn(&InputChange) + Send + Sync>;
pub type DropHook = Arc<dyn Fn(&DropPayload) + Send + Sync>;

/// The hook table handed to a [`FileAgent`](crate::FileAgent).
#[derive(Clone, Default)]
pub struct AgentEvents {
    pub on_change: Option<ChangeHook>,
    pub on_before_delete: Option<Predicate>,
    pub on_before_rename: Option<Predicate>,
    pub on_delete: Option<Predicate>,
    pub on_rename: Option<Predicate>,
    pub on_input: Option<RecordsHook>,
    pub on_select: Option<RecordsHook>,
    pub on_drop: Option<DropHook>,
    pub on_upload: Option<UploadHook>,
    pub on_upload_error: Option<UploadErrorHook>,
    pub on_upload_delete: Option<ResponseHook>,
    pub on_upload_delete_error: Option<ResponseErrorHook>,
    pub on_upload_update: Option<ResponseHook>,
    pub on_upload_update_error: Option<ResponseErrorHook>,
}

fn predicate<F, V>(f: F) -> Predicate
where
    F: Fn(&Arc<FileRecord>) -> V + Send + Sync + 'static,
    V: Into<Verdict>,
{
    Arc::new(move |record: &Arc<FileRecord>| f(record).into())
}

impl AgentEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_change(mut self, f: impl Fn(&InputChange) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Arc::new(f));
        self
    }

    /// Pre-check before a delete; return `false` (or a [`Verdict`]) to cancel.
    pub fn on_before_delete<V: Into<Verdict>>(
        mut self,
        f: impl Fn(&Arc<FileRecord>) -> V + Send + Sync + 'static,
    ) -> Self {
        self.on_before_delete = Some(predicate(f));
        self
    }

    pub fn on_before_rename<V: Into<Verdict>>(
        mut self,
        f: impl Fn(&Arc<FileRecord>) -> V + Send + Sync + 'static,
    ) -> Self {
        self.on_before_rename = Some(predicate(f));
        self
    }

    /// Runs after the optimistic removal; a `false` verdict rolls it back.
    pub fn on_delete<V: Into<Verdict>>(
        mut self,
        f: impl Fn(&Arc<FileRecord>) -> V + Send + Sync + 'static,
    ) -> Self {
        self.on_delete = Some(predicate(f));
        self
    }

    /// Runs after the optimistic rename; a `false` verdict reverts it.
    pub fn on_rename<V: Into<Verdict>>(
        mut self,
        f: impl Fn(&Arc<FileRecord>) -> V + Send + Sync + 'static,
    ) -> Self {
        self.on_rename = Some(predicate(f));
        self
    }

    pub fn on_input(mut self, f: impl Fn(&[Arc<FileRecord>]) + Send + Sync + 'static) -> Self {
        self.on_input = Some(Arc::new(f));
        self
    }

    pub fn on_select(mut self, f: impl Fn(&[Arc<FileRecord>]) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Arc::new(f));
        self
    }

    pub fn on_drop(mut self, f: impl Fn(&DropPayload) + Send + Sync + 'static) -> Self {
        self.on_drop = Some(Arc::new(f));
        self
    }

    pub fn on_upload(
        mut self,
        f: impl Fn(&[Arc<FileRecord>], &[UploadResponse]) + Send + Sync + 'static,
    ) -> Self {
        self.on_upload = Some(Arc::new(f));
        self
    }

    pub fn on_upload_error(
        mut self,
        f: impl Fn(&[Arc<FileRecord>], &TransportError) + Send + Sync + 'static,
    ) -> Self {
        self.on_upload_error = Some(Arc::new(f));
        self
    }

    pub fn on_upload_delete(
        mut self,
        f: impl Fn(&Arc<FileRecord>, &UploadResponse) + Send + Sync + 'static,
    ) -> Self {
        self.on_upload_delete = Some(Arc::new(f));
        self
    }

    pub fn on_upload_delete_error(
        mut self,
        f: impl Fn(&Arc<FileRecord>, &TransportError) + Send + Sync + 'static,
    ) -> Self {
        self.on_upload_delete_error = Some(Arc::new(f));
        self
    }

    pub fn on_upload_update(
        mut self,
        f: impl Fn(&Arc<FileRecord>, &UploadResponse) + Send + Sync + 'static,
    ) -> Self {
        self.on_upload_update = Some(Arc::new(f));
        self
    }

    pub fn on_upload_update_error(
        mut self,
        f: impl Fn(&Arc<FileRecord>, &TransportError) + Send + Sync + 'static,
    ) -> Self {
        self.on_upload_update_error = Some(Arc::new(f));
        self
    }
}

/// Evaluates an optional cancellable hook. A missing hook always proceeds.
pub(crate) async fn check(hook: Option<&Predicate>, record: &Arc<FileRecord>) -> bool {
    match hook {
        Some(hook) => hook(record).resolve().await,
        None => true,
    }
}

impl fmt::Debug for AgentEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentEvents")
            .field("on_change", &self.on_change.is_some())
            .field("on_before_delete", &self.on_before_delete.is_some())
            .field("on_before_rename", &self.on_before_rename.is_some())
            .field("on_delete", &self.on_delete.is_some())
            .field("on_rename", &self.on_rename.is_some())
            .field("on_input", &self.on_input.is_some())
            .field("on_select", &self.on_select.is_some())
            .field("on_drop", &self.on_drop.is_some())
            .field("on_upload", &self.on_upload.is_some())
            .field("on_upload_error", &self.on_upload_error.is_some())
            .field("on_upload_delete", &self.on_upload_delete.is_some())
            .field("on_upload_update", &self.on_upload_update.is_some())
            .finish_non_exhaustive()
    }
}
