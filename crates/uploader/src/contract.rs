//! The pluggable uploader trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use fileagent_record::FileRecord;
use serde_json::Value;

use crate::error::TransportError;
use crate::request::{FormDataBuilder, UploadRequest};
use crate::response::{ProgressCallback, UploadResponse};

/// Boxed future returned by every uploader operation.
pub type UploadFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Abstract transport for upload, update and delete.
///
/// The orchestrator only ever calls these three operations; using a trait
/// keeps the widget logic decoupled from the network and testable with mocks.
pub trait Uploader: Send + Sync {
    /// Uploads `records`, returning one response per record in order.
    ///
    /// `progress` receives per-record and overall progress as the transfer
    /// advances. Rejects if any record fails.
    fn upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        records: &'a [Arc<FileRecord>],
        form: Option<&'a FormDataBuilder>,
        progress: ProgressCallback,
    ) -> UploadFuture<'a, Vec<UploadResponse>>;

    /// Deletes a previously uploaded record on the server.
    ///
    /// `upload_data` overrides the data stored on the record.
    fn delete_upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        record: &'a Arc<FileRecord>,
        upload_data: Option<&'a Value>,
    ) -> UploadFuture<'a, UploadResponse>;

    /// Pushes record changes (its new name) to the server.
    fn update_upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        record: &'a Arc<FileRecord>,
        upload_data: Option<&'a Value>,
    ) -> UploadFuture<'a, UploadResponse>;
}
