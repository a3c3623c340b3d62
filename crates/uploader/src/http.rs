//! Default HTTP uploader.
//!
//! - upload: one multipart `POST` per record, sent concurrently
//! - delete: `DELETE` with the upload data as JSON body
//! - update: `PUT` with `{ "name", "upload" }`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fileagent_record::FileRecord;
use futures_util::future::join_all;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::contract::{UploadFuture, Uploader};
use crate::error::TransportError;
use crate::request::{FormDataBuilder, FormField, RequestOptions, UploadRequest, default_form};
use crate::response::{ProgressCallback, UploadProgress, UploadResponse};

/// [`Uploader`] backed by a `reqwest` client.
///
/// Credentialed requests go through a second client with a cookie store,
/// so cookies set by the endpoint are only replayed when the request asks
/// for them. Configured headers are always sent.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: Client,
    credentialed: Client,
}

impl Default for HttpUploader {
    fn default() -> Self {
        let credentialed = match Client::builder().cookie_store(true).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "cookie store unavailable, using the plain client");
                Client::new()
            }
        };
        Self {
            client: Client::new(),
            credentialed,
        }
    }
}

impl HttpUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `client` for every request, credentialed or not.
    pub fn with_client(client: Client) -> Self {
        Self {
            credentialed: client.clone(),
            client,
        }
    }

    fn client_for(&self, options: &RequestOptions) -> &Client {
        if options.with_credentials {
            &self.credentialed
        } else {
            &self.client
        }
    }

    async fn upload_one(
        &self,
        request: &UploadRequest,
        options: &RequestOptions,
        record: &FileRecord,
        form: Option<&FormDataBuilder>,
    ) -> Result<UploadResponse, TransportError> {
        let fields = match form {
            Some(build) => build(record),
            None => default_form(record),
        };

        let mut multipart = Form::new();
        for field in fields {
            match field {
                FormField::Text { name, value } => {
                    multipart = multipart.text(name, value);
                }
                FormField::File { name } => {
                    let bytes = record.file().read_all().await?;
                    let mut part = Part::bytes(bytes).file_name(record.name());
                    let mime_type = record.file().mime_type();
                    if !mime_type.is_empty() {
                        part = part.mime_str(mime_type)?;
                    }
                    multipart = multipart.part(name, part);
                }
            }
        }

        debug!(record = %record.id(), endpoint = %request.endpoint, "uploading file");
        let resp = apply_options(self.client_for(options).post(&request.endpoint), options)
            .multipart(multipart)
            .send()
            .await?;
        into_response(resp).await
    }
}

fn apply_options(mut builder: RequestBuilder, options: &RequestOptions) -> RequestBuilder {
    for (name, value) in &options.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    builder
}

/// JSON if the body parses as JSON, otherwise the raw text.
fn parse_body(body: String) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

async fn into_response(resp: Response) -> Result<UploadResponse, TransportError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        warn!(status = status.as_u16(), "upload endpoint rejected request");
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(UploadResponse::new(status.as_u16(), parse_body(body)))
}

fn percent(done: usize, total: usize) -> u8 {
    (done * 100 / total.max(1)).min(100) as u8
}

impl Uploader for HttpUploader {
    fn upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        records: &'a [Arc<FileRecord>],
        form: Option<&'a FormDataBuilder>,
        progress: ProgressCallback,
    ) -> UploadFuture<'a, Vec<UploadResponse>> {
        Box::pin(async move {
            let options = request.options();
            let total = records.len();
            let done = AtomicUsize::new(0);

            let uploads = records.iter().map(|record| {
                let options = &options;
                let done = &done;
                let progress = &progress;
                async move {
                    progress(UploadProgress {
                        record: record.id(),
                        percent: 0,
                        overall: percent(done.load(Ordering::SeqCst), total),
                    });
                    let response = self.upload_one(request, options, record, form).await?;
                    let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(UploadProgress {
                        record: record.id(),
                        percent: 100,
                        overall: percent(finished, total),
                    });
                    Ok::<_, TransportError>(response)
                }
            });

            join_all(uploads).await.into_iter().collect()
        })
    }

    fn delete_upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        record: &'a Arc<FileRecord>,
        upload_data: Option<&'a Value>,
    ) -> UploadFuture<'a, UploadResponse> {
        Box::pin(async move {
            let options = request.options();
            let data = upload_data
                .cloned()
                .or_else(|| record.upload_data())
                .unwrap_or(Value::Null);

            debug!(record = %record.id(), endpoint = %request.endpoint, "deleting upload");
            let resp = apply_options(self.client_for(&options).delete(&request.endpoint), &options)
                .json(&data)
                .send()
                .await?;
            into_response(resp).await
        })
    }

    fn update_upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        record: &'a Arc<FileRecord>,
        upload_data: Option<&'a Value>,
    ) -> UploadFuture<'a, UploadResponse> {
        Box::pin(async move {
            let options = request.options();
            let data = upload_data
                .cloned()
                .or_else(|| record.upload_data())
                .unwrap_or(Value::Null);
            let body = json!({
                "name": record.name(),
                "upload": data,
            });

            debug!(record = %record.id(), endpoint = %request.endpoint, "updating upload");
            let resp = apply_options(self.client_for(&options).put(&request.endpoint), &options)
                .json(&body)
                .send()
                .await?;
            into_response(resp).await
        })
    }
}
