//! Request description handed to an [`Uploader`](crate::Uploader).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use fileagent_record::FileRecord;
use serde_json::Value;

/// Transport-level options a configurator may tweak before sending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    /// Replay cookies from earlier responses. Headers are sent either way.
    pub with_credentials: bool,
    pub timeout: Option<Duration>,
}

/// Caller hook to mutate [`RequestOptions`] right before a request is sent.
pub type RequestConfigurator = Arc<dyn Fn(&mut RequestOptions) + Send + Sync>;

/// Folds the widget's credentials flag into the caller's configurator.
///
/// `None` leaves the configurator untouched; `Some(flag)` forces
/// `with_credentials` and then runs the caller's configurator.
pub fn compose_configurator(
    with_credentials: Option<bool>,
    configure: Option<RequestConfigurator>,
) -> Option<RequestConfigurator> {
    let Some(with_credentials) = with_credentials else {
        return configure;
    };
    let composed: RequestConfigurator = Arc::new(move |options: &mut RequestOptions| {
        options.with_credentials = with_credentials;
        if let Some(configure) = &configure {
            configure(options);
        }
    });
    Some(composed)
}

/// One multipart field produced for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text { name: String, value: String },
    /// The record's file content.
    File { name: String },
}

/// Builds the multipart fields for one record.
pub type FormDataBuilder = Arc<dyn Fn(&FileRecord) -> Vec<FormField> + Send + Sync>;

/// The fields sent when the caller supplies no form builder.
pub fn default_form(_record: &FileRecord) -> Vec<FormField> {
    vec![FormField::File {
        name: "file".into(),
    }]
}

/// Endpoint, headers and options for one uploader call.
#[derive(Clone, Default)]
pub struct UploadRequest {
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    /// Opaque widget upload config, forwarded untouched.
    pub upload_config: Option<Value>,
    pub configure: Option<RequestConfigurator>,
}

impl UploadRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_upload_config(mut self, config: Option<Value>) -> Self {
        self.upload_config = config;
        self
    }

    pub fn with_configurator(mut self, configure: Option<RequestConfigurator>) -> Self {
        self.configure = configure;
        self
    }

    /// Resolves the final request options: headers first, then the configurator.
    pub fn options(&self) -> RequestOptions {
        let mut options = RequestOptions {
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            ..RequestOptions::default()
        };
        if let Some(configure) = &self.configure {
            configure(&mut options);
        }
        options
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("endpoint", &self.endpoint)
            .field("headers", &self.headers)
            .field("upload_config", &self.upload_config)
            .field("configure", &self.configure.is_some())
            .finish()
    }
}
