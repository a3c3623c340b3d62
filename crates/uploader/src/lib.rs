//! Uploader contract for the file agent.
//!
//! The orchestrator never talks to the network itself: it calls an
//! [`Uploader`] for upload, update (rename) and delete. Implementations are
//! pluggable; [`HttpUploader`] is the default, built on `reqwest`.

mod contract;
mod error;
mod http;
mod request;
mod response;

pub use contract::{UploadFuture, Uploader};
pub use error::TransportError;
pub use http::HttpUploader;
pub use request::{
    FormDataBuilder, FormField, RequestConfigurator, RequestOptions, UploadRequest,
    compose_configurator, default_form,
};
pub use response::{ProgressCallback, UploadProgress, UploadResponse};
