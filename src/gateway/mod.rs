//! Transport contract between requests and the job server
//!
//! [`JobGateway`] is the seam between the request state machine and the network. The core
//! never performs HTTP itself: it hands fully validated, serialized parameters to a gateway
//! and interprets the decoded replies. [`HttpGateway`] is the production implementation;
//! tests substitute in-memory gateways.
//!
//! Every method is a single round trip. Gateways must not retry internally; retry and
//! polling policy belong to the caller.

mod http;

pub use http::HttpGateway;

use crate::error::Result;
use crate::results::ArchiveFormat;
use crate::types::{JobId, JobStatus, ProductKind, ProductStatus, Selection};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Everything the server needs to create a job
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitRequest {
    /// Registered user ID of the caller
    pub user_id: String,
    /// Serialized parameters in client-native shape
    pub parameters: Map<String, Value>,
    /// Ask the server to return every resolved/defaulted parameter
    pub return_resolved: bool,
}

/// Decoded reply to a submission
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SubmitResponse {
    /// Whether the server created a job
    pub accepted: bool,
    /// The new job's ID (accepted only)
    pub job_id: Option<JobId>,
    /// Page where the job's progress and products can be followed (accepted only)
    pub url: Option<String>,
    /// Full parameter set as resolved by the server, in server-native shape
    pub resolved_parameters: Option<Map<String, Value>>,
    /// The server's explanation (rejected only)
    pub error_message: Option<String>,
}

/// Decoded reply to a status query
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StatusReport {
    /// Aggregate status of the job, when the server reports one
    pub job: Option<JobStatus>,
    /// Per-product status; products the server did not mention are absent
    pub products: BTreeMap<ProductKind, ProductStatus>,
}

/// Outcome of cancelling one product, as reported by the server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelDetail {
    /// Server code (1 = cancelled)
    pub code: i32,
    /// Server explanation
    pub text: String,
}

/// Decoded reply to a cancellation
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CancelReport {
    /// Aggregate code: -1 error, 0 all rejected, 1 success, 2 partial success
    pub code: i32,
    /// Per-product breakdown
    pub products: BTreeMap<ProductKind, CancelDetail>,
}

/// Transport used by requests to talk to the job server
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use xrt_prods::{ClientConfig, HttpGateway, JobGateway};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway: Arc<dyn JobGateway> = Arc::new(HttpGateway::new(ClientConfig::default())?);
/// let active = gateway.count_active_jobs("user@example.com").await?;
/// println!("server says: {}", active);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait JobGateway: Send + Sync {
    /// Submit a new job
    ///
    /// A well-formed rejection is returned as `Ok` with `accepted == false`; `Err` is
    /// reserved for transport and protocol failures.
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse>;

    /// Query the status of some or all products of a job
    async fn status(&self, job_id: JobId, what: &Selection) -> Result<StatusReport>;

    /// Cancel some or all products of a job
    async fn cancel(&self, job_id: JobId, user_id: &str, what: &Selection) -> Result<CancelReport>;

    /// Number of jobs the user has queued or running, as returned by the server
    async fn count_active_jobs(&self, user_id: &str) -> Result<Value>;

    /// The user's previous jobs, as returned by the server
    async fn list_old_jobs(&self, user_id: &str) -> Result<Value>;

    /// Stored parameters of a previous job, in server-native shape
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) if the job does not exist
    /// or belongs to another user.
    async fn clone_job(&self, job_id: JobId, user_id: &str) -> Result<Map<String, Value>>;

    /// Result document of one position product
    async fn position(&self, job_id: JobId, kind: ProductKind) -> Result<Map<String, Value>>;

    /// Result document of the source detection product
    async fn source_list(&self, job_id: JobId) -> Result<Map<String, Value>>;

    /// Raw bytes of a product archive
    async fn fetch_archive(
        &self,
        job_id: JobId,
        kind: ProductKind,
        format: ArchiveFormat,
    ) -> Result<Vec<u8>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
