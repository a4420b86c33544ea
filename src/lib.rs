//! # xrt-prods
//!
//! Client library for building, submitting and tracking Swift-XRT product requests.
//!
//! ## Design Philosophy
//!
//! xrt-prods is designed to be:
//! - **Checked early** - Parameters are validated against a static schema before anything
//!   reaches the network
//! - **Explicit about state** - A request is a Draft until it is submitted, once, and then
//!   only polled and retrieved from
//! - **Transport-agnostic** - The HTTP client sits behind the [`JobGateway`] trait
//! - **Caller-driven** - No background tasks, retries or polling loops; every call is one
//!   round trip
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use xrt_prods::{ClientConfig, DownloadOptions, HttpGateway, ProductRequest, Selection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Arc::new(HttpGateway::new(ClientConfig::default())?);
//!     let mut request = ProductRequest::new("someone@example.com", gateway)?;
//!
//!     request.set_global_parameters([
//!         ("name", json!("GRB 060729")),
//!         ("targ", json!("00221755")),
//!         ("getT0", json!(true)),
//!         ("RA", json!("06:21:31.8")),
//!         ("Dec", json!("-62:22:12")),
//!     ])?;
//!     request.add_image([("energies", json!("0.3-10"))])?;
//!
//!     let (ok, explanation) = request.is_valid().into_parts();
//!     if !ok {
//!         eprintln!("{}", explanation);
//!         return Ok(());
//!     }
//!
//!     let job_id = request.submit().await?;
//!     while !request.check_status(Selection::All).await? {
//!         tokio::time::sleep(std::time::Duration::from_secs(30)).await;
//!     }
//!
//!     let report = request
//!         .download_products("/tmp/products", Selection::All, &DownloadOptions::default())
//!         .await?;
//!     println!("job {}: {:?}", job_id, report.results);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Transport contract and the HTTP gateway
pub mod gateway;
/// Cross-job queries (active job count, previous jobs)
pub mod jobs;
/// Parameter sets
pub mod params;
/// Products within a request
pub mod product;
/// The product request aggregate
pub mod request;
/// Object name resolution
pub mod resolver;
/// Result types for completed jobs
pub mod results;
/// Static parameter schema
pub mod schema;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{ClientConfig, EndpointConfig};
pub use error::{Error, Result, StateError, ValidationError};
pub use gateway::{
    CancelDetail, CancelReport, HttpGateway, JobGateway, StatusReport, SubmitRequest,
    SubmitResponse,
};
pub use jobs::{OldJob, count_active_jobs, list_old_jobs};
pub use params::{ParamQuery, ParameterSet};
pub use product::Product;
pub use request::{ProductRequest, SubmitOptions, SubmitState, ValidationReport};
pub use resolver::{NameResolver, SkyPosition, StaticResolver};
pub use results::{
    ArchiveFormat, CancelOutcome, CancelStatus, DownloadOptions, DownloadReport, EnergyBand,
    Position, PositionResult, SourceList, SourceRecord,
};
pub use schema::Scope;
pub use types::{
    JobId, JobStatus, ProductKind, ProductStatus, STATUS_COMPLETE, STATUS_NOT_REPORTED,
    Selection,
};
