//! The product request aggregate, split into focused submodules.
//!
//! A [`ProductRequest`] holds global parameters and at most one [`Product`] per kind, and
//! carries the submission state machine `Draft -> Submitting -> {Accepted, Rejected}`.
//! Only a Draft can be changed. Its methods are organized by concern:
//! - [`build`] - Product and parameter mutation, copying, coordinate resolution
//! - [`wire`] - Serialization and the two JSON shapes
//! - [`submit`] - Validation and submission
//! - [`lifecycle`] - Status polling, cancellation, cloning previous jobs
//! - [`retrieve`] - Positions, source lists and archive downloads

mod build;
mod lifecycle;
mod retrieve;
mod submit;
mod wire;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use submit::{SubmitOptions, ValidationReport};

use crate::config::ClientConfig;
use crate::error::{Error, Result, StateError, ValidationError};
use crate::gateway::{HttpGateway, JobGateway};
use crate::params::ParameterSet;
use crate::product::Product;
use crate::schema::Scope;
use crate::types::{JobId, JobStatus, ProductKind, Selection};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Where a request is in its submission lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitState {
    /// Being built; the only mutable state
    Draft,
    /// Handed to the gateway, waiting for the server's answer
    Submitting,
    /// The server created a job
    Accepted,
    /// The server (or the transport) refused the submission
    Rejected,
}

impl std::fmt::Display for SubmitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SubmitState::Draft => "draft",
            SubmitState::Submitting => "being submitted",
            SubmitState::Accepted => "already submitted",
            SubmitState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// A multi-product processing request and its server-side job
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use serde_json::json;
/// use xrt_prods::{ClientConfig, HttpGateway, ProductKind, ProductRequest};
///
/// # #[tokio::main]
/// # async fn main() -> xrt_prods::Result<()> {
/// let gateway = Arc::new(HttpGateway::new(ClientConfig::default())?);
/// let mut request = ProductRequest::new("someone@example.com", gateway)?;
/// request.set_global_parameters([
///     ("name", json!("GRB 060729")),
///     ("targ", json!("00221755")),
///     ("T0", json!(175892061.0)),
///     ("RA", json!(95.37)),
///     ("Dec", json!(-62.37)),
/// ])?;
/// request.add_light_curve([
///     ("binMeth", json!("counts")),
///     ("pcCounts", json!(20)),
///     ("wtCounts", json!(30)),
///     ("dynamic", json!(true)),
/// ])?;
///
/// let job_id = request.submit().await?;
/// println!("job {} is at {:?}", job_id, request.url());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ProductRequest {
    user_id: String,
    gateway: Arc<dyn JobGateway>,
    global: ParameterSet,
    products: BTreeMap<ProductKind, Product>,
    state: SubmitState,
    job_id: Option<JobId>,
    url: Option<String>,
    submit_error: Option<String>,
    complete: bool,
    status: Option<JobStatus>,
    /// Resolved parameters returned on acceptance (server-native shape)
    sub_ret_data: Option<Map<String, Value>>,
}

impl std::fmt::Debug for ProductRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductRequest")
            .field("user_id", &self.user_id)
            .field("gateway", &self.gateway.name())
            .field("global", &self.global)
            .field("products", &self.products)
            .field("state", &self.state)
            .field("job_id", &self.job_id)
            .field("complete", &self.complete)
            .finish_non_exhaustive()
    }
}

impl ProductRequest {
    /// Create an empty Draft request for a registered user
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `user_id` is blank.
    pub fn new(user_id: impl Into<String>, gateway: Arc<dyn JobGateway>) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                scope: "request".to_string(),
                name: "userID".to_string(),
                reason: "a registered user ID is required".to_string(),
            }
            .into());
        }
        Ok(Self::blank(user_id, gateway))
    }

    fn blank(user_id: String, gateway: Arc<dyn JobGateway>) -> Self {
        Self {
            user_id,
            gateway,
            global: ParameterSet::new(Scope::Global),
            products: BTreeMap::new(),
            state: SubmitState::Draft,
            job_id: None,
            url: None,
            submit_error: None,
            complete: false,
            status: None,
            sub_ret_data: None,
        }
    }

    /// Create a request talking to the job server over HTTP
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unusable configuration, or a [`ValidationError`]
    /// for a blank user ID.
    pub fn with_config(user_id: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let gateway = Arc::new(HttpGateway::new(config)?);
        Self::new(user_id, gateway)
    }

    /// The registered user ID
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The gateway this request talks through
    pub fn gateway(&self) -> &Arc<dyn JobGateway> {
        &self.gateway
    }

    /// Current submission state
    pub fn state(&self) -> SubmitState {
        self.state
    }

    /// Whether the server accepted this request
    pub fn submitted(&self) -> bool {
        self.state == SubmitState::Accepted
    }

    /// Server job ID, once accepted
    pub fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    /// Page where the job can be followed, once accepted
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Why the last submission failed
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Whether every product was complete at the last full status check
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Aggregate job status from the last status check
    pub fn status(&self) -> Option<&JobStatus> {
        self.status.as_ref()
    }

    /// Resolved parameters the server returned on acceptance, in server-native shape
    pub fn sub_ret_data(&self) -> Option<&Map<String, Value>> {
        self.sub_ret_data.as_ref()
    }

    /// Global parameters
    pub fn global_parameters(&self) -> &ParameterSet {
        &self.global
    }

    /// A product, if present
    pub fn product(&self, kind: ProductKind) -> Option<&Product> {
        self.products.get(&kind)
    }

    /// Whether a product of this kind has been added
    pub fn has_product(&self, kind: ProductKind) -> bool {
        self.products.contains_key(&kind)
    }

    /// Kinds of the products in this request, in canonical order
    pub fn product_kinds(&self) -> Vec<ProductKind> {
        self.products.keys().copied().collect()
    }

    /// Every product in this request
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    fn ensure_draft(&self, operation: &str) -> std::result::Result<(), StateError> {
        if self.state == SubmitState::Draft {
            return Ok(());
        }
        Err(StateError::NotDraft {
            operation: operation.to_string(),
            state: self.state.to_string(),
        })
    }

    fn ensure_submitted(&self, operation: &str) -> std::result::Result<JobId, StateError> {
        match (self.state, self.job_id) {
            (SubmitState::Accepted, Some(job_id)) => Ok(job_id),
            _ => Err(StateError::NotSubmitted {
                operation: operation.to_string(),
            }),
        }
    }

    fn product_mut(&mut self, kind: ProductKind) -> Result<&mut Product> {
        self.products
            .get_mut(&kind)
            .ok_or_else(|| Error::product_not_found(kind))
    }

    fn existing_product(&self, kind: ProductKind) -> Result<&Product> {
        self.products.get(&kind).ok_or_else(|| Error::product_not_found(kind))
    }

    /// Kinds named by a selection, checked against this request's products
    fn selected_kinds(&self, what: &Selection) -> Result<Vec<ProductKind>> {
        match what {
            Selection::All => Ok(self.product_kinds()),
            Selection::Only(kinds) => {
                for kind in kinds {
                    self.existing_product(*kind)?;
                }
                let mut kinds = kinds.clone();
                kinds.sort();
                kinds.dedup();
                Ok(kinds)
            }
        }
    }
}

