//! Validation and the one-shot submission of a request.

use crate::error::{Error, Result, ValidationError};
use crate::gateway::{SubmitRequest, SubmitResponse};
use crate::schema::Scope;
use crate::types::JobId;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::wire::decode_server_shape;
use super::{ProductRequest, SubmitState};

/// Every problem found by [`ProductRequest::is_valid`]
///
/// Validation is structural: a valid request has everything the server needs, but the
/// server may still reject it on domain grounds (an impossible coordinate, say).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// One line per problem, naming the scope and parameter
    pub problems: Vec<String>,
}

impl ValidationReport {
    /// Whether no problems were found
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    /// All problems, one per line (empty when valid)
    pub fn explanation(&self) -> String {
        self.problems.join("\n")
    }

    /// The `(ok, explanation)` pair
    pub fn into_parts(self) -> (bool, String) {
        (self.is_ok(), self.explanation())
    }
}

/// Options for [`ProductRequest::submit_with`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Ask the server for every resolved and defaulted parameter, and fold them back into
    /// the request (default: true)
    pub return_resolved_parameters: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            return_resolved_parameters: true,
        }
    }
}

impl ProductRequest {
    /// Check the whole request: global parameters and every product
    ///
    /// Every failure is collected, not just the first.
    pub fn is_valid(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.products.is_empty() {
            report.problems.push("no products have been added".to_string());
        }
        self.check_global(&mut report);
        for kind in self.products.keys() {
            self.check_product(Scope::Product(*kind), &mut report);
        }
        report
    }

    /// Check a single scope
    ///
    /// A product scope that is not in the request is reported as a problem.
    pub fn is_valid_in(&self, scope: Scope) -> ValidationReport {
        let mut report = ValidationReport::default();
        match scope {
            Scope::Global => self.check_global(&mut report),
            Scope::Product(_) => self.check_product(scope, &mut report),
        }
        report
    }

    fn check_global(&self, report: &mut ValidationReport) {
        let kinds = self.product_kinds();
        for name in self.global.missing(&kinds) {
            report
                .problems
                .push(format!("global parameter '{}' is required", name));
        }
        for violation in self.global.joint_violations() {
            report.problems.push(format!("global: {}", violation));
        }
    }

    fn check_product(&self, scope: Scope, report: &mut ValidationReport) {
        let Scope::Product(kind) = scope else {
            return;
        };
        let Some(product) = self.products.get(&kind) else {
            report
                .problems
                .push(format!("no {} product in this request", kind));
            return;
        };
        for name in product.missing_parameters() {
            report
                .problems
                .push(format!("{} parameter '{}' is required", kind, name));
        }
        for violation in product.parameters().joint_violations() {
            report.problems.push(format!("{}: {}", kind, violation));
        }
    }

    /// Submit with default options
    ///
    /// # Errors
    ///
    /// As for [`submit_with`](Self::submit_with).
    pub async fn submit(&mut self) -> Result<JobId> {
        self.submit_with(SubmitOptions::default()).await
    }

    /// Validate, serialize and submit the request
    ///
    /// Submission happens at most once. On acceptance the job ID and URL are recorded
    /// and, unless opted out, the server's resolved parameters are folded back into the
    /// request (values the caller never set are marked auto-filled). On rejection the
    /// server's explanation is kept in [`submit_error`](Self::submit_error); the request
    /// cannot be sent again, but [`redraft`](Self::redraft) gives a fresh copy to fix.
    ///
    /// # Errors
    ///
    /// - [`StateError::NotDraft`](crate::StateError::NotDraft) if already submitted
    /// - [`ValidationError::Incomplete`] listing every problem; nothing is sent
    /// - [`Error::ServerRejection`] with the server's explanation
    /// - transport errors, which also leave the request Rejected
    /// - [`Error::Protocol`] if the resolved parameters cannot be read; the request is
    ///   still Accepted and keeps its job ID
    ///
    /// # Cancel safety
    ///
    /// Not cancel safe. If the future is dropped while the gateway call is in flight, the
    /// request stays [`SubmitState::Submitting`]: the server may or may not have created a
    /// job, so it can be neither resent nor polled. [`redraft`](Self::redraft) still
    /// gives a fresh Draft with the same parameters.
    pub async fn submit_with(&mut self, options: SubmitOptions) -> Result<JobId> {
        self.ensure_draft("submit")?;
        let report = self.is_valid();
        if !report.is_ok() {
            return Err(ValidationError::Incomplete(report.explanation()).into());
        }

        self.state = SubmitState::Submitting;
        let request = SubmitRequest {
            user_id: self.user_id.clone(),
            parameters: self.serialize(),
            return_resolved: options.return_resolved_parameters,
        };
        info!(gateway = self.gateway.name(), products = ?self.product_kinds(), "submitting request");

        let response = match self.gateway.submit(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "submission failed in transport");
                self.reject(e.to_string());
                return Err(e);
            }
        };
        self.accept(response)
    }

    fn reject(&mut self, message: String) {
        self.state = SubmitState::Rejected;
        self.submit_error = Some(message);
    }

    fn accept(&mut self, response: SubmitResponse) -> Result<JobId> {
        if !response.accepted {
            let message = response
                .error_message
                .unwrap_or_else(|| "the server gave no reason".to_string());
            info!(error = %message, "request rejected by server");
            self.reject(message.clone());
            return Err(Error::ServerRejection(message));
        }

        let Some(job_id) = response.job_id else {
            let message = "server accepted the request without a job ID".to_string();
            self.reject(message.clone());
            return Err(Error::Protocol(message));
        };

        self.state = SubmitState::Accepted;
        self.job_id = Some(job_id);
        self.url = response.url;
        info!(job_id = %job_id, url = ?self.url, "request accepted");

        if let Some(resolved) = response.resolved_parameters {
            self.sub_ret_data = Some(resolved.clone());
            self.fold_resolved(&resolved)?;
        }
        Ok(job_id)
    }

    /// Merge server-resolved parameters into the request
    fn fold_resolved(&mut self, resolved: &Map<String, Value>) -> Result<()> {
        let decoded = decode_server_shape(resolved)?;
        for (name, value) in decoded.global {
            self.global.fold_resolved(&name, value);
        }
        let settled = self.global.settle_derived_flags();
        if !settled.is_empty() {
            debug!(flags = ?settled, "cleared derive flags for resolved values");
        }
        for (kind, params) in decoded.products {
            let Some(product) = self.products.get_mut(&kind) else {
                debug!(product = %kind, "ignoring resolved parameters of a product that was not requested");
                continue;
            };
            for (name, value) in params {
                product.parameters_mut().fold_resolved(&name, value);
            }
        }
        debug!(job_id = ?self.job_id, "folded resolved parameters");
        Ok(())
    }
}
