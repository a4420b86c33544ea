//! Post-submission lifecycle: status polling, cancellation and cloning previous jobs.

use crate::error::{Error, Result, StateError};
use crate::gateway::JobGateway;
use crate::results::{CancelOutcome, CancelStatus};
use crate::types::{JobId, ProductKind, ProductStatus, Selection};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ProductRequest, SubmitState};

impl ProductRequest {
    /// Poll the server for the status of some or all products
    ///
    /// Each selected product's status is replaced with the server's report. A product the
    /// server did not mention gets the "not reported" code (`-10`), which means "ask
    /// again", not failure. Only a check of every product recomputes the aggregate
    /// completion flag, which is returned.
    ///
    /// # Errors
    ///
    /// [`StateError::NotSubmitted`] before acceptance, `NotFound` for a product not in the
    /// request, or the gateway's error (statuses are then left untouched).
    pub async fn check_status(&mut self, what: impl Into<Selection>) -> Result<bool> {
        let job_id = self.ensure_submitted("check status")?;
        let what = what.into();
        let kinds = self.selected_kinds(&what)?;

        let report = self.gateway.status(job_id, &what).await?;

        for kind in report.products.keys() {
            if !self.products.contains_key(kind) {
                warn!(job_id = %job_id, product = %kind, "status reported for a product not in the request");
            }
        }
        for kind in &kinds {
            let status = match report.products.get(kind) {
                Some(status) => status.clone(),
                None => {
                    debug!(job_id = %job_id, product = %kind, "no status reported this cycle");
                    ProductStatus::not_reported()
                }
            };
            if let Some(product) = self.products.get_mut(kind) {
                product.set_status(status);
            }
        }
        if let Some(job) = report.job {
            self.status = Some(job);
        }
        if what.is_all() {
            self.complete = !self.products.is_empty() && self.products.values().all(|p| p.is_complete());
        }

        debug!(job_id = %job_id, complete = self.complete, "checked status");
        Ok(self.complete)
    }

    /// Cancel some or all products
    ///
    /// Partial success is an ordinary outcome: check [`CancelOutcome::status`] and the
    /// per-product breakdown.
    ///
    /// # Errors
    ///
    /// - [`StateError::NotSubmitted`] before acceptance
    /// - [`StateError::AlreadyComplete`] naming every selected product that has already
    ///   completed, or every product when all of them have; nothing is sent
    /// - `NotFound` for a product not in the request
    /// - [`Error::Protocol`] for an aggregate code outside the server's contract
    pub async fn cancel_products(&mut self, what: impl Into<Selection>) -> Result<CancelOutcome> {
        let job_id = self.ensure_submitted("cancel products")?;
        let what = what.into();
        let kinds = self.selected_kinds(&what)?;

        let finished: Vec<ProductKind> = kinds
            .iter()
            .copied()
            .filter(|kind| self.products.get(kind).is_some_and(|p| p.is_complete()))
            .collect();
        // "all" is refused only once every product has completed
        let refuse = match &what {
            Selection::All => self.complete || (!kinds.is_empty() && finished.len() == kinds.len()),
            Selection::Only(_) => !finished.is_empty(),
        };
        if refuse {
            let names = finished.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ");
            return Err(StateError::AlreadyComplete { job_id, what: names }.into());
        }

        let report = self.gateway.cancel(job_id, &self.user_id, &what).await?;
        let status = CancelStatus::from_code(report.code)
            .ok_or_else(|| Error::Protocol(format!("unknown cancellation status {}", report.code)))?;

        info!(job_id = %job_id, status = ?status, "cancellation finished");
        Ok(CancelOutcome {
            status,
            products: report.products,
        })
    }

    /// Replace this Draft's parameters with those of a previous job of the same user
    ///
    /// With `become_job` the request takes over the old job: it is marked Accepted with
    /// `old_job_id` and can only be polled and retrieved from. Otherwise it stays a Draft
    /// that can be changed and submitted as a new job.
    ///
    /// # Errors
    ///
    /// [`StateError::NotDraft`] after submission, `NotFound` if the job does not exist or
    /// belongs to someone else, or an error decoding the stored parameters.
    pub async fn clone_from_completed_job(&mut self, old_job_id: JobId, become_job: bool) -> Result<()> {
        self.ensure_draft("clone a previous job")?;
        let stored = self.gateway.clone_job(old_job_id, &self.user_id).await?;
        self.from_json(&stored, true)?;

        if become_job {
            self.state = SubmitState::Accepted;
            self.job_id = Some(old_job_id);
            self.sub_ret_data = Some(stored);
        }
        info!(job_id = %old_job_id, become_job, "cloned previous job");
        Ok(())
    }

    /// Build a request from a previous job of the user
    ///
    /// # Errors
    ///
    /// As for [`clone_from_completed_job`](Self::clone_from_completed_job).
    pub async fn from_completed_job(
        user_id: impl Into<String>,
        gateway: Arc<dyn JobGateway>,
        old_job_id: JobId,
        become_job: bool,
    ) -> Result<Self> {
        let mut request = Self::new(user_id, gateway)?;
        request.clone_from_completed_job(old_job_id, become_job).await?;
        Ok(request)
    }
}
