//! Shared test helpers: an in-memory gateway and ready-made requests.

use crate::error::{Error, Result};
use crate::gateway::{CancelReport, JobGateway, StatusReport, SubmitRequest, SubmitResponse};
use crate::request::ProductRequest;
use crate::results::ArchiveFormat;
use crate::types::{JobId, ProductKind, Selection};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub(crate) const USER: &str = "someone@example.com";

/// Gateway that records every call and replays canned replies
///
/// A call with no canned reply fails with a protocol error, so a test notices
/// unexpected traffic.
#[derive(Default)]
pub(crate) struct StubGateway {
    calls: Mutex<Vec<String>>,
    submitted: Mutex<Vec<SubmitRequest>>,
    submit: Mutex<Option<SubmitResponse>>,
    submit_fails: Mutex<bool>,
    statuses: Mutex<VecDeque<StatusReport>>,
    cancel: Mutex<Option<CancelReport>>,
    count: Mutex<Option<Value>>,
    old_jobs: Mutex<Option<Value>>,
    stored_jobs: Mutex<HashMap<JobId, Map<String, Value>>>,
    positions: Mutex<HashMap<ProductKind, Map<String, Value>>>,
    source_list: Mutex<Option<Map<String, Value>>>,
    archives: Mutex<HashMap<ProductKind, Vec<u8>>>,
}

impl StubGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Accept submissions with the given job ID
    pub(crate) fn accepting(job_id: u64) -> Self {
        Self::new().with_submit(SubmitResponse {
            accepted: true,
            job_id: Some(JobId(job_id)),
            url: Some(format!("https://example.org/tprods/{}", job_id)),
            ..Default::default()
        })
    }

    pub(crate) fn with_submit(self, reply: SubmitResponse) -> Self {
        *self.submit.lock().unwrap() = Some(reply);
        self
    }

    pub(crate) fn failing_submit(self) -> Self {
        *self.submit_fails.lock().unwrap() = true;
        self
    }

    /// Queue a status reply; replies are consumed in order
    pub(crate) fn with_status(self, report: StatusReport) -> Self {
        self.statuses.lock().unwrap().push_back(report);
        self
    }

    pub(crate) fn with_cancel(self, report: CancelReport) -> Self {
        *self.cancel.lock().unwrap() = Some(report);
        self
    }

    pub(crate) fn with_count(self, reply: Value) -> Self {
        *self.count.lock().unwrap() = Some(reply);
        self
    }

    pub(crate) fn with_old_jobs(self, reply: Value) -> Self {
        *self.old_jobs.lock().unwrap() = Some(reply);
        self
    }

    pub(crate) fn with_stored_job(self, job_id: u64, pars: Value) -> Self {
        let pars = pars.as_object().cloned().unwrap();
        self.stored_jobs.lock().unwrap().insert(JobId(job_id), pars);
        self
    }

    pub(crate) fn with_position(self, kind: ProductKind, reply: Value) -> Self {
        let reply = reply.as_object().cloned().unwrap();
        self.positions.lock().unwrap().insert(kind, reply);
        self
    }

    pub(crate) fn with_source_list(self, reply: Value) -> Self {
        *self.source_list.lock().unwrap() = reply.as_object().cloned();
        self
    }

    pub(crate) fn with_archive(self, kind: ProductKind, bytes: &[u8]) -> Self {
        self.archives.lock().unwrap().insert(kind, bytes.to_vec());
        self
    }

    /// Names of the gateway methods called so far, in order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Every submission received
    pub(crate) fn submissions(&self) -> Vec<SubmitRequest> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

fn no_reply(what: &str) -> Error {
    Error::Protocol(format!("stub gateway has no {} reply", what))
}

#[async_trait]
impl JobGateway for StubGateway {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse> {
        self.record("submit");
        self.submitted.lock().unwrap().push(request);
        if *self.submit_fails.lock().unwrap() {
            return Err(Error::Protocol("connection reset".into()));
        }
        self.submit.lock().unwrap().clone().ok_or_else(|| no_reply("submit"))
    }

    async fn status(&self, job_id: JobId, what: &Selection) -> Result<StatusReport> {
        self.record(format!("status {} {:?}", job_id, what));
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| no_reply("status"))
    }

    async fn cancel(&self, job_id: JobId, _user_id: &str, what: &Selection) -> Result<CancelReport> {
        self.record(format!("cancel {} {:?}", job_id, what));
        self.cancel.lock().unwrap().clone().ok_or_else(|| no_reply("cancel"))
    }

    async fn count_active_jobs(&self, _user_id: &str) -> Result<Value> {
        self.record("count_active_jobs");
        self.count.lock().unwrap().clone().ok_or_else(|| no_reply("count"))
    }

    async fn list_old_jobs(&self, _user_id: &str) -> Result<Value> {
        self.record("list_old_jobs");
        self.old_jobs
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| no_reply("old jobs"))
    }

    async fn clone_job(&self, job_id: JobId, _user_id: &str) -> Result<Map<String, Value>> {
        self.record(format!("clone_job {}", job_id));
        self.stored_jobs
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("job {}: no such job", job_id)))
    }

    async fn position(&self, job_id: JobId, kind: ProductKind) -> Result<Map<String, Value>> {
        self.record(format!("position {} {}", job_id, kind));
        self.positions
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .ok_or_else(|| no_reply("position"))
    }

    async fn source_list(&self, job_id: JobId) -> Result<Map<String, Value>> {
        self.record(format!("source_list {}", job_id));
        self.source_list
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| no_reply("source list"))
    }

    async fn fetch_archive(
        &self,
        job_id: JobId,
        kind: ProductKind,
        format: ArchiveFormat,
    ) -> Result<Vec<u8>> {
        self.record(format!("fetch_archive {} {} {}", job_id, kind, format.extension()));
        self.archives
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no {} archive", kind)))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Global parameters that satisfy every global requirement
pub(crate) fn valid_globals() -> Vec<(&'static str, Value)> {
    vec![
        ("name", json!("GRB 060729")),
        ("targ", json!("00221755")),
        ("T0", json!(175892061.0)),
        ("RA", json!(95.37)),
        ("Dec", json!(-62.37)),
    ]
}

/// Complete light-curve parameters
pub(crate) fn light_curve_pars() -> Vec<(&'static str, Value)> {
    vec![
        ("binMeth", json!("counts")),
        ("pcCounts", json!(20)),
        ("wtCounts", json!(30)),
        ("dynamic", json!(true)),
    ]
}

/// Complete spectrum parameters
pub(crate) fn spectrum_pars() -> Vec<(&'static str, Value)> {
    vec![("hasRedshift", json!(false)), ("timeslice", json!("single"))]
}

/// A draft request holding valid globals and nothing else
pub(crate) fn draft_with(gateway: Arc<StubGateway>) -> ProductRequest {
    let mut request = ProductRequest::new(USER, gateway).unwrap();
    request.set_global_parameters(valid_globals()).unwrap();
    request
}

/// A request with the given products, submitted and accepted as job 42
///
/// Position products and images are given enough parameters to pass validation.
pub(crate) async fn submitted_with(
    kinds: &[ProductKind],
    gateway: StubGateway,
) -> (ProductRequest, Arc<StubGateway>) {
    let gateway = Arc::new(gateway.with_submit(SubmitResponse {
        accepted: true,
        job_id: Some(JobId(42)),
        url: Some("https://example.org/tprods/42".into()),
        ..Default::default()
    }));
    let mut request = draft_with(gateway.clone());
    for kind in kinds {
        let pars = match kind {
            ProductKind::LightCurve => light_curve_pars(),
            ProductKind::Spectrum => spectrum_pars(),
            ProductKind::Image => vec![("energies", json!("0.3-10"))],
            ProductKind::SourceDet => vec![("whichBands", json!("all"))],
            _ => vec![],
        };
        request.add_product(*kind, pars, false).unwrap();
    }
    request.submit().await.unwrap();
    (request, gateway)
}
