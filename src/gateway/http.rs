//! HTTP implementation of [`JobGateway`]

use super::{
    CancelDetail, CancelReport, JobGateway, StatusReport, SubmitRequest, SubmitResponse,
};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::results::ArchiveFormat;
use crate::types::{JobId, JobStatus, ProductKind, ProductStatus, Selection};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Name announced to the server on submission
const API_NAME: &str = "xrt_prods";

/// Job gateway talking JSON over HTTP to the job server's scripts
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpGateway {
    /// Create a gateway from a configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid or the HTTP client cannot
    /// be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {}", e),
                key: None,
            })?;
        Ok(Self { client, config })
    }

    /// The configuration this gateway was built from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POST a JSON body to a server script and decode the JSON reply
    async fn post(&self, script: &str, body: &Value) -> Result<Value> {
        let url = self.config.endpoint(script)?;
        debug!(url = %url, "posting to job server");

        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::Protocol(format!(
                "{} returned HTTP {}: {}",
                script,
                status,
                text.trim()
            )));
        }

        serde_json::from_str(text.trim())
            .map_err(|e| Error::Protocol(format!("{} returned invalid JSON: {}", script, e)))
    }

    /// POST and require an object reply with a true `OK` flag
    async fn post_checked(&self, script: &str, body: &Value) -> Result<Map<String, Value>> {
        let reply = into_object(script, self.post(script, body).await?)?;
        match ok_flag(&reply) {
            Some(true) => Ok(reply),
            Some(false) => Err(Error::ServerRejection(error_text(&reply))),
            None => Err(Error::Protocol(format!("{} reply has no OK flag", script))),
        }
    }
}

fn into_object(script: &str, value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::Protocol(format!(
            "{} returned {} where an object was expected",
            script, other
        ))),
    }
}

/// The server encodes success as `1`/`0` or `true`/`false`
fn ok_flag(reply: &Map<String, Value>) -> Option<bool> {
    match reply.get("OK")? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

fn error_text(reply: &Map<String, Value>) -> String {
    reply
        .get("ERROR")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "server gave no explanation".to_string())
}

fn as_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_job_id(value: &Value) -> Option<JobId> {
    match value {
        Value::Number(n) => n.as_u64().map(JobId),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn selection_value(what: &Selection) -> Value {
    match what {
        Selection::All => Value::from("all"),
        Selection::Only(kinds) => kinds.iter().map(|k| Value::from(k.as_str())).collect(),
    }
}

/// Map a per-product object keyed by server flag, skipping keys that are not products
fn by_product<T>(
    script: &str,
    entries: &Map<String, Value>,
    mut parse: impl FnMut(&Map<String, Value>) -> Option<T>,
) -> Result<BTreeMap<ProductKind, T>> {
    let mut out = BTreeMap::new();
    for (key, entry) in entries {
        let Some(kind) = ProductKind::from_server_flag(key) else {
            warn!(script = %script, key = %key, "ignoring unknown product in server reply");
            continue;
        };
        let parsed = entry
            .as_object()
            .and_then(&mut parse)
            .ok_or_else(|| Error::Protocol(format!("{} reply has a malformed entry for {}", script, kind)))?;
        out.insert(kind, parsed);
    }
    Ok(out)
}

fn parse_product_status(entry: &Map<String, Value>) -> Option<ProductStatus> {
    Some(ProductStatus {
        code: as_i32(entry.get("statusCode")?)?,
        text: entry
            .get("statusText")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        progress: entry.get("progress").and_then(Value::as_f64),
    })
}

fn parse_cancel_detail(entry: &Map<String, Value>) -> Option<CancelDetail> {
    Some(CancelDetail {
        code: as_i32(entry.get("code")?)?,
        text: entry
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

#[async_trait]
impl JobGateway for HttpGateway {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse> {
        let script = self.config.endpoints.submit.as_str();
        let mut body = request.parameters;
        body.insert("UserID".into(), Value::from(request.user_id));
        body.insert("api_name".into(), Value::from(API_NAME));
        body.insert("api_version".into(), Value::from(self.config.api_version.clone()));
        body.insert("getAllPars".into(), Value::from(request.return_resolved));

        let reply = into_object(script, self.post(script, &Value::Object(body)).await?)?;
        match ok_flag(&reply) {
            None => Err(Error::Protocol(format!("{} reply has no OK flag", script))),
            Some(false) => Ok(SubmitResponse {
                accepted: false,
                error_message: Some(error_text(&reply)),
                ..Default::default()
            }),
            Some(true) => {
                let job_id = reply
                    .get("JobID")
                    .and_then(parse_job_id)
                    .ok_or_else(|| Error::Protocol(format!("{} accepted the job without a JobID", script)))?;
                let resolved_parameters = match reply.get("jobPars") {
                    None | Some(Value::Null) => None,
                    Some(Value::Object(pars)) => Some(pars.clone()),
                    Some(other) => {
                        return Err(Error::Protocol(format!(
                            "{} returned jobPars as {} instead of an object",
                            script, other
                        )));
                    }
                };
                Ok(SubmitResponse {
                    accepted: true,
                    job_id: Some(job_id),
                    url: reply.get("URL").and_then(Value::as_str).map(str::to_string),
                    resolved_parameters,
                    error_message: None,
                })
            }
        }
    }

    async fn status(&self, job_id: JobId, what: &Selection) -> Result<StatusReport> {
        let script = self.config.endpoints.status.as_str();
        let body = json!({ "JobID": job_id, "what": selection_value(what) });
        let reply = self.post_checked(script, &body).await?;

        let statuses = reply
            .get("statuses")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Protocol(format!("{} reply has no statuses", script)))?;

        let job = match (reply.get("jobStatus").and_then(as_i32), reply.get("jobStatusText")) {
            (Some(code), text) => Some(JobStatus {
                code,
                text: text.and_then(Value::as_str).unwrap_or_default().to_string(),
            }),
            (None, _) => None,
        };

        Ok(StatusReport {
            job,
            products: by_product(script, statuses, parse_product_status)?,
        })
    }

    async fn cancel(&self, job_id: JobId, user_id: &str, what: &Selection) -> Result<CancelReport> {
        let script = self.config.endpoints.cancel.as_str();
        let body = json!({ "JobID": job_id, "UserID": user_id, "what": selection_value(what) });
        let reply = self.post_checked(script, &body).await?;

        let code = reply
            .get("status")
            .and_then(as_i32)
            .ok_or_else(|| Error::Protocol(format!("{} reply has no status code", script)))?;
        let details = match reply.get("details") {
            Some(Value::Object(details)) => by_product(script, details, parse_cancel_detail)?,
            _ => BTreeMap::new(),
        };
        Ok(CancelReport {
            code,
            products: details,
        })
    }

    async fn count_active_jobs(&self, user_id: &str) -> Result<Value> {
        let script = self.config.endpoints.count_jobs.as_str();
        let url = self.config.endpoint(script)?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "UserID": user_id }))
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::Protocol(format!("{} returned HTTP {}", script, status)));
        }

        // the count comes back as a bare number; anything else is passed on for the caller
        // to reject, except an explicit refusal
        let value = serde_json::from_str(text.trim()).unwrap_or_else(|_| Value::from(text.trim()));
        if let Value::Object(ref reply) = value
            && ok_flag(reply) == Some(false)
        {
            return Err(Error::ServerRejection(error_text(reply)));
        }
        Ok(value)
    }

    async fn list_old_jobs(&self, user_id: &str) -> Result<Value> {
        let script = self.config.endpoints.old_jobs.as_str();
        let mut reply = self
            .post_checked(script, &json!({ "UserID": user_id }))
            .await?;
        reply
            .remove("jobs")
            .ok_or_else(|| Error::Protocol(format!("{} reply has no jobs list", script)))
    }

    async fn clone_job(&self, job_id: JobId, user_id: &str) -> Result<Map<String, Value>> {
        let script = self.config.endpoints.clone_job.as_str();
        let body = json!({ "JobID": job_id, "UserID": user_id });
        let mut reply = match self.post_checked(script, &body).await {
            Ok(reply) => reply,
            Err(Error::ServerRejection(message)) => {
                return Err(Error::NotFound(format!("job {}: {}", job_id, message)));
            }
            Err(e) => return Err(e),
        };
        match reply.remove("jobPars") {
            Some(Value::Object(pars)) => Ok(pars),
            _ => Err(Error::Protocol(format!("{} reply has no jobPars object", script))),
        }
    }

    async fn position(&self, job_id: JobId, kind: ProductKind) -> Result<Map<String, Value>> {
        let script = self.config.endpoints.position.as_str();
        let body = json!({ "JobID": job_id, "what": kind.as_str() });
        self.post_checked(script, &body).await
    }

    async fn source_list(&self, job_id: JobId) -> Result<Map<String, Value>> {
        let script = self.config.endpoints.source_list.as_str();
        self.post_checked(script, &json!({ "JobID": job_id })).await
    }

    async fn fetch_archive(
        &self,
        job_id: JobId,
        kind: ProductKind,
        format: ArchiveFormat,
    ) -> Result<Vec<u8>> {
        let archives = self.config.endpoints.archives.trim_end_matches('/');
        let path = format!(
            "{}/{}/{}.{}",
            archives,
            job_id,
            kind.server_flag(),
            format.extension()
        );
        let url = self.config.endpoint(&path)?;
        debug!(url = %url, "fetching product archive");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("no {} archive for job {}", kind, job_id)));
        }
        if !status.is_success() {
            return Err(Error::Protocol(format!(
                "archive download for {} returned HTTP {}",
                kind, status
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
