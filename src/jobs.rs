//! Cross-job queries: active job count and previous jobs of a user
//!
//! These are stateless functions of the user ID, not tied to any
//! [`ProductRequest`](crate::ProductRequest). The job count exists so that callers can
//! throttle themselves against the server's admission limits.

use crate::error::{Error, Result};
use crate::gateway::JobGateway;
use crate::schema::parse_calendar;
use crate::types::{JobId, ProductKind};
use crate::utils::json_flag;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// One previously submitted job
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OldJob {
    /// Server job ID
    pub job_id: JobId,
    /// Object name the job was submitted under
    pub name: String,
    /// Submission time (UTC)
    pub date_submitted: NaiveDateTime,
    /// Which products the job requested
    pub products: BTreeMap<ProductKind, bool>,
    /// Whether any product output is still held on the server
    pub has_prod: bool,
}

/// Number of jobs the user has queued or running
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the server's reply is not a single non-negative integer.
pub async fn count_active_jobs(gateway: &dyn JobGateway, user_id: &str) -> Result<u64> {
    let reply = gateway.count_active_jobs(user_id).await?;
    let count = match &reply {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::Protocol(format!("job count is not an integer: {}", reply)))?;

    debug!(count, "active jobs");
    Ok(count)
}

/// Previous jobs of the user, most recent first
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the listing or any entry is malformed.
pub async fn list_old_jobs(gateway: &dyn JobGateway, user_id: &str) -> Result<Vec<OldJob>> {
    let reply = gateway.list_old_jobs(user_id).await?;
    let entries = match reply {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        other => {
            return Err(Error::Protocol(format!(
                "old job listing is not an array: {}",
                other
            )));
        }
    };

    let mut jobs = entries
        .iter()
        .map(|entry| {
            entry
                .as_object()
                .ok_or_else(|| Error::Protocol(format!("old job entry is not an object: {}", entry)))
                .and_then(parse_old_job)
        })
        .collect::<Result<Vec<_>>>()?;
    jobs.sort_by(|a, b| b.date_submitted.cmp(&a.date_submitted));

    debug!(count = jobs.len(), "listed old jobs");
    Ok(jobs)
}

fn parse_old_job(entry: &Map<String, Value>) -> Result<OldJob> {
    let job_id = match entry.get("JobID") {
        Some(Value::Number(n)) => n.as_u64().map(JobId),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::Protocol("old job entry has no valid JobID".to_string()))?;

    let date_submitted = entry
        .get("DateSubmitted")
        .and_then(Value::as_str)
        .and_then(parse_calendar)
        .ok_or_else(|| Error::Protocol(format!("job {} has no valid DateSubmitted", job_id)))?;

    let products = ProductKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let flag = entry.get(kind.server_flag()).and_then(json_flag)?;
            Some((kind, flag))
        })
        .collect();

    Ok(OldJob {
        job_id,
        name: entry
            .get("Name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        date_submitted,
        products,
        has_prod: entry.get("hasProd").and_then(json_flag).unwrap_or(false),
    })
}
