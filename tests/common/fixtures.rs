//! Parameter fixtures and canned server replies

use serde_json::{Value, json};

pub const USER: &str = "someone@example.com";

/// Global parameters for GRB 060729
pub fn grb_globals() -> Vec<(&'static str, Value)> {
    vec![
        ("name", json!("GRB 060729")),
        ("targ", json!("00221755")),
        ("T0", json!("2006-07-29 19:12:29")),
        ("RA", json!("06:21:31.8")),
        ("Dec", json!("-62:22:12")),
    ]
}

/// Counts-binned light curve
pub fn light_curve() -> Vec<(&'static str, Value)> {
    vec![
        ("binMeth", json!("counts")),
        ("pcCounts", json!(20)),
        ("wtCounts", json!(30)),
        ("dynamic", json!(true)),
    ]
}

/// Single time-averaged spectrum without redshift
pub fn spectrum() -> Vec<(&'static str, Value)> {
    vec![("hasRedshift", json!(false)), ("timeslice", json!("single"))]
}

/// A successful submission reply for the given job
pub fn accepted(job_id: u64) -> Value {
    json!({
        "OK": 1,
        "JobID": job_id,
        "URL": format!("https://example.org/tprods/USERPROD_{}", job_id),
    })
}

/// A status reply: `(server flag, status code)` per product
pub fn statuses(entries: &[(&str, i32)]) -> Value {
    let statuses: serde_json::Map<String, Value> = entries
        .iter()
        .map(|(flag, code)| {
            let text = match *code {
                4 => "Complete",
                -10 => "Not reported",
                c if c < 0 => "Failed",
                _ => "Running",
            };
            (
                flag.to_string(),
                json!({"statusCode": code, "statusText": text}),
            )
        })
        .collect();
    json!({"OK": 1, "jobStatus": 2, "jobStatusText": "Running", "statuses": statuses})
}
