//! Result types for completed jobs: positions, source lists, cancellations and downloads

use crate::error::{Error, Result};
use crate::gateway::CancelDetail;
use crate::types::ProductKind;
use crate::utils::json_flag;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A position measured by one of the position products
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Right ascension, decimal degrees (J2000)
    pub ra: f64,
    /// Declination, decimal degrees (J2000)
    pub dec: f64,
    /// 90% confidence radius, arcseconds
    pub err90: f64,
    /// Whether the position was taken from the SXPS catalogue rather than computed
    pub from_sxps: bool,
    /// Catalogue the position (or its astrometric correction) came from
    pub catalogue: Option<String>,
    /// Observations the position was derived from
    pub obs_used: Option<String>,
}

/// Outcome of a position product: a position, or the reason there is none
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PositionResult {
    /// The server produced a position
    Found(Position),
    /// No position could be produced
    NotFound {
        /// The server's explanation
        reason: String,
    },
}

impl PositionResult {
    /// The position, if one was found
    pub fn position(&self) -> Option<&Position> {
        match self {
            PositionResult::Found(pos) => Some(pos),
            PositionResult::NotFound { .. } => None,
        }
    }
}

/// Energy bands reported by source detection
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnergyBand {
    /// 0.3-10 keV
    Total,
    /// 0.3-1 keV
    Soft,
    /// 1-2 keV
    Medium,
    /// 2-10 keV
    Hard,
}

impl EnergyBand {
    /// Every band, in reporting order
    pub const ALL: [EnergyBand; 4] = [
        EnergyBand::Total,
        EnergyBand::Soft,
        EnergyBand::Medium,
        EnergyBand::Hard,
    ];

    /// Key used by the server
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyBand::Total => "Total",
            EnergyBand::Soft => "Soft",
            EnergyBand::Medium => "Medium",
            EnergyBand::Hard => "Hard",
        }
    }
}

/// One detected source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Source number within the band
    #[serde(rename = "ID")]
    pub id: u32,
    /// Right ascension, decimal degrees
    #[serde(rename = "RA")]
    pub ra: f64,
    /// Declination, decimal degrees
    #[serde(rename = "Dec")]
    pub dec: f64,
    /// 90% confidence radius, arcseconds
    #[serde(rename = "Err90")]
    pub err90: f64,
    /// Count rate, counts/s
    #[serde(rename = "Rate")]
    pub rate: f64,
    /// Count-rate uncertainty
    #[serde(rename = "RateErr", default)]
    pub rate_err: Option<f64>,
    /// Detection quality flag
    #[serde(rename = "DetFlag", default)]
    pub det_flag: Option<i32>,
    /// Any further columns the server returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Detected sources per energy band; bands the server did not report are absent
pub type SourceList = BTreeMap<EnergyBand, Vec<SourceRecord>>;

/// Aggregate outcome of a cancellation, as defined by the server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelStatus {
    /// Transport or protocol error on the server side (-1)
    Error,
    /// Every cancellation was rejected (0)
    AllRejected,
    /// Every product was cancelled (1)
    Success,
    /// Some products were cancelled, some were not (2)
    Partial,
}

impl CancelStatus {
    /// Map the server's aggregate code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(CancelStatus::Error),
            0 => Some(CancelStatus::AllRejected),
            1 => Some(CancelStatus::Success),
            2 => Some(CancelStatus::Partial),
            _ => None,
        }
    }

    /// The server's aggregate code
    pub fn code(&self) -> i32 {
        match self {
            CancelStatus::Error => -1,
            CancelStatus::AllRejected => 0,
            CancelStatus::Success => 1,
            CancelStatus::Partial => 2,
        }
    }
}

/// Result of cancelling products
#[derive(Clone, Debug, PartialEq)]
pub struct CancelOutcome {
    /// Aggregate status
    pub status: CancelStatus,
    /// Per-product breakdown
    pub products: BTreeMap<ProductKind, CancelDetail>,
}

impl CancelOutcome {
    /// Whether a given product was cancelled
    pub fn cancelled(&self, kind: ProductKind) -> bool {
        self.products.get(&kind).is_some_and(|d| d.code == 1)
    }
}

/// Archive format for product downloads
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// Gzipped tarball
    #[default]
    TarGz,
    /// Zip archive
    Zip,
}

impl ArchiveFormat {
    /// File extension, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

impl std::str::FromStr for ArchiveFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.') {
            "tar.gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            "zip" => Ok(ArchiveFormat::Zip),
            other => Err(format!("unsupported archive format '{}'", other)),
        }
    }
}

/// Options for [`ProductRequest::download_products`](crate::ProductRequest::download_products)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Archive format
    pub format: ArchiveFormat,
    /// Overwrite existing files instead of reporting them as errors
    pub clobber: bool,
    /// Prefix for the saved file names
    pub stem: Option<String>,
}

/// Per-product outcome of a download call: a saved path, or why it failed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DownloadReport {
    /// Outcome for every product the call attempted
    pub results: BTreeMap<ProductKind, std::result::Result<PathBuf, String>>,
}

impl DownloadReport {
    /// Paths of the archives that were saved
    pub fn saved(&self) -> impl Iterator<Item = (ProductKind, &PathBuf)> {
        self.results
            .iter()
            .filter_map(|(kind, r)| r.as_ref().ok().map(|p| (*kind, p)))
    }

    /// Products that failed, with their error
    pub fn failed(&self) -> impl Iterator<Item = (ProductKind, &str)> {
        self.results
            .iter()
            .filter_map(|(kind, r)| r.as_ref().err().map(|e| (*kind, e.as_str())))
    }

    /// Whether every attempted product was saved
    pub fn all_saved(&self) -> bool {
        self.results.values().all(|r| r.is_ok())
    }
}

fn number(reply: &Map<String, Value>, key: &str) -> Option<f64> {
    match reply.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(reply: &Map<String, Value>, key: &str) -> Option<bool> {
    reply.get(key).and_then(json_flag)
}

/// Decode a position reply
pub(crate) fn parse_position(kind: ProductKind, reply: &Map<String, Value>) -> Result<PositionResult> {
    let got = flag(reply, "GotPos")
        .ok_or_else(|| Error::Protocol(format!("{} reply has no GotPos flag", kind)))?;
    if !got {
        let reason = reply
            .get("Reason")
            .and_then(Value::as_str)
            .unwrap_or("no reason given")
            .to_string();
        return Ok(PositionResult::NotFound { reason });
    }

    let field = |key: &str| {
        number(reply, key)
            .ok_or_else(|| Error::Protocol(format!("{} reply has no valid {}", kind, key)))
    };
    Ok(PositionResult::Found(Position {
        ra: field("RA")?,
        dec: field("Dec")?,
        err90: field("Err90")?,
        from_sxps: flag(reply, "FromSXPS").unwrap_or(false),
        catalogue: reply
            .get("Catalogue")
            .and_then(Value::as_str)
            .map(str::to_string),
        obs_used: reply.get("ObsUsed").and_then(Value::as_str).map(str::to_string),
    }))
}

/// Decode a source-list reply; bands absent from the reply are absent from the result
pub(crate) fn parse_source_list(reply: &Map<String, Value>) -> Result<SourceList> {
    let mut list = SourceList::new();
    for band in EnergyBand::ALL {
        let Some(entries) = reply.get(band.as_str()) else {
            continue;
        };
        let records: Vec<SourceRecord> = serde_json::from_value(entries.clone()).map_err(|e| {
            Error::Protocol(format!("malformed {} source list: {}", band.as_str(), e))
        })?;
        list.insert(band, records);
    }
    Ok(list)
}
