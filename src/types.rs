//! Core types for xrt-prods

use serde::{Deserialize, Serialize};

/// Server-assigned identifier for a submitted job
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Create a new JobId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<JobId> for u64 {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl PartialEq<u64> for JobId {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// The closed set of products a request can contain
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    /// Light curve
    LightCurve,
    /// Spectrum
    Spectrum,
    /// Standard position
    StandardPos,
    /// Enhanced position (UVOT-aided astrometry)
    EnhancedPos,
    /// Astrometric position (field-source cross-correlation)
    AstromPos,
    /// Image
    Image,
    /// Source detection
    SourceDet,
}

impl ProductKind {
    /// All product kinds, in serialization order
    pub const ALL: [ProductKind; 7] = [
        ProductKind::LightCurve,
        ProductKind::Spectrum,
        ProductKind::StandardPos,
        ProductKind::EnhancedPos,
        ProductKind::AstromPos,
        ProductKind::Image,
        ProductKind::SourceDet,
    ];

    /// Client-side name, as used in accessors and the client-native JSON shape
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::LightCurve => "LightCurve",
            ProductKind::Spectrum => "Spectrum",
            ProductKind::StandardPos => "StandardPos",
            ProductKind::EnhancedPos => "EnhancedPos",
            ProductKind::AstromPos => "AstromPos",
            ProductKind::Image => "Image",
            ProductKind::SourceDet => "SourceDet",
        }
    }

    /// Server-side flag key, also used as prefix for server-native parameter names
    /// and as the archive file name
    pub fn server_flag(&self) -> &'static str {
        match self {
            ProductKind::LightCurve => "lc",
            ProductKind::Spectrum => "spec",
            ProductKind::StandardPos => "psf",
            ProductKind::EnhancedPos => "enh",
            ProductKind::AstromPos => "xastrom",
            ProductKind::Image => "image",
            ProductKind::SourceDet => "sourceDet",
        }
    }

    /// Look up a kind by its server flag key
    pub fn from_server_flag(flag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.server_flag() == flag)
    }

    /// Whether this kind is one of the three position products
    pub fn is_position(&self) -> bool {
        matches!(
            self,
            ProductKind::StandardPos | ProductKind::EnhancedPos | ProductKind::AstromPos
        )
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown product kind '{}'", s))
    }
}

/// Which products an operation applies to
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every product in the request
    #[default]
    All,
    /// Only the named products
    Only(Vec<ProductKind>),
}

impl Selection {
    /// Whether this selects every product
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl From<ProductKind> for Selection {
    fn from(kind: ProductKind) -> Self {
        Selection::Only(vec![kind])
    }
}

impl From<Vec<ProductKind>> for Selection {
    fn from(kinds: Vec<ProductKind>) -> Self {
        Selection::Only(kinds)
    }
}

impl From<&[ProductKind]> for Selection {
    fn from(kinds: &[ProductKind]) -> Self {
        Selection::Only(kinds.to_vec())
    }
}

/// Status code meaning the server did not report on the product in this cycle
pub const STATUS_NOT_REPORTED: i32 = -10;

/// Status code meaning the product is complete
pub const STATUS_COMPLETE: i32 = 4;

/// Last known server-side status of one product
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductStatus {
    /// Server status code (`-10` = not yet reported, `4` = complete, negative = failed)
    pub code: i32,
    /// Human-readable status text
    pub text: String,
    /// Progress reported by the server, in percent
    #[serde(default)]
    pub progress: Option<f64>,
}

impl ProductStatus {
    /// Status of a product the server has not reported on
    pub fn not_reported() -> Self {
        Self {
            code: STATUS_NOT_REPORTED,
            text: "Not yet reported by server".to_string(),
            progress: None,
        }
    }

    /// Whether the product finished successfully
    pub fn is_complete(&self) -> bool {
        self.code == STATUS_COMPLETE
    }

    /// Whether the server has reported on this product
    pub fn is_reported(&self) -> bool {
        self.code != STATUS_NOT_REPORTED
    }

    /// Whether the product has stopped (completed or failed)
    pub fn is_terminal(&self) -> bool {
        self.is_complete() || (self.code < 0 && self.is_reported())
    }
}

impl Default for ProductStatus {
    fn default() -> Self {
        Self::not_reported()
    }
}

/// Aggregate job status, as last reported by the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Server status code for the whole job
    pub code: i32,
    /// Human-readable status text
    pub text: String,
}
