use super::*;
use crate::error::Error;
use crate::gateway::{CancelDetail, CancelReport, StatusReport, SubmitResponse};
use crate::params::ParamQuery;
use crate::resolver::StaticResolver;
use crate::results::{ArchiveFormat, CancelStatus, DownloadOptions, EnergyBand, PositionResult};
use crate::test_helpers::{
    StubGateway, USER, draft_with, light_curve_pars, spectrum_pars, submitted_with, valid_globals,
};
use crate::types::{ProductStatus, STATUS_COMPLETE, STATUS_NOT_REPORTED, Selection};
use serde_json::json;

mod submit;

fn status(code: i32, text: &str) -> ProductStatus {
    ProductStatus {
        code,
        text: text.to_string(),
        progress: None,
    }
}

fn complete() -> ProductStatus {
    ProductStatus {
        code: STATUS_COMPLETE,
        text: "Complete".to_string(),
        progress: Some(100.0),
    }
}

fn report(entries: &[(ProductKind, ProductStatus)]) -> StatusReport {
    StatusReport {
        job: None,
        products: entries.iter().cloned().collect(),
    }
}

fn is_state_error(err: &Error) -> bool {
    matches!(err, Error::State(_))
}
