//! Serialization and the two JSON shapes a request can be read from.
//!
//! The client-native shape keeps global parameters at the top level and nests each
//! product's parameters under its kind name:
//!
//! ```json
//! {"name": "GRB 060729", "RA": 95.37, "LightCurve": {"binMeth": "counts"}}
//! ```
//!
//! The server-native shape is flat. Globals use server names, a product is present when
//! its flag key is truthy, and product parameters are prefixed with that flag:
//!
//! ```json
//! {"name": "GRB 060729", "RA": 95.37, "lc": 1, "lc_binMeth": "counts"}
//! ```

use crate::error::{Error, Result, ValidationError};
use crate::gateway::JobGateway;
use crate::params::ParameterSet;
use crate::product::Product;
use crate::schema::{self, Scope};
use crate::types::ProductKind;
use crate::utils::json_flag;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::ProductRequest;

/// Parameters decoded from the server-native shape, renamed to client names and normalized
#[derive(Debug, Default)]
pub(crate) struct ServerParameters {
    pub(crate) global: Map<String, Value>,
    pub(crate) products: BTreeMap<ProductKind, Map<String, Value>>,
}

/// Decode a flat server-native parameter document
///
/// Keys the schema does not know (job metadata and the like) are skipped. Empty values
/// mean "unset" and are skipped too.
///
/// # Errors
///
/// Returns [`Error::Protocol`] for a known parameter whose value fails validation.
pub(crate) fn decode_server_shape(values: &Map<String, Value>) -> Result<ServerParameters> {
    let mut decoded = ServerParameters::default();
    for kind in ProductKind::ALL {
        if values.get(kind.server_flag()).and_then(json_flag) == Some(true) {
            decoded.products.insert(kind, Map::new());
        }
    }

    for (key, value) in values {
        if value.is_null() || value.as_str() == Some("") {
            continue;
        }
        if ProductKind::from_server_flag(key).is_some() {
            continue;
        }

        let prefixed = ProductKind::ALL.into_iter().find_map(|kind| {
            let rest = key.strip_prefix(kind.server_flag())?.strip_prefix('_')?;
            Some((kind, rest))
        });
        let (scope, server_name) = match prefixed {
            Some((kind, rest)) => (Scope::Product(kind), rest),
            None => (Scope::Global, key.as_str()),
        };

        let Some(spec) = schema::scope_schema(scope).by_server_name(server_name) else {
            warn!(key = %key, "ignoring unrecognized server parameter");
            continue;
        };
        let normalized = spec.coerce(value).map_err(|reason| {
            Error::Protocol(format!("server value for {} '{}': {}", scope, key, reason))
        })?;

        match scope {
            Scope::Global => {
                decoded.global.insert(spec.name.to_string(), normalized);
            }
            Scope::Product(kind) => match decoded.products.get_mut(&kind) {
                Some(params) => {
                    params.insert(spec.name.to_string(), normalized);
                }
                None => debug!(key = %key, "ignoring parameter of a product that was not requested"),
            },
        }
    }
    Ok(decoded)
}

fn decode_client_shape(values: &Map<String, Value>) -> Result<(ParameterSet, BTreeMap<ProductKind, Product>)> {
    let mut global = ParameterSet::new(Scope::Global);
    let mut products = BTreeMap::new();
    let mut global_values = Vec::new();

    for (key, value) in values {
        match key.parse::<ProductKind>() {
            Ok(kind) => {
                let params = value.as_object().ok_or_else(|| {
                    ValidationError::MalformedDocument(format!("'{}' must be an object of parameters", key))
                })?;
                let product = Product::with_parameters(kind, params.iter().map(|(k, v)| (k.clone(), v.clone())))?;
                products.insert(kind, product);
            }
            Err(_) => global_values.push((key.clone(), value.clone())),
        }
    }
    global.set_many(global_values)?;
    Ok((global, products))
}

fn build_from_server(values: &Map<String, Value>) -> Result<(ParameterSet, BTreeMap<ProductKind, Product>)> {
    let decoded = decode_server_shape(values)?;
    let mut global = ParameterSet::new(Scope::Global);
    global.set_many(decoded.global)?;
    global.settle_derived_flags();
    let products = decoded
        .products
        .into_iter()
        .map(|(kind, params)| Ok((kind, Product::with_parameters(kind, params)?)))
        .collect::<Result<_>>()?;
    Ok((global, products))
}

impl ProductRequest {
    /// Serialize the parameters into the client-native shape
    ///
    /// Unset parameters are omitted so that the server applies its own defaults. This
    /// never changes the request and can be called at any point in its lifecycle.
    pub fn serialize(&self) -> Map<String, Value> {
        let mut out = self.global.values().clone();
        for (kind, product) in &self.products {
            out.insert(
                kind.as_str().to_string(),
                Value::Object(product.parameters().values().clone()),
            );
        }
        out
    }

    /// Replace every parameter (global and all products) with the contents of `values`
    ///
    /// `from_server` selects the shape and is never inferred from the content. The new
    /// parameters are fully decoded before anything is replaced.
    ///
    /// # Errors
    ///
    /// - [`StateError::NotDraft`](crate::StateError::NotDraft) after submission
    /// - [`ValidationError`] for client-native documents with bad names or values
    /// - [`Error::Protocol`] for server-native documents with bad values
    pub fn from_json(&mut self, values: &Map<String, Value>, from_server: bool) -> Result<()> {
        self.ensure_draft("replace parameters")?;
        let (global, products) = if from_server {
            build_from_server(values)?
        } else {
            decode_client_shape(values)?
        };
        self.global = global;
        self.products = products;
        debug!(from_server, products = ?self.product_kinds(), "replaced parameters from JSON");
        Ok(())
    }

    /// A caller-held snapshot of this request's identity and parameters
    ///
    /// Restore it with [`restore`](Self::restore). Submission state is not included.
    pub fn snapshot(&self) -> Value {
        json!({
            "userID": self.user_id,
            "parameters": self.serialize(),
        })
    }

    /// Rebuild a Draft request from a [`snapshot`](Self::snapshot)
    ///
    /// # Errors
    ///
    /// [`Error::Serialization`] if the snapshot does not have the expected shape, or any
    /// error from [`new`](Self::new) and [`from_json`](Self::from_json).
    pub fn restore(snapshot: &Value, gateway: Arc<dyn JobGateway>) -> Result<Self> {
        let snapshot = Snapshot::deserialize(snapshot)?;
        let mut request = Self::new(snapshot.user_id, gateway)?;
        request.from_json(&snapshot.parameters, false)?;
        Ok(request)
    }
}

/// The shape written by [`ProductRequest::snapshot`]
#[derive(Deserialize)]
struct Snapshot {
    #[serde(rename = "userID")]
    user_id: String,
    parameters: Map<String, Value>,
}
