//! A single product within a request: its parameters and its last known status

use crate::error::ValidationError;
use crate::params::{ParamQuery, ParameterSet};
use crate::schema::Scope;
use crate::types::{ProductKind, ProductStatus};
use serde_json::{Map, Value};

/// One sub-product of a request
///
/// Products are owned by exactly one [`ProductRequest`](crate::ProductRequest); their
/// parameters can be copied (never shared) into a product of the same kind elsewhere.
#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    kind: ProductKind,
    parameters: ParameterSet,
    status: ProductStatus,
}

impl Product {
    /// Create a product with no parameters set
    pub fn new(kind: ProductKind) -> Self {
        Self {
            kind,
            parameters: ParameterSet::new(Scope::Product(kind)),
            status: ProductStatus::not_reported(),
        }
    }

    /// Create a product and set its initial parameters
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] among `values`.
    pub fn with_parameters<I, K>(kind: ProductKind, values: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut product = Self::new(kind);
        product.set_parameters(values)?;
        Ok(product)
    }

    /// The product kind (fixed at construction)
    pub fn kind(&self) -> ProductKind {
        self.kind
    }

    /// The product's parameter set
    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Validate and set parameters; nothing is applied if any entry is invalid
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`], naming the parameter and the reason.
    pub fn set_parameters<I, K>(&mut self, values: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.parameters.set_many(values)
    }

    /// Query parameter values (see [`ParameterSet::query`])
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownParameter`] for names outside this kind's schema.
    pub fn get_parameters(
        &self,
        query: &ParamQuery,
        include_unset: bool,
    ) -> Result<Map<String, Value>, ValidationError> {
        self.parameters.query(query, include_unset)
    }

    /// Unset a parameter
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownParameter`] for names outside this kind's schema.
    pub fn remove_parameter(&mut self, name: &str) -> Result<Option<Value>, ValidationError> {
        self.parameters.remove(name)
    }

    /// Mandatory parameters of this kind that have no value
    pub fn missing_parameters(&self) -> Vec<&'static str> {
        self.parameters.missing(&[])
    }

    /// Whether every mandatory parameter has a value
    pub fn is_valid(&self) -> bool {
        self.missing_parameters().is_empty()
    }

    /// Replace this product's parameters with a copy of another product's
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::KindMismatch`] if `other` is a different kind.
    pub fn copy_from(&mut self, other: &Product) -> Result<(), ValidationError> {
        if other.kind != self.kind {
            return Err(ValidationError::KindMismatch {
                expected: self.kind,
                found: other.kind,
            });
        }
        self.parameters.copy_values_from(&other.parameters);
        Ok(())
    }

    /// Last known server status
    pub fn status(&self) -> &ProductStatus {
        &self.status
    }

    /// Whether the server has reported this product complete
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    pub(crate) fn set_status(&mut self, status: ProductStatus) {
        self.status = status;
    }

    pub(crate) fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.parameters
    }
}
