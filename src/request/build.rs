//! Building a request: products, parameters, copies and coordinate resolution.

use crate::error::{Error, Result, StateError, ValidationError};
use crate::params::ParamQuery;
use crate::product::Product;
use crate::resolver::{NameResolver, SkyPosition};
use crate::types::{ProductKind, Selection};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use super::ProductRequest;

impl ProductRequest {
    /// Add a product with its initial parameters
    ///
    /// If a product of this kind already exists it is replaced only when
    /// `allow_override` is set. The new product is built completely before anything is
    /// replaced, so a failed call leaves the request unchanged.
    ///
    /// # Errors
    ///
    /// - [`StateError::NotDraft`] once the request has been submitted
    /// - [`StateError::ProductExists`] for a duplicate kind without `allow_override`
    /// - [`ValidationError`] for an invalid parameter
    pub fn add_product<I, K>(&mut self, kind: ProductKind, values: I, allow_override: bool) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.ensure_draft("add a product")?;
        if !allow_override && self.products.contains_key(&kind) {
            return Err(StateError::ProductExists { kind }.into());
        }
        let product = Product::with_parameters(kind, values)?;
        let replaced = self.products.insert(kind, product).is_some();
        debug!(product = %kind, replaced, "added product");
        Ok(())
    }

    /// Add a light curve
    ///
    /// # Errors
    ///
    /// As for [`add_product`](Self::add_product).
    pub fn add_light_curve<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.add_product(ProductKind::LightCurve, values, false)
    }

    /// Add a spectrum
    ///
    /// # Errors
    ///
    /// As for [`add_product`](Self::add_product).
    pub fn add_spectrum<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.add_product(ProductKind::Spectrum, values, false)
    }

    /// Add a standard position
    ///
    /// # Errors
    ///
    /// As for [`add_product`](Self::add_product).
    pub fn add_standard_pos<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.add_product(ProductKind::StandardPos, values, false)
    }

    /// Add an enhanced position
    ///
    /// # Errors
    ///
    /// As for [`add_product`](Self::add_product).
    pub fn add_enhanced_pos<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.add_product(ProductKind::EnhancedPos, values, false)
    }

    /// Add an astrometric position
    ///
    /// # Errors
    ///
    /// As for [`add_product`](Self::add_product).
    pub fn add_astrom_pos<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.add_product(ProductKind::AstromPos, values, false)
    }

    /// Add an image
    ///
    /// # Errors
    ///
    /// As for [`add_product`](Self::add_product).
    pub fn add_image<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.add_product(ProductKind::Image, values, false)
    }

    /// Add source detection
    ///
    /// # Errors
    ///
    /// As for [`add_product`](Self::add_product).
    pub fn add_source_detection<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.add_product(ProductKind::SourceDet, values, false)
    }

    /// Detach and return a product
    ///
    /// # Errors
    ///
    /// [`StateError::NotDraft`] after submission, [`Error::NotFound`] if the kind is absent.
    pub fn remove_product(&mut self, kind: ProductKind) -> Result<Product> {
        self.ensure_draft("remove a product")?;
        let removed = self
            .products
            .remove(&kind)
            .ok_or_else(|| Error::product_not_found(kind))?;
        debug!(product = %kind, "removed product");
        Ok(removed)
    }

    /// Set parameters of an existing product (all-or-nothing)
    ///
    /// # Errors
    ///
    /// [`StateError::NotDraft`] after submission, `NotFound` for an absent product,
    /// [`ValidationError`] for an invalid parameter.
    pub fn set_product_parameters<I, K>(&mut self, kind: ProductKind, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.ensure_draft("set product parameters")?;
        self.product_mut(kind)?.set_parameters(values)?;
        Ok(())
    }

    /// Query parameters of a product
    ///
    /// # Errors
    ///
    /// `NotFound` for an absent product, [`ValidationError::UnknownParameter`] for a name
    /// outside the product's schema.
    pub fn get_product_parameters(
        &self,
        kind: ProductKind,
        query: &ParamQuery,
        include_unset: bool,
    ) -> Result<Map<String, Value>> {
        Ok(self.existing_product(kind)?.get_parameters(query, include_unset)?)
    }

    /// Unset a product parameter
    ///
    /// # Errors
    ///
    /// As for [`set_product_parameters`](Self::set_product_parameters).
    pub fn remove_product_parameter(&mut self, kind: ProductKind, name: &str) -> Result<Option<Value>> {
        self.ensure_draft("remove a product parameter")?;
        Ok(self.product_mut(kind)?.remove_parameter(name)?)
    }

    /// Set global parameters (all-or-nothing)
    ///
    /// # Errors
    ///
    /// [`StateError::NotDraft`] after submission, [`ValidationError`] for an invalid parameter.
    pub fn set_global_parameters<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.ensure_draft("set global parameters")?;
        self.global.set_many(values)?;
        Ok(())
    }

    /// Query global parameters
    ///
    /// Shared parameters are left out of [`ParamQuery::All`] and must be asked for by name
    /// or with [`ParamQuery::AllIncludingShared`].
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownParameter`] for an unknown name.
    pub fn get_global_parameters(&self, query: &ParamQuery, include_unset: bool) -> Result<Map<String, Value>> {
        Ok(self.global.query(query, include_unset)?)
    }

    /// Unset a global parameter
    ///
    /// # Errors
    ///
    /// [`StateError::NotDraft`] after submission, [`ValidationError::UnknownParameter`] for
    /// an unknown name.
    pub fn remove_global_parameter(&mut self, name: &str) -> Result<Option<Value>> {
        self.ensure_draft("remove a global parameter")?;
        Ok(self.global.remove(name)?)
    }

    /// Copy product parameter sets from another request
    ///
    /// Products of the same kind already in this request are replaced. Copies are deep:
    /// later changes to `other` do not show up here. Statuses are not copied.
    ///
    /// # Errors
    ///
    /// [`StateError::NotDraft`] after submission, `NotFound` if `other` lacks a named product.
    pub fn copy_products_from(&mut self, other: &ProductRequest, what: impl Into<Selection>) -> Result<()> {
        self.ensure_draft("copy products")?;
        let kinds = other.selected_kinds(&what.into())?;
        let copies = kinds
            .iter()
            .map(|kind| {
                let mut copy = Product::new(*kind);
                copy.copy_from(other.existing_product(*kind)?)?;
                Ok(copy)
            })
            .collect::<Result<Vec<_>>>()?;

        for copy in copies {
            self.products.insert(copy.kind(), copy);
        }
        debug!(products = ?kinds, "copied products from another request");
        Ok(())
    }

    /// Fill RA and Dec by resolving the global `name` parameter
    ///
    /// A `getCoords` flag is cleared, since explicit coordinates replace it.
    ///
    /// # Errors
    ///
    /// [`StateError::NotDraft`] after submission, [`ValidationError::Incomplete`] if
    /// `name` is not set, or whatever the resolver returns (`NotFound` for unknown names).
    pub async fn resolve_coordinates(&mut self, resolver: &dyn NameResolver) -> Result<SkyPosition> {
        self.ensure_draft("resolve coordinates")?;
        let name = self
            .global
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ValidationError::Incomplete("global parameter 'name' is required to resolve coordinates".into())
            })?
            .to_string();

        let position = resolver.resolve(&name).await?;

        let mut staged = self.global.clone();
        staged.set_many([("RA", json!(position.ra)), ("Dec", json!(position.dec))])?;
        staged.settle_derived_flags();
        self.global = staged;

        info!(name = %name, ra = position.ra, dec = position.dec, "resolved coordinates");
        Ok(position)
    }

    /// A fresh Draft carrying this request's parameters
    ///
    /// This is how a rejected request is corrected and sent again: the original stays
    /// as it was, and the copy has no job, status or submission error.
    pub fn redraft(&self) -> ProductRequest {
        let mut draft = ProductRequest::blank(self.user_id.clone(), self.gateway.clone());
        draft.global = self.global.clone();
        for (kind, product) in &self.products {
            let mut fresh = Product::new(*kind);
            fresh.parameters_mut().copy_values_from(product.parameters());
            draft.products.insert(*kind, fresh);
        }
        draft
    }
}
