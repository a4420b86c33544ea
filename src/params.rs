//! Parameter sets: the values explicitly held for one scope
//!
//! A [`ParameterSet`] only stores parameters that were set (by the caller, or folded back
//! from the server after submission). An unset parameter is absent, which is different
//! from a parameter explicitly set to `false` or `0`; unset parameters are omitted on the
//! wire so the server applies its own default.

use crate::error::ValidationError;
use crate::schema::{self, Scope, ScopeSchema};
use crate::types::ProductKind;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Which parameters a query returns
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ParamQuery {
    /// Every parameter of the scope except shared ones
    #[default]
    All,
    /// Every parameter of the scope, shared ones included
    AllIncludingShared,
    /// Only the named parameters (shared ones may be named explicitly)
    Names(Vec<String>),
}

impl ParamQuery {
    /// Query for a list of names
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParamQuery::Names(names.into_iter().map(Into::into).collect())
    }
}

/// Explicitly set parameter values of one scope
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSet {
    scope: Scope,
    values: Map<String, Value>,
    /// Parameters whose value was filled in by the server rather than the caller
    auto_filled: BTreeSet<String>,
}

impl ParameterSet {
    /// Create an empty parameter set
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            values: Map::new(),
            auto_filled: BTreeSet::new(),
        }
    }

    /// The scope this set belongs to
    pub fn scope(&self) -> Scope {
        self.scope
    }

    fn schema(&self) -> &'static ScopeSchema {
        schema::scope_schema(self.scope)
    }

    /// Validate and set several parameters at once
    ///
    /// Either every value is applied, or (on the first invalid entry) none is.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] for the first unknown or invalid parameter.
    pub fn set_many<I, K>(&mut self, values: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut staged = Vec::new();
        for (name, value) in values {
            let name = name.into();
            let normalized = schema::validate(self.scope, &name, &value)?;
            staged.push((name, normalized));
        }
        for (name, value) in staged {
            self.auto_filled.remove(&name);
            self.values.insert(name, value);
        }
        Ok(())
    }

    /// Set a single parameter
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name is unknown or the value invalid.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), ValidationError> {
        self.set_many([(name, value)])
    }

    /// Explicit value of a parameter, if set
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Whether a parameter has been explicitly set
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Whether a parameter's value came from the server's resolved parameters
    pub fn is_auto_filled(&self, name: &str) -> bool {
        self.auto_filled.contains(name)
    }

    /// All explicitly set values
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Whether nothing has been set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Query parameter values
    ///
    /// When `include_unset` is false, parameters that were never set are left out even if
    /// the schema gives them a default. When true, unset parameters are reported with their
    /// default, or `null` if they have none.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownParameter`] if a requested name is not in the schema.
    pub fn query(
        &self,
        query: &ParamQuery,
        include_unset: bool,
    ) -> Result<Map<String, Value>, ValidationError> {
        let schema = self.schema();
        let specs: Vec<_> = match query {
            ParamQuery::All => schema.params.iter().filter(|p| !p.shared).collect(),
            ParamQuery::AllIncludingShared => schema.params.iter().collect(),
            ParamQuery::Names(names) => names
                .iter()
                .map(|name| {
                    schema.get(name).ok_or_else(|| ValidationError::UnknownParameter {
                        scope: self.scope.to_string(),
                        name: name.clone(),
                    })
                })
                .collect::<Result<_, _>>()?,
        };

        let mut out = Map::new();
        for spec in specs {
            match self.values.get(spec.name) {
                Some(value) => {
                    out.insert(spec.name.to_string(), value.clone());
                }
                None if include_unset => {
                    let fallback = spec
                        .default
                        .map(schema::DefaultValue::to_value)
                        .unwrap_or(Value::Null);
                    out.insert(spec.name.to_string(), fallback);
                }
                None => {}
            }
        }
        Ok(out)
    }

    /// Unset a parameter, so that it is omitted on the wire
    ///
    /// Returns the previous value, or `None` if it was not set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownParameter`] if the name is not in the schema.
    pub fn remove(&mut self, name: &str) -> Result<Option<Value>, ValidationError> {
        if self.schema().get(name).is_none() {
            return Err(ValidationError::UnknownParameter {
                scope: self.scope.to_string(),
                name: name.to_string(),
            });
        }
        self.auto_filled.remove(name);
        Ok(self.values.remove(name))
    }

    /// Mandatory parameters that have no value
    pub fn missing(&self, products: &[ProductKind]) -> Vec<&'static str> {
        self.schema().missing(&self.values, products)
    }

    /// Violated multi-parameter rules
    pub fn joint_violations(&self) -> Vec<String> {
        self.schema().joint_violations(&self.values)
    }

    /// Replace every value with a deep copy of another set of the same scope
    pub(crate) fn copy_values_from(&mut self, other: &ParameterSet) {
        self.values = other.values.clone();
        self.auto_filled = other.auto_filled.clone();
    }

    /// Drop derive flags whose value is now known
    ///
    /// Returns the flags that were removed.
    pub(crate) fn settle_derived_flags(&mut self) -> Vec<&'static str> {
        let flags = self.schema().settled_flags(&self.values);
        for flag in &flags {
            self.values.remove(*flag);
            self.auto_filled.remove(*flag);
        }
        flags
    }

    /// Store a value resolved by the server
    ///
    /// Values the caller never set are marked as auto-filled.
    pub(crate) fn fold_resolved(&mut self, name: &str, value: Value) {
        if !self.values.contains_key(name) {
            self.auto_filled.insert(name.to_string());
        }
        self.values.insert(name.to_string(), value);
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn light_curve() -> ParameterSet {
        ParameterSet::new(Scope::Product(ProductKind::LightCurve))
    }

    #[test]
    fn set_many_is_all_or_nothing() {
        let mut pars = light_curve();
        let result = pars.set_many([
            ("binMeth", json!("counts")),
            ("pcCounts", json!(20)),
            ("wtCounts", json!("lots")),
        ]);

        assert!(matches!(
            result,
            Err(ValidationError::InvalidValue { ref name, .. }) if name == "wtCounts"
        ));
        assert!(pars.is_empty(), "no parameter should have been applied");
    }

    #[test]
    fn explicit_false_is_distinguishable_from_unset() {
        let mut pars = light_curve();
        pars.set("dynamic", json!(false)).unwrap();

        assert!(pars.is_set("dynamic"));
        assert_eq!(pars.get("dynamic"), Some(&json!(false)));
        assert!(!pars.is_set("matchHR"));
    }

    #[test]
    fn query_omits_unset_unless_requested() {
        let mut pars = light_curve();
        pars.set("binMeth", json!("snapshot")).unwrap();

        let set_only = pars.query(&ParamQuery::All, false).unwrap();
        assert_eq!(set_only.len(), 1);

        let with_unset = pars.query(&ParamQuery::All, true).unwrap();
        assert_eq!(with_unset["minSig"], json!(3.0));
        assert_eq!(with_unset["pcCounts"], Value::Null);
    }

    #[test]
    fn shared_parameters_need_explicit_request() {
        let mut pars = ParameterSet::new(Scope::Global);
        pars.set_many([("name", json!("GRB 060729")), ("useSXPS", json!(true))])
            .unwrap();

        let all = pars.query(&ParamQuery::All, false).unwrap();
        assert!(!all.contains_key("useSXPS"));

        let named = pars.query(&ParamQuery::names(["useSXPS"]), false).unwrap();
        assert_eq!(named["useSXPS"], json!(true));

        let everything = pars.query(&ParamQuery::AllIncludingShared, false).unwrap();
        assert_eq!(everything.len(), 2);
    }

    #[test]
    fn query_rejects_unknown_names() {
        let pars = light_curve();
        assert!(pars.query(&ParamQuery::names(["binning"]), true).is_err());
    }

    #[test]
    fn remove_reverts_to_unset_not_default() {
        let mut pars = light_curve();
        pars.set("minSig", json!(5.0)).unwrap();

        assert_eq!(pars.remove("minSig").unwrap(), Some(json!(5.0)));
        assert!(!pars.is_set("minSig"));
        assert_eq!(pars.remove("minSig").unwrap(), None);
        assert!(pars.remove("nonsense").is_err());
    }

    #[test]
    fn resolved_values_are_marked_auto_filled_until_user_sets_them() {
        let mut pars = light_curve();
        pars.set("binMeth", json!("counts")).unwrap();
        pars.fold_resolved("binMeth", json!("counts"));
        pars.fold_resolved("pcCounts", json!(20));

        assert!(!pars.is_auto_filled("binMeth"));
        assert!(pars.is_auto_filled("pcCounts"));

        pars.set("pcCounts", json!(30)).unwrap();
        assert!(!pars.is_auto_filled("pcCounts"));
    }
}
