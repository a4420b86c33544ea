//! Static parameter schema for the global scope and every product kind
//!
//! The tables in [`tables`] are plain `static` data: they are compiled in, shared by every
//! request, and never mutated. This module interprets them:
//! - [`validate`] checks a single `(scope, name, value)` triple and normalizes the value
//! - [`ScopeSchema::missing`] lists mandatory parameters that have no value
//! - [`ScopeSchema::joint_violations`] evaluates the rules that involve several parameters
//!
//! Joint rules are only evaluated when a whole request is validated, because setting one
//! parameter may make a previously set one valid or invalid.

mod coords;
mod tables;

pub use coords::{parse_declination, parse_right_ascension, parse_time};
pub(crate) use coords::parse_calendar;

use crate::error::ValidationError;
use crate::types::ProductKind;
use serde_json::{Map, Value};

/// A parameter namespace: the global parameters or one product kind's parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Parameters shared by every product in the request
    Global,
    /// Parameters of one product
    Product(ProductKind),
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Product(kind) => write!(f, "{}", kind),
        }
    }
}

/// Semantic type of a parameter
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamType {
    /// `true`/`false` (the server's 0/1 encoding is accepted too)
    Bool,
    /// Whole number with optional inclusive bounds
    Int {
        /// Lower bound
        min: Option<i64>,
        /// Upper bound
        max: Option<i64>,
    },
    /// Real number with optional inclusive bounds
    Float {
        /// Lower bound
        min: Option<f64>,
        /// Upper bound
        max: Option<f64>,
    },
    /// Free text
    Text,
    /// One of an enumerated set of strings
    Choice(&'static [&'static str]),
    /// Mission elapsed time in seconds, or a calendar date
    Time,
    /// Right ascension, stored in decimal degrees
    RightAscension,
    /// Declination, stored in decimal degrees
    Declination,
    /// Comma-separated list of observation or target IDs
    ObsList,
}

/// Compile-time default value of a parameter
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DefaultValue {
    /// Boolean default
    Bool(bool),
    /// Integer default
    Int(i64),
    /// Real default
    Float(f64),
    /// String default
    Str(&'static str),
}

impl DefaultValue {
    /// The default as a JSON value
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Bool(b) => Value::Bool(b),
            DefaultValue::Int(i) => Value::from(i),
            DefaultValue::Float(f) => Value::from(f),
            DefaultValue::Str(s) => Value::from(s),
        }
    }
}

/// Definition of one parameter
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    /// Client-side name
    pub name: &'static str,
    /// Name used in server-native documents
    pub server_name: &'static str,
    /// Semantic type
    pub ty: ParamType,
    /// Value the server applies when the parameter is left unset
    pub default: Option<DefaultValue>,
    /// Shared parameters are left out of "all" queries unless asked for
    pub shared: bool,
}

impl ParamSpec {
    const fn new(name: &'static str, server_name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            server_name,
            ty,
            default: None,
            shared: false,
        }
    }

    const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    const fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    /// Check a value against this parameter's type and normalize it
    ///
    /// Returns the normalized value (e.g. sexagesimal RA converted to degrees) or the
    /// reason the value was rejected.
    pub fn coerce(&self, value: &Value) -> Result<Value, String> {
        match self.ty {
            ParamType::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::Number(n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
                Value::Number(n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
                other => Err(format!("expected a boolean, got {}", other)),
            },
            ParamType::Int { min, max } => {
                let n = as_integer(value).ok_or_else(|| format!("expected an integer, got {}", value))?;
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    return Err(format!("{} is outside {}", n, describe_range(min, max)));
                }
                Ok(Value::from(n))
            }
            ParamType::Float { min, max } => {
                let n = as_number(value).ok_or_else(|| format!("expected a number, got {}", value))?;
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    return Err(format!("{} is outside {}", n, describe_range(min, max)));
                }
                Ok(Value::from(n))
            }
            ParamType::Text => match value {
                Value::String(s) if !s.trim().is_empty() => Ok(Value::from(s.trim())),
                Value::Number(n) => Ok(Value::from(n.to_string())),
                other => Err(format!("expected a non-empty string, got {}", other)),
            },
            ParamType::Choice(options) => {
                let text = match value {
                    Value::String(s) => s.trim().to_string(),
                    Value::Number(n) => n.to_string(),
                    other => return Err(format!("expected one of {:?}, got {}", options, other)),
                };
                if options.contains(&text.as_str()) {
                    Ok(Value::from(text))
                } else {
                    Err(format!("'{}' is not one of {:?}", text, options))
                }
            }
            ParamType::Time => parse_time(value),
            ParamType::RightAscension => parse_right_ascension(value).map(Value::from),
            ParamType::Declination => parse_declination(value).map(Value::from),
            ParamType::ObsList => coerce_obs_list(value),
        }
    }
}

/// A condition under which a mandatory parameter must be present
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Condition {
    /// Always mandatory
    Always,
    /// Mandatory unless the named boolean flag is true
    Unless(&'static str),
    /// Mandatory when the named boolean flag is true
    WhenTrue(&'static str),
    /// Mandatory when the named parameter equals the given value
    WhenEquals(&'static str, &'static str),
    /// Mandatory (unless the flag is true) when any of the listed products is requested
    WithProducts {
        /// Flag that asks the server to derive the value instead
        unless: &'static str,
        /// Products that need the parameter
        products: &'static [ProductKind],
    },
}

/// A mandatory parameter
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Requirement {
    /// Parameter name
    pub name: &'static str,
    /// When it is mandatory
    pub condition: Condition,
}

/// A rule involving more than one parameter
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JointRule {
    /// `low` must be below `high` (or equal, when `strict` is false)
    Ordered {
        /// Lower parameter
        low: &'static str,
        /// Upper parameter
        high: &'static str,
        /// Whether equality violates the rule
        strict: bool,
    },
    /// `other` may not be set while the boolean `flag` is true
    Exclusive {
        /// Boolean flag asking the server to derive `other`
        flag: &'static str,
        /// Explicit parameter that conflicts with the flag
        other: &'static str,
    },
}

/// The schema of one scope
#[derive(Debug)]
pub struct ScopeSchema {
    /// Parameter definitions
    pub params: &'static [ParamSpec],
    /// Mandatory parameters
    pub requirements: &'static [Requirement],
    /// Multi-parameter rules
    pub joint: &'static [JointRule],
}

impl ScopeSchema {
    /// Look up a parameter by client name
    pub fn get(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Look up a parameter by server name
    pub fn by_server_name(&self, server_name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.server_name == server_name)
    }

    /// Value a parameter takes once submitted: the explicit value, else the default
    fn effective(&self, values: &Map<String, Value>, name: &str) -> Option<Value> {
        values.get(name).cloned().or_else(|| {
            self.get(name)
                .and_then(|spec| spec.default)
                .map(DefaultValue::to_value)
        })
    }

    fn is_true(&self, values: &Map<String, Value>, name: &str) -> bool {
        matches!(self.effective(values, name), Some(Value::Bool(true)))
    }

    /// Mandatory parameters without a value, given the products present in the request
    pub fn missing(&self, values: &Map<String, Value>, products: &[ProductKind]) -> Vec<&'static str> {
        self.requirements
            .iter()
            .filter(|req| {
                let needed = match req.condition {
                    Condition::Always => true,
                    Condition::Unless(flag) => !self.is_true(values, flag),
                    Condition::WhenTrue(flag) => self.is_true(values, flag),
                    Condition::WhenEquals(name, expected) => {
                        matches!(self.effective(values, name), Some(Value::String(ref s)) if s == expected)
                    }
                    Condition::WithProducts { unless, products: needs } => {
                        !self.is_true(values, unless) && needs.iter().any(|k| products.contains(k))
                    }
                };
                needed && !values.contains_key(req.name)
            })
            .map(|req| req.name)
            .collect()
    }

    /// "Derive" flags that are true although the value they would derive is already present
    ///
    /// Once the server has resolved a value (a target ID, T0, coordinates) the flag asking
    /// for it no longer applies and only makes the set violate its exclusivity rule.
    pub fn settled_flags(&self, values: &Map<String, Value>) -> Vec<&'static str> {
        let mut flags: Vec<&'static str> = self
            .joint
            .iter()
            .filter_map(|rule| match *rule {
                JointRule::Exclusive { flag, other }
                    if values.contains_key(other) && self.is_true(values, flag) =>
                {
                    Some(flag)
                }
                _ => None,
            })
            .collect();
        flags.dedup();
        flags
    }

    /// Human-readable descriptions of every violated joint rule
    pub fn joint_violations(&self, values: &Map<String, Value>) -> Vec<String> {
        let mut problems = Vec::new();
        for rule in self.joint {
            match *rule {
                JointRule::Ordered { low, high, strict } => {
                    let (Some(lo), Some(hi)) = (self.effective(values, low), self.effective(values, high))
                    else {
                        continue;
                    };
                    let Some(ordering) = compare(&lo, &hi) else {
                        continue;
                    };
                    let violated = match ordering {
                        std::cmp::Ordering::Greater => true,
                        std::cmp::Ordering::Equal => strict,
                        std::cmp::Ordering::Less => false,
                    };
                    if violated {
                        let relation = if strict { "below" } else { "at most" };
                        problems.push(format!(
                            "{} ({}) must be {} {} ({})",
                            low, lo, relation, high, hi
                        ));
                    }
                }
                JointRule::Exclusive { flag, other } => {
                    if self.is_true(values, flag) && values.contains_key(other) {
                        problems.push(format!("{} cannot be set while {} is true", other, flag));
                    }
                }
            }
        }
        problems
    }
}

/// Schema for a scope
pub fn scope_schema(scope: Scope) -> &'static ScopeSchema {
    match scope {
        Scope::Global => &tables::GLOBAL,
        Scope::Product(ProductKind::LightCurve) => &tables::LIGHT_CURVE,
        Scope::Product(ProductKind::Spectrum) => &tables::SPECTRUM,
        Scope::Product(ProductKind::StandardPos) => &tables::STANDARD_POS,
        Scope::Product(ProductKind::EnhancedPos) => &tables::ENHANCED_POS,
        Scope::Product(ProductKind::AstromPos) => &tables::ASTROM_POS,
        Scope::Product(ProductKind::Image) => &tables::IMAGE,
        Scope::Product(ProductKind::SourceDet) => &tables::SOURCE_DET,
    }
}

/// Validate one parameter value for a scope
///
/// # Errors
///
/// - [`ValidationError::UnknownParameter`] if `name` is not defined for `scope`
/// - [`ValidationError::InvalidValue`] if the value has the wrong type or is out of range
pub fn validate(scope: Scope, name: &str, value: &Value) -> Result<Value, ValidationError> {
    let spec = scope_schema(scope)
        .get(name)
        .ok_or_else(|| ValidationError::UnknownParameter {
            scope: scope.to_string(),
            name: name.to_string(),
        })?;
    spec.coerce(value).map_err(|reason| ValidationError::InvalidValue {
        scope: scope.to_string(),
        name: name.to_string(),
        reason,
    })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn describe_range<T: std::fmt::Display>(min: Option<T>, max: Option<T>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("[{}, {}]", lo, hi),
        (Some(lo), None) => format!("[{}, ..)", lo),
        (None, Some(hi)) => format!("(.., {}]", hi),
        (None, None) => "any range".to_string(),
    }
}

fn coerce_obs_list(value: &Value) -> Result<Value, String> {
    let tokens: Vec<String> = match value {
        Value::String(s) => s.split(',').map(|t| t.trim().to_string()).collect(),
        Value::Number(n) => vec![n.to_string()],
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(format!("observation IDs must be strings, got {}", other)),
            })
            .collect::<Result<_, _>>()?,
        other => return Err(format!("expected a list of observation IDs, got {}", other)),
    };
    if tokens.is_empty() || tokens.iter().any(|t| t.is_empty()) {
        return Err("observation list contains an empty entry".to_string());
    }
    if let Some(bad) = tokens.iter().find(|t| !t.chars().all(|c| c.is_ascii_digit())) {
        return Err(format!("'{}' is not a numeric observation or target ID", bad));
    }
    Ok(Value::from(tokens.join(",")))
}

/// Order two values of the same family (numbers, or calendar dates)
fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            let x = coords::parse_calendar(x)?;
            let y = coords::parse_calendar(y)?;
            Some(x.cmp(&y))
        }
        _ => None,
    }
}
