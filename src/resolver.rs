//! Pluggable resolution of object names to sky coordinates
//!
//! Name resolution (SIMBAD, NED and the like) is an external service. The library only
//! defines the [`NameResolver`] seam; [`StaticResolver`] is an in-memory implementation
//! for offline use and tests.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// J2000 position in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    /// Right ascension, degrees
    pub ra: f64,
    /// Declination, degrees
    pub dec: f64,
}

/// Resolves an object name to coordinates
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Look up a name
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the name cannot be resolved.
    async fn resolve(&self, name: &str) -> Result<SkyPosition>;
}

/// Resolver backed by a fixed table; lookups ignore case and surrounding whitespace
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    entries: HashMap<String, SkyPosition>,
}

impl StaticResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    pub fn with(mut self, name: &str, ra: f64, dec: f64) -> Self {
        self.insert(name, SkyPosition { ra, dec });
        self
    }

    /// Add or replace an entry
    pub fn insert(&mut self, name: &str, position: SkyPosition) {
        self.entries.insert(normalize(name), position);
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[async_trait]
impl NameResolver for StaticResolver {
    async fn resolve(&self, name: &str) -> Result<SkyPosition> {
        self.entries
            .get(&normalize(name))
            .copied()
            .ok_or_else(|| Error::NotFound(format!("cannot resolve '{}'", name)))
    }
}
