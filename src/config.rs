//! Edge default overrides loaded from TOML
//!
//! Lets an analyst change which edge kinds participate in traversal or show up
//! in output without recompiling the catalog.
//!
//! # Example TOML
//! ```toml
//! [[edge]]
//! name = "DSReplGetChngs"
//! forward = true
//! show = true
//!
//! [[edge]]
//! name = "RDPRights"
//! backward = false
//! description = "Interactive logon over RDP"
//! ```
//!
//! `shown` is accepted for `show`. Unknown keys are rejected.
//! Omitted fields keep the edge's current value. Overrides are applied during
//! startup, after the catalog is declared and before analysis begins.

use crate::edge::{Edge, EdgeTypeRegistry};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Override for a single edge kind
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeOverride {
    /// Edge kind name, matched case-insensitively
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backward: Option<bool>,

    /// Also accepted as `shown`, the name used in catalog JSON
    #[serde(default, alias = "shown", skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Set of edge overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeOverrides {
    #[serde(default)]
    pub edge: Vec<EdgeOverride>,
}

impl EdgeOverrides {
    /// Load overrides from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn len(&self) -> usize {
        self.edge.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edge.is_empty()
    }

    /// Apply every override to `registry`
    ///
    /// All names are resolved before anything is changed, so an unknown edge
    /// kind leaves the registry untouched.
    pub fn apply(&self, registry: &EdgeTypeRegistry) -> Result<()> {
        let resolved: Vec<(Edge, &EdgeOverride)> = self
            .edge
            .iter()
            .map(|o| {
                registry
                    .lookup(&o.name)
                    .map(|edge| (edge, o))
                    .ok_or_else(|| ConfigError::UnknownEdge(o.name.clone()))
            })
            .collect::<Result<_>>()?;

        for (edge, o) in resolved {
            let current = registry.defaults(edge).unwrap_or_default();
            let forward = o.forward.unwrap_or(current.forward);
            let backward = o.backward.unwrap_or(current.backward);
            let shown = o.show.unwrap_or(current.shown);
            let description = o.description.clone();

            registry.configure(edge, |config| {
                let config = config.set_default(forward, backward, shown);
                match description {
                    Some(text) => config.describe(text),
                    None => config,
                }
            });
            tracing::debug!(
                edge = %o.name,
                forward,
                backward,
                shown,
                "applied edge override"
            );
        }
        Ok(())
    }
}
