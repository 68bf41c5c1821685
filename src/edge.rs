//! Edge kinds and their probability model
//!
//! An [`Edge`] is an interned handle for a kind of directed relationship
//! ("can reset password of", "can write ACL of"). The [`EdgeTypeRegistry`]
//! owns the catalog: per kind a display name, an optional description shown
//! to analysts, default traversal/visibility flags and an optional
//! [`ProbabilityCalculator`].
//!
//! Edge kinds are declared at startup with a fluent chain and treated as
//! read-only afterwards:
//!
//! ```
//! use trustgraph::edge::EdgeTypeRegistry;
//! use trustgraph::object::MemoryObject;
//! use trustgraph::probability::{self, Probability};
//!
//! let edges = EdgeTypeRegistry::new();
//! let rdp = edges
//!     .declare("RDPRights")
//!     .describe("Interactive logon over RDP")
//!     .register_probability_calculator(probability::constant(Probability::new(30)))
//!     .build();
//! let owns = edges.declare("Owns").build();
//!
//! let (a, b) = (MemoryObject::new(1), MemoryObject::new(2));
//! assert_eq!(edges.probability(rdp, &a, &b), Probability::new(30));
//! assert_eq!(edges.probability(owns, &a, &b), Probability::CERTAIN);
//! ```
//!
//! # Concurrency
//!
//! Declaration follows the same double-checked locking as attribute interning.
//! The fluent [`EdgeBuilder`] configures an already-declared handle one call at
//! a time, so it must only be used during single-threaded startup; concurrent
//! declarers use [`EdgeTypeRegistry::declare_with`], which declares and
//! configures under one exclusive lock. Probability dispatch clones the
//! calculator out of the shared lock and calls it unlocked, so calculators may
//! query the registry themselves.

use crate::object::GraphObject;
use crate::probability::{Probability, ProbabilityCalculator};
use fnv::FnvHashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Interned handle for an edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Edge(u32);

impl Edge {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Set of edge kinds connecting one object to another
#[derive(Debug, Clone, Default)]
pub struct EdgeBitmap {
    words: Vec<u64>,
}

impl EdgeBitmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, edge: Edge) {
        let (word, bit) = Self::position(edge);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= bit;
    }

    pub fn clear(&mut self, edge: Edge) {
        let (word, bit) = Self::position(edge);
        if let Some(w) = self.words.get_mut(word) {
            *w &= !bit;
        }
    }

    pub fn is_set(&self, edge: Edge) -> bool {
        let (word, bit) = Self::position(edge);
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Edge kinds in the set, in handle order
    pub fn iter(&self) -> impl Iterator<Item = Edge> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..64u32)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| Edge(i as u32 * 64 + bit))
        })
    }

    pub fn union(&self, other: &Self) -> Self {
        let len = self.words.len().max(other.words.len());
        let words = (0..len)
            .map(|i| {
                self.words.get(i).copied().unwrap_or(0) | other.words.get(i).copied().unwrap_or(0)
            })
            .collect();
        Self { words }
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a & b)
            .collect();
        Self { words }
    }

    fn position(edge: Edge) -> (usize, u64) {
        (edge.index() / 64, 1u64 << (edge.index() % 64))
    }
}

impl FromIterator<Edge> for EdgeBitmap {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        let mut bitmap = Self::new();
        for edge in iter {
            bitmap.set(edge);
        }
        bitmap
    }
}

/// Default participation of an edge kind in traversal and output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeDefaults {
    /// Followed when searching forward from a source
    pub forward: bool,
    /// Followed when searching backward from a target
    pub backward: bool,
    /// Shown in default output
    pub shown: bool,
}

impl Default for EdgeDefaults {
    fn default() -> Self {
        Self {
            forward: true,
            backward: true,
            shown: true,
        }
    }
}

/// Configuration attached to an edge kind
#[derive(Clone, Default)]
pub struct EdgeConfig {
    description: Option<String>,
    defaults: EdgeDefaults,
    calculator: Option<ProbabilityCalculator>,
}

impl EdgeConfig {
    pub fn set_default(mut self, forward: bool, backward: bool, shown: bool) -> Self {
        self.defaults = EdgeDefaults {
            forward,
            backward,
            shown,
        };
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn register_probability_calculator(mut self, calculator: ProbabilityCalculator) -> Self {
        self.calculator = Some(calculator);
        self
    }
}

impl fmt::Debug for EdgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeConfig")
            .field("description", &self.description)
            .field("defaults", &self.defaults)
            .field("calculator", &self.calculator.is_some())
            .finish()
    }
}

/// Serializable snapshot of one catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeInfo {
    pub edge: Edge,
    pub name: String,
    pub description: Option<String>,
    pub defaults: EdgeDefaults,
    pub has_calculator: bool,
}

#[derive(Debug, Default)]
struct EdgeTable {
    by_name: FnvHashMap<String, Edge>,
    names: Vec<String>,
    configs: Vec<EdgeConfig>,
}

impl EdgeTable {
    fn insert(&mut self, folded: String, name: &str, config: EdgeConfig) -> Edge {
        let edge = Edge(self.names.len() as u32);
        self.by_name.insert(folded, edge);
        self.names.push(name.to_string());
        self.configs.push(config);
        tracing::trace!(edge = edge.0, name, "declared edge kind");
        edge
    }
}

/// Catalog of edge kinds
#[derive(Debug, Default)]
pub struct EdgeTypeRegistry {
    table: RwLock<EdgeTable>,
}

impl EdgeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an edge kind and start configuring it
    ///
    /// Declaring an existing name (case-insensitively) returns a builder for
    /// the existing handle. The builder is for single-threaded startup only.
    pub fn declare(&self, name: &str) -> EdgeBuilder<'_> {
        let folded = name.to_lowercase();

        if let Some(&edge) = self.table.read().by_name.get(&folded) {
            return EdgeBuilder {
                registry: self,
                edge,
            };
        }

        let mut table = self.table.write();
        let edge = match table.by_name.get(&folded) {
            Some(&edge) => edge,
            None => table.insert(folded, name, EdgeConfig::default()),
        };
        EdgeBuilder {
            registry: self,
            edge,
        }
    }

    /// Declare and configure an edge kind as one atomic step
    ///
    /// `configure` only runs when the name is new; an existing declaration
    /// keeps its configuration.
    pub fn declare_with<F>(&self, name: &str, configure: F) -> Edge
    where
        F: FnOnce(EdgeConfig) -> EdgeConfig,
    {
        let folded = name.to_lowercase();

        if let Some(&edge) = self.table.read().by_name.get(&folded) {
            return edge;
        }

        let mut table = self.table.write();
        if let Some(&edge) = table.by_name.get(&folded) {
            return edge;
        }
        table.insert(folded, name, configure(EdgeConfig::default()))
    }

    /// Case-insensitive lookup that never declares
    pub fn lookup(&self, name: &str) -> Option<Edge> {
        self.table.read().by_name.get(&name.to_lowercase()).copied()
    }

    /// Modify the configuration of a declared edge kind
    ///
    /// Returns `false` if the handle is unknown to this registry.
    pub fn configure<F>(&self, edge: Edge, f: F) -> bool
    where
        F: FnOnce(EdgeConfig) -> EdgeConfig,
    {
        let mut table = self.table.write();
        match table.configs.get_mut(edge.index()) {
            Some(config) => {
                *config = f(std::mem::take(config));
                true
            }
            None => false,
        }
    }

    /// Display name as first declared
    pub fn name(&self, edge: Edge) -> Option<String> {
        self.table.read().names.get(edge.index()).cloned()
    }

    pub fn description(&self, edge: Edge) -> Option<String> {
        self.table
            .read()
            .configs
            .get(edge.index())
            .and_then(|c| c.description.clone())
    }

    pub fn defaults(&self, edge: Edge) -> Option<EdgeDefaults> {
        self.table
            .read()
            .configs
            .get(edge.index())
            .map(|c| c.defaults)
    }

    pub fn has_calculator(&self, edge: Edge) -> bool {
        self.table
            .read()
            .configs
            .get(edge.index())
            .is_some_and(|c| c.calculator.is_some())
    }

    pub fn len(&self) -> usize {
        self.table.read().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All declared handles in declaration order
    pub fn edges(&self) -> Vec<Edge> {
        (0..self.len() as u32).map(Edge).collect()
    }

    /// Snapshot of the whole catalog
    pub fn definitions(&self) -> Vec<EdgeInfo> {
        let table = self.table.read();
        table
            .names
            .iter()
            .zip(&table.configs)
            .enumerate()
            .map(|(i, (name, config))| EdgeInfo {
                edge: Edge(i as u32),
                name: name.clone(),
                description: config.description.clone(),
                defaults: config.defaults,
                has_calculator: config.calculator.is_some(),
            })
            .collect()
    }

    /// Attacker-success probability of one edge instance
    ///
    /// Dispatches to the registered calculator, or returns
    /// [`Probability::CERTAIN`] when the kind has none. Handles unknown to
    /// this registry and panicking calculators yield
    /// [`Probability::INAPPLICABLE`].
    pub fn probability(
        &self,
        edge: Edge,
        source: &dyn GraphObject,
        target: &dyn GraphObject,
    ) -> Probability {
        let calculator = {
            let table = self.table.read();
            match table.configs.get(edge.index()) {
                Some(config) => config.calculator.clone(),
                None => {
                    tracing::debug!(edge = edge.0, "probability requested for unknown edge");
                    return Probability::INAPPLICABLE;
                }
            }
        };

        let Some(calculator) = calculator else {
            return Probability::CERTAIN;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| calculator(source, target))) {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!(
                    edge = edge.0,
                    "probability calculator panicked, treating edge as inapplicable"
                );
                Probability::INAPPLICABLE
            }
        }
    }

    /// Best probability among the edge kinds in `bitmap`
    ///
    /// Inapplicable kinds never win; an empty bitmap, or one where every kind
    /// is inapplicable, yields [`Probability::INAPPLICABLE`].
    pub fn max_probability(
        &self,
        bitmap: &EdgeBitmap,
        source: &dyn GraphObject,
        target: &dyn GraphObject,
    ) -> Probability {
        bitmap
            .iter()
            .map(|edge| self.probability(edge, source, target))
            .max()
            .unwrap_or(Probability::INAPPLICABLE)
    }

    /// Edge kinds followed forward by default
    pub fn default_forward_bitmap(&self) -> EdgeBitmap {
        self.bitmap_where(|d| d.forward)
    }

    /// Edge kinds followed backward by default
    pub fn default_backward_bitmap(&self) -> EdgeBitmap {
        self.bitmap_where(|d| d.backward)
    }

    /// Edge kinds shown in default output
    pub fn default_shown_bitmap(&self) -> EdgeBitmap {
        self.bitmap_where(|d| d.shown)
    }

    fn bitmap_where(&self, pred: impl Fn(&EdgeDefaults) -> bool) -> EdgeBitmap {
        self.table
            .read()
            .configs
            .iter()
            .enumerate()
            .filter(|(_, c)| pred(&c.defaults))
            .map(|(i, _)| Edge(i as u32))
            .collect()
    }
}

/// Fluent configuration of a freshly declared edge kind
///
/// Each call takes the registry's exclusive lock; use during single-threaded
/// startup and finish the chain with [`EdgeBuilder::build`].
#[must_use = "finish the declaration with .build()"]
pub struct EdgeBuilder<'a> {
    registry: &'a EdgeTypeRegistry,
    edge: Edge,
}

impl<'a> EdgeBuilder<'a> {
    /// Override the default traversal and visibility flags (all `true`)
    pub fn set_default(self, forward: bool, backward: bool, shown: bool) -> Self {
        self.registry
            .configure(self.edge, |c| c.set_default(forward, backward, shown));
        self
    }

    /// Attach the analyst-facing rationale for this edge kind
    pub fn describe(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.registry.configure(self.edge, |c| c.describe(text));
        self
    }

    /// Attach the probability calculator, replacing any previous one
    pub fn register_probability_calculator(self, calculator: ProbabilityCalculator) -> Self {
        self.registry
            .configure(self.edge, |c| c.register_probability_calculator(calculator));
        self
    }

    pub fn build(self) -> Edge {
        self.edge
    }
}

impl From<EdgeBuilder<'_>> for Edge {
    fn from(builder: EdgeBuilder<'_>) -> Self {
        builder.edge
    }
}
