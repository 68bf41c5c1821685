//! Attribute name interning
//!
//! Directory objects carry hundreds of attribute names, repeated across
//! millions of objects. The [`AttributeRegistry`] maps each case-insensitive
//! name to a small dense [`Attribute`] handle so objects store integers instead
//! of strings.
//!
//! # Concurrency
//!
//! Interning is optimistic: the name is first looked up under a shared lock.
//! Only on a miss is the exclusive lock taken, and the name is checked again
//! before a handle is allocated, since another thread may have inserted it in
//! between. Usage counters are atomics, so hits never need the exclusive lock.
//!
//! ```text
//! intern("Member;range=0-4999")
//!   │ strip ";range=0-4999"      → "Member"
//!   │ case-fold                  → "member"
//!   ├─ read lock:  hit?  ──yes──→ popularity += 1, return handle
//!   └─ write lock: hit?  ──yes──→ popularity += 1, return handle
//!                        ──no───→ allocate handle = len, popularity = 1
//! ```
//!
//! # Example
//!
//! ```
//! use trustgraph::attribute::{Attribute, AttributeRegistry};
//!
//! let registry = AttributeRegistry::new();
//! let member = registry.intern("member");
//! assert_eq!(registry.intern("MEMBER;range=0-4999"), member);
//! assert_eq!(registry.lookup("Member"), member);
//! assert_eq!(registry.lookup("unknown"), Attribute::NON_EXISTING);
//! assert_eq!(registry.popularity(member), 2);
//! ```

use fnv::FnvHashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Display name of [`Attribute::NON_EXISTING`]
pub const NON_EXISTING_NAME: &str = "*NON EXISTING ATTRIBUTE*";

/// Prefix marking attributes synthesized by analysis
pub const META_PREFIX: char = '_';

/// Interned handle for an attribute name
///
/// Handles are dense, start at zero and are assigned in first-seen order.
/// They are only meaningful together with the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Attribute(u32);

impl Attribute {
    /// Sentinel for "no such attribute", outside the dense range
    pub const NON_EXISTING: Self = Self(u32::MAX);

    /// Position of this handle in the dense range
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn exists(self) -> bool {
        self.0 != u32::MAX
    }

    /// Format this handle by its name in `registry`
    pub fn display(self, registry: &AttributeRegistry) -> AttributeDisplay<'_> {
        AttributeDisplay {
            attribute: self,
            registry,
        }
    }
}

/// [`fmt::Display`] adapter returned by [`Attribute::display`]
pub struct AttributeDisplay<'a> {
    attribute: Attribute,
    registry: &'a AttributeRegistry,
}

impl fmt::Display for AttributeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.registry.display(self.attribute))
    }
}

/// One row of a popularity or size ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedAttribute {
    pub attribute: Attribute,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Default)]
struct AttributeTable {
    /// Case-folded name → handle
    by_name: FnvHashMap<String, Attribute>,
    /// Handle → original-case name
    names: Vec<String>,
    /// Handle → times interned
    popularity: Vec<AtomicU64>,
    /// Handle → bytes of value data, fed by the object store
    sizes: Vec<AtomicU64>,
}

impl AttributeTable {
    /// Return the handle for an already-known name and count the hit
    fn hit(&self, folded: &str) -> Option<Attribute> {
        let attribute = *self.by_name.get(folded)?;
        self.popularity[attribute.index()].fetch_add(1, Ordering::Relaxed);
        Some(attribute)
    }
}

/// Registry of interned attribute names with usage statistics
///
/// Construct one per analysis and pass it by reference to everything that
/// needs it; it is `Send + Sync` and safe for unbounded concurrent callers.
#[derive(Debug, Default)]
pub struct AttributeRegistry {
    table: RwLock<AttributeTable>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an attribute name, returning its stable handle
    ///
    /// Any `;`-delimited qualifier (LDAP range retrieval such as
    /// `member;range=0-4999`) is stripped first. Qualifiers on anything other
    /// than `member` indicate truncated upstream data and are logged at debug
    /// level. The first spelling seen is kept for display.
    pub fn intern(&self, name: &str) -> Attribute {
        let name = strip_qualifier(name);
        let folded = name.to_lowercase();

        if let Some(attribute) = self.table.read().hit(&folded) {
            return attribute;
        }

        let mut table = self.table.write();
        // Someone may have beaten us to it between the two locks
        if let Some(attribute) = table.hit(&folded) {
            return attribute;
        }

        let attribute = Attribute(table.names.len() as u32);
        table.by_name.insert(folded, attribute);
        table.names.push(name.to_string());
        table.popularity.push(AtomicU64::new(1));
        table.sizes.push(AtomicU64::new(0));
        tracing::trace!(attribute = attribute.0, name, "interned attribute");
        attribute
    }

    /// Case-insensitive lookup that never allocates or counts
    ///
    /// Returns [`Attribute::NON_EXISTING`] for names never interned.
    pub fn lookup(&self, name: &str) -> Attribute {
        self.table
            .read()
            .by_name
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(Attribute::NON_EXISTING)
    }

    /// Original-case name of a handle
    pub fn display(&self, attribute: Attribute) -> String {
        self.table
            .read()
            .names
            .get(attribute.index())
            .cloned()
            .unwrap_or_else(|| NON_EXISTING_NAME.to_string())
    }

    /// Whether the attribute is synthesized by analysis (`_` prefix)
    pub fn is_meta(&self, attribute: Attribute) -> bool {
        self.table
            .read()
            .names
            .get(attribute.index())
            .is_some_and(|name| name.starts_with(META_PREFIX))
    }

    /// Accumulate bytes of value data seen for an attribute
    ///
    /// Called by the owning object store. Unknown handles are ignored.
    pub fn add_size(&self, attribute: Attribute, bytes: u64) {
        if let Some(size) = self.table.read().sizes.get(attribute.index()) {
            size.fetch_add(bytes, Ordering::Relaxed);
        }
    }

    pub fn popularity(&self, attribute: Attribute) -> u64 {
        self.table
            .read()
            .popularity
            .get(attribute.index())
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    pub fn size(&self, attribute: Attribute) -> u64 {
        self.table
            .read()
            .sizes
            .get(attribute.index())
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Number of distinct interned names
    pub fn len(&self) -> usize {
        self.table.read().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attributes by descending intern count
    pub fn rank_by_popularity(&self) -> Vec<RankedAttribute> {
        let table = self.table.read();
        rank(&table.names, &table.popularity)
    }

    /// Attributes by descending accumulated value size
    pub fn rank_by_size(&self) -> Vec<RankedAttribute> {
        let table = self.table.read();
        rank(&table.names, &table.sizes)
    }

    /// Dump both rankings at debug level
    pub fn log_statistics(&self) {
        tracing::debug!("attribute popularity ranking");
        for row in self.rank_by_popularity() {
            tracing::debug!("{} has {} hits", row.name, row.count);
        }
        tracing::debug!("attribute size ranking");
        for row in self.rank_by_size() {
            tracing::debug!("{} has used {} bytes", row.name, row.count);
        }
    }
}

/// Drop an LDAP `;qualifier` suffix, keeping the attribute name
fn strip_qualifier(name: &str) -> &str {
    match name.split_once(';') {
        Some((base, _)) => {
            if !base.eq_ignore_ascii_case("member") {
                tracing::debug!("Incomplete data detected in attribute {}", name);
            }
            base
        }
        None => name,
    }
}

fn rank(names: &[String], counters: &[AtomicU64]) -> Vec<RankedAttribute> {
    let mut ranked: Vec<RankedAttribute> = names
        .iter()
        .zip(counters)
        .enumerate()
        .map(|(i, (name, count))| RankedAttribute {
            attribute: Attribute(i as u32),
            name: name.clone(),
            count: count.load(Ordering::Relaxed),
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}
