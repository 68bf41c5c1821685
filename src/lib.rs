//! Trustgraph - attribute interning and edge probability model for
//! directory attack-path graphs
//!
//! This library provides the data model underneath attack-path analysis of a
//! directory service: a concurrent registry that interns attribute names into
//! dense handles, and a catalog of edge kinds whose probability calculators
//! tell the pathfinder how likely an attacker is to abuse each relationship.

pub mod activedirectory;
pub mod attribute;
pub mod cli;
pub mod config;
pub mod edge;
pub mod error;
pub mod object;
pub mod probability;
pub mod schema;

pub use attribute::{Attribute, AttributeRegistry};
pub use edge::{Edge, EdgeBitmap, EdgeTypeRegistry};
pub use object::{GraphObject, MemoryObject, ObjectId};
pub use probability::Probability;
