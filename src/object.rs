//! Boundary to the object graph
//!
//! The graph store that owns directory objects and their edge bitmaps lives
//! outside this crate. Probability calculators see objects only through the
//! [`GraphObject`] trait: integer attribute reads and a walk over outgoing
//! relationships. [`MemoryObject`] is a small in-memory implementation used by
//! tests and the diagnostics binary.

use crate::attribute::Attribute;
use crate::edge::{Edge, EdgeBitmap};
use fnv::FnvHashMap;
use std::ops::ControlFlow;

/// Identity of an object within its graph store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u64);

/// Read-only view of a graph object used by probability calculators
///
/// Implementations are responsible for their own thread safety when the
/// backing graph is mutated concurrently with analysis.
pub trait GraphObject {
    fn id(&self) -> ObjectId;

    /// Integer or bitmask value of an attribute, `None` when absent
    fn attr_int(&self, attribute: Attribute) -> Option<i64>;

    /// Visit each outgoing neighbour with the bitmap of edge kinds leading to it
    ///
    /// The visitor returns [`ControlFlow::Break`] to stop early.
    fn for_each_out_edge(&self, visit: &mut dyn FnMut(ObjectId, &EdgeBitmap) -> ControlFlow<()>);

    /// Whether this object already has an outgoing `edge` to `target`
    ///
    /// A missing neighbour counts as "no edge".
    fn has_edge_to(&self, target: ObjectId, edge: Edge) -> bool {
        let mut found = false;
        self.for_each_out_edge(&mut |neighbour, bitmap| {
            if neighbour == target && bitmap.is_set(edge) {
                found = true;
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found
    }

    /// Whether a bitmask attribute is present and has any of `flags` set
    fn has_flag(&self, attribute: Attribute, flags: i64) -> bool {
        self.attr_int(attribute)
            .is_some_and(|value| value & flags != 0)
    }
}

/// Minimal in-memory object with integer attributes and outgoing edges
#[derive(Debug, Clone)]
pub struct MemoryObject {
    id: ObjectId,
    attributes: FnvHashMap<Attribute, i64>,
    edges_out: Vec<(ObjectId, EdgeBitmap)>,
}

impl MemoryObject {
    pub fn new(id: u64) -> Self {
        Self {
            id: ObjectId(id),
            attributes: FnvHashMap::default(),
            edges_out: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, attribute: Attribute, value: i64) -> Self {
        self.set_attr(attribute, value);
        self
    }

    /// Builder-style edge setter
    pub fn with_edge(mut self, target: ObjectId, edge: Edge) -> Self {
        self.add_edge(target, edge);
        self
    }

    pub fn set_attr(&mut self, attribute: Attribute, value: i64) {
        self.attributes.insert(attribute, value);
    }

    /// Record an outgoing edge of kind `edge` to `target`
    pub fn add_edge(&mut self, target: ObjectId, edge: Edge) {
        match self.edges_out.iter_mut().find(|(id, _)| *id == target) {
            Some((_, bitmap)) => bitmap.set(edge),
            None => {
                let mut bitmap = EdgeBitmap::new();
                bitmap.set(edge);
                self.edges_out.push((target, bitmap));
            }
        }
    }

    /// Edge kinds leading to `target`, if any
    pub fn edges_to(&self, target: ObjectId) -> Option<&EdgeBitmap> {
        self.edges_out
            .iter()
            .find(|(id, _)| *id == target)
            .map(|(_, bitmap)| bitmap)
    }
}

impl GraphObject for MemoryObject {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn attr_int(&self, attribute: Attribute) -> Option<i64> {
        self.attributes.get(&attribute).copied()
    }

    fn for_each_out_edge(&self, visit: &mut dyn FnMut(ObjectId, &EdgeBitmap) -> ControlFlow<()>) {
        for (target, bitmap) in &self.edges_out {
            if visit(*target, bitmap).is_break() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeRegistry;
    use crate::edge::EdgeTypeRegistry;

    #[test]
    fn test_attr_int() {
        let attributes = AttributeRegistry::new();
        let uac = attributes.intern("userAccountControl");
        let other = attributes.intern("adminCount");

        let obj = MemoryObject::new(1).with_attr(uac, 0x0202);
        assert_eq!(obj.attr_int(uac), Some(0x0202));
        assert_eq!(obj.attr_int(other), None);
        assert!(obj.has_flag(uac, 0x0002));
        assert!(!obj.has_flag(uac, 0x0010));
        assert!(!obj.has_flag(other, 0x0002));
    }

    #[test]
    fn test_has_edge_to() {
        let edges = EdgeTypeRegistry::new();
        let owns = edges.declare("Owns").build();
        let write_dacl = edges.declare("WriteDACL").build();

        let target = ObjectId(2);
        let source = MemoryObject::new(1)
            .with_edge(target, owns)
            .with_edge(ObjectId(3), write_dacl);

        assert!(source.has_edge_to(target, owns));
        assert!(!source.has_edge_to(target, write_dacl));
        assert!(source.has_edge_to(ObjectId(3), write_dacl));
        assert!(!source.has_edge_to(ObjectId(99), owns));
    }

    #[test]
    fn test_add_edge_merges_bitmaps() {
        let edges = EdgeTypeRegistry::new();
        let owns = edges.declare("Owns").build();
        let generic_all = edges.declare("GenericAll").build();

        let mut source = MemoryObject::new(1);
        source.add_edge(ObjectId(2), owns);
        source.add_edge(ObjectId(2), generic_all);

        let bitmap = source.edges_to(ObjectId(2)).unwrap();
        assert_eq!(bitmap.count(), 2);
        assert!(source.edges_to(ObjectId(3)).is_none());
    }

    #[test]
    fn test_walk_stops_on_break() {
        let edges = EdgeTypeRegistry::new();
        let owns = edges.declare("Owns").build();

        let source = MemoryObject::new(1)
            .with_edge(ObjectId(2), owns)
            .with_edge(ObjectId(3), owns)
            .with_edge(ObjectId(4), owns);

        let mut visited = 0;
        source.for_each_out_edge(&mut |_, _| {
            visited += 1;
            ControlFlow::Break(())
        });
        assert_eq!(visited, 1);
    }
}
