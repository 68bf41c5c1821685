// Active Directory edge catalog
//
// Declares the relationship kinds an attacker can abuse between directory
// objects, with their default traversal flags, analyst-facing descriptions and
// probability calculators. Calculators capture the attribute and edge handles
// they consult, so one kind can refer to another at runtime (the
// WriteKeyCredentialLink rule checks for a WriteUserAccountControl edge to the
// same target) without any static ordering between declarations.

mod edges;
pub mod uac_flags;

pub use edges::ActiveDirectoryEdges;
