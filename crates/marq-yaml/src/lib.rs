//! A comment-preserving YAML document tree.
//!
//! Marker inspection needs three things from a YAML model: scalar tags and
//! values it can rewrite, head/line/foot comments attached to the nodes they
//! describe, and structural re-emission. None of the ecosystem YAML crates
//! keep node comments through a parse, so this crate carries its own tree
//! over the block-style subset that workload manifests use.

mod node;
pub use node::{Document, Node, NodeId, NodeKind, ScalarStyle};

mod parser;
pub use parser::ScanError;

mod emit;
