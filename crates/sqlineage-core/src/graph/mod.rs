//! Lineage graph construction and queries

mod builder;
mod lineage;

pub use builder::GraphBuilder;
pub use lineage::{LineageGraph, Node};
