//! Reachability-graph construction over Petri-net markings.

pub mod reachability;

pub use reachability::{explore, ReachabilityEdge, ReachabilityGraph};
