pub mod cycle_detection;
pub mod obligation_graph;
pub mod scc;
