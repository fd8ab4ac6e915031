mod push_relabel;

pub use push_relabel::solve;

/// Result of a max-flow run.
#[derive(Debug, Clone)]
pub struct MinCut {
    /// Indexed by node; true for nodes reachable from the source in the final
    /// residual graph.
    pub source_side: Vec<bool>,
    /// Max-flow value, equal to the capacity of the cut.
    pub flow: f64,
}

impl MinCut {
    pub fn is_source_side(&self, node: usize) -> bool {
        self.source_side[node]
    }
}
