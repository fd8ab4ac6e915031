/// Flow network addressed by dense node indices.
///
/// Inner nodes are `0..inner_count`, followed by the source and the sink.
/// Arcs are stored in pairs: arc `a` and arc `a ^ 1` are each other's reverse,
/// each with its own capacity.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    inner_count: usize,
    heads: Vec<u32>,
    capacities: Vec<f64>,
    adjacency: Vec<Vec<u32>>,
    has_terminals: Vec<bool>,
    /// Energy removed from terminal pairs to keep capacities non-negative.
    constant: f64,
}

/// Slots reserved per inner node: four grid neighbors plus two terminals.
const GRID_DEGREE: usize = 6;

impl FlowNetwork {
    pub fn new(inner_count: usize) -> Self {
        Self::with_arc_capacity(inner_count, 0)
    }

    /// Pre-size for `pairs` arc pairs.
    pub fn with_arc_capacity(inner_count: usize, pairs: usize) -> Self {
        let mut adjacency: Vec<Vec<u32>> = (0..inner_count)
            .map(|_| Vec::with_capacity(GRID_DEGREE))
            .collect();
        adjacency.push(Vec::with_capacity(inner_count));
        adjacency.push(Vec::with_capacity(inner_count));

        Self {
            inner_count,
            heads: Vec::with_capacity(pairs * 2),
            capacities: Vec::with_capacity(pairs * 2),
            adjacency,
            has_terminals: vec![false; inner_count],
            constant: 0.0,
        }
    }

    pub fn inner_count(&self) -> usize {
        self.inner_count
    }

    pub fn node_count(&self) -> usize {
        self.inner_count + 2
    }

    pub fn arc_count(&self) -> usize {
        self.heads.len()
    }

    pub fn source(&self) -> usize {
        self.inner_count
    }

    pub fn sink(&self) -> usize {
        self.inner_count + 1
    }

    pub fn is_terminal(&self, node: usize) -> bool {
        node >= self.inner_count
    }

    /// Constant energy not represented by any arc.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Add one arc pair between `u` and `v`, `forward` on `u → v` and
    /// `backward` on `v → u`.
    pub fn add_edge(&mut self, u: usize, v: usize, forward: f64, backward: f64) {
        assert!(u != v, "self-loop on node {u}");
        debug_assert!(forward >= 0.0 && backward >= 0.0);

        let arc = self.heads.len() as u32;
        self.heads.push(v as u32);
        self.capacities.push(forward);
        self.heads.push(u as u32);
        self.capacities.push(backward);
        self.adjacency[u].push(arc);
        self.adjacency[v].push(arc + 1);
    }

    /// Attach both terminal arcs of an inner node: `source → node` carries
    /// `source_cap`, `node → sink` carries `sink_cap`.
    ///
    /// Only the difference between the two matters to the cut, so the
    /// smaller one is moved into [`FlowNetwork::constant`]. Negative inputs
    /// are fine.
    pub fn add_terminal_edges(&mut self, node: usize, source_cap: f64, sink_cap: f64) {
        assert!(node < self.inner_count, "terminal edges on terminal {node}");
        assert!(
            !self.has_terminals[node],
            "terminal edges of node {node} added twice"
        );
        self.has_terminals[node] = true;

        let shift = source_cap.min(sink_cap);
        self.constant += shift;
        self.add_edge(self.source(), node, source_cap - shift, 0.0);
        self.add_edge(node, self.sink(), sink_cap - shift, 0.0);
    }

    /// Arc ids leaving `node`.
    pub fn arcs(&self, node: usize) -> &[u32] {
        &self.adjacency[node]
    }

    pub fn head(&self, arc: u32) -> usize {
        self.heads[arc as usize] as usize
    }

    pub fn capacity(&self, arc: u32) -> f64 {
        self.capacities[arc as usize]
    }

    pub(crate) fn capacities(&self) -> &[f64] {
        &self.capacities
    }

    /// Total capacity of arcs leaving the source side.
    pub fn cut_capacity(&self, source_side: &[bool]) -> f64 {
        let mut total = 0.0;
        for (u, arcs) in self.adjacency.iter().enumerate() {
            if !source_side[u] {
                continue;
            }
            for &arc in arcs {
                if !source_side[self.head(arc)] {
                    total += self.capacity(arc);
                }
            }
        }
        total
    }
}
