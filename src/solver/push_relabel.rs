use std::collections::VecDeque;

use crate::graph::FlowNetwork;

use super::MinCut;

/// Residuals at or below `RELATIVE_TOLERANCE * (1 + max capacity)` count as saturated.
const RELATIVE_TOLERANCE: f64 = 1e-12;

/// Maximum flow by FIFO push-relabel, followed by a residual reachability
/// scan from the source.
///
/// Heights are kept valid (`h(u) <= h(v) + 1` on every residual arc) and are
/// recomputed exactly by a backwards BFS every `n` relabels.
pub fn solve(network: &FlowNetwork) -> MinCut {
    let _span = tracing::debug_span!(
        "max_flow",
        nodes = network.node_count(),
        arcs = network.arc_count()
    )
    .entered();

    let mut preflow = Preflow::new(network);
    preflow.run();

    let source_side = preflow.reachable_from_source();
    let flow = preflow.excess[network.sink()];
    tracing::debug!(flow, relabels = preflow.relabels, "max flow done");

    MinCut { source_side, flow }
}

struct Preflow<'a> {
    net: &'a FlowNetwork,
    residual: Vec<f64>,
    excess: Vec<f64>,
    height: Vec<usize>,
    current: Vec<usize>,
    active: VecDeque<usize>,
    queued: Vec<bool>,
    tolerance: f64,
    relabels: usize,
    relabels_since_global: usize,
}

impl<'a> Preflow<'a> {
    fn new(net: &'a FlowNetwork) -> Self {
        let n = net.node_count();
        let residual = net.capacities().to_vec();
        let max_capacity = residual.iter().copied().fold(0.0, f64::max);

        Self {
            net,
            residual,
            excess: vec![0.0; n],
            height: vec![0; n],
            current: vec![0; n],
            active: VecDeque::new(),
            queued: vec![false; n],
            tolerance: RELATIVE_TOLERANCE * (1.0 + max_capacity),
            relabels: 0,
            relabels_since_global: 0,
        }
    }

    fn run(&mut self) {
        let net = self.net;
        let n = net.node_count();
        let source = net.source();
        self.height[source] = n;

        for &arc in net.arcs(source) {
            let cap = self.residual[arc as usize];
            if cap > 0.0 {
                self.excess[source] += cap;
                self.push(source, arc, cap);
            }
        }

        self.global_relabel();

        while let Some(u) = self.active.pop_front() {
            self.queued[u] = false;
            self.discharge(u);

            if self.relabels_since_global >= n {
                self.global_relabel();
            }
        }
    }

    /// Push excess out of `u` until it is gone or `u` has been relabeled.
    fn discharge(&mut self, u: usize) {
        let net = self.net;
        let arcs = net.arcs(u);

        while self.excess[u] > self.tolerance {
            if self.current[u] == arcs.len() {
                if !self.relabel(u) {
                    // Only rounding dust can be stranded without a residual arc.
                    self.excess[u] = 0.0;
                    return;
                }
                self.current[u] = 0;
                // Re-queue behind other active nodes after a relabel.
                self.enqueue(u);
                return;
            }

            let arc = arcs[self.current[u]];
            let v = net.head(arc);
            let residual = self.residual[arc as usize];
            if residual > self.tolerance && self.height[u] == self.height[v] + 1 {
                let amount = self.excess[u].min(residual);
                self.push(u, arc, amount);
            } else {
                self.current[u] += 1;
            }
        }
    }

    fn push(&mut self, u: usize, arc: u32, amount: f64) {
        let v = self.net.head(arc);
        self.residual[arc as usize] -= amount;
        self.residual[(arc ^ 1) as usize] += amount;
        self.excess[u] -= amount;
        self.excess[v] += amount;
        self.enqueue(v);
    }

    fn enqueue(&mut self, v: usize) {
        if !self.net.is_terminal(v) && !self.queued[v] && self.excess[v] > self.tolerance {
            self.queued[v] = true;
            self.active.push_back(v);
        }
    }

    /// Lift `u` to one above its lowest residual neighbor. Returns false when
    /// `u` has no residual arc at all.
    fn relabel(&mut self, u: usize) -> bool {
        let lowest = self
            .net
            .arcs(u)
            .iter()
            .filter(|&&arc| self.residual[arc as usize] > self.tolerance)
            .map(|&arc| self.height[self.net.head(arc)])
            .min();
        let Some(lowest) = lowest else {
            return false;
        };

        let n = self.net.node_count();
        let new_height = lowest + 1;
        assert!(
            new_height > self.height[u],
            "relabel of node {u} did not raise its height ({} -> {new_height})",
            self.height[u]
        );
        assert!(
            new_height < 2 * n,
            "height of node {u} exceeded bound 2n-1 ({new_height})"
        );

        self.height[u] = new_height;
        self.relabels += 1;
        self.relabels_since_global += 1;
        true
    }

    /// Exact residual distances: `d(v, sink)` where the sink is reachable,
    /// `n + d(v, source)` otherwise, and `2n - 1` for nodes reaching neither.
    fn global_relabel(&mut self) {
        let _span = tracing::trace_span!("global_relabel").entered();

        let n = self.net.node_count();
        let (source, sink) = (self.net.source(), self.net.sink());
        let mut fresh = vec![usize::MAX; n];
        fresh[source] = n;
        fresh[sink] = 0;

        for root in [sink, source] {
            let mut queue = VecDeque::from([root]);
            while let Some(v) = queue.pop_front() {
                for &arc in self.net.arcs(v) {
                    let w = self.net.head(arc);
                    // Arc `arc ^ 1` runs from w into v.
                    if fresh[w] == usize::MAX && self.residual[(arc ^ 1) as usize] > self.tolerance
                    {
                        fresh[w] = fresh[v] + 1;
                        queue.push_back(w);
                    }
                }
            }
        }

        for (v, h) in fresh.into_iter().enumerate() {
            let h = if h == usize::MAX { 2 * n - 1 } else { h };
            debug_assert!(h >= self.height[v] || self.net.is_terminal(v));
            self.height[v] = h.max(self.height[v]);
            self.current[v] = 0;
        }
        self.relabels_since_global = 0;
    }

    fn reachable_from_source(&self) -> Vec<bool> {
        let source = self.net.source();
        let mut seen = vec![false; self.net.node_count()];
        seen[source] = true;
        let mut queue = VecDeque::from([source]);

        while let Some(u) = queue.pop_front() {
            for &arc in self.net.arcs(u) {
                let v = self.net.head(arc);
                if !seen[v] && self.residual[arc as usize] > self.tolerance {
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }
        seen
    }
}
