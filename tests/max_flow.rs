mod common;

use common::synthetic_image::boundary_length;
use cutout::graph::{EnergyTerms, FlowNetwork};
use cutout::solver;
use cutout::Mask;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_terms(rng: &mut StdRng, width: u32, height: u32, pair: Option<f64>) -> EnergyTerms {
    let n = (width * height) as usize;
    let w = width as usize;
    let h = height as usize;
    let cost = |rng: &mut StdRng| rng.random_range(-5.0..5.0);
    let foreground = (0..n).map(|_| cost(rng)).collect();
    let background = (0..n).map(|_| cost(rng)).collect();
    let weight = |rng: &mut StdRng| pair.unwrap_or_else(|| rng.random_range(0.0..3.0));
    let right = (0..n)
        .map(|i| if i % w + 1 < w { weight(rng) } else { 0.0 })
        .collect();
    let down = (0..n)
        .map(|i| if i / w + 1 < h { weight(rng) } else { 0.0 })
        .collect();
    EnergyTerms::from_parts(width, height, foreground, background, right, down)
}

fn brute_force_minimum(terms: &EnergyTerms) -> f64 {
    let (width, height) = terms.dimensions();
    let n = (width * height) as usize;
    (0u32..1 << n)
        .map(|bits| {
            let mask = Mask::from_fn(width, height, |x, y| {
                bits >> (y * width + x) & 1 == 1
            });
            terms.energy(&mask)
        })
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn cut_matches_exhaustive_search_on_small_grids() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for (width, height) in [(1, 1), (2, 1), (1, 3), (2, 2), (3, 3), (4, 3)] {
        for _ in 0..8 {
            let terms = random_terms(&mut rng, width, height, None);
            let result = terms.solve();
            let best = brute_force_minimum(&terms);

            assert!(
                (result.energy - best).abs() < 1e-9,
                "{width}x{height}: cut energy {} vs exhaustive {}",
                result.energy,
                best
            );
            assert!((terms.energy(&result.mask) - result.energy).abs() < 1e-9);
        }
    }
}

#[test]
fn flow_equals_min_cut_on_random_networks() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let inner = rng.random_range(2..8usize);
        let mut net = FlowNetwork::new(inner);
        let nodes = net.node_count();

        for _ in 0..inner * 3 {
            let u = rng.random_range(0..nodes);
            let v = rng.random_range(0..nodes);
            if u == v {
                continue;
            }
            net.add_edge(u, v, rng.random_range(0.0..10.0), rng.random_range(0.0..4.0));
        }

        let cut = solver::solve(&net);
        let (s, t) = (net.source(), net.sink());
        assert!(cut.source_side[s]);
        assert!(!cut.source_side[t]);
        assert!((net.cut_capacity(&cut.source_side) - cut.flow).abs() < 1e-9);

        // No other s-t cut is cheaper.
        let mut best = f64::INFINITY;
        for bits in 0u32..1 << inner {
            let mut side: Vec<bool> = (0..inner).map(|i| bits >> i & 1 == 1).collect();
            side.push(true);
            side.push(false);
            best = best.min(net.cut_capacity(&side));
        }
        assert!((best - cut.flow).abs() < 1e-9);
    }
}

#[test]
fn heavier_smoothing_never_lengthens_the_boundary() {
    let mut rng = StdRng::seed_from_u64(7);
    let base = random_terms(&mut rng, 6, 6, Some(0.0));
    let (width, height) = base.dimensions();
    let n = (width * height) as usize;
    let costs = |terms: &EnergyTerms| -> (Vec<f64>, Vec<f64>) {
        (
            (0..n).map(|i| terms.foreground_cost(i)).collect(),
            (0..n).map(|i| terms.background_cost(i)).collect(),
        )
    };
    let (foreground, background) = costs(&base);

    let mut previous = usize::MAX;
    for lambda in [0.0, 0.5, 1.0, 2.0, 4.0, 8.0] {
        let w = width as usize;
        let h = height as usize;
        let right = (0..n).map(|i| if i % w + 1 < w { lambda } else { 0.0 }).collect();
        let down = (0..n).map(|i| if i / w + 1 < h { lambda } else { 0.0 }).collect();
        let terms = EnergyTerms::from_parts(
            width,
            height,
            foreground.clone(),
            background.clone(),
            right,
            down,
        );
        let boundary = boundary_length(&terms.solve().mask);
        assert!(boundary <= previous, "λ = {lambda}: {boundary} > {previous}");
        previous = boundary;
    }
}
