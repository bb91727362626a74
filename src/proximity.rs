use crate::settings::GraphSettings;
use glam::Vec3;

/// A connective link between two nearby particles (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    /// 1 at zero distance, 0 at the connection threshold
    pub weight: f32,
    /// Render brightness after the highlight override
    pub brightness: f32,
}

/// Per-frame set of particle pairs closer than the connection distance
#[derive(Debug, Clone, Default)]
pub struct ProximityGraph {
    edges: Vec<Edge>,
    truncated: bool,
}

impl ProximityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Whether the edge cap cut the last rebuild short
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.truncated = false;
    }

    /// Rebuild from scratch with an exhaustive pairwise scan.
    ///
    /// Pairs are visited in `(i, j)` ascending order and the scan stops at
    /// `max_edges`, so the first pairs found survive the cap.
    /// `is_active` marks particles whose edges get the fixed bright floor.
    pub fn rebuild(&mut self, positions: &[Vec3], settings: &GraphSettings, is_active: impl Fn(usize) -> bool) {
        self.clear();

        let threshold = settings.connect_distance;
        if threshold <= 0.0 || settings.max_edges == 0 {
            return;
        }
        let threshold_sq = threshold * threshold;
        let n = positions.len();

        'scan: for i in 0..n {
            let pi = positions[i];
            for j in (i + 1)..n {
                // Compare squared distances first to skip the sqrt for far pairs
                let dist_sq = pi.distance_squared(positions[j]);
                if dist_sq >= threshold_sq {
                    continue;
                }
                if self.edges.len() >= settings.max_edges {
                    self.truncated = true;
                    break 'scan;
                }

                let weight = 1.0 - dist_sq.sqrt() / threshold;
                let brightness = if is_active(i) || is_active(j) {
                    settings.active_brightness
                } else {
                    weight * settings.connect_opacity
                };
                self.edges.push(Edge { a: i, b: j, weight, brightness });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;

    fn cloud(n: usize, seed: u64) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Vec3::new(rng.gen_range(-30.0..30.0), rng.gen_range(-30.0..30.0), rng.gen_range(-30.0..30.0)))
            .collect()
    }

    fn uncapped() -> GraphSettings {
        GraphSettings {
            max_edges: usize::MAX,
            ..Default::default()
        }
    }

    #[test]
    fn test_matches_brute_force_definition() {
        let positions = cloud(150, 2);
        let settings = uncapped();
        let mut graph = ProximityGraph::new();
        graph.rebuild(&positions, &settings, |_| false);

        let mut expected = HashMap::new();
        for i in 0..positions.len() {
            for j in 0..positions.len() {
                if i == j {
                    continue;
                }
                let d = positions[i].distance(positions[j]);
                if d < settings.connect_distance {
                    expected.insert((i.min(j), i.max(j)), 1.0 - d / settings.connect_distance);
                }
            }
        }

        assert_eq!(graph.edges().len(), expected.len());
        for edge in graph.edges() {
            assert!(edge.a < edge.b);
            let w = expected[&(edge.a, edge.b)];
            assert!((edge.weight - w).abs() < 1e-5);
            assert!(edge.weight > 0.0 && edge.weight <= 1.0);
        }
    }

    #[test]
    fn test_rebuild_is_reproducible() {
        let positions = cloud(300, 5);
        let mut a = ProximityGraph::new();
        let mut b = ProximityGraph::new();
        a.rebuild(&positions, &GraphSettings::default(), |_| false);
        b.rebuild(&positions, &GraphSettings::default(), |_| false);
        assert_eq!(a.edges(), b.edges());
    }

    #[test]
    fn test_cap_is_hard_early_exit() {
        let positions = vec![Vec3::ZERO; 40];
        let settings = GraphSettings {
            max_edges: 25,
            ..Default::default()
        };
        let mut graph = ProximityGraph::new();
        graph.rebuild(&positions, &settings, |_| false);
        assert_eq!(graph.edges().len(), 25);
        assert!(graph.truncated());
        // First row of the scan survives
        assert!(graph.edges().iter().all(|e| e.a == 0));
    }

    #[test]
    fn test_active_particle_edges_get_floor() {
        let positions = vec![Vec3::ZERO, Vec3::new(14.0, 0.0, 0.0), Vec3::new(-14.0, 0.0, 0.0)];
        let settings = GraphSettings::default();
        let mut graph = ProximityGraph::new();
        graph.rebuild(&positions, &settings, |i| i == 1);

        let touching = graph.edges().iter().find(|e| e.a == 0 && e.b == 1).unwrap();
        assert_eq!(touching.brightness, settings.active_brightness);
        let plain = graph.edges().iter().find(|e| e.a == 0 && e.b == 2).unwrap();
        assert!((plain.brightness - plain.weight * settings.connect_opacity).abs() < 1e-6);
        // The pair 1-2 is 28 apart and never linked
        assert_eq!(graph.edges().len(), 2);
    }
}
