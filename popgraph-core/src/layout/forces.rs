//! Potential-energy model of the relaxation.
//!
//! Every pair of nodes interacts through `V(d) = 1/d + d²/(2U³)`, whose
//! force `1/d² − d/U³` repels at short range and turns attractive beyond the
//! universe radius `U`, so disconnected components stay in view. Each node is
//! additionally pulled towards its neighbours by a spring whose force is the
//! mean, not the sum, of the neighbour offsets, so hubs are not crushed into
//! their neighbourhood.

use super::vector::Vector;

/// Distances below this are treated as this, keeping forces finite.
const MIN_DISTANCE: f64 = 1e-3;

/// Spring constant of the neighbour attraction.
const SPRING: f64 = 1.0;

/// Universe radius per `N^(1/dim)`.
const UNIVERSE_SCALE: f64 = 2.0;

/// Read-only view of everything a single relaxation step needs.
#[derive(Clone, Copy, Debug)]
pub(super) struct Forces<'a> {
    neighbours: &'a [Vec<usize>],
    universe_cubed: f64,
    dt: f64,
    max_step: f64,
}

impl<'a> Forces<'a> {
    pub(super) fn new<V: Vector>(neighbours: &'a [Vec<usize>], dt: f64, max_step: f64) -> Self {
        let nodes = neighbours.len().max(1) as f64;
        let universe = UNIVERSE_SCALE * nodes.powf(1.0 / V::DIM as f64);
        Self {
            neighbours,
            universe_cubed: universe.powi(3),
            dt,
            max_step,
        }
    }

    /// Displacement of `node` under the forces exerted by `positions`, and
    /// the node's share of the total potential.
    pub(super) fn step<V: Vector>(&self, node: usize, positions: &[V]) -> (V, f64) {
        let Some(&here) = positions.get(node) else {
            return (V::default(), 0.0);
        };
        let mut force = V::default();
        let mut potential = 0.0;
        for (other, &there) in positions.iter().enumerate() {
            if other == node {
                continue;
            }
            let offset = here - there;
            let distance = offset.length().max(MIN_DISTANCE);
            let magnitude = 1.0 / (distance * distance) - distance / self.universe_cubed;
            force = force + offset * (magnitude / distance);
            // pair energy is split between both endpoints
            potential += 0.5 * (1.0 / distance + distance * distance / (2.0 * self.universe_cubed));
        }
        let neighbours = self.neighbours.get(node).map_or(&[][..], Vec::as_slice);
        if !neighbours.is_empty() {
            let count = neighbours.len() as f64;
            let mut pull = V::default();
            for &other in neighbours {
                let Some(&there) = positions.get(other) else {
                    continue;
                };
                let offset = there - here;
                pull = pull + offset;
                potential += SPRING * offset.dot(offset) / (2.0 * count);
            }
            force = force + pull * (SPRING / count);
        }
        let step = force * self.dt;
        let length = step.length();
        if length > self.max_step {
            (step * (self.max_step / length), potential)
        } else {
            (step, potential)
        }
    }

    /// Total potential of `positions` without moving anything.
    pub(super) fn potential<V: Vector>(&self, positions: &[V]) -> f64 {
        (0..positions.len())
            .map(|node| self.step(node, positions).1)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::vector::Vec2;

    #[test]
    fn isolated_pair_repels() {
        let neighbours = vec![Vec::new(), Vec::new()];
        let forces = Forces::new::<Vec2>(&neighbours, 0.1, 10.0);
        let positions = [Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.0)];
        let (step, _) = forces.step(0, &positions);
        assert!(step.x < 0.0);
        assert_eq!(step.y, 0.0);
    }

    #[test]
    fn distant_neighbours_attract() {
        let neighbours = vec![vec![1], vec![0]];
        let forces = Forces::new::<Vec2>(&neighbours, 0.1, 10.0);
        let positions = [Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0)];
        let (step, _) = forces.step(0, &positions);
        assert!(step.x > 0.0);
    }

    #[test]
    fn steps_are_bounded() {
        let neighbours = vec![Vec::new(), Vec::new()];
        let forces = Forces::new::<Vec2>(&neighbours, 1.0, 0.25);
        let positions = [Vec2::new(0.0, 0.0), Vec2::new(0.01, 0.0)];
        let (step, _) = forces.step(0, &positions);
        assert!((step.length() - 0.25).abs() < 1e-12);
    }
}
