//! Radial layout of the belief tree.
//!
//! The core sits at the center and each generation occupies its own ring.
//! Angles follow a cluster layout: leaves are spread evenly around the circle
//! in tree order, with a wider gap between leaves of different parents, and
//! every internal belief sits at the mean angle of its children.

use std::collections::{HashMap, HashSet};
use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use crate::belief::BeliefId;
use crate::error::{BeliefError, Result};
use crate::state::GraphState;

/// Ring geometry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Radius of the core's ring.
    pub inner_radius: f64,
    /// Smallest distance between consecutive rings.
    pub min_ring_step: f64,
    /// Outermost ring radius as a fraction of the smaller viewport side.
    pub radius_fraction: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            inner_radius: 40.0,
            min_ring_step: 60.0,
            radius_fraction: 0.46,
        }
    }
}

/// Where a belief is drawn, relative to the viewport center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub depth: usize,
    pub radius: f64,
    /// Angle in radians, clockwise from 12 o'clock.
    pub theta: f64,
}

/// A computed layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadialLayout {
    pub positions: HashMap<BeliefId, Placement>,
    pub r0: f64,
    pub r_step: f64,
}

impl RadialLayout {
    pub fn get(&self, id: BeliefId) -> Option<&Placement> {
        self.positions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Lay out `state` in a `width` x `height` viewport with default geometry.
pub fn layout(state: &GraphState, width: f64, height: f64) -> Result<RadialLayout> {
    layout_with(state, width, height, &LayoutConfig::default())
}

/// Lay out `state` in a `width` x `height` viewport.
///
/// Fails with [`BeliefError::NoCore`] on an uninitialized map. Beliefs not
/// reachable from the core through primary parents are left out.
pub fn layout_with(
    state: &GraphState,
    width: f64,
    height: f64,
    config: &LayoutConfig,
) -> Result<RadialLayout> {
    let core_id = state
        .core_id()
        .filter(|id| state.node(*id).is_some())
        .ok_or(BeliefError::NoCore)?;

    let tree = Tree::build(state, core_id);

    let max_depth = tree.order.iter().map(|t| t.depth).max().unwrap_or(0);
    let max_radius = width.min(height) * config.radius_fraction;
    let r0 = config.inner_radius;
    let r_step = config
        .min_ring_step
        .max((max_radius - r0) / max_depth.max(1) as f64);

    let angles = tree.cluster_angles();

    let positions = tree
        .order
        .iter()
        .map(|t| {
            let radius = r0 + t.depth as f64 * r_step;
            let theta = angles.get(&t.id).copied().unwrap_or(0.0);
            let placement = Placement {
                x: (theta - FRAC_PI_2).cos() * radius,
                y: (theta - FRAC_PI_2).sin() * radius,
                depth: t.depth,
                radius,
                theta,
            };
            (t.id, placement)
        })
        .collect();

    Ok(RadialLayout {
        positions,
        r0,
        r_step,
    })
}

struct TreeNode {
    id: BeliefId,
    parent: Option<BeliefId>,
    depth: usize,
}

/// The primary-parent tree, flattened in pre-order.
struct Tree {
    order: Vec<TreeNode>,
    children: HashMap<BeliefId, Vec<BeliefId>>,
}

impl Tree {
    fn build(state: &GraphState, core_id: BeliefId) -> Self {
        let mut children: HashMap<BeliefId, Vec<BeliefId>> = HashMap::new();
        let mut non_core: Vec<_> = state.nodes().filter(|n| n.id != core_id).collect();
        non_core.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        for node in non_core {
            let parent = node.parent_id.unwrap_or(core_id);
            children.entry(parent).or_default().push(node.id);
        }

        let mut order = Vec::with_capacity(state.node_count());
        let mut visited = HashSet::new();
        let mut stack = vec![(core_id, None, 0)];
        while let Some((id, parent, depth)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            order.push(TreeNode { id, parent, depth });
            if let Some(kids) = children.get(&id) {
                // Reversed so the oldest child is visited first.
                for kid in kids.iter().rev() {
                    stack.push((*kid, Some(id), depth + 1));
                }
            }
        }

        // Beliefs caught in a parent cycle are never reached from the core.
        for kids in children.values_mut() {
            kids.retain(|k| visited.contains(k));
        }

        Self { order, children }
    }

    fn kids(&self, id: BeliefId) -> &[BeliefId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Angles in `[0, 2π)` for every belief in the tree.
    fn cluster_angles(&self) -> HashMap<BeliefId, f64> {
        let parents: HashMap<BeliefId, Option<BeliefId>> =
            self.order.iter().map(|t| (t.id, t.parent)).collect();
        let separation = |a: BeliefId, b: BeliefId| {
            if parents.get(&a) == parents.get(&b) {
                1.0
            } else {
                2.0
            }
        };

        let mut x: HashMap<BeliefId, f64> = HashMap::with_capacity(self.order.len());

        // Leaves take sequential positions in pre-order.
        let mut previous: Option<BeliefId> = None;
        let mut cursor = 0.0;
        for t in &self.order {
            if !self.kids(t.id).is_empty() {
                continue;
            }
            if let Some(prev) = previous {
                cursor += separation(t.id, prev);
            }
            x.insert(t.id, cursor);
            previous = Some(t.id);
        }

        // Children come after their parent in pre-order, so walking backwards
        // settles every child before its parent.
        for t in self.order.iter().rev() {
            let kids = self.kids(t.id);
            if kids.is_empty() {
                continue;
            }
            let sum: f64 = kids.iter().map(|k| x.get(k).copied().unwrap_or(0.0)).sum();
            x.insert(t.id, sum / kids.len() as f64);
        }

        let Some(root) = self.order.first().map(|t| t.id) else {
            return x;
        };
        let left = self.extreme_leaf(root, |kids| kids.first());
        let right = self.extreme_leaf(root, |kids| kids.last());
        let x0 = x.get(&left).copied().unwrap_or(0.0) - separation(left, right) / 2.0;
        let x1 = x.get(&right).copied().unwrap_or(0.0) + separation(right, left) / 2.0;
        let span = x1 - x0;

        for value in x.values_mut() {
            *value = (*value - x0) / span * TAU;
        }
        x
    }

    fn extreme_leaf(
        &self,
        root: BeliefId,
        pick: impl Fn(&[BeliefId]) -> Option<&BeliefId>,
    ) -> BeliefId {
        let mut current = root;
        while let Some(next) = pick(self.kids(current)) {
            current = *next;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::{Mode, NewBelief};
    use crate::store::GraphStore;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn uninitialized_map_has_no_layout() {
        let store = GraphStore::in_memory();
        assert!(matches!(
            layout(store.state(), 1000.0, 1000.0),
            Err(BeliefError::NoCore)
        ));
    }

    #[test]
    fn lone_core_sits_on_inner_ring() {
        let mut store = GraphStore::in_memory();
        let core = store
            .initialize(Mode::Sandbox, "Kindness matters", None, None)
            .unwrap();
        let out = layout(store.state(), 1000.0, 1000.0).unwrap();
        let p = out.get(core).unwrap();
        assert_eq!(p.depth, 0);
        assert!(close(p.radius, 40.0));
        assert!(close(p.theta, PI));
        // θ = π points straight down.
        assert!(close(p.x, 0.0));
        assert!(close(p.y, 40.0));
        // max(60, (460 - 40) / 1)
        assert!(close(out.r_step, 420.0));
    }

    #[test]
    fn two_level_tree() {
        let mut store = GraphStore::in_memory();
        let core = store
            .initialize(Mode::Sandbox, "Kindness matters", None, None)
            .unwrap();
        let a = store
            .insert_pending(NewBelief::new("Charity helps people", 50), Some(core))
            .unwrap();
        let g = store
            .insert_pending(NewBelief::new("Food banks reduce hunger", 50), Some(a))
            .unwrap();
        let b = store
            .insert_pending(NewBelief::new("Listening builds trust", 50), Some(core))
            .unwrap();

        let out = layout(store.state(), 1000.0, 1000.0).unwrap();
        assert_eq!(out.len(), 4);
        assert!(close(out.r0, 40.0));
        assert!(close(out.r_step, 210.0));

        let expect = [
            (core, PI, 40.0, 0),
            (a, PI / 2.0, 250.0, 1),
            (g, PI / 2.0, 460.0, 2),
            (b, 3.0 * PI / 2.0, 250.0, 1),
        ];
        for (id, theta, radius, depth) in expect {
            let p = out.get(id).unwrap();
            assert!(close(p.theta, theta), "theta {} != {theta}", p.theta);
            assert!(close(p.radius, radius), "radius {} != {radius}", p.radius);
            assert_eq!(p.depth, depth);
        }

        // θ = π/2 points right.
        let pa = out.get(a).unwrap();
        assert!(close(pa.x, 250.0));
        assert!(close(pa.y, 0.0));
    }

    #[test]
    fn siblings_are_evenly_spaced() {
        let mut store = GraphStore::in_memory();
        let core = store
            .initialize(Mode::Professional, "Kindness matters", None, None)
            .unwrap();
        let ids: Vec<_> = (0..4)
            .map(|i| {
                store
                    .insert_pending(NewBelief::new(format!("Sibling belief {i}"), 50), None)
                    .unwrap()
            })
            .collect();
        let out = layout(store.state(), 800.0, 600.0).unwrap();
        let mut thetas: Vec<f64> = ids.iter().map(|id| out.get(*id).unwrap().theta).collect();
        thetas.sort_by(f64::total_cmp);
        for (i, theta) in thetas.iter().enumerate() {
            // Leaves at 0..3 with half a gap either side: (i + 0.5) / 4 of the circle.
            assert!(close(*theta, (i as f64 + 0.5) / 4.0 * TAU));
        }
        assert!(close(out.get(core).unwrap().theta, PI));
    }

    #[test]
    fn ring_step_has_floor() {
        let mut store = GraphStore::in_memory();
        let mut parent = store
            .initialize(Mode::Sandbox, "Kindness matters", None, None)
            .unwrap();
        for i in 0..10 {
            parent = store
                .insert_pending(NewBelief::new(format!("Deep belief {i}"), 50), Some(parent))
                .unwrap();
        }
        let out = layout(store.state(), 400.0, 400.0).unwrap();
        assert!(close(out.r_step, 60.0));
        assert!(close(out.get(parent).unwrap().radius, 40.0 + 10.0 * 60.0));
    }

    #[test]
    fn custom_geometry() {
        let mut store = GraphStore::in_memory();
        let core = store
            .initialize(Mode::Sandbox, "Kindness matters", None, None)
            .unwrap();
        let config = LayoutConfig {
            inner_radius: 10.0,
            min_ring_step: 5.0,
            radius_fraction: 0.5,
        };
        let out = layout_with(store.state(), 200.0, 100.0, &config).unwrap();
        assert!(close(out.get(core).unwrap().radius, 10.0));
        assert!(close(out.r_step, 40.0));
    }
}
