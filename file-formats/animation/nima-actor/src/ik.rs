//! Analytic inverse kinematics for IK target nodes
//!
//! One influenced bone is aimed at the target. Two bones are solved with the
//! law of cosines. Longer chains run the two-bone solve between each
//! influenced bone and the last one in turn, which approximates a chain
//! solve without iterating.

use std::f32::consts::PI;

use glam::{Affine2, Vec2};

use crate::actor::Actor;
use crate::component::{ComponentKind, Node, NodeFlags, invert_or_identity};
use crate::transform::SuppressScope;

/// `acos` of `numerator / denominator`, clamped into the domain.
/// A degenerate triangle side yields 0.
fn safe_acos(numerator: f32, denominator: f32) -> f32 {
    if denominator == 0.0 {
        return 0.0;
    }
    (numerator / denominator).clamp(-1.0, 1.0).acos()
}

impl Actor {
    /// Run every solver in solve order and commit the solved pose
    pub(crate) fn solve_constraints(&mut self) {
        for k in 0..self.solvers.len() {
            let index = self.solvers[k];
            self.solve_start(index);
        }
        self.update_all_transforms();

        let mut deferred = Vec::new();
        for k in 0..self.solvers.len() {
            let index = self.solvers[k];
            // Rotating its own bones must not re-dirty the solver mid-pass
            let mut scope = SuppressScope::suppressing([index]);
            log::trace!("Solving IK target {index}");
            self.solve(index, &mut scope);
            deferred.extend(scope.take_deferred());
        }

        let mut scope = SuppressScope::new();
        for index in deferred {
            self.mark_world_dirty(index, &mut scope);
        }
        self.update_all_transforms();

        for k in 0..self.solvers.len() {
            let index = self.solvers[k];
            if let Some(node) = self.node_mut(index) {
                node.flags.remove(NodeFlags::SOLVE_DIRTY);
            }
        }
    }

    /// Seed rotation overrides with the authored rotations
    fn solve_start(&mut self, index: usize) {
        let Some(target) = self.ik_target(index) else {
            return;
        };
        let constraint = &target.constraint;
        if constraint.influenced.is_empty() {
            return;
        }

        let mut seeds = Vec::with_capacity(constraint.influenced.len() + 1);
        if let Some(child) = constraint.bone1_child {
            if Some(child) != constraint.bone2() {
                seeds.push(child);
            }
        }
        seeds.extend_from_slice(&constraint.influenced);

        for bone in seeds {
            if let Some(rotation) = self.node(bone).map(Node::rotation) {
                self.set_rotation_override(bone, rotation);
            }
        }
    }

    fn solve(&mut self, index: usize, scope: &mut SuppressScope) {
        let Some(target) = self.ik_target(index) else {
            return;
        };
        let constraint = &target.constraint;
        if constraint.chain.is_empty() {
            return;
        }
        let influenced = constraint.influenced.clone();
        let invert = constraint.invert;
        let strength = constraint.strength;
        let mut chain = constraint.chain.clone();

        let Some(goal) = self.world_translation(index) else {
            return;
        };

        for link in &mut chain {
            link.fk_angle = self.node(link.bone).map_or(0.0, Node::effective_rotation);
        }

        match influenced.as_slice() {
            [] => return,
            [bone] => {
                self.solve1(*bone, goal, scope);
            }
            [first, second] => {
                self.solve2(*first, *second, goal, invert, scope);
            }
            [.., last] => {
                let last = *last;
                for &bone in &influenced[..influenced.len() - 1] {
                    self.solve2(bone, last, goal, invert, scope);
                }
            }
        }

        if strength != 1.0 {
            let fk_weight = 1.0 - strength;
            for link in chain.iter().filter(|link| link.included) {
                let Some(solved) = self.node(link.bone).map(Node::effective_rotation) else {
                    continue;
                };
                let blended = solved * strength + link.fk_angle * fk_weight;
                self.set_rotation_override_scoped(link.bone, blended, scope);
            }
        }

        if let Some(ComponentKind::IkTarget(target)) = self.kind_mut(index) {
            target.constraint.chain = chain;
        }
    }

    /// Point a single bone's +X axis at `goal`
    fn solve1(&mut self, bone: usize, goal: Vec2, scope: &mut SuppressScope) -> Option<()> {
        let world = self.world_transform(bone)?;
        let local = invert_or_identity(world).transform_point2(goal);
        let rotation = self.node(bone)?.effective_rotation();
        self.set_rotation_override_scoped(bone, rotation + local.y.atan2(local.x), scope);
        Some(())
    }

    /// Two-bone solve between `bone1` and the tip of `bone2`.
    ///
    /// Bones between the two keep their pose; the child of `bone1` on the
    /// path to `bone2` takes the elbow angle, corrected for the bend those
    /// bones already add.
    fn solve2(
        &mut self,
        bone1: usize,
        bone2: usize,
        goal: Vec2,
        invert: bool,
        scope: &mut SuppressScope,
    ) -> Option<()> {
        let bone1_child = self.child_toward(bone1, bone2)?;

        let parent = self.parent(bone1);
        let parent_world = match parent {
            Some(parent) => self.world_transform(parent)?,
            None => Affine2::IDENTITY,
        };
        // Measure from the parent bone's tip when there is one
        let parent_length = parent.and_then(|parent| self.bone(parent)).map(|bone| bone.length);
        let inverse = match parent_length {
            Some(length) => {
                invert_or_identity(parent_world * Affine2::from_translation(Vec2::new(length, 0.0)))
            }
            None => invert_or_identity(parent_world),
        };

        let origin = inverse.transform_point2(self.world_translation(bone1)?);
        let elbow = inverse.transform_point2(self.bone_tip_world_translation(bone1)?);
        let tip = inverse.transform_point2(self.bone_tip_world_translation(bone2)?);
        let target = inverse.transform_point2(goal);

        let a = (tip - elbow).length();
        let b = (elbow - origin).length();
        let c = (target - origin).length();

        let angle_a = safe_acos(-a * a + b * b + c * c, 2.0 * b * c);
        let angle_c = safe_acos(a * a + b * b - c * c, 2.0 * a * b);

        let mut correction = 0.0;
        if bone1_child != bone2 {
            let child_inverse = invert_or_identity(self.world_transform(bone1_child)?);
            let local_tip = child_inverse.transform_point2(self.bone_tip_world_translation(bone2)?);
            correction = -local_tip.y.atan2(local_tip.x);
        }

        let heading = target.y.atan2(target.x);
        let (rotation1, rotation_child) = if invert {
            (heading - angle_a, -angle_c + PI + correction)
        } else {
            (angle_a + heading, angle_c - PI + correction)
        };
        self.set_rotation_override_scoped(bone1, rotation1, scope);
        self.set_rotation_override_scoped(bone1_child, rotation_child, scope);
        Some(())
    }

    /// Ancestor of `bone` (or `bone` itself) whose parent is `ancestor`,
    /// walking up through bones only
    fn child_toward(&self, ancestor: usize, bone: usize) -> Option<usize> {
        let mut current = bone;
        for _ in 0..self.components.len() {
            if self.parent(current) == Some(ancestor) {
                return Some(current);
            }
            current = self.parent_bone(current)?;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Bone, Component, IkTarget};

    fn component(name: &str, parent: u16, kind: ComponentKind) -> Option<Component> {
        Some(Component {
            name: name.to_string(),
            parent_index: parent,
            parent: None,
            custom_properties: Vec::new(),
            kind,
        })
    }

    fn bone(x: f32, length: f32) -> ComponentKind {
        ComponentKind::Bone(Bone {
            node: Node {
                translation: Vec2::new(x, 0.0),
                ..Node::default()
            },
            length,
            is_connected_to_image: false,
        })
    }

    fn target(at: Vec2, bones: &[u16], strength: f32) -> ComponentKind {
        let mut target = IkTarget {
            node: Node {
                translation: at,
                ..Node::default()
            },
            ..IkTarget::default()
        };
        target.constraint.bone_indices = bones.to_vec();
        target.constraint.strength = strength;
        ComponentKind::IkTarget(target)
    }

    /// Bones of length 10 laid out along +X, then the target
    fn arm(bone_count: usize, goal: Vec2, influenced: &[u16], strength: f32) -> Actor {
        let mut components = vec![Some(Component::root())];
        for k in 0..bone_count {
            let x = if k == 0 { 0.0 } else { 10.0 };
            components.push(component("bone", k as u16, bone(x, 10.0)));
        }
        components.push(component("target", 0, target(goal, influenced, strength)));
        let mut actor = Actor::with_components(18, components);
        actor.resolve();
        actor.advance(0.0);
        actor
    }

    fn tip(actor: &mut Actor, bone: usize) -> Vec2 {
        actor.bone_tip_world_translation(bone).unwrap()
    }

    #[test]
    fn test_safe_acos_clamps() {
        assert!(safe_acos(2.0, 1.0).abs() < 0.001);
        assert!((safe_acos(-2.0, 1.0) - PI).abs() < 0.001);
        assert!(safe_acos(1.0, 0.0).abs() < 0.001);
    }

    #[test]
    fn test_single_bone_points_at_target() {
        let mut actor = arm(1, Vec2::new(0.0, 5.0), &[1], 1.0);
        let end = tip(&mut actor, 1);
        assert!(end.x.abs() < 0.001);
        assert!((end.y - 10.0).abs() < 0.001);
        // Authored rotation is untouched
        assert!(actor.node(1).unwrap().rotation().abs() < 0.001);
    }

    #[test]
    fn test_two_bone_reaches_target() {
        let goal = Vec2::new(12.0, 8.0);
        let mut actor = arm(2, goal, &[1, 2], 1.0);
        let end = tip(&mut actor, 2);
        assert!((end - goal).length() < 0.01, "tip {end:?}");
    }

    #[test]
    fn test_two_bone_inverted_reaches_target() {
        let goal = Vec2::new(12.0, 8.0);
        let mut components = vec![
            Some(Component::root()),
            component("upper", 0, bone(0.0, 10.0)),
            component("lower", 1, bone(10.0, 10.0)),
        ];
        let mut kind = target(goal, &[1, 2], 1.0);
        if let ComponentKind::IkTarget(target) = &mut kind {
            target.constraint.invert = true;
        }
        components.push(component("target", 0, kind));
        let mut actor = Actor::with_components(18, components);
        actor.resolve();
        actor.advance(0.0);

        let end = tip(&mut actor, 2);
        assert!((end - goal).length() < 0.01, "tip {end:?}");
        // The elbow bends the other way
        let elbow = tip(&mut actor, 1);
        assert!(elbow.y < goal.y * elbow.x / goal.x);
    }

    #[test]
    fn test_unreachable_target_extends_chain() {
        let mut actor = arm(2, Vec2::new(0.0, 30.0), &[1, 2], 1.0);
        let end = tip(&mut actor, 2);
        assert!(end.x.abs() < 0.01);
        assert!((end.y - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_zero_strength_keeps_fk_pose() {
        let mut actor = arm(2, Vec2::new(12.0, 8.0), &[1, 2], 0.0);
        let end = tip(&mut actor, 2);
        assert!((end.x - 20.0).abs() < 0.001);
        assert!(end.y.abs() < 0.001);
    }

    #[test]
    fn test_pairwise_chain_reaches_target() {
        let goal = Vec2::new(25.0, 5.0);
        let mut actor = arm(3, goal, &[1, 2, 3], 1.0);
        let end = tip(&mut actor, 3);
        assert!((end - goal).length() < 0.01, "tip {end:?}");
    }

    #[test]
    fn test_solve_settles() {
        let mut actor = arm(2, Vec2::new(12.0, 8.0), &[1, 2], 1.0);
        assert!(!actor.solver(3).unwrap().needs_solve());
        let before = tip(&mut actor, 2);
        actor.advance(0.0);
        let after = tip(&mut actor, 2);
        assert!((before - after).length() < 0.001);
    }

    #[test]
    fn test_moving_target_resolves() {
        let mut actor = arm(2, Vec2::new(12.0, 8.0), &[1, 2], 1.0);
        actor.set_translation_y(3, -8.0);
        assert!(actor.solver(3).unwrap().needs_solve());
        actor.advance(0.0);
        let end = tip(&mut actor, 2);
        assert!((end - Vec2::new(12.0, -8.0)).length() < 0.01, "tip {end:?}");
    }

    #[test]
    fn test_moving_bone_resolves_after_target_query() {
        let goal = Vec2::new(12.0, 8.0);
        let mut actor = arm(2, goal, &[1, 2], 1.0);
        actor.set_translation_x(1, 3.0);
        actor.world_translation(3);
        assert!(actor.solver(3).unwrap().needs_solve());
        actor.advance(0.0);
        let end = tip(&mut actor, 2);
        assert!((end - goal).length() < 0.01, "tip {end:?}");
    }

    #[test]
    fn test_strength_change_resolves_after_target_query() {
        let mut actor = arm(2, Vec2::new(12.0, 8.0), &[1, 2], 1.0);
        actor.set_ik_strength(3, 0.0);
        actor.world_translation(3);
        assert!(actor.solver(3).unwrap().needs_solve());
        actor.advance(0.0);
        let end = tip(&mut actor, 2);
        assert!((end.x - 20.0).abs() < 0.001);
        assert!(end.y.abs() < 0.001);
    }

    #[test]
    fn test_unresolved_bones_are_ignored() {
        let mut actor = arm(1, Vec2::new(0.0, 5.0), &[7], 1.0);
        let end = tip(&mut actor, 1);
        assert!((end.x - 10.0).abs() < 0.001);
    }
}
