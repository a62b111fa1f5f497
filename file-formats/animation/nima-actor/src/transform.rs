//! Transform cache and property setters
//!
//! Setters compare against the current value and return early when nothing
//! changes. A change marks the node locally dirty and invalidates the world
//! transform of the node, its children and its dependents. World transforms
//! are rebuilt lazily on query or during [`Actor::advance`].

use glam::{Affine2, Vec2};

use crate::actor::{Actor, ActorFlags};
use crate::component::{ComponentKind, CustomValue, NodeFlags};

/// Nodes that world-dirty propagation must not enter.
///
/// Propagation that reaches a suppressed node records it instead, so the
/// caller can invalidate it once the suppressing work is finished.
#[derive(Debug, Clone, Default)]
pub struct SuppressScope {
    suppressed: Vec<usize>,
    deferred: Vec<usize>,
}

impl SuppressScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppressing(nodes: impl IntoIterator<Item = usize>) -> Self {
        Self {
            suppressed: nodes.into_iter().collect(),
            deferred: Vec::new(),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.suppressed.contains(&index)
    }

    /// Suppressed nodes propagation tried to invalidate
    pub fn deferred(&self) -> &[usize] {
        &self.deferred
    }

    pub fn take_deferred(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.deferred)
    }

    fn defer(&mut self, index: usize) {
        if !self.deferred.contains(&index) {
            self.deferred.push(index);
        }
    }
}

impl Actor {
    /// Invalidate the world transform of `index` and everything below or
    /// depending on it.
    ///
    /// Stops at nodes that are already world-dirty and at nodes in `scope`.
    pub fn mark_world_dirty(&mut self, index: usize, scope: &mut SuppressScope) {
        let mut pending = vec![index];
        while let Some(current) = pending.pop() {
            if scope.contains(current) {
                scope.defer(current);
                continue;
            }
            let is_solver = self.solver(current).is_some();
            let Some(node) = self.node_mut(current) else {
                continue;
            };
            if is_solver {
                node.flags.insert(NodeFlags::SOLVE_DIRTY);
            }
            if node.flags.contains(NodeFlags::WORLD_DIRTY) {
                continue;
            }
            node.flags.insert(NodeFlags::WORLD_DIRTY);
            pending.extend(node.dependents.iter().rev());
            pending.extend(node.children.iter().rev());
        }
    }

    fn mark_dirty(&mut self, index: usize) {
        if let Some(node) = self.node_mut(index) {
            node.flags.insert(NodeFlags::DIRTY);
        }
    }

    fn invalidate(&mut self, index: usize, scope: &mut SuppressScope) {
        self.mark_dirty(index);
        self.mark_world_dirty(index, scope);
    }

    fn set_node_value(
        &mut self,
        index: usize,
        value: f32,
        field: fn(&mut crate::component::Node) -> &mut f32,
    ) {
        let Some(node) = self.node_mut(index) else {
            return;
        };
        let slot = field(node);
        if *slot == value {
            return;
        }
        *slot = value;
        self.invalidate(index, &mut SuppressScope::new());
    }

    pub fn set_translation_x(&mut self, index: usize, value: f32) {
        self.set_node_value(index, value, |node| &mut node.translation.x);
    }

    pub fn set_translation_y(&mut self, index: usize, value: f32) {
        self.set_node_value(index, value, |node| &mut node.translation.y);
    }

    pub fn set_translation(&mut self, index: usize, value: Vec2) {
        self.set_translation_x(index, value.x);
        self.set_translation_y(index, value.y);
    }

    pub fn set_scale_x(&mut self, index: usize, value: f32) {
        self.set_node_value(index, value, |node| &mut node.scale.x);
    }

    pub fn set_scale_y(&mut self, index: usize, value: f32) {
        self.set_node_value(index, value, |node| &mut node.scale.y);
    }

    pub fn set_rotation(&mut self, index: usize, value: f32) {
        self.set_node_value(index, value, |node| &mut node.rotation);
    }

    /// Opacity only affects world state
    pub fn set_opacity(&mut self, index: usize, value: f32) {
        let Some(node) = self.node_mut(index) else {
            return;
        };
        if node.opacity == value {
            return;
        }
        node.opacity = value;
        self.mark_world_dirty(index, &mut SuppressScope::new());
    }

    pub fn set_collapsed_visibility(&mut self, index: usize, collapsed: bool) {
        let Some(node) = self.node_mut(index) else {
            return;
        };
        if node.collapsed_visibility == collapsed {
            return;
        }
        node.collapsed_visibility = collapsed;
        self.invalidate(index, &mut SuppressScope::new());
    }

    pub fn set_rotation_override(&mut self, index: usize, value: f32) {
        self.set_rotation_override_scoped(index, value, &mut SuppressScope::new());
    }

    pub(crate) fn set_rotation_override_scoped(
        &mut self,
        index: usize,
        value: f32,
        scope: &mut SuppressScope,
    ) {
        let Some(node) = self.node_mut(index) else {
            return;
        };
        if node.rotation_override == Some(value) {
            return;
        }
        node.rotation_override = Some(value);
        self.invalidate(index, scope);
    }

    pub fn clear_rotation_override(&mut self, index: usize) {
        let Some(node) = self.node_mut(index) else {
            return;
        };
        if node.rotation_override.take().is_some() {
            self.invalidate(index, &mut SuppressScope::new());
        }
    }

    /// Pin the world transform of `index`, ignoring its parent and local
    /// transform until cleared
    pub fn override_world_transform(&mut self, index: usize, transform: Affine2) {
        let Some(node) = self.node_mut(index) else {
            return;
        };
        node.world_override = Some(transform);
        node.world = transform;
        self.mark_world_dirty(index, &mut SuppressScope::new());
    }

    pub fn clear_world_transform_override(&mut self, index: usize) {
        let Some(node) = self.node_mut(index) else {
            return;
        };
        if node.world_override.take().is_some() {
            self.mark_world_dirty(index, &mut SuppressScope::new());
        }
    }

    /// Set a bone's length and move every child bone's origin to the new tip
    pub fn set_bone_length(&mut self, index: usize, length: f32) {
        let children = match self.kind_mut(index) {
            Some(ComponentKind::Bone(bone)) if bone.length != length => {
                bone.length = length;
                bone.node.children.clone()
            }
            _ => return,
        };
        for child in children {
            if self.bone(child).is_some() {
                self.set_translation_x(child, length);
            }
        }
    }

    /// Show child `active - 1` of a solo node and collapse the others
    pub fn set_active_child_index(&mut self, index: usize, active: i32) {
        match self.kind_mut(index) {
            Some(ComponentKind::Solo(solo)) if solo.active_child_index != active => {
                solo.active_child_index = active;
            }
            _ => return,
        }
        self.collapse_solo_children(index);
    }

    /// Show only the child at the solo's one-based active index
    pub(crate) fn collapse_solo_children(&mut self, index: usize) {
        let (active, children) = match self.kind_mut(index) {
            Some(ComponentKind::Solo(solo)) => (solo.active_child_index, solo.node.children.clone()),
            _ => return,
        };
        for (position, child) in children.into_iter().enumerate() {
            let is_active = i64::try_from(position).is_ok_and(|p| p == i64::from(active) - 1);
            self.set_collapsed_visibility(child, !is_active);
        }
    }

    /// Change a render node's draw order; the sort happens on the next advance
    pub fn set_draw_order(&mut self, index: usize, order: u16) {
        let Some(render) = self.kind_mut(index).and_then(ComponentKind::as_render_node_mut) else {
            return;
        };
        if render.render().draw_order == order {
            return;
        }
        render.render_mut().draw_order = order;
        self.flags.insert(ActorFlags::DRAW_ORDER_DIRTY);
    }

    /// Strength only feeds the solve, so only the solve is invalidated
    pub fn set_ik_strength(&mut self, index: usize, strength: f32) {
        if let Some(ComponentKind::IkTarget(target)) = self.kind_mut(index) {
            if target.constraint.strength != strength {
                target.constraint.strength = strength;
                target.node.flags.insert(NodeFlags::SOLVE_DIRTY);
            }
        }
    }

    pub fn set_collision_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(ComponentKind::Collider(collider)) = self.kind_mut(index) {
            collider.is_collision_enabled = enabled;
        }
    }

    /// Replace a custom property's value; returns `false` when `index` is
    /// not a custom property of the same kind
    pub fn set_custom_value(&mut self, index: usize, value: CustomValue) -> bool {
        let Some(ComponentKind::CustomProperty(property)) = self.kind_mut(index) else {
            return false;
        };
        if std::mem::discriminant(&property.value) != std::mem::discriminant(&value) {
            return false;
        }
        property.value = value;
        true
    }

    /// Select an image sequence frame; out-of-range frames are ignored
    pub fn set_sequence_frame(&mut self, index: usize, frame: usize) {
        if let Some(ComponentKind::Image(image)) = self.kind_mut(index) {
            let count = image.sequence.as_ref().map_or(0, |sequence| sequence.frame_count());
            if frame < count {
                image.sequence_frame = frame;
            }
        }
    }

    /// Blend animated vertex positions into an image's deform buffer
    pub(crate) fn write_deformed_vertices(&mut self, index: usize, vertices: &[f32], mix: f32) {
        let Some(ComponentKind::Image(image)) = self.kind_mut(index) else {
            return;
        };
        let Some(buffer) = image.deformed_vertices.as_mut() else {
            return;
        };
        if mix == 1.0 {
            for (target, value) in buffer.iter_mut().zip(vertices) {
                *target = *value;
            }
        } else {
            let keep = 1.0 - mix;
            for (target, value) in buffer.iter_mut().zip(vertices) {
                *target = *target * keep + value * mix;
            }
        }
        image.is_vertex_deform_dirty = true;
        self.flags.insert(ActorFlags::VERTEX_DEFORM_DIRTY);
    }

    /// Rebuild whichever of the local and world transforms are stale
    pub fn update_transforms(&mut self, index: usize) {
        let Some(node) = self.node_mut(index) else {
            return;
        };
        if node.is_dirty() {
            node.update_transform();
        }
        if node.is_world_dirty() {
            self.update_world_transform(index);
        }
    }

    pub(crate) fn update_all_transforms(&mut self) {
        for k in 0..self.nodes.len() {
            let index = self.nodes[k];
            self.update_transforms(index);
        }
    }

    /// Recompute the world transform, render opacity and render collapse of
    /// `index` from its parent, updating the parent first when stale
    pub(crate) fn update_world_transform(&mut self, index: usize) {
        let parent = self.parent(index);
        let Some(node) = self.node_mut(index) else {
            return;
        };
        node.flags.remove(NodeFlags::WORLD_DIRTY);
        if node.is_dirty() {
            node.update_transform();
        }

        let inherited = parent.and_then(|parent| {
            self.update_transforms(parent);
            self.node(parent)
                .map(|p| (p.world, p.render_opacity, p.render_collapsed))
        });

        let Some(node) = self.node_mut(index) else {
            return;
        };
        node.render_opacity = node.opacity;
        match inherited {
            Some((parent_world, parent_opacity, parent_collapsed)) => {
                node.render_collapsed = node.collapsed_visibility || parent_collapsed;
                node.render_opacity *= parent_opacity;
                node.world = node.world_override.unwrap_or(parent_world * node.local);
            }
            None => {
                node.render_collapsed = node.collapsed_visibility;
                node.world = node.world_override.unwrap_or(node.local);
            }
        }
        let world = node.world;

        if let Some(ComponentKind::NestedActor(nested)) = self.kind_mut(index) {
            if nested.transform_nested {
                if let Some(instance) = nested.instance.as_mut() {
                    let root = instance.root();
                    instance.override_world_transform(root, world);
                }
            }
        }
    }

    /// World transform of `index`, recomputed first when stale
    pub fn world_transform(&mut self, index: usize) -> Option<Affine2> {
        if self.node(index)?.is_world_dirty() {
            self.update_world_transform(index);
        }
        self.node(index).map(|node| node.world)
    }

    pub fn world_translation(&mut self, index: usize) -> Option<Vec2> {
        self.world_transform(index).map(|world| world.translation)
    }

    /// Tip of a bone in world space, `None` if `index` is not a bone
    pub fn bone_tip_world_translation(&mut self, index: usize) -> Option<Vec2> {
        self.bone(index)?;
        self.world_transform(index)?;
        self.bone(index).map(|bone| bone.tip_world_translation())
    }
}
