//! The actor: component arena, derived index lists and per-frame advance

use std::sync::Arc;

use bitflags::bitflags;
use glam::Affine2;

use crate::animation::Animation;
use crate::component::{
    Bone, ChainLink, Component, ComponentKind, CustomValue, IkTarget, Image, NestedActorAsset,
    Node, RenderNode, Solver,
};

bitflags! {
    /// Work deferred to the next [`Actor::advance`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActorFlags: u8 {
        const DRAW_ORDER_DIRTY = 1 << 0;
        const VERTEX_DEFORM_DIRTY = 1 << 1;
        /// Created by [`Actor::make_instance`]
        const IS_INSTANCE = 1 << 2;
    }
}

/// A loaded character: scene graph, animations and nested assets.
///
/// Components live in a flat arena addressed by index; index 0 is always the
/// root node. Slots holding component types this runtime does not know are
/// `None`, which keeps every index in the file valid.
#[derive(Debug)]
pub struct Actor {
    pub(crate) version: u32,
    pub(crate) flags: ActorFlags,
    pub(crate) components: Vec<Option<Component>>,
    pub(crate) nodes: Vec<usize>,
    pub(crate) render_nodes: Vec<usize>,
    pub(crate) image_nodes: Vec<usize>,
    pub(crate) solvers: Vec<usize>,
    pub(crate) nested_nodes: Vec<usize>,
    pub(crate) animations: Arc<[Arc<Animation>]>,
    pub(crate) nested_assets: Arc<[NestedActorAsset]>,
    pub(crate) max_texture_index: i32,
    pub(crate) deformed_images: Vec<usize>,
}

impl Actor {
    pub(crate) fn with_components(version: u32, components: Vec<Option<Component>>) -> Self {
        Self {
            version,
            flags: ActorFlags::DRAW_ORDER_DIRTY,
            components,
            nodes: Vec::new(),
            render_nodes: Vec::new(),
            image_nodes: Vec::new(),
            solvers: Vec::new(),
            nested_nodes: Vec::new(),
            animations: Arc::from(Vec::new()),
            nested_assets: Arc::from(Vec::new()),
            max_texture_index: -1,
            deformed_images: Vec::new(),
        }
    }

    /// Rebuild every cross-reference from the raw indices stored in the
    /// components.
    ///
    /// Parents and typed lists are resolved for all components first, so
    /// type-specific resolution can walk the hierarchy regardless of the
    /// order components appear in.
    pub(crate) fn resolve(&mut self) {
        self.nodes.clear();
        self.render_nodes.clear();
        self.image_nodes.clear();
        self.solvers.clear();
        self.nested_nodes.clear();

        for index in 0..self.components.len() {
            self.resolve_parent(index);
        }

        for (index, component) in self.components.iter().enumerate() {
            let Some(component) = component else {
                continue;
            };
            let kind = &component.kind;
            if kind.is_node() {
                self.nodes.push(index);
            }
            if kind.as_render_node().is_some() {
                self.render_nodes.push(index);
            }
            if kind.as_solver().is_some() {
                self.solvers.push(index);
            }
            match kind {
                ComponentKind::Image(_) => self.image_nodes.push(index),
                ComponentKind::NestedActor(_) => self.nested_nodes.push(index),
                _ => {}
            }
        }

        for index in self.solvers.clone() {
            self.resolve_ik_target(index);
        }
        for index in self.image_nodes.clone() {
            self.resolve_image_bones(index);
        }

        // Stable, so equal orders keep load order
        let mut solvers = std::mem::take(&mut self.solvers);
        solvers.sort_by_key(|&index| self.solver(index).map_or(0, Solver::order));
        self.solvers = solvers;

        let solos: Vec<usize> = self
            .nodes
            .iter()
            .copied()
            .filter(|&index| {
                matches!(
                    self.component(index).map(Component::kind),
                    Some(ComponentKind::Solo(_))
                )
            })
            .collect();
        for index in solos {
            self.collapse_solo_children(index);
        }

        self.instantiate_nested();
        self.flags.insert(ActorFlags::DRAW_ORDER_DIRTY);
    }

    fn resolve_parent(&mut self, index: usize) {
        if index == 0 {
            return;
        }
        let Some(parent_index) = self.component(index).map(|c| usize::from(c.parent_index)) else {
            return;
        };
        let is_property = matches!(
            self.component(index).map(|c| &c.kind),
            Some(ComponentKind::CustomProperty(_))
        );
        let parent_is_node = self.node(parent_index).is_some();

        match self.component_mut(parent_index) {
            Some(parent) if is_property => parent.custom_properties.push(index),
            Some(_) => {}
            None => {
                log::warn!("Component {index} has missing parent {parent_index}");
                return;
            }
        }

        if !parent_is_node || parent_index == index {
            return;
        }
        let is_node = self.node(index).is_some();
        if let Some(component) = self.component_mut(index) {
            component.parent = Some(parent_index);
        }
        if is_node {
            if let Some(parent) = self.node_mut(parent_index) {
                parent.children.push(index);
            }
        }
    }

    fn resolve_image_bones(&mut self, index: usize) {
        let Some(image) = self.image(index) else {
            return;
        };
        let bone_indices: Vec<usize> = image
            .bone_connections
            .iter()
            .map(|connection| usize::from(connection.bone_index))
            .collect();

        let resolved: Vec<Option<usize>> = bone_indices
            .iter()
            .map(|&bone| self.bone(bone).map(|_| bone))
            .collect();

        for bone in resolved.iter().flatten() {
            if let Some(ComponentKind::Bone(bone)) = self.kind_mut(*bone) {
                bone.is_connected_to_image = true;
            }
        }
        if let Some(ComponentKind::Image(image)) = self.kind_mut(index) {
            for (connection, node) in image.bone_connections.iter_mut().zip(resolved) {
                if node.is_none() {
                    log::warn!(
                        "Image {index} is skinned to {} which is not a bone",
                        connection.bone_index
                    );
                }
                connection.node = node;
            }
        }
    }

    fn resolve_ik_target(&mut self, index: usize) {
        let Some(target) = self.ik_target(index) else {
            return;
        };
        let raw = target.constraint.bone_indices.clone();

        let mut influenced = Vec::with_capacity(raw.len());
        for &bone in &raw {
            let bone = usize::from(bone);
            if self.bone(bone).is_none() {
                log::warn!("IK target {index} references {bone} which is not a bone, disabling");
                influenced.clear();
                break;
            }
            influenced.push(bone);
        }

        let mut bone1_child = None;
        let mut chain = Vec::new();
        if let (Some(&bone1), Some(&bone2)) = (influenced.first(), influenced.last()) {
            for &bone in &influenced {
                if let Some(node) = self.node_mut(bone) {
                    if !node.dependents.contains(&index) {
                        node.dependents.push(index);
                    }
                }
            }

            // Walks are bounded by the arena size so malformed parent cycles terminate
            let limit = self.components.len();

            let mut child = bone2;
            if influenced.len() > 1 {
                for _ in 0..limit {
                    if self.parent(child) == Some(bone1) {
                        break;
                    }
                    match self.parent_bone(child) {
                        Some(parent) => child = parent,
                        None => break,
                    }
                }
            }
            bone1_child = Some(child);

            let stop = self.parent(bone1);
            let mut end = Some(bone2);
            while let Some(bone) = end {
                if Some(bone) == stop || chain.len() >= limit {
                    break;
                }
                end = self.parent_bone(bone);
                let included = influenced.contains(&bone) || end.is_some_and(|e| influenced.contains(&e));
                chain.push(ChainLink {
                    bone,
                    fk_angle: 0.0,
                    included,
                });
            }
        }

        if let Some(ComponentKind::IkTarget(target)) = self.kind_mut(index) {
            target.constraint.influenced = influenced;
            target.constraint.bone1_child = bone1_child;
            target.constraint.chain = chain;
        }
    }

    /// Create live instances for nested nodes whose asset has an actor
    /// attached and that have none yet
    pub fn instantiate_nested(&mut self) {
        let assets = Arc::clone(&self.nested_assets);
        for k in 0..self.nested_nodes.len() {
            let index = self.nested_nodes[k];
            let Some(ComponentKind::NestedActor(nested)) = self.kind_mut(index) else {
                continue;
            };
            if nested.instance.is_some() {
                continue;
            }
            let Some(asset_index) = nested.asset_index else {
                continue;
            };
            match assets.get(usize::from(asset_index)) {
                Some(asset) => {
                    if let Some(template) = asset.actor() {
                        nested.instance = Some(Box::new(template.make_instance()));
                    }
                }
                None => log::warn!("Nested actor {index} references missing asset {asset_index}"),
            }
        }
    }

    /// Copy this actor for independent playback.
    ///
    /// Geometry, animations and the nested asset table are shared with
    /// `self`; transform state, overrides, custom property values and
    /// deform buffers belong to the copy.
    pub fn make_instance(&self) -> Actor {
        let components = self
            .components
            .iter()
            .map(|component| component.as_ref().map(Component::instance_copy))
            .collect();

        let mut instance = Actor {
            version: self.version,
            flags: ActorFlags::IS_INSTANCE | ActorFlags::DRAW_ORDER_DIRTY,
            components,
            nodes: Vec::new(),
            render_nodes: Vec::new(),
            image_nodes: Vec::new(),
            solvers: Vec::new(),
            nested_nodes: Vec::new(),
            animations: Arc::clone(&self.animations),
            nested_assets: Arc::clone(&self.nested_assets),
            max_texture_index: self.max_texture_index,
            deformed_images: Vec::new(),
        };
        instance.resolve();
        instance
    }

    /// Bring the actor up to date for rendering.
    ///
    /// Refreshes transforms, runs IK when any constraint's inputs changed,
    /// collects images whose deform buffers changed, re-sorts render nodes
    /// when a draw order changed and advances nested actors.
    pub fn advance(&mut self, elapsed_seconds: f32) {
        self.deformed_images.clear();

        let run_solvers = self
            .solvers
            .iter()
            .any(|&index| self.solver(index).is_some_and(Solver::needs_solve));

        self.update_all_transforms();

        if run_solvers {
            self.solve_constraints();
        }

        if self.flags.contains(ActorFlags::VERTEX_DEFORM_DIRTY) {
            self.flags.remove(ActorFlags::VERTEX_DEFORM_DIRTY);
            for k in 0..self.image_nodes.len() {
                let index = self.image_nodes[k];
                let refreshed = match self.kind_mut(index) {
                    Some(ComponentKind::Image(image)) if image.is_vertex_deform_dirty => {
                        image.is_vertex_deform_dirty = false;
                        true
                    }
                    _ => false,
                };
                if refreshed {
                    self.deformed_images.push(index);
                }
            }
        }

        if self.flags.contains(ActorFlags::DRAW_ORDER_DIRTY) {
            self.flags.remove(ActorFlags::DRAW_ORDER_DIRTY);
            let mut render_nodes = std::mem::take(&mut self.render_nodes);
            render_nodes.sort_by_key(|&index| self.render_node(index).map_or(0, |node| node.draw_order()));
            self.render_nodes = render_nodes;
        }

        for k in 0..self.nested_nodes.len() {
            let index = self.nested_nodes[k];
            if let Some(ComponentKind::NestedActor(nested)) = self.kind_mut(index) {
                if let Some(instance) = nested.instance.as_mut() {
                    instance.advance(elapsed_seconds);
                }
            }
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn flags(&self) -> ActorFlags {
        self.flags
    }

    pub fn is_instance(&self) -> bool {
        self.flags.contains(ActorFlags::IS_INSTANCE)
    }

    /// Number of arena slots, including the root and empty slots
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn component(&self, index: usize) -> Option<&Component> {
        self.components.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn component_mut(&mut self, index: usize) -> Option<&mut Component> {
        self.components.get_mut(index).and_then(Option::as_mut)
    }

    pub(crate) fn kind_mut(&mut self, index: usize) -> Option<&mut ComponentKind> {
        self.component_mut(index).map(|component| &mut component.kind)
    }

    /// Occupied slots with their indices
    pub fn components(&self) -> impl Iterator<Item = (usize, &Component)> {
        self.components
            .iter()
            .enumerate()
            .filter_map(|(index, component)| component.as_ref().map(|c| (index, c)))
    }

    /// First component with the given name
    pub fn component_by_name(&self, name: &str) -> Option<usize> {
        self.components()
            .find(|(_, component)| component.name == name)
            .map(|(index, _)| index)
    }

    /// Index of the root node
    pub fn root(&self) -> usize {
        0
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.component(index).and_then(Component::as_node)
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.kind_mut(index).and_then(ComponentKind::as_node_mut)
    }

    /// Resolved parent node of `index`
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.component(index).and_then(Component::parent)
    }

    pub(crate) fn parent_bone(&self, index: usize) -> Option<usize> {
        self.parent(index).filter(|&parent| self.bone(parent).is_some())
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.component(index).and_then(|c| c.kind.as_bone())
    }

    pub fn image(&self, index: usize) -> Option<&Image> {
        self.component(index).and_then(|c| c.kind.as_image())
    }

    pub fn ik_target(&self, index: usize) -> Option<&IkTarget> {
        self.component(index).and_then(|c| c.kind.as_ik_target())
    }

    pub fn render_node(&self, index: usize) -> Option<&dyn RenderNode> {
        self.component(index).and_then(|c| c.kind.as_render_node())
    }

    pub(crate) fn solver(&self, index: usize) -> Option<&dyn Solver> {
        self.component(index).and_then(|c| c.kind.as_solver())
    }

    /// Every node, in index order
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Render nodes, sorted by draw order after the first advance
    pub fn render_nodes(&self) -> &[usize] {
        &self.render_nodes
    }

    pub fn image_nodes(&self) -> &[usize] {
        &self.image_nodes
    }

    /// Solvers in solve order
    pub fn solvers(&self) -> &[usize] {
        &self.solvers
    }

    pub fn nested_nodes(&self) -> &[usize] {
        &self.nested_nodes
    }

    /// Images whose deform buffers changed during the last advance
    pub fn deformed_images(&self) -> &[usize] {
        &self.deformed_images
    }

    pub fn animations(&self) -> &[Arc<Animation>] {
        &self.animations
    }

    pub fn animation(&self, name: &str) -> Option<&Arc<Animation>> {
        self.animations.iter().find(|animation| animation.name() == name)
    }

    pub fn nested_assets(&self) -> &[NestedActorAsset] {
        &self.nested_assets
    }

    /// Live instance hosted by a nested actor node
    pub fn nested_actor(&self, index: usize) -> Option<&Actor> {
        self.component(index)
            .and_then(|c| c.kind.as_nested_actor())
            .and_then(|nested| nested.instance())
    }

    pub fn nested_actor_mut(&mut self, index: usize) -> Option<&mut Actor> {
        match self.kind_mut(index) {
            Some(ComponentKind::NestedActor(nested)) => nested.instance.as_deref_mut(),
            _ => None,
        }
    }

    /// Value of a custom property component
    pub fn custom_value(&self, index: usize) -> Option<&CustomValue> {
        self.component(index)
            .and_then(|c| c.kind.as_custom_property())
            .map(|property| property.value())
    }

    /// Custom property named `name` attached to `component`
    pub fn custom_property(&self, component: usize, name: &str) -> Option<&CustomValue> {
        self.component(component)?
            .custom_properties
            .iter()
            .find(|&&index| self.component(index).is_some_and(|c| c.name == name))
            .and_then(|&index| self.custom_value(index))
    }

    pub fn custom_int(&self, component: usize, name: &str) -> Option<i32> {
        match self.custom_property(component, name)? {
            CustomValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn custom_float(&self, component: usize, name: &str) -> Option<f32> {
        match self.custom_property(component, name)? {
            CustomValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn custom_string(&self, component: usize, name: &str) -> Option<&str> {
        match self.custom_property(component, name)? {
            CustomValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn custom_bool(&self, component: usize, name: &str) -> Option<bool> {
        match self.custom_property(component, name)? {
            CustomValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Highest atlas index used by any image or mesh surface, -1 for none
    pub fn max_texture_index(&self) -> i32 {
        self.max_texture_index
    }

    pub fn texture_count(&self) -> usize {
        usize::try_from(self.max_texture_index + 1).unwrap_or(0)
    }

    /// Skinning matrices for an image: identity followed by
    /// `bone world * inverse bind` per connected bone, six floats each.
    ///
    /// Reads world transforms as of the last advance.
    pub fn bone_influence_matrices(&self, index: usize) -> Option<Vec<f32>> {
        let image = self.image(index)?;
        let mut matrices = Vec::with_capacity((image.bone_connections.len() + 1) * 6);
        matrices.extend_from_slice(&Affine2::IDENTITY.to_cols_array());
        for connection in &image.bone_connections {
            let matrix = connection
                .node
                .and_then(|bone| self.node(bone))
                .map_or(Affine2::IDENTITY, |bone| {
                    bone.world_transform() * connection.inverse_bind
                });
            matrices.extend_from_slice(&matrix.to_cols_array());
        }
        Some(matrices)
    }
}
