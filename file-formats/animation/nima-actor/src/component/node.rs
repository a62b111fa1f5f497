//! Scene graph nodes and bones

use bitflags::bitflags;
use glam::{Affine2, Vec2};
use nima_data::BlockReader;

use crate::error::Result;

bitflags! {
    /// Cache state of a node's transforms
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// Local transform must be rebuilt from translation/rotation/scale
        const DIRTY = 1 << 0;
        /// World transform, render opacity and render visibility are stale
        const WORLD_DIRTY = 1 << 1;
        /// Solver inputs changed since the last solve; unused on other nodes
        const SOLVE_DIRTY = 1 << 2;
    }
}

/// A component occupying a position in the transform hierarchy
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) translation: Vec2,
    pub(crate) rotation: f32,
    pub(crate) scale: Vec2,
    pub(crate) opacity: f32,
    pub(crate) render_opacity: f32,
    pub(crate) collapsed_visibility: bool,
    pub(crate) render_collapsed: bool,
    pub(crate) rotation_override: Option<f32>,
    pub(crate) world_override: Option<Affine2>,
    pub(crate) local: Affine2,
    pub(crate) world: Affine2,
    pub(crate) flags: NodeFlags,
    pub(crate) children: Vec<usize>,
    pub(crate) dependents: Vec<usize>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            opacity: 1.0,
            render_opacity: 1.0,
            collapsed_visibility: false,
            render_collapsed: false,
            rotation_override: None,
            world_override: None,
            local: Affine2::IDENTITY,
            world: Affine2::IDENTITY,
            flags: NodeFlags::all(),
            children: Vec::new(),
            dependents: Vec::new(),
        }
    }
}

impl Node {
    /// Read translation, rotation, scale, opacity and collapsed visibility
    pub(crate) fn read(reader: &mut BlockReader<'_>) -> Result<Self> {
        let translation = reader.read_vec2()?;
        let rotation = reader.read_f32()?;
        let scale = reader.read_vec2()?;
        let opacity = reader.read_f32()?;
        let collapsed_visibility = reader.read_bool()?;
        Ok(Self {
            translation,
            rotation,
            scale,
            opacity,
            render_opacity: opacity,
            collapsed_visibility,
            ..Self::default()
        })
    }

    /// Copy for a new instance: authored state and overrides are kept,
    /// links are rebuilt by the resolve pass and both caches start dirty.
    pub(crate) fn instance_copy(&self) -> Self {
        Self {
            children: Vec::new(),
            dependents: Vec::new(),
            flags: NodeFlags::all(),
            ..self.clone()
        }
    }

    /// Rebuild the local matrix as translation * rotation * scale.
    /// The rotation override, when set, replaces the authored rotation.
    pub(crate) fn update_transform(&mut self) {
        self.flags.remove(NodeFlags::DIRTY);
        let angle = self.rotation_override.unwrap_or(self.rotation);
        self.local = Affine2::from_scale_angle_translation(self.scale, angle, self.translation);
    }

    pub fn translation(&self) -> Vec2 {
        self.translation
    }

    pub fn x(&self) -> f32 {
        self.translation.x
    }

    pub fn y(&self) -> f32 {
        self.translation.y
    }

    /// Authored rotation in radians
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Opacity multiplied through the parent chain
    pub fn render_opacity(&self) -> f32 {
        self.render_opacity
    }

    pub fn collapsed_visibility(&self) -> bool {
        self.collapsed_visibility
    }

    /// True when this node or any ancestor is collapsed
    pub fn render_collapsed(&self) -> bool {
        self.render_collapsed
    }

    pub fn rotation_override(&self) -> Option<f32> {
        self.rotation_override
    }

    /// Rotation used for the local transform
    pub fn effective_rotation(&self) -> f32 {
        self.rotation_override.unwrap_or(self.rotation)
    }

    pub fn world_override(&self) -> Option<Affine2> {
        self.world_override
    }

    pub fn local_transform(&self) -> Affine2 {
        self.local
    }

    /// Last computed world transform; stale while [`Node::is_world_dirty`]
    pub fn world_transform(&self) -> Affine2 {
        self.world
    }

    pub fn world_translation(&self) -> Vec2 {
        self.world.translation
    }

    pub fn is_dirty(&self) -> bool {
        self.flags.contains(NodeFlags::DIRTY)
    }

    pub fn is_world_dirty(&self) -> bool {
        self.flags.contains(NodeFlags::WORLD_DIRTY)
    }

    pub fn is_solve_dirty(&self) -> bool {
        self.flags.contains(NodeFlags::SOLVE_DIRTY)
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Nodes invalidated alongside this one without being its children
    pub fn dependents(&self) -> &[usize] {
        &self.dependents
    }
}

/// A node with a length along its local +X axis
#[derive(Debug, Clone, Default)]
pub struct Bone {
    pub(crate) node: Node,
    pub(crate) length: f32,
    pub(crate) is_connected_to_image: bool,
}

impl Bone {
    pub(crate) fn read(reader: &mut BlockReader<'_>) -> Result<Self> {
        let node = Node::read(reader)?;
        let length = reader.read_f32()?;
        Ok(Self {
            node,
            length,
            is_connected_to_image: false,
        })
    }

    pub(crate) fn instance_copy(&self) -> Self {
        Self {
            node: self.node.instance_copy(),
            length: self.length,
            is_connected_to_image: false,
        }
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    /// Set when an image skins against this bone
    pub fn is_connected_to_image(&self) -> bool {
        self.is_connected_to_image
    }

    /// Bone tip position in world space
    pub fn tip_world_translation(&self) -> Vec2 {
        self.node.world.transform_point2(Vec2::new(self.length, 0.0))
    }
}

/// A node that shows exactly one of its children
#[derive(Debug, Clone, Default)]
pub struct Solo {
    pub(crate) node: Node,
    pub(crate) active_child_index: i32,
}

impl Solo {
    pub(crate) fn read(reader: &mut BlockReader<'_>) -> Result<Self> {
        let node = Node::read(reader)?;
        let active_child_index = reader.read_f32()? as i32;
        Ok(Self {
            node,
            active_child_index,
        })
    }

    pub(crate) fn instance_copy(&self) -> Self {
        Self {
            node: self.node.instance_copy(),
            active_child_index: self.active_child_index,
        }
    }

    /// One-based index of the visible child; 0 hides all children
    pub fn active_child_index(&self) -> i32 {
        self.active_child_index
    }
}
