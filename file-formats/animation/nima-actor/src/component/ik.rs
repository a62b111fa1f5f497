//! IK target nodes

use nima_data::BlockReader;

use super::node::Node;
use crate::error::Result;

/// One bone of the chain an IK constraint may rotate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainLink {
    pub bone: usize,
    /// Rotation recorded before solving, blended back in by strength
    pub fk_angle: f32,
    /// The bone or its parent bone is influenced by the constraint
    pub included: bool,
}

/// Constraint data of an [`IkTarget`]
#[derive(Debug, Clone, Default)]
pub struct IkConstraint {
    pub(crate) order: u16,
    pub(crate) strength: f32,
    pub(crate) invert: bool,
    pub(crate) bone_indices: Vec<u16>,
    pub(crate) influenced: Vec<usize>,
    pub(crate) bone1_child: Option<usize>,
    pub(crate) chain: Vec<ChainLink>,
}

impl IkConstraint {
    pub fn order(&self) -> u16 {
        self.order
    }

    /// Blend weight between the FK pose (0) and the solved pose (1)
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Selects the other elbow solution for two-bone solves
    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Component indices as stored in the file
    pub fn bone_indices(&self) -> &[u16] {
        &self.bone_indices
    }

    /// Resolved influenced bones, empty when any index was invalid
    pub fn influenced(&self) -> &[usize] {
        &self.influenced
    }

    pub fn bone1(&self) -> Option<usize> {
        self.influenced.first().copied()
    }

    pub fn bone2(&self) -> Option<usize> {
        self.influenced.last().copied()
    }

    /// Child of bone1 on the path down to bone2
    pub fn bone1_child(&self) -> Option<usize> {
        self.bone1_child
    }

    /// Bones from bone2 up to and including bone1
    pub fn chain(&self) -> &[ChainLink] {
        &self.chain
    }
}

/// A node whose world position bones are rotated to reach
#[derive(Debug, Clone, Default)]
pub struct IkTarget {
    pub(crate) node: Node,
    pub(crate) constraint: IkConstraint,
}

impl IkTarget {
    pub(crate) fn read(reader: &mut BlockReader<'_>) -> Result<Self> {
        let node = Node::read(reader)?;
        let order = reader.read_u16()?;
        let strength = reader.read_f32()?;
        let invert = reader.read_bool()?;
        let bone_count = reader.read_u8()? as usize;
        let bone_indices = reader.read_u16_array(bone_count)?;
        Ok(Self {
            node,
            constraint: IkConstraint {
                order,
                strength,
                invert,
                bone_indices,
                ..IkConstraint::default()
            },
        })
    }

    pub(crate) fn instance_copy(&self) -> Self {
        Self {
            node: self.node.instance_copy(),
            constraint: IkConstraint {
                order: self.constraint.order,
                strength: self.constraint.strength,
                invert: self.constraint.invert,
                bone_indices: self.constraint.bone_indices.clone(),
                ..IkConstraint::default()
            },
        }
    }

    pub fn constraint(&self) -> &IkConstraint {
        &self.constraint
    }
}
