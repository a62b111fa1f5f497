//! Collision shapes attached to the scene graph

use glam::Vec2;
use nima_data::BlockReader;

use super::node::Node;
use crate::block_type::BlockType;
use crate::error::Result;

/// Geometry of a collider, in the collider node's local space
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Rectangle { width: f32, height: f32 },
    Triangle { width: f32, height: f32 },
    Circle { radius: f32 },
    Polygon { contour: Vec<Vec2> },
    Line { vertices: Vec<Vec2> },
}

impl ColliderShape {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rectangle { .. } => "rectangle",
            Self::Triangle { .. } => "triangle",
            Self::Circle { .. } => "circle",
            Self::Polygon { .. } => "polygon",
            Self::Line { .. } => "line",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Collider {
    pub(crate) node: Node,
    pub(crate) is_collision_enabled: bool,
    pub(crate) shape: ColliderShape,
}

impl Collider {
    /// Read a collider of the given block type; `None` for non-collider types
    pub(crate) fn read(reader: &mut BlockReader<'_>, block: BlockType) -> Result<Option<Self>> {
        let node = Node::read(reader)?;
        let is_collision_enabled = reader.read_bool()?;
        let shape = match block {
            BlockType::ColliderRectangle => ColliderShape::Rectangle {
                width: reader.read_f32()?,
                height: reader.read_f32()?,
            },
            BlockType::ColliderTriangle => ColliderShape::Triangle {
                width: reader.read_f32()?,
                height: reader.read_f32()?,
            },
            BlockType::ColliderCircle => ColliderShape::Circle {
                radius: reader.read_f32()?,
            },
            BlockType::ColliderPolygon => ColliderShape::Polygon {
                contour: read_points(reader)?,
            },
            BlockType::ColliderLine => ColliderShape::Line {
                vertices: read_points(reader)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(Self {
            node,
            is_collision_enabled,
            shape,
        }))
    }

    pub(crate) fn instance_copy(&self) -> Self {
        Self {
            node: self.node.instance_copy(),
            is_collision_enabled: self.is_collision_enabled,
            shape: self.shape.clone(),
        }
    }

    pub fn is_collision_enabled(&self) -> bool {
        self.is_collision_enabled
    }

    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }
}

fn read_points(reader: &mut BlockReader<'_>) -> Result<Vec<Vec2>> {
    let count = reader.read_u32()? as usize;
    let values = reader.read_f32_array(count.saturating_mul(2))?;
    Ok(values
        .chunks_exact(2)
        .map(|pair| Vec2::new(pair[0], pair[1]))
        .collect())
}
