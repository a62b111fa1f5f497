//! Draw-ordered nodes and static meshes

use std::sync::Arc;

use nima_data::BlockReader;

use super::node::Node;
use crate::error::Result;

/// How a render node composites onto what is already drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub enum BlendMode {
    Off,
    #[default]
    Normal,
    Multiply,
    Screen,
    Additive,
}

impl BlendMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Normal,
            1 => Self::Multiply,
            2 => Self::Screen,
            3 => Self::Additive,
            other => {
                log::debug!("Unknown blend mode {other}, using Normal");
                Self::Normal
            }
        }
    }

    /// Wire value, -1 for [`BlendMode::Off`]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Off => -1,
            Self::Normal => 0,
            Self::Multiply => 1,
            Self::Screen => 2,
            Self::Additive => 3,
        }
    }
}

/// State shared by everything that is sorted for drawing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderData {
    pub(crate) draw_order: u16,
}

impl RenderData {
    pub fn draw_order(&self) -> u16 {
        self.draw_order
    }
}

/// One independently textured, unskinned mesh of a [`StaticMesh`]
#[derive(Debug, Clone, Default)]
pub struct Surface {
    texture_index: i32,
    vertex_count: usize,
    vertices: Vec<f32>,
    triangles: Vec<u16>,
}

impl Surface {
    /// Vertices are `[x, y, u, v]`
    pub const VERTEX_STRIDE: usize = 4;

    fn read(reader: &mut BlockReader<'_>) -> Result<Self> {
        let texture_index = i32::from(reader.read_u8()?);
        let vertex_count = reader.read_u32()? as usize;
        let vertices = reader.read_f32_array(vertex_count.saturating_mul(Self::VERTEX_STRIDE))?;
        let triangle_count = reader.read_u32()? as usize;
        let triangles = reader.read_u16_array(triangle_count.saturating_mul(3))?;
        Ok(Self {
            texture_index,
            vertex_count,
            vertices,
            triangles,
        })
    }

    pub fn texture_index(&self) -> i32 {
        self.texture_index
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[u16] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }
}

/// Render node made of rigid surfaces
#[derive(Debug, Clone)]
pub struct StaticMesh {
    pub(crate) node: Node,
    pub(crate) render: RenderData,
    pub(crate) blend_mode: BlendMode,
    pub(crate) surfaces: Arc<[Surface]>,
}

impl StaticMesh {
    pub(crate) fn read(reader: &mut BlockReader<'_>) -> Result<Self> {
        let node = Node::read(reader)?;
        let mut mesh = Self {
            node,
            render: RenderData::default(),
            blend_mode: BlendMode::Off,
            surfaces: Arc::from(Vec::new()),
        };

        let is_visible = reader.read_u8()? != 0;
        if is_visible {
            mesh.blend_mode = BlendMode::from_u8(reader.read_u8()?);
            mesh.render.draw_order = reader.read_u16()?;
            let surface_count = reader.read_u16()? as usize;
            let surfaces = (0..surface_count)
                .map(|_| Surface::read(reader))
                .collect::<Result<Vec<_>>>()?;
            mesh.surfaces = Arc::from(surfaces);
        }
        Ok(mesh)
    }

    pub(crate) fn instance_copy(&self) -> Self {
        Self {
            node: self.node.instance_copy(),
            render: self.render,
            blend_mode: self.blend_mode,
            surfaces: Arc::clone(&self.surfaces),
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub(crate) fn max_texture_index(&self) -> Option<i32> {
        self.surfaces.iter().map(Surface::texture_index).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_mode_values() {
        assert_eq!(BlendMode::from_u8(3), BlendMode::Additive);
        assert_eq!(BlendMode::from_u8(9), BlendMode::Normal);
        assert_eq!(BlendMode::Off.as_i32(), -1);
        assert_eq!(BlendMode::Screen.as_i32(), 2);
    }

    #[test]
    fn test_surface_read() {
        let mut data = vec![2u8];
        data.extend_from_slice(&1u32.to_le_bytes());
        for value in [1.0f32, 2.0, 0.5, 0.5] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&1u32.to_le_bytes());
        for index in [0u16, 0, 0] {
            data.extend_from_slice(&index.to_le_bytes());
        }

        let mut reader = BlockReader::new(&data);
        let surface = Surface::read(&mut reader).unwrap();
        assert_eq!(surface.texture_index(), 2);
        assert_eq!(surface.vertex_count(), 1);
        assert_eq!(surface.vertices(), &[1.0, 2.0, 0.5, 0.5]);
        assert_eq!(surface.triangle_count(), 1);
        assert!(reader.is_empty());
    }
}
