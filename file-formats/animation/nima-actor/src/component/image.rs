//! Skinned image meshes and image sequences

use std::sync::Arc;

use glam::Affine2;
use nima_data::BlockReader;

use super::node::Node;
use super::render::{BlendMode, RenderData};
use crate::error::Result;

/// Vertex and index buffers read from the file, shared by all instances
#[derive(Debug, Clone, Default)]
pub struct ImageGeometry {
    vertex_count: usize,
    vertex_stride: usize,
    vertices: Vec<f32>,
    triangles: Vec<u16>,
}

impl ImageGeometry {
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// 4 floats `[x, y, u, v]`, or 12 when skinned (adds 4 weights and 4 bone indices)
    pub fn vertex_stride(&self) -> usize {
        self.vertex_stride
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[u16] {
        &self.triangles
    }

    /// Interleaved `[x, y]` pairs pulled out of the vertex buffer
    pub fn positions(&self) -> Vec<f32> {
        self.strided_pairs(0)
    }

    /// Interleaved `[u, v]` pairs pulled out of the vertex buffer
    pub fn uvs(&self) -> Vec<f32> {
        self.strided_pairs(2)
    }

    fn strided_pairs(&self, offset: usize) -> Vec<f32> {
        if self.vertex_stride == 0 {
            return Vec::new();
        }
        self.vertices
            .chunks_exact(self.vertex_stride)
            .flat_map(|vertex| [vertex[offset], vertex[offset + 1]])
            .collect()
    }
}

/// A bone the image is skinned against
#[derive(Debug, Clone)]
pub struct BoneConnection {
    pub(crate) bone_index: u16,
    pub(crate) node: Option<usize>,
    pub(crate) bind: Affine2,
    pub(crate) inverse_bind: Affine2,
}

impl BoneConnection {
    pub fn bone_index(&self) -> u16 {
        self.bone_index
    }

    /// Resolved bone, `None` when the index did not point at a bone
    pub fn node(&self) -> Option<usize> {
        self.node
    }

    pub fn bind(&self) -> Affine2 {
        self.bind
    }

    pub fn inverse_bind(&self) -> Affine2 {
        self.inverse_bind
    }
}

/// One frame of an image sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceFrame {
    pub atlas_index: i32,
    /// Offset of this frame's UVs into [`ImageSequence::uvs`], in floats
    pub offset: usize,
}

/// Flip-book frames that swap atlas and UVs on a fixed mesh
#[derive(Debug, Clone, Default)]
pub struct ImageSequence {
    frames: Vec<SequenceFrame>,
    uvs: Vec<f32>,
}

impl ImageSequence {
    pub fn frames(&self) -> &[SequenceFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }
}

/// A textured mesh, optionally skinned to bones
#[derive(Debug, Clone)]
pub struct Image {
    pub(crate) node: Node,
    pub(crate) render: RenderData,
    pub(crate) blend_mode: BlendMode,
    pub(crate) texture_index: i32,
    pub(crate) geometry: Arc<ImageGeometry>,
    pub(crate) bone_connections: Vec<BoneConnection>,
    pub(crate) deformed_vertices: Option<Vec<f32>>,
    pub(crate) is_vertex_deform_dirty: bool,
    pub(crate) sequence: Option<Arc<ImageSequence>>,
    pub(crate) sequence_frame: usize,
}

impl Image {
    pub(crate) fn read(reader: &mut BlockReader<'_>) -> Result<Self> {
        let node = Node::read(reader)?;
        let mut image = Self {
            node,
            render: RenderData::default(),
            blend_mode: BlendMode::Off,
            texture_index: -1,
            geometry: Arc::new(ImageGeometry::default()),
            bone_connections: Vec::new(),
            deformed_vertices: None,
            is_vertex_deform_dirty: false,
            sequence: None,
            sequence_frame: 0,
        };

        let is_visible = reader.read_u8()? != 0;
        if !is_visible {
            return Ok(image);
        }

        image.blend_mode = BlendMode::from_u8(reader.read_u8()?);
        image.render.draw_order = reader.read_u16()?;
        image.texture_index = i32::from(reader.read_u8()?);

        let bone_count = reader.read_u8()? as usize;
        for _ in 0..bone_count {
            let bone_index = reader.read_u16()?;
            let bind = reader.read_affine2()?;
            image.bone_connections.push(BoneConnection {
                bone_index,
                node: None,
                bind,
                inverse_bind: invert_or_identity(bind),
            });
        }
        if bone_count > 0 {
            // Skinned images are positioned by their bones alone
            image.node.world_override = Some(reader.read_affine2()?);
        }

        let vertex_count = reader.read_u32()? as usize;
        let vertex_stride = if bone_count > 0 { 12 } else { 4 };
        let vertices = reader.read_f32_array(vertex_count.saturating_mul(vertex_stride))?;
        let triangle_count = reader.read_u32()? as usize;
        let triangles = reader.read_u16_array(triangle_count.saturating_mul(3))?;

        image.geometry = Arc::new(ImageGeometry {
            vertex_count,
            vertex_stride,
            vertices,
            triangles,
        });
        Ok(image)
    }

    /// Read an image followed by its extra sequence frames
    pub(crate) fn read_sequence(reader: &mut BlockReader<'_>) -> Result<Self> {
        let mut image = Self::read(reader)?;
        if image.texture_index < 0 {
            return Ok(image);
        }

        let frame_count = reader.read_u16()? as usize;
        if frame_count == 0 {
            return Ok(image);
        }
        let uv_stride = image.geometry.vertex_count * 2;
        let mut frames = Vec::with_capacity(frame_count);
        let mut uvs = Vec::with_capacity(uv_stride * frame_count);

        frames.push(SequenceFrame {
            atlas_index: image.texture_index,
            offset: 0,
        });
        uvs.extend(image.geometry.uvs());

        for _ in 1..frame_count {
            let atlas_index = i32::from(reader.read_u8()?);
            frames.push(SequenceFrame {
                atlas_index,
                offset: uvs.len(),
            });
            uvs.extend(reader.read_f32_array(uv_stride)?);
        }

        image.sequence = Some(Arc::new(ImageSequence { frames, uvs }));
        Ok(image)
    }

    pub(crate) fn instance_copy(&self) -> Self {
        Self {
            node: self.node.instance_copy(),
            render: self.render,
            blend_mode: self.blend_mode,
            texture_index: self.texture_index,
            geometry: Arc::clone(&self.geometry),
            bone_connections: self
                .bone_connections
                .iter()
                .map(|connection| BoneConnection {
                    node: None,
                    ..connection.clone()
                })
                .collect(),
            deformed_vertices: self.deformed_vertices.clone(),
            is_vertex_deform_dirty: self.is_vertex_deform_dirty,
            sequence: self.sequence.clone(),
            sequence_frame: self.sequence_frame,
        }
    }

    /// Allocate the deform buffer, seeded with the rest positions
    pub(crate) fn enable_animation_deform(&mut self) {
        if self.deformed_vertices.is_none() {
            self.deformed_vertices = Some(self.geometry.positions());
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Atlas index, or the current sequence frame's atlas for sequences
    pub fn texture_index(&self) -> i32 {
        self.current_sequence_frame()
            .map_or(self.texture_index, |frame| frame.atlas_index)
    }

    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count
    }

    pub fn triangle_count(&self) -> usize {
        self.geometry.triangles.len() / 3
    }

    pub fn vertices(&self) -> &[f32] {
        &self.geometry.vertices
    }

    pub fn triangles(&self) -> &[u16] {
        &self.geometry.triangles
    }

    /// UVs for the current sequence frame, or the mesh's own UVs
    pub fn uvs(&self) -> Vec<f32> {
        match (&self.sequence, self.current_sequence_frame()) {
            (Some(sequence), Some(frame)) => {
                let end = frame.offset + self.geometry.vertex_count * 2;
                sequence.uvs.get(frame.offset..end).map_or_else(Vec::new, <[f32]>::to_vec)
            }
            _ => self.geometry.uvs(),
        }
    }

    pub fn bone_connections(&self) -> &[BoneConnection] {
        &self.bone_connections
    }

    pub fn connected_bone_count(&self) -> usize {
        self.bone_connections.len()
    }

    pub fn is_skinned(&self) -> bool {
        !self.bone_connections.is_empty()
    }

    pub fn does_animation_vertex_deform(&self) -> bool {
        self.deformed_vertices.is_some()
    }

    /// Animated `[x, y]` positions, present only when a track deforms this image
    pub fn animation_deformed_vertices(&self) -> Option<&[f32]> {
        self.deformed_vertices.as_deref()
    }

    pub fn is_vertex_deform_dirty(&self) -> bool {
        self.is_vertex_deform_dirty
    }

    pub fn sequence(&self) -> Option<&ImageSequence> {
        self.sequence.as_deref()
    }

    pub fn sequence_frame(&self) -> usize {
        self.sequence_frame
    }

    fn current_sequence_frame(&self) -> Option<&SequenceFrame> {
        self.sequence
            .as_ref()
            .and_then(|sequence| sequence.frames.get(self.sequence_frame))
    }
}

/// Inverse of `matrix`, identity when it is singular
pub(crate) fn invert_or_identity(matrix: Affine2) -> Affine2 {
    if matrix.matrix2.determinant() == 0.0 {
        Affine2::IDENTITY
    } else {
        matrix.inverse()
    }
}
