//! Common test utilities: an in-memory writer for actor files

#![allow(dead_code)]

/// Little-endian byte sink with nested block support
#[derive(Debug, Default)]
pub struct ByteWriter {
    data: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.u8(u8::from(value))
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f64(&mut self, value: f64) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32s(&mut self, values: &[f32]) -> &mut Self {
        for &value in values {
            self.f32(value);
        }
        self
    }

    pub fn string(&mut self, value: &str) -> &mut Self {
        self.u32(value.len() as u32);
        self.data.extend_from_slice(value.as_bytes());
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Write a block whose payload is produced by `build`
    pub fn block(&mut self, tag: u8, build: impl FnOnce(&mut ByteWriter)) -> &mut Self {
        let mut payload = ByteWriter::new();
        build(&mut payload);
        self.u8(tag);
        self.u32(payload.data.len() as u32);
        self.data.extend_from_slice(&payload.data);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Authored node state written before every node type's own fields
#[derive(Debug, Clone, Copy)]
pub struct NodeFields {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub opacity: f32,
    pub collapsed: bool,
}

impl NodeFields {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    fn write(&self, w: &mut ByteWriter) {
        w.f32(self.x)
            .f32(self.y)
            .f32(self.rotation)
            .f32(self.scale_x)
            .f32(self.scale_y)
            .f32(self.opacity)
            .bool(self.collapsed);
    }
}

impl Default for NodeFields {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            collapsed: false,
        }
    }
}

/// Unskinned image geometry: `[x, y, u, v]` per vertex
#[derive(Debug, Clone)]
pub struct ImageFields {
    pub draw_order: u16,
    pub texture_index: u8,
    pub blend_mode: u8,
    pub vertices: Vec<f32>,
    pub triangles: Vec<u16>,
}

impl ImageFields {
    pub fn quad(draw_order: u16, texture_index: u8) -> Self {
        Self {
            draw_order,
            texture_index,
            blend_mode: 0,
            vertices: vec![
                0.0, 0.0, 0.0, 0.0, //
                10.0, 0.0, 1.0, 0.0, //
                10.0, 10.0, 1.0, 1.0, //
                0.0, 10.0, 0.0, 1.0,
            ],
            triangles: vec![0, 1, 2, 0, 2, 3],
        }
    }
}

/// Builds the bytes of an actor file, tracking component indices
#[derive(Debug)]
pub struct ActorFile {
    version: u32,
    components: Vec<(u8, Vec<u8>)>,
    animations: Vec<Vec<u8>>,
    nested_assets: Vec<(String, String)>,
}

impl Default for ActorFile {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorFile {
    pub fn new() -> Self {
        Self {
            version: 18,
            components: Vec::new(),
            animations: Vec::new(),
            nested_assets: Vec::new(),
        }
    }

    /// Append a raw component record; returns its arena index
    pub fn raw(&mut self, tag: u8, build: impl FnOnce(&mut ByteWriter)) -> u16 {
        let mut payload = ByteWriter::new();
        build(&mut payload);
        self.components.push((tag, payload.into_bytes()));
        self.components.len() as u16
    }

    fn component(
        &mut self,
        tag: u8,
        name: &str,
        parent: u16,
        build: impl FnOnce(&mut ByteWriter),
    ) -> u16 {
        self.raw(tag, |w| {
            w.string(name).u16(parent);
            build(w);
        })
    }

    pub fn node(&mut self, name: &str, parent: u16, fields: NodeFields) -> u16 {
        self.component(2, name, parent, |w| fields.write(w))
    }

    pub fn bone(&mut self, name: &str, parent: u16, fields: NodeFields, length: f32) -> u16 {
        self.component(3, name, parent, |w| {
            fields.write(w);
            w.f32(length);
        })
    }

    pub fn root_bone(&mut self, name: &str, parent: u16, fields: NodeFields) -> u16 {
        self.component(4, name, parent, |w| fields.write(w))
    }

    pub fn solo(&mut self, name: &str, parent: u16, active: f32) -> u16 {
        self.component(23, name, parent, |w| {
            NodeFields::default().write(w);
            w.f32(active);
        })
    }

    pub fn ik_target(
        &mut self,
        name: &str,
        parent: u16,
        fields: NodeFields,
        bones: &[u16],
        strength: f32,
        invert: bool,
    ) -> u16 {
        self.component(11, name, parent, |w| {
            fields.write(w);
            w.u16(0).f32(strength).bool(invert).u8(bones.len() as u8);
            for &bone in bones {
                w.u16(bone);
            }
        })
    }

    pub fn image(&mut self, name: &str, parent: u16, fields: NodeFields, image: &ImageFields) -> u16 {
        self.component(5, name, parent, |w| {
            fields.write(w);
            write_image(w, image, &[]);
        })
    }

    /// Image skinned to `bones`, each bound at its rest world transform
    pub fn skinned_image(
        &mut self,
        name: &str,
        parent: u16,
        image: &ImageFields,
        bones: &[(u16, [f32; 6])],
    ) -> u16 {
        self.component(5, name, parent, |w| {
            NodeFields::default().write(w);
            write_image(w, image, bones);
        })
    }

    pub fn image_sequence(
        &mut self,
        name: &str,
        parent: u16,
        image: &ImageFields,
        extra_frames: &[(u8, Vec<f32>)],
    ) -> u16 {
        self.component(22, name, parent, |w| {
            NodeFields::default().write(w);
            write_image(w, image, &[]);
            w.u16(extra_frames.len() as u16 + 1);
            for (atlas, uvs) in extra_frames {
                w.u8(*atlas).f32s(uvs);
            }
        })
    }

    pub fn invisible_image(&mut self, name: &str, parent: u16) -> u16 {
        self.component(5, name, parent, |w| {
            NodeFields::default().write(w);
            w.bool(false);
        })
    }

    pub fn nested(&mut self, name: &str, parent: u16, fields: NodeFields, draw_order: u16, asset: u16) -> u16 {
        self.component(24, name, parent, |w| {
            fields.write(w);
            w.bool(true).u16(draw_order).u16(asset);
        })
    }

    pub fn event(&mut self, name: &str, parent: u16) -> u16 {
        self.component(12, name, parent, |_| {})
    }

    pub fn custom_int(&mut self, name: &str, parent: u16, value: i32) -> u16 {
        self.component(13, name, parent, |w| {
            w.i32(value);
        })
    }

    pub fn custom_float(&mut self, name: &str, parent: u16, value: f32) -> u16 {
        self.component(14, name, parent, |w| {
            w.f32(value);
        })
    }

    pub fn custom_string(&mut self, name: &str, parent: u16, value: &str) -> u16 {
        self.component(15, name, parent, |w| {
            w.string(value);
        })
    }

    pub fn custom_bool(&mut self, name: &str, parent: u16, value: bool) -> u16 {
        self.component(16, name, parent, |w| {
            w.bool(value);
        })
    }

    pub fn circle_collider(&mut self, name: &str, parent: u16, radius: f32) -> u16 {
        self.component(19, name, parent, |w| {
            NodeFields::default().write(w);
            w.bool(true).f32(radius);
        })
    }

    pub fn animation(&mut self, animation: &AnimationFile) {
        self.animations.push(animation.bytes());
    }

    pub fn nested_asset(&mut self, name: &str, id: &str) {
        self.nested_assets.push((name.to_string(), id.to_string()));
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.bytes(b"NIMA").u32(self.version);
        w.block(1, |w| {
            w.u16(self.components.len() as u16);
            for (tag, payload) in &self.components {
                w.block(*tag, |w| {
                    w.bytes(payload);
                });
            }
        });
        if !self.animations.is_empty() {
            w.block(8, |w| {
                w.u16(self.animations.len() as u16);
                for animation in &self.animations {
                    w.block(7, |w| {
                        w.bytes(animation);
                    });
                }
            });
        }
        if !self.nested_assets.is_empty() {
            w.block(25, |w| {
                w.u16(self.nested_assets.len() as u16);
                for (name, id) in &self.nested_assets {
                    w.block(26, |w| {
                        w.string(name).string(id);
                    });
                }
            });
        }
        w.into_bytes()
    }
}

fn write_image(w: &mut ByteWriter, image: &ImageFields, bones: &[(u16, [f32; 6])]) {
    w.bool(true)
        .u8(image.blend_mode)
        .u16(image.draw_order)
        .u8(image.texture_index)
        .u8(bones.len() as u8);
    for (bone, bind) in bones {
        w.u16(*bone).f32s(bind);
    }
    if !bones.is_empty() {
        w.f32s(&[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    let stride = if bones.is_empty() { 4 } else { 12 };
    let vertex_count = image.vertices.len() / 4;
    w.u32(vertex_count as u32);
    for vertex in image.vertices.chunks_exact(4) {
        w.f32s(vertex);
        if stride == 12 {
            // Fully weighted to the first connected bone
            w.f32s(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        }
    }
    w.u32((image.triangles.len() / 3) as u32);
    for &index in &image.triangles {
        w.u16(index);
    }
}

/// Keyframe payloads as written inside a property block
pub mod key {
    use super::ByteWriter;

    pub const HOLD: u8 = 0;
    pub const LINEAR: u8 = 1;
    pub const MIRRORED: u8 = 2;

    fn interpolation(w: &mut ByteWriter, kind: u8) {
        w.u8(kind);
        if kind == HOLD {
            w.f64(0.0).f32(0.0);
        }
    }

    pub fn number(time: f64, kind: u8, value: f32) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.f64(time);
        interpolation(&mut w, kind);
        w.f32(value);
        w.into_bytes()
    }

    pub fn int(time: f64, kind: u8, value: i32) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.f64(time);
        interpolation(&mut w, kind);
        w.i32(value);
        w.into_bytes()
    }

    /// Curve keyframe with in and out handles
    pub fn curve(time: f64, value: f32, handles: (f64, f32, f64, f32)) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.f64(time).u8(MIRRORED);
        w.f64(handles.0).f32(handles.1).f64(handles.2).f32(handles.3);
        w.f32(value);
        w.into_bytes()
    }

    pub fn deform(time: f64, kind: u8, positions: &[f32]) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.f64(time);
        interpolation(&mut w, kind);
        w.f32s(positions);
        w.into_bytes()
    }

    pub fn trigger(time: f64) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.f64(time);
        w.into_bytes()
    }

    pub fn flag(time: f64, value: bool) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.f64(time).bool(value);
        w.into_bytes()
    }

    pub fn text(time: f64, value: &str) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.f64(time).string(value);
        w.into_bytes()
    }

    pub fn snap(time: f64, value: f32) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.f64(time).f32(value);
        w.into_bytes()
    }

    pub fn draw_order(time: f64, orders: &[(u16, u16)]) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.f64(time).u16(orders.len() as u16);
        for &(component, order) in orders {
            w.u16(component).u16(order);
        }
        w.into_bytes()
    }
}

/// Builds the payload of an animation block
#[derive(Debug)]
pub struct AnimationFile {
    name: String,
    fps: u8,
    duration: f32,
    looping: bool,
    components: Vec<(u16, Vec<(u8, Vec<Vec<u8>>)>)>,
}

impl AnimationFile {
    pub fn new(name: &str, duration: f32, looping: bool) -> Self {
        Self {
            name: name.to_string(),
            fps: 60,
            duration,
            looping,
            components: Vec::new(),
        }
    }

    /// Add a track of `property` on `component` holding `frames`
    pub fn track(&mut self, component: u16, property: u8, frames: Vec<Vec<u8>>) -> &mut Self {
        match self.components.iter_mut().find(|(index, _)| *index == component) {
            Some((_, tracks)) => tracks.push((property, frames)),
            None => self.components.push((component, vec![(property, frames)])),
        }
        self
    }

    fn bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.string(&self.name)
            .u8(self.fps)
            .f32(self.duration)
            .bool(self.looping)
            .u16(self.components.len() as u16);
        for (component, tracks) in &self.components {
            w.u16(*component).u16(tracks.len() as u16);
            for (property, frames) in tracks {
                w.block(*property, |w| {
                    w.u16(frames.len() as u16);
                    for frame in frames {
                        w.bytes(frame);
                    }
                });
            }
        }
        w.into_bytes()
    }
}

/// Property block tags
pub mod property {
    pub const POS_X: u8 = 1;
    pub const POS_Y: u8 = 2;
    pub const ROTATION: u8 = 5;
    pub const OPACITY: u8 = 6;
    pub const DRAW_ORDER: u8 = 7;
    pub const LENGTH: u8 = 8;
    pub const VERTEX_DEFORM: u8 = 9;
    pub const IK_STRENGTH: u8 = 10;
    pub const TRIGGER: u8 = 11;
    pub const INT: u8 = 12;
    pub const FLOAT: u8 = 13;
    pub const STRING: u8 = 14;
    pub const BOOLEAN: u8 = 15;
    pub const COLLISION_ENABLED: u8 = 16;
    pub const SEQUENCE: u8 = 17;
    pub const ACTIVE_CHILD: u8 = 18;
}

/// Load bytes, panicking with the error on failure
pub fn load(bytes: &[u8]) -> nima_actor::Actor {
    nima_actor::Actor::load(bytes).expect("actor file should load")
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
