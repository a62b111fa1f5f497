//! Property tracks and the per-property apply table

use nima_data::BlockReader;

use super::keyframe::{InterpolationType, KeyFrame, KeyValue, Sample};
use crate::actor::Actor;
use crate::component::{CustomValue, Node};
use crate::error::Result;

/// Property a track animates; the wire value is the track's block type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
#[repr(u8)]
pub enum PropertyType {
    PosX = 1,
    PosY = 2,
    ScaleX = 3,
    ScaleY = 4,
    Rotation = 5,
    Opacity = 6,
    DrawOrder = 7,
    Length = 8,
    VertexDeform = 9,
    IkStrength = 10,
    Trigger = 11,
    IntProperty = 12,
    FloatProperty = 13,
    StringProperty = 14,
    BooleanProperty = 15,
    IsCollisionEnabled = 16,
    Sequence = 17,
    ActiveChildIndex = 18,
}

/// Writes a sampled value into the live actor, blending by `mix` where the
/// property supports it
pub type ApplyFn = fn(&mut Actor, usize, Sample<'_>, f32);

impl PropertyType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::PosX,
            2 => Self::PosY,
            3 => Self::ScaleX,
            4 => Self::ScaleY,
            5 => Self::Rotation,
            6 => Self::Opacity,
            7 => Self::DrawOrder,
            8 => Self::Length,
            9 => Self::VertexDeform,
            10 => Self::IkStrength,
            11 => Self::Trigger,
            12 => Self::IntProperty,
            13 => Self::FloatProperty,
            14 => Self::StringProperty,
            15 => Self::BooleanProperty,
            16 => Self::IsCollisionEnabled,
            17 => Self::Sequence,
            18 => Self::ActiveChildIndex,
            _ => return None,
        })
    }

    /// Keyframes of this property carry an interpolation mode
    pub fn is_interpolated(self) -> bool {
        matches!(
            self,
            Self::PosX
                | Self::PosY
                | Self::ScaleX
                | Self::ScaleY
                | Self::Rotation
                | Self::Opacity
                | Self::Length
                | Self::VertexDeform
                | Self::IkStrength
                | Self::IntProperty
                | Self::FloatProperty
                | Self::Sequence
        )
    }

    pub fn apply_fn(self) -> ApplyFn {
        match self {
            Self::PosX => apply_pos_x,
            Self::PosY => apply_pos_y,
            Self::ScaleX => apply_scale_x,
            Self::ScaleY => apply_scale_y,
            Self::Rotation => apply_rotation,
            Self::Opacity => apply_opacity,
            Self::DrawOrder => apply_draw_order,
            Self::Length => apply_length,
            Self::VertexDeform => apply_vertex_deform,
            Self::IkStrength => apply_ik_strength,
            Self::Trigger => apply_trigger,
            Self::IntProperty => apply_int_property,
            Self::FloatProperty => apply_float_property,
            Self::StringProperty => apply_string_property,
            Self::BooleanProperty => apply_boolean_property,
            Self::IsCollisionEnabled => apply_collision_enabled,
            Self::Sequence => apply_sequence,
            Self::ActiveChildIndex => apply_active_child,
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

fn blend(live: f32, value: f32, mix: f32) -> f32 {
    live * (1.0 - mix) + value * mix
}

fn blend_node(
    actor: &mut Actor,
    index: usize,
    sample: Sample<'_>,
    mix: f32,
    get: fn(&Node) -> f32,
    set: fn(&mut Actor, usize, f32),
) {
    let Sample::Number(value) = sample else {
        return;
    };
    let Some(live) = actor.node(index).map(get) else {
        return;
    };
    set(actor, index, blend(live, value, mix));
}

fn apply_pos_x(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    blend_node(actor, index, sample, mix, Node::x, Actor::set_translation_x);
}

fn apply_pos_y(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    blend_node(actor, index, sample, mix, Node::y, Actor::set_translation_y);
}

fn apply_scale_x(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    blend_node(actor, index, sample, mix, |node| node.scale().x, Actor::set_scale_x);
}

fn apply_scale_y(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    blend_node(actor, index, sample, mix, |node| node.scale().y, Actor::set_scale_y);
}

fn apply_rotation(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    blend_node(actor, index, sample, mix, Node::rotation, Actor::set_rotation);
}

fn apply_opacity(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    blend_node(actor, index, sample, mix, Node::opacity, Actor::set_opacity);
}

fn apply_length(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    let Sample::Number(value) = sample else {
        return;
    };
    let Some(live) = actor.bone(index).map(|bone| bone.length()) else {
        return;
    };
    actor.set_bone_length(index, blend(live, value, mix));
}

fn apply_ik_strength(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    let Sample::Number(value) = sample else {
        return;
    };
    let Some(live) = actor.ik_target(index).map(|target| target.constraint().strength()) else {
        return;
    };
    actor.set_ik_strength(index, blend(live, value, mix));
}

fn apply_draw_order(actor: &mut Actor, _index: usize, sample: Sample<'_>, _mix: f32) {
    let Sample::DrawOrder(orders) = sample else {
        return;
    };
    for entry in orders {
        actor.set_draw_order(usize::from(entry.component), entry.order);
    }
}

fn apply_vertex_deform(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    if let Sample::Deform(vertices) = sample {
        actor.write_deformed_vertices(index, vertices, mix);
    }
}

fn apply_trigger(_actor: &mut Actor, _index: usize, _sample: Sample<'_>, _mix: f32) {}

fn apply_int_property(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    let Sample::Number(value) = sample else {
        return;
    };
    let Some(CustomValue::Int(live)) = actor.custom_value(index) else {
        return;
    };
    let blended = blend(*live as f32, value, mix).round() as i32;
    actor.set_custom_value(index, CustomValue::Int(blended));
}

fn apply_float_property(actor: &mut Actor, index: usize, sample: Sample<'_>, mix: f32) {
    let Sample::Number(value) = sample else {
        return;
    };
    let Some(CustomValue::Float(live)) = actor.custom_value(index) else {
        return;
    };
    let blended = blend(*live, value, mix);
    actor.set_custom_value(index, CustomValue::Float(blended));
}

fn apply_string_property(actor: &mut Actor, index: usize, sample: Sample<'_>, _mix: f32) {
    if let Sample::Text(value) = sample {
        actor.set_custom_value(index, CustomValue::Text(value.to_string()));
    }
}

fn apply_boolean_property(actor: &mut Actor, index: usize, sample: Sample<'_>, _mix: f32) {
    if let Sample::Flag(value) = sample {
        actor.set_custom_value(index, CustomValue::Bool(value));
    }
}

fn apply_collision_enabled(actor: &mut Actor, index: usize, sample: Sample<'_>, _mix: f32) {
    if let Sample::Flag(value) = sample {
        actor.set_collision_enabled(index, value);
    }
}

fn apply_active_child(actor: &mut Actor, index: usize, sample: Sample<'_>, _mix: f32) {
    if let Sample::Number(value) = sample {
        actor.set_active_child_index(index, value as i32);
    }
}

/// Sequence frames ignore `mix`
fn apply_sequence(actor: &mut Actor, index: usize, sample: Sample<'_>, _mix: f32) {
    let Sample::Number(value) = sample else {
        return;
    };
    let Some(count) = actor
        .image(index)
        .and_then(|image| image.sequence())
        .map(|sequence| sequence.frame_count())
    else {
        return;
    };
    if let Some(frame) = wrap_sequence_frame(value, count) {
        actor.set_sequence_frame(index, frame);
    }
}

/// `floor(value) % count`, shifted into `[0, count)` when negative
pub(crate) fn wrap_sequence_frame(value: f32, count: usize) -> Option<usize> {
    let count = i64::try_from(count).ok().filter(|&count| count > 0)?;
    let mut frame = (value.floor() as i64) % count;
    if frame < 0 {
        frame += count;
    }
    usize::try_from(frame).ok()
}

/// Keyframes of one property on one component
#[derive(Debug, Clone)]
pub struct PropertyAnimation {
    property_type: PropertyType,
    key_frames: Vec<KeyFrame>,
}

impl PropertyAnimation {
    /// Read the keyframes of a property block.
    ///
    /// A keyframe that cannot be used leaves the rest of the block in an
    /// unknown layout, so reading stops there and the frames before it are
    /// kept.
    pub(crate) fn read(
        reader: &mut BlockReader<'_>,
        property_type: PropertyType,
        vertex_count: Option<usize>,
    ) -> Result<Self> {
        let count = reader.read_u16()? as usize;
        let mut key_frames: Vec<KeyFrame> = Vec::with_capacity(count);
        for _ in 0..count {
            match KeyFrame::read(reader, property_type, vertex_count)? {
                Some(frame) => key_frames.push(frame),
                None => break,
            }
        }

        if key_frames.len() < count {
            log::warn!(
                "{property_type} track kept {} of {count} keyframes",
                key_frames.len()
            );
        }

        for index in 1..key_frames.len() {
            let (head, tail) = key_frames.split_at_mut(index);
            if let Some(previous) = head.last_mut() {
                previous.set_next(&tail[0]);
            }
        }

        Ok(Self {
            property_type,
            key_frames,
        })
    }

    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    pub fn key_frames(&self) -> &[KeyFrame] {
        &self.key_frames
    }

    pub fn is_empty(&self) -> bool {
        self.key_frames.is_empty()
    }

    /// Index of the first keyframe at or after `time`
    pub(crate) fn frame_index(&self, time: f32) -> usize {
        self.key_frames.partition_point(|frame| frame.time < time)
    }

    /// Sample the track at `time` and write the result into `component`
    pub fn apply(&self, time: f32, actor: &mut Actor, component: usize, mix: f32) {
        let apply = self.property_type.apply_fn();
        let index = self.frame_index(time);

        if index == 0 {
            if let Some(first) = self.key_frames.first() {
                apply(actor, component, first.value.as_sample(), mix);
            }
            return;
        }

        match (self.key_frames.get(index - 1), self.key_frames.get(index)) {
            (Some(_), Some(to)) if time == to.time => {
                apply(actor, component, to.value.as_sample(), mix);
            }
            (Some(from), Some(to)) => self.interpolate(from, to, time, actor, component, mix),
            (Some(last), None) => apply(actor, component, last.value.as_sample(), mix),
            _ => {}
        }
    }

    fn interpolate(
        &self,
        from: &KeyFrame,
        to: &KeyFrame,
        time: f32,
        actor: &mut Actor,
        component: usize,
        mix: f32,
    ) {
        let apply = self.property_type.apply_fn();
        let span = to.time - from.time;
        let factor = if span > 0.0 { (time - from.time) / span } else { 0.0 };

        match (&from.value, &to.value) {
            (KeyValue::Number(start), KeyValue::Number(end))
                if self.property_type.is_interpolated() =>
            {
                let value = match from.interpolation {
                    InterpolationType::Hold => Some(*start),
                    InterpolationType::Linear => Some(start * (1.0 - factor) + end * factor),
                    InterpolationType::Mirrored
                    | InterpolationType::Asymmetric
                    | InterpolationType::Disconnected => {
                        from.curve.map(|curve| curve.value_at(f64::from(time)))
                    }
                    InterpolationType::Progression => None,
                };
                if let Some(value) = value {
                    apply(actor, component, Sample::Number(value), mix);
                }
            }
            (KeyValue::Deform(start), KeyValue::Deform(end)) => {
                if from.interpolation == InterpolationType::Hold {
                    apply(actor, component, Sample::Deform(start), mix);
                } else {
                    let blended: Vec<f32> = start
                        .iter()
                        .zip(end)
                        .map(|(a, b)| a * (1.0 - factor) + b * factor)
                        .collect();
                    apply(actor, component, Sample::Deform(&blended), mix);
                }
            }
            _ => apply(actor, component, from.value.as_sample(), mix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_type_ids() {
        assert_eq!(PropertyType::from_u8(1), Some(PropertyType::PosX));
        assert_eq!(PropertyType::from_u8(18), Some(PropertyType::ActiveChildIndex));
        assert_eq!(PropertyType::from_u8(0), None);
        assert_eq!(PropertyType::from_u8(19), None);
        assert_eq!(PropertyType::Sequence as u8, 17);
    }

    #[test]
    fn test_sequence_wraps_negative_frames() {
        assert_eq!(wrap_sequence_frame(5.7, 4), Some(1));
        assert_eq!(wrap_sequence_frame(-1.0, 4), Some(3));
        assert_eq!(wrap_sequence_frame(-0.5, 4), Some(3));
        assert_eq!(wrap_sequence_frame(-8.0, 4), Some(0));
        assert_eq!(wrap_sequence_frame(3.0, 0), None);
    }

    #[test]
    fn test_frame_index_lookup() {
        let frames = [0.0f32, 1.0, 2.0]
            .iter()
            .map(|&time| KeyFrame {
                time,
                interpolation: InterpolationType::Linear,
                tangents: None,
                curve: None,
                value: KeyValue::Number(time),
            })
            .collect();
        let track = PropertyAnimation {
            property_type: PropertyType::PosX,
            key_frames: frames,
        };
        assert_eq!(track.frame_index(-1.0), 0);
        assert_eq!(track.frame_index(1.0), 1);
        assert_eq!(track.frame_index(1.5), 2);
        assert_eq!(track.frame_index(9.0), 3);
    }
}
