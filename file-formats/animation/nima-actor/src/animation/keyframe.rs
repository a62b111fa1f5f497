//! Keyframes and their wire layouts

use nima_data::BlockReader;

use super::curve::{CubicCurve, Tangents};
use super::property::PropertyType;
use crate::error::Result;

/// How a keyframe interpolates towards the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub enum InterpolationType {
    #[default]
    Hold,
    Linear,
    Mirrored,
    Asymmetric,
    Disconnected,
    /// Only applied on the keyframe itself
    Progression,
}

impl InterpolationType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Hold),
            1 => Some(Self::Linear),
            2 => Some(Self::Mirrored),
            3 => Some(Self::Asymmetric),
            4 => Some(Self::Disconnected),
            5 => Some(Self::Progression),
            _ => None,
        }
    }

    /// Modes evaluated through a fitted [`CubicCurve`]
    pub fn is_curve(self) -> bool {
        matches!(self, Self::Mirrored | Self::Asymmetric | Self::Disconnected)
    }
}

/// A draw order assignment in a draw order keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOrderIndex {
    pub component: u16,
    pub order: u16,
}

/// Payload of a keyframe
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Number(f32),
    Flag(bool),
    Text(String),
    DrawOrder(Vec<DrawOrderIndex>),
    /// `[x, y]` vertex positions
    Deform(Vec<f32>),
    Trigger,
}

/// A value handed to a property setter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample<'a> {
    Number(f32),
    Flag(bool),
    Text(&'a str),
    DrawOrder(&'a [DrawOrderIndex]),
    Deform(&'a [f32]),
    Trigger,
}

impl KeyValue {
    pub fn as_sample(&self) -> Sample<'_> {
        match self {
            Self::Number(value) => Sample::Number(*value),
            Self::Flag(value) => Sample::Flag(*value),
            Self::Text(value) => Sample::Text(value),
            Self::DrawOrder(orders) => Sample::DrawOrder(orders),
            Self::Deform(vertices) => Sample::Deform(vertices),
            Self::Trigger => Sample::Trigger,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrame {
    pub(crate) time: f32,
    pub(crate) interpolation: InterpolationType,
    pub(crate) tangents: Option<Tangents>,
    pub(crate) curve: Option<CubicCurve>,
    pub(crate) value: KeyValue,
}

impl KeyFrame {
    /// Read one keyframe of `property`.
    ///
    /// `vertex_count` is the vertex count of the targeted image, needed to
    /// size deform payloads. Returns `Ok(None)` when the frame cannot be used;
    /// the reader is then positioned somewhere inside the frame.
    pub(crate) fn read(
        reader: &mut BlockReader<'_>,
        property: PropertyType,
        vertex_count: Option<usize>,
    ) -> Result<Option<Self>> {
        let time = reader.read_f64()? as f32;

        let mut interpolation = InterpolationType::Hold;
        let mut tangents = None;
        if property.is_interpolated() {
            let raw = reader.read_u8()?;
            let Some(kind) = InterpolationType::from_u8(raw) else {
                log::warn!("Dropping {property:?} keyframe at {time}: unknown interpolation {raw}");
                return Ok(None);
            };
            interpolation = kind;
            tangents = Self::read_tangents(reader, kind)?;
        }

        let value = match property {
            PropertyType::IntProperty => KeyValue::Number(reader.read_i32()? as f32),
            PropertyType::VertexDeform => {
                let Some(vertex_count) = vertex_count else {
                    log::warn!("Dropping vertex deform keyframe at {time}: target is not an image");
                    return Ok(None);
                };
                KeyValue::Deform(reader.read_f32_array(vertex_count * 2)?)
            }
            PropertyType::DrawOrder => {
                let count = reader.read_u16()? as usize;
                let mut orders = Vec::with_capacity(count);
                for _ in 0..count {
                    orders.push(DrawOrderIndex {
                        component: reader.read_u16()?,
                        order: reader.read_u16()?,
                    });
                }
                KeyValue::DrawOrder(orders)
            }
            PropertyType::Trigger => KeyValue::Trigger,
            PropertyType::StringProperty => KeyValue::Text(reader.read_string()?),
            PropertyType::BooleanProperty | PropertyType::IsCollisionEnabled => {
                KeyValue::Flag(reader.read_bool()?)
            }
            PropertyType::ActiveChildIndex
            | PropertyType::PosX
            | PropertyType::PosY
            | PropertyType::ScaleX
            | PropertyType::ScaleY
            | PropertyType::Rotation
            | PropertyType::Opacity
            | PropertyType::Length
            | PropertyType::IkStrength
            | PropertyType::FloatProperty
            | PropertyType::Sequence => KeyValue::Number(reader.read_f32()?),
        };

        Ok(Some(Self {
            time,
            interpolation,
            tangents,
            curve: None,
            value,
        }))
    }

    fn read_tangents(
        reader: &mut BlockReader<'_>,
        kind: InterpolationType,
    ) -> Result<Option<Tangents>> {
        match kind {
            InterpolationType::Mirrored
            | InterpolationType::Asymmetric
            | InterpolationType::Disconnected => Ok(Some(Tangents {
                in_factor: reader.read_f64()?,
                in_value: reader.read_f32()?,
                out_factor: reader.read_f64()?,
                out_value: reader.read_f32()?,
            })),
            InterpolationType::Hold => Ok(Some(Tangents {
                in_factor: reader.read_f64()?,
                in_value: reader.read_f32()?,
                ..Tangents::default()
            })),
            InterpolationType::Linear | InterpolationType::Progression => Ok(None),
        }
    }

    /// Link this frame to the one after it.
    ///
    /// Curve frames fit their segment here. A hold frame's handles only
    /// serve as the in-values of the segment arriving at it.
    pub(crate) fn set_next(&mut self, next: &KeyFrame) {
        self.curve = None;
        if !self.interpolation.is_curve() {
            return;
        }
        let (Some(out), Some(from_value), Some(to_value)) = (
            self.tangents.as_ref(),
            self.value.as_number(),
            next.value.as_number(),
        ) else {
            return;
        };
        self.curve = Some(CubicCurve::fit(
            self.time,
            from_value,
            out,
            next.time,
            to_value,
            next.tangents.as_ref(),
        ));
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn interpolation(&self) -> InterpolationType {
        self.interpolation
    }

    pub fn tangents(&self) -> Option<&Tangents> {
        self.tangents.as_ref()
    }

    /// Fitted curve towards the next frame, for curve interpolation modes
    pub fn curve(&self) -> Option<&CubicCurve> {
        self.curve.as_ref()
    }

    pub fn value(&self) -> &KeyValue {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_bytes(time: f64, interpolation: Option<u8>, tail: &[u8]) -> Vec<u8> {
        let mut data = time.to_le_bytes().to_vec();
        if let Some(interpolation) = interpolation {
            data.push(interpolation);
        }
        data.extend_from_slice(tail);
        data
    }

    #[test]
    fn test_linear_numeric() {
        let data = frame_bytes(0.5, Some(1), &2.5f32.to_le_bytes());
        let mut reader = BlockReader::new(&data);
        let frame = KeyFrame::read(&mut reader, PropertyType::PosX, None)
            .unwrap()
            .unwrap();
        assert!((frame.time() - 0.5).abs() < 0.001);
        assert_eq!(frame.interpolation(), InterpolationType::Linear);
        assert_eq!(frame.value(), &KeyValue::Number(2.5));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_hold_reads_in_handle() {
        let mut tail = 0.25f64.to_le_bytes().to_vec();
        tail.extend_from_slice(&3.0f32.to_le_bytes());
        tail.extend_from_slice(&7.0f32.to_le_bytes());
        let data = frame_bytes(1.0, Some(0), &tail);
        let mut reader = BlockReader::new(&data);
        let frame = KeyFrame::read(&mut reader, PropertyType::Rotation, None)
            .unwrap()
            .unwrap();
        let tangents = frame.tangents().unwrap();
        assert!((tangents.in_factor - 0.25).abs() < 0.001);
        assert!((tangents.in_value - 3.0).abs() < 0.001);
        assert_eq!(frame.value(), &KeyValue::Number(7.0));
    }

    #[test]
    fn test_unknown_interpolation_drops_frame() {
        let data = frame_bytes(0.0, Some(6), &1.0f32.to_le_bytes());
        let mut reader = BlockReader::new(&data);
        assert!(
            KeyFrame::read(&mut reader, PropertyType::PosY, None)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_snapping_types_skip_interpolation() {
        let mut tail = 2u16.to_le_bytes().to_vec();
        for value in [4u16, 1, 5, 0] {
            tail.extend_from_slice(&value.to_le_bytes());
        }
        let data = frame_bytes(0.0, None, &tail);
        let mut reader = BlockReader::new(&data);
        let frame = KeyFrame::read(&mut reader, PropertyType::DrawOrder, None)
            .unwrap()
            .unwrap();
        assert_eq!(
            frame.value(),
            &KeyValue::DrawOrder(vec![
                DrawOrderIndex {
                    component: 4,
                    order: 1
                },
                DrawOrderIndex {
                    component: 5,
                    order: 0
                },
            ])
        );
        assert!(reader.is_empty());
    }

    #[test]
    fn test_deform_needs_image() {
        let data = frame_bytes(0.0, Some(1), &[0; 16]);
        let mut reader = BlockReader::new(&data);
        assert!(
            KeyFrame::read(&mut reader, PropertyType::VertexDeform, None)
                .unwrap()
                .is_none()
        );

        let mut reader = BlockReader::new(&data);
        let frame = KeyFrame::read(&mut reader, PropertyType::VertexDeform, Some(2))
            .unwrap()
            .unwrap();
        assert_eq!(frame.value(), &KeyValue::Deform(vec![0.0; 4]));
    }

    #[test]
    fn test_truncated_frame_overflows() {
        let data = frame_bytes(0.0, Some(1), &[0, 0]);
        let mut reader = BlockReader::new(&data);
        assert!(KeyFrame::read(&mut reader, PropertyType::Opacity, None).is_err());
    }

    #[test]
    fn test_hold_next_supplies_in_values() {
        let curve_frame = KeyFrame {
            time: 0.0,
            interpolation: InterpolationType::Mirrored,
            tangents: Some(Tangents {
                in_factor: 0.0,
                in_value: 0.0,
                out_factor: 1.0 / 3.0,
                out_value: 10.0 / 3.0,
            }),
            curve: None,
            value: KeyValue::Number(0.0),
        };
        let hold_frame = KeyFrame {
            time: 10.0,
            interpolation: InterpolationType::Hold,
            tangents: Some(Tangents {
                in_factor: 1.0 / 3.0,
                in_value: 20.0 / 3.0,
                ..Tangents::default()
            }),
            curve: None,
            value: KeyValue::Number(10.0),
        };

        let mut first = curve_frame.clone();
        first.set_next(&hold_frame);
        let curve = first.curve().unwrap();
        assert!((curve.value_at(5.0) - 5.0).abs() < 0.001);

        let mut hold = hold_frame.clone();
        hold.set_next(&curve_frame);
        assert!(hold.curve().is_none());
    }
}
