//! Keyframe animation
//!
//! An [`Animation`] is a set of [`ComponentAnimation`]s, each holding one
//! [`PropertyAnimation`] track per animated property of a component.
//! Sampling writes into a live [`Actor`] through its setters, so the
//! transform cache picks up animated values on the next advance.

mod curve;
mod event;
mod instance;
mod keyframe;
mod property;

pub use curve::{CubicCurve, Tangents};
pub use event::AnimationEvent;
pub use instance::AnimationInstance;
pub use keyframe::{DrawOrderIndex, InterpolationType, KeyFrame, KeyValue, Sample};
pub use property::{ApplyFn, PropertyAnimation, PropertyType};

use nima_data::BlockReader;

use crate::actor::Actor;
use crate::component::{Component, ComponentKind};
use crate::error::Result;

/// The tracks of a single component
#[derive(Debug, Clone)]
pub struct ComponentAnimation {
    component: usize,
    properties: Vec<PropertyAnimation>,
}

impl ComponentAnimation {
    pub(crate) fn read(
        reader: &mut BlockReader<'_>,
        components: &mut [Option<Component>],
    ) -> Result<Self> {
        let component = reader.read_u16()? as usize;
        let property_count = reader.read_u16()? as usize;

        let mut target = components.get_mut(component).and_then(Option::as_mut);
        if target.is_none() {
            log::warn!("Animation targets missing component {component}");
        }
        let vertex_count = target
            .as_ref()
            .and_then(|target| target.kind.as_image())
            .map(|image| image.vertex_count());

        let mut properties = Vec::with_capacity(property_count);
        for _ in 0..property_count {
            let Some(mut block) = reader.read_next_block()? else {
                break;
            };
            let Some(property_type) = PropertyType::from_u8(block.block_type()) else {
                log::debug!("Skipping unknown property type {}", block.block_type());
                continue;
            };

            let property = PropertyAnimation::read(&mut block, property_type, vertex_count)?;
            if property_type == PropertyType::VertexDeform && !property.is_empty() {
                if let Some(ComponentKind::Image(image)) =
                    target.as_mut().map(|target| &mut target.kind)
                {
                    image.enable_animation_deform();
                }
            }
            properties.push(property);
        }

        Ok(Self {
            component,
            properties,
        })
    }

    /// Index of the animated component
    pub fn component(&self) -> usize {
        self.component
    }

    pub fn properties(&self) -> &[PropertyAnimation] {
        &self.properties
    }

    pub fn apply(&self, time: f32, actor: &mut Actor, mix: f32) {
        for property in &self.properties {
            property.apply(time, actor, self.component, mix);
        }
    }

    /// Collect events for trigger keyframes in `(from_time, to_time]`,
    /// latest first
    pub fn trigger_events(
        &self,
        actor: &Actor,
        from_time: f32,
        to_time: f32,
        events: &mut Vec<AnimationEvent>,
    ) {
        let name = actor
            .component(self.component)
            .map_or_else(String::new, |component| component.name().to_string());

        for property in &self.properties {
            if property.property_type() != PropertyType::Trigger {
                continue;
            }
            let frames = property.key_frames();
            let Some(first) = frames.first() else {
                continue;
            };

            let index = property.frame_index(to_time);
            if index == 0 {
                if first.time == to_time && first.time > from_time {
                    events.push(AnimationEvent {
                        component: self.component,
                        name: name.clone(),
                        key_frame_time: to_time,
                        elapsed_time: 0.0,
                    });
                }
                continue;
            }

            // The frame at `index` lands exactly on `to_time` when present
            let end = frames
                .get(index)
                .filter(|frame| frame.time == to_time)
                .map_or(index, |_| index + 1);
            for frame in frames[..end].iter().rev() {
                if frame.time <= from_time {
                    break;
                }
                events.push(AnimationEvent {
                    component: self.component,
                    name: name.clone(),
                    key_frame_time: frame.time,
                    elapsed_time: to_time - frame.time,
                });
            }
        }
    }
}

/// A named animation of an actor
#[derive(Debug, Clone)]
pub struct Animation {
    name: String,
    fps: u8,
    duration: f32,
    looping: bool,
    components: Vec<ComponentAnimation>,
    trigger_components: Vec<usize>,
}

impl Animation {
    pub(crate) fn read(
        reader: &mut BlockReader<'_>,
        components: &mut [Option<Component>],
    ) -> Result<Self> {
        let name = reader.read_string()?;
        let fps = reader.read_u8()?;
        let duration = reader.read_f32()?;
        let looping = reader.read_u8()? != 0;

        let count = reader.read_u16()? as usize;
        let mut keyed = Vec::with_capacity(count);
        let mut trigger_components = Vec::new();
        for _ in 0..count {
            let animation = ComponentAnimation::read(reader, components)?;
            let is_event = components
                .get(animation.component)
                .and_then(Option::as_ref)
                .is_some_and(|component| matches!(component.kind, ComponentKind::Event));
            if is_event {
                trigger_components.push(keyed.len());
            }
            keyed.push(animation);
        }

        log::debug!(
            "Read animation {name:?}: {} keyed components, {} event components",
            keyed.len(),
            trigger_components.len()
        );

        Ok(Self {
            name,
            fps,
            duration,
            looping,
            components: keyed,
            trigger_components,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fps(&self) -> u8 {
        self.fps
    }

    /// Length in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn component_animations(&self) -> &[ComponentAnimation] {
        &self.components
    }

    /// Keyed components whose target is an event component
    pub fn trigger_components(&self) -> impl Iterator<Item = &ComponentAnimation> {
        self.trigger_components
            .iter()
            .filter_map(|&index| self.components.get(index))
    }

    /// Sample every track at `time`, blending numeric values by `mix`
    pub fn apply(&self, time: f32, actor: &mut Actor, mix: f32) {
        for component in &self.components {
            component.apply(time, actor, mix);
        }
    }

    /// Collect events for trigger keyframes in `(from_time, to_time]`
    pub fn trigger_events(
        &self,
        actor: &Actor,
        from_time: f32,
        to_time: f32,
        events: &mut Vec<AnimationEvent>,
    ) {
        for component in self.trigger_components() {
            component.trigger_events(actor, from_time, to_time, events);
        }
    }
}
