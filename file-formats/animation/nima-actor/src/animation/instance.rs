//! Playback state for one animation on one actor

use std::fmt;
use std::sync::Arc;

use super::{Animation, AnimationEvent};
use crate::actor::Actor;

type EventCallback = Box<dyn FnMut(&AnimationEvent) + Send>;

/// A time cursor over an [`Animation`].
///
/// The instance does not own the actor it plays on; callers pass it to
/// [`AnimationInstance::advance`] for event lookup and to
/// [`AnimationInstance::apply`] to write the sampled pose.
pub struct AnimationInstance {
    animation: Arc<Animation>,
    time: f32,
    min: f32,
    max: f32,
    looping: bool,
    events: Vec<AnimationEvent>,
    callback: Option<EventCallback>,
}

impl fmt::Debug for AnimationInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationInstance")
            .field("animation", &self.animation.name())
            .field("time", &self.time)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("looping", &self.looping)
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl AnimationInstance {
    /// Start the named animation of `actor`, `None` if it has no such animation
    pub fn new(actor: &Actor, name: &str) -> Option<Self> {
        actor.animation(name).map(|animation| Self::from_animation(Arc::clone(animation)))
    }

    pub fn from_animation(animation: Arc<Animation>) -> Self {
        Self {
            min: 0.0,
            max: animation.duration(),
            looping: animation.is_looping(),
            time: 0.0,
            events: Vec::new(),
            callback: None,
            animation,
        }
    }

    pub fn animation(&self) -> &Arc<Animation> {
        &self.animation
    }

    pub fn duration(&self) -> f32 {
        self.animation.duration()
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Called for every event as it fires, in addition to queueing it
    pub fn set_event_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&AnimationEvent) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_event_callback(&mut self) {
        self.callback = None;
    }

    /// Events fired since the last call
    pub fn take_events(&mut self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Seek to `time`, clamped to the animation's range.
    ///
    /// Seeking forward fires the trigger keyframes passed over.
    pub fn set_time(&mut self, actor: &Actor, time: f32) {
        let target = time.clamp(self.min, self.max.max(self.min));
        let from = self.time;
        self.time = target;
        if target > from {
            self.fire(actor, from, target);
        }
    }

    /// Move the cursor by `seconds`.
    ///
    /// Looping animations wrap within the range and fire the events up to the
    /// end, then the events from the start up to the new time. Other
    /// animations clamp at the end. Moving backwards fires nothing.
    pub fn advance(&mut self, actor: &Actor, seconds: f32) {
        let from = self.time;
        let range = self.max - self.min;
        let mut time = from + seconds;

        if self.looping && range > 0.0 {
            if time >= self.max {
                let wrapped = self.min + (time - self.min) % range;
                self.time = wrapped;
                self.fire(actor, from, self.max);
                self.fire(actor, f32::NEG_INFINITY, wrapped);
                return;
            }
            if time < self.min {
                time = self.max - (self.min - time) % range;
            }
        } else {
            time = time.clamp(self.min, self.max.max(self.min));
        }

        self.time = time;
        if seconds > 0.0 && time > from {
            self.fire(actor, from, time);
        }
    }

    /// Write the pose at the current time into `actor`
    pub fn apply(&self, actor: &mut Actor, mix: f32) {
        self.animation.apply(self.time, actor, mix);
    }

    fn fire(&mut self, actor: &Actor, from: f32, to: f32) {
        let start = self.events.len();
        self.animation.trigger_events(actor, from, to, &mut self.events);

        // Events arrive latest first per track
        self.events[start..].reverse();
        if let Some(callback) = self.callback.as_mut() {
            for event in &self.events[start..] {
                callback(event);
            }
        }
    }
}
