/// A trigger keyframe crossed while an animation played
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct AnimationEvent {
    /// Index of the event component that owns the trigger track
    pub component: usize,
    pub name: String,
    pub key_frame_time: f32,
    /// Time between the keyframe and the end of the scanned interval
    pub elapsed_time: f32,
}
