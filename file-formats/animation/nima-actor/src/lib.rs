//! Runtime for Nima 2D skeletal actors.
//!
//! Loads `.nima` files into an [`Actor`], keeps node transforms up to date
//! through a dirty-flag cache, solves IK constraints and samples keyframe
//! animations. Rendering is left to the caller, which reads sorted render
//! nodes, image geometry and skinning matrices back out of the actor.
//!
//! # Examples
//!
//! ```no_run
//! use nima_actor::{Actor, AnimationInstance};
//!
//! let bytes = std::fs::read("character.nima")?;
//! let template = Actor::load(&bytes)?;
//! let mut actor = template.make_instance();
//!
//! if let Some(mut walk) = AnimationInstance::new(&actor, "Walk") {
//!     walk.advance(&actor, 1.0 / 60.0);
//!     walk.apply(&mut actor, 1.0);
//! }
//! actor.advance(1.0 / 60.0);
//! for &index in actor.render_nodes() {
//!     let _matrices = actor.bone_influence_matrices(index);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod actor;
pub mod animation;
pub mod block_type;
pub mod component;
pub mod error;
mod ik;
pub mod loader;
pub mod transform;

pub use actor::{Actor, ActorFlags};
pub use animation::{Animation, AnimationEvent, AnimationInstance, PropertyType};
pub use block_type::BlockType;
pub use component::{Component, ComponentKind, CustomValue, NodeLike, RenderNode, Solver};
pub use error::{ActorError, Result};
pub use loader::{MAGIC, MIN_SUPPORTED_VERSION};
pub use transform::SuppressScope;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use crate::actor::Actor;
    pub use crate::animation::{AnimationEvent, AnimationInstance};
    pub use crate::component::{ComponentKind, CustomValue, NodeLike, RenderNode};
    pub use crate::error::{ActorError, Result};
}
