//! Core logic for the card wall: procedural card rasterization, vertical
//! atlas packing, instanced field layout, and the drag/scroll interaction
//! state machine.
//!
//! Nothing in this crate touches a window, a GPU API, or an event source.
//! Hosts feed pointer/wheel events into [`InteractionController`], call
//! [`CardField::tick`] once per frame, and forward the resulting
//! [`UniformSnapshot`] plus the static [`InstanceBuffers`] to their renderer.

pub mod atlas;
pub mod camera;
pub mod card;
pub mod constants;
pub mod field;
pub mod frame;
pub mod instances;
pub mod interaction;

pub static CARDS_WGSL: &str = include_str!("../shaders/cards.wgsl");

pub use atlas::*;
pub use camera::*;
pub use card::*;
pub use constants::*;
pub use field::*;
pub use frame::*;
pub use instances::*;
pub use interaction::*;
