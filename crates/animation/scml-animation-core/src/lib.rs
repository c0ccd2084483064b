//! SCML Animation Core (renderer-agnostic)
//!
//! Runtime playback for 2D skeletal animation documents in the SCML/SCON
//! format. A [`Document`] is loaded once and shared; any number of
//! [`Instance`]s play its entities independently, each resolving keyframes,
//! composing the bone hierarchy and caching the resulting world-space
//! [`Frame`]. Pixel output and image loading stay with the host through the
//! [`Renderer`] and [`ImageStore`] traits.

pub mod cache;
pub mod compose;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod ids;
pub mod instance;
pub mod interp;
pub mod render;
pub mod resolve;
pub mod scon;
pub mod transform;
mod validate;

// Re-exports for consumers (hosts and renderers)
pub use cache::{CacheKey, TransformCache};
pub use config::Config;
pub use data::{
    Animation, BlendMode, BonePose, BoneSlot, CharacterMap, Document, Entity, ImageRef, KeyPose,
    KeyTrack, LoopMode, MainlineKey, ObjectPose, ObjectSlot, Timeline, TimelineKey, TimelineKind,
};
pub use error::{DocumentError, LookupError, ResolveWarning, SlotKind};
pub use frame::{Frame, PlacedBone, PlacedObject, Placement};
pub use ids::{AnimId, CharacterMapId, EntityId, FileId, FolderId, KeyId, SlotId, TimelineId};
pub use instance::{Instance, PlaybackState};
pub use interp::Curve;
pub use render::{ImageStore, Renderer, Sprite, StaticImageStore};
pub use scon::parse_scon_json;
pub use transform::{Color, Spin, Transform};
