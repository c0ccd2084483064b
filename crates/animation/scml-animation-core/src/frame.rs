//! Output contracts: world-space placements for one instant.
//!
//! A frame carries bones in dependency order (parents before children) and
//! objects in draw order, plus the resolution warnings raised while building it.

use serde::{Deserialize, Serialize};

use crate::data::{BlendMode, ImageRef, SubAnimation};
use crate::error::{ResolveWarning, SlotKind};
use crate::ids::SlotId;
use crate::transform::{Color, Transform};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedBone {
    pub slot: SlotId,
    pub parent: Option<SlotId>,
    /// World-space transform.
    pub transform: Transform,
    pub color: Color,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub slot: SlotId,
    pub parent: Option<SlotId>,
    pub z_index: i32,
    /// World-space transform.
    pub transform: Transform,
    pub color: Color,
    /// Image to draw, after character-map substitution. `None` for objects
    /// without an image or hidden by the active character map.
    pub image: Option<ImageRef>,
    pub pivot: Option<[f32; 2]>,
    pub size: Option<[f32; 2]>,
    pub blend_mode: BlendMode,
    pub name: Option<String>,
    pub sub_animation: Option<SubAnimation>,
}

/// Flat view of one placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub slot: SlotId,
    pub kind: SlotKind,
    pub transform: Transform,
    /// Draw order; 0 for bones.
    pub z_index: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub bones: Vec<PlacedBone>,
    #[serde(default)]
    pub objects: Vec<PlacedObject>,
    #[serde(default)]
    pub warnings: Vec<ResolveWarning>,
}

impl Frame {
    #[inline]
    pub fn clear(&mut self) {
        self.bones.clear();
        self.objects.clear();
        self.warnings.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty() && self.objects.is_empty()
    }

    pub fn bone(&self, slot: SlotId) -> Option<&PlacedBone> {
        self.bones.iter().find(|b| b.slot == slot)
    }

    pub fn object(&self, slot: SlotId) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.slot == slot)
    }

    /// Bones (dependency order) followed by objects (draw order).
    pub fn placements(&self) -> impl Iterator<Item = Placement> + '_ {
        let bones = self.bones.iter().map(|b| Placement {
            slot: b.slot,
            kind: SlotKind::Bone,
            transform: b.transform,
            z_index: 0,
        });
        let objects = self.objects.iter().map(|o| Placement {
            slot: o.slot,
            kind: SlotKind::Object,
            transform: o.transform,
            z_index: o.z_index,
        });
        bones.chain(objects)
    }
}
