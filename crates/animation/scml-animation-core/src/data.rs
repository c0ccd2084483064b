//! Canonical document model.
//!
//! A [`Document`] is immutable after load and shared by every playback
//! instance created from it. Records are addressed by the integer ids the
//! document assigns; keyed collections are ordered maps so iteration is
//! deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{AnimId, CharacterMapId, EntityId, FileId, FolderId, KeyId, SlotId, TimelineId};
use crate::interp::Curve;
use crate::transform::{Color, Spin, Transform};

/// Authoring metadata carried by the document. Unused by playback.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub license: Option<String>,
    pub version: Option<String>,
    pub last_modified: Option<String>,
    pub notes: Option<String>,
}

/// A loaded document: image folders plus animated entities.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub version: String,
    pub generator: String,
    pub generator_version: String,
    pub pixel_art_mode: bool,
    pub info: DocumentInfo,
    pub folders: BTreeMap<FolderId, Folder>,
    pub entities: BTreeMap<EntityId, Entity>,
    /// Ids given more than once to [`Document::new`], as (kind, id).
    pub(crate) duplicates: Vec<(&'static str, u32)>,
}

impl Document {
    /// Assemble a document without validation. A later folder or entity
    /// replaces an earlier one with the same id; [`Document::validate`]
    /// reports the clash.
    pub fn new(
        folders: impl IntoIterator<Item = Folder>,
        entities: impl IntoIterator<Item = Entity>,
    ) -> Self {
        let mut doc = Self::default();
        for f in folders {
            if let Some(old) = doc.folders.insert(f.id, f) {
                doc.duplicates.push(("folder", old.id.into()));
            }
        }
        for e in entities {
            if let Some(old) = doc.entities.insert(e.id, e) {
                doc.duplicates.push(("entity", old.id.into()));
            }
        }
        doc
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.values().find(|e| e.name == name)
    }

    /// Number of animations of an entity (0 for an unknown entity).
    pub fn animation_count(&self, entity: EntityId) -> usize {
        self.entity(entity).map_or(0, |e| e.animations.len())
    }

    pub fn file(&self, image: ImageRef) -> Option<&File> {
        self.folders.get(&image.folder)?.files.get(&image.file)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub files: BTreeMap<FileId, File>,
}

/// An image declared by the document.
#[derive(Clone, Debug, PartialEq)]
pub struct File {
    pub id: FileId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pivot_x: f32,
    pub pivot_y: f32,
}

/// A (folder, file) image address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub folder: FolderId,
    pub file: FileId,
}

impl ImageRef {
    pub const fn new(folder: u32, file: u32) -> Self {
        Self {
            folder: FolderId(folder),
            file: FileId(file),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub animations: BTreeMap<AnimId, Animation>,
    pub character_maps: BTreeMap<CharacterMapId, CharacterMap>,
}

impl Entity {
    pub fn animation(&self, id: AnimId) -> Option<&Animation> {
        self.animations.get(&id)
    }

    pub fn animation_by_name(&self, name: &str) -> Option<&Animation> {
        self.animations.values().find(|a| a.name == name)
    }
}

/// Image substitutions applied at draw time (alternate skins).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CharacterMap {
    pub id: CharacterMapId,
    pub name: String,
    pub maps: Vec<FileMap>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FileMap {
    pub from: ImageRef,
    /// `None` hides the image.
    pub to: Option<ImageRef>,
}

impl CharacterMap {
    /// Image to draw in place of `image`; `None` when the map hides it.
    pub fn apply(&self, image: ImageRef) -> Option<ImageRef> {
        match self.maps.iter().find(|m| m.from == image) {
            Some(m) => m.to,
            None => Some(image),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopMode {
    NoLoop,
    #[default]
    Loop,
    /// Play forwards then backwards. Segments never wrap to the first key.
    PingPong,
}

#[derive(Clone, Debug, Default)]
pub struct Animation {
    pub id: AnimId,
    pub name: String,
    /// Total length in milliseconds.
    pub length: u32,
    pub looping: LoopMode,
    /// Time to resume from after wrapping past the end (looping only).
    pub loop_to: u32,
    pub mainline: KeyTrack<MainlineKey>,
    pub timelines: BTreeMap<TimelineId, Timeline>,
}

impl Animation {
    /// Whether segments after the last key blend towards the first one.
    #[inline]
    pub fn wraps(&self) -> bool {
        matches!(self.looping, LoopMode::Loop)
    }

    pub fn timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(&id)
    }

    /// Map elapsed playback time (ms since the animation was selected) into
    /// animation time according to the looping mode.
    pub fn normalize_time(&self, elapsed: u64) -> u32 {
        if self.length == 0 {
            return 0;
        }
        let length = u64::from(self.length);
        let last = length - 1;
        let t = match self.looping {
            LoopMode::NoLoop => elapsed.min(last),
            LoopMode::Loop => {
                if elapsed < length {
                    elapsed
                } else {
                    let loop_to = u64::from(self.loop_to).min(last);
                    let span = length - loop_to;
                    loop_to + (elapsed - length) % span
                }
            }
            LoopMode::PingPong => {
                if last == 0 {
                    0
                } else {
                    let period = 2 * last;
                    let m = elapsed % period;
                    if m <= last {
                        m
                    } else {
                        period - m
                    }
                }
            }
        };
        // t <= last < u32::MAX
        t as u32
    }
}

/// Anything stored in a [`KeyTrack`].
pub trait Keyframe {
    fn id(&self) -> KeyId;
    fn time(&self) -> u32;
}

/// Keys addressed by id and ordered by (time, id).
#[derive(Clone, Debug)]
pub struct KeyTrack<K> {
    keys: Vec<K>,
    index: BTreeMap<KeyId, usize>,
    duplicates: Vec<KeyId>,
}

impl<K> Default for KeyTrack<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            index: BTreeMap::new(),
            duplicates: Vec::new(),
        }
    }
}

impl<K: Keyframe> KeyTrack<K> {
    /// Later duplicates of an id replace earlier ones and are remembered in
    /// [`KeyTrack::duplicate_ids`].
    pub fn new(keys: impl IntoIterator<Item = K>) -> Self {
        let mut by_id: BTreeMap<KeyId, K> = BTreeMap::new();
        let mut duplicates = Vec::new();
        for k in keys {
            let id = k.id();
            if by_id.insert(id, k).is_some() {
                duplicates.push(id);
            }
        }
        let mut keys: Vec<K> = by_id.into_values().collect();
        keys.sort_by_key(|k| (k.time(), k.id()));
        let index = keys.iter().enumerate().map(|(i, k)| (k.id(), i)).collect();
        Self {
            keys,
            index,
            duplicates,
        }
    }

    /// Ids that appeared more than once when the track was built.
    pub fn duplicate_ids(&self) -> &[KeyId] {
        &self.duplicates
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, id: KeyId) -> Option<&K> {
        self.index.get(&id).map(|&i| &self.keys[i])
    }

    /// Keys in (time, id) order.
    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.keys.iter()
    }

    pub fn first(&self) -> Option<&K> {
        self.keys.first()
    }

    /// The key with the greatest time <= `t` (smallest id among equal times).
    /// Times before the first key clamp to the first key.
    pub fn at_time(&self, t: u32) -> Option<&K> {
        let first = self.keys.first()?;
        let p = self.keys.partition_point(|k| k.time() <= t);
        if p == 0 {
            return Some(first);
        }
        let found = self.keys[p - 1].time();
        let start = self.keys.partition_point(|k| k.time() < found);
        Some(&self.keys[start])
    }

    /// The key following `id` in time order. After the last key this wraps to
    /// the first key when `wrap` is set and otherwise returns the key itself.
    /// The flag reports whether a wrap happened.
    pub fn next_after(&self, id: KeyId, wrap: bool) -> Option<(&K, bool)> {
        let &i = self.index.get(&id)?;
        if i + 1 < self.keys.len() {
            Some((&self.keys[i + 1], false))
        } else if wrap {
            Some((&self.keys[0], true))
        } else {
            Some((&self.keys[i], false))
        }
    }
}

/// Snapshot selecting which bones and objects are present from its time on.
#[derive(Clone, Debug, Default)]
pub struct MainlineKey {
    pub id: KeyId,
    pub time: u32,
    pub bones: BTreeMap<SlotId, BoneSlot>,
    pub objects: BTreeMap<SlotId, ObjectSlot>,
}

impl Keyframe for MainlineKey {
    fn id(&self) -> KeyId {
        self.id
    }
    fn time(&self) -> u32 {
        self.time
    }
}

/// A bone slot: literal pose or reference into a bone timeline.
#[derive(Clone, Debug, PartialEq)]
pub enum BoneSlot {
    Literal(LiteralBone),
    Ref(SlotRef),
}

impl BoneSlot {
    pub fn parent(&self) -> Option<SlotId> {
        match self {
            BoneSlot::Literal(b) => b.parent,
            BoneSlot::Ref(r) => r.parent,
        }
    }
}

/// An object slot: literal pose or reference into an object timeline.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectSlot {
    Literal(LiteralObject),
    Ref(SlotRef),
}

impl ObjectSlot {
    pub fn parent(&self) -> Option<SlotId> {
        match self {
            ObjectSlot::Literal(o) => o.parent,
            ObjectSlot::Ref(r) => r.parent,
        }
    }

    pub fn z_index(&self) -> i32 {
        match self {
            ObjectSlot::Literal(o) => o.z_index,
            ObjectSlot::Ref(r) => r.z_index,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LiteralBone {
    pub parent: Option<SlotId>,
    pub pose: BonePose,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LiteralObject {
    pub parent: Option<SlotId>,
    pub z_index: i32,
    pub pose: ObjectPose,
}

/// "Interpolate timeline `timeline` starting from its key `key`."
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotRef {
    pub parent: Option<SlotId>,
    pub timeline: TimelineId,
    pub key: KeyId,
    /// Draw order; only meaningful for objects.
    pub z_index: i32,
}

/// What a timeline animates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Bone,
    #[default]
    Sprite,
    Box,
    Point,
    Sound,
    Entity,
    Variable,
}

impl TimelineKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bone" => TimelineKind::Bone,
            "sprite" => TimelineKind::Sprite,
            "box" => TimelineKind::Box,
            "point" => TimelineKind::Point,
            "sound" => TimelineKind::Sound,
            "entity" => TimelineKind::Entity,
            "variable" => TimelineKind::Variable,
            _ => return None,
        })
    }

    #[inline]
    pub fn is_bone(&self) -> bool {
        matches!(self, TimelineKind::Bone)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Timeline {
    pub id: TimelineId,
    pub name: String,
    pub kind: TimelineKind,
    pub keys: KeyTrack<TimelineKey>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelineKey {
    pub id: KeyId,
    pub time: u32,
    pub curve: Curve,
    pub spin: Spin,
    pub pose: KeyPose,
}

impl Keyframe for TimelineKey {
    fn id(&self) -> KeyId {
        self.id
    }
    fn time(&self) -> u32 {
        self.time
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum KeyPose {
    Bone(BonePose),
    Object(ObjectPose),
}

impl KeyPose {
    pub fn as_bone(&self) -> Option<&BonePose> {
        match self {
            KeyPose::Bone(b) => Some(b),
            KeyPose::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectPose> {
        match self {
            KeyPose::Object(o) => Some(o),
            KeyPose::Bone(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BonePose {
    pub transform: Transform,
    pub color: Color,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Alpha,
    Additive,
    Multiply,
    Screen,
    Overlay,
}

impl BlendMode {
    /// Unknown names fall back to alpha blending.
    pub fn from_name(name: &str) -> Self {
        match name {
            "additive" => BlendMode::Additive,
            "multiply" => BlendMode::Multiply,
            "screen" => BlendMode::Screen,
            "overlay" => BlendMode::Overlay,
            _ => BlendMode::Alpha,
        }
    }
}

/// Scrub position inside a nested animation (objects of entity kind).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubAnimation {
    pub animation: AnimId,
    /// Normalised progress in [0, 1].
    pub t: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectPose {
    pub transform: Transform,
    pub color: Color,
    pub image: Option<ImageRef>,
    /// Normalised pivot; `None` defers to the image's declared pivot.
    pub pivot: Option<[f32; 2]>,
    /// Size in pixels; `None` defers to the image dimensions.
    pub size: Option<[f32; 2]>,
    pub blend_mode: BlendMode,
    pub name: Option<String>,
    pub sub_animation: Option<SubAnimation>,
}
