//! Error and warning types.
//!
//! Structural problems found while loading reject the whole document
//! ([`DocumentError`]). Runtime lookups by id report [`LookupError`]. Problems
//! found while resolving a frame never fail: they become [`ResolveWarning`]s
//! attached to the frame and the affected slot degrades gracefully.

use serde::{Deserialize, Serialize};

use crate::ids::{AnimId, CharacterMapId, EntityId, KeyId, SlotId, TimelineId};

/// Where inside a document a structural problem was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub entity: EntityId,
    pub animation: AnimId,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity {} animation {}", self.entity, self.animation)
    }
}

/// Failure to load a document. No partial document is ever returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DocumentError {
    /// The text is not a well-formed document encoding.
    #[error("Parse error: {reason}")]
    Parse { reason: String },

    /// Two records of the same kind share an id inside one map.
    #[error("Duplicate {what} id {id} in {scope}")]
    DuplicateId {
        what: &'static str,
        id: u32,
        scope: String,
    },

    /// A mainline reference names a timeline that does not exist.
    #[error("{at}: mainline key {key} slot {slot} references missing timeline {timeline}")]
    MissingTimeline {
        at: Location,
        key: KeyId,
        slot: SlotId,
        timeline: TimelineId,
    },

    /// A mainline reference names a key its timeline does not contain.
    #[error("{at}: mainline key {key} slot {slot} references missing key {timeline_key} of timeline {timeline}")]
    MissingTimelineKey {
        at: Location,
        key: KeyId,
        slot: SlotId,
        timeline: TimelineId,
        timeline_key: KeyId,
    },

    /// A bone reference points at an object timeline or vice versa.
    #[error("{at}: timeline {timeline} key {timeline_key} does not hold a {expected} pose")]
    TimelineKindMismatch {
        at: Location,
        timeline: TimelineId,
        timeline_key: KeyId,
        expected: &'static str,
    },

    /// A slot names a parent bone absent from the same mainline key.
    #[error("{at}: mainline key {key} slot {slot} names missing parent bone {parent}")]
    MissingParent {
        at: Location,
        key: KeyId,
        slot: SlotId,
        parent: SlotId,
    },

    /// Following parent ids from this bone returns to it.
    #[error("{at}: mainline key {key} bone {bone} is part of a parent cycle")]
    ParentCycle {
        at: Location,
        key: KeyId,
        bone: SlotId,
    },

    /// Curve type name not recognised.
    #[error("{at}: timeline {timeline} key {timeline_key} has unknown curve type '{name}'")]
    UnknownCurve {
        at: Location,
        timeline: TimelineId,
        timeline_key: KeyId,
        name: String,
    },

    /// A required attribute is missing or out of range.
    #[error("Invalid {field} in {scope}: {reason}")]
    InvalidField {
        field: &'static str,
        scope: String,
        reason: String,
    },
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}

/// A runtime lookup by id or name found nothing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum LookupError {
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Animation not found: {0}")]
    AnimationNotFound(String),

    #[error("Character map not found: {0}")]
    CharacterMapNotFound(CharacterMapId),

    #[error("No animation selected")]
    NoAnimation,
}

/// A per-frame resolution problem. The offending slot is skipped or frozen and
/// composition continues.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ResolveWarning {
    /// Reference to a timeline the animation does not have; slot skipped.
    MissingTimeline {
        kind: SlotKind,
        slot: SlotId,
        timeline: TimelineId,
    },
    /// Reference to a key the timeline does not have; slot skipped.
    MissingTimelineKey {
        kind: SlotKind,
        slot: SlotId,
        timeline: TimelineId,
        key: KeyId,
    },
    /// Timeline key holds the wrong pose kind; slot skipped.
    KindMismatch {
        kind: SlotKind,
        slot: SlotId,
        timeline: TimelineId,
        key: KeyId,
    },
    /// The next key holds the wrong pose kind; the slot froze on its current key.
    NextKeyMismatch {
        kind: SlotKind,
        slot: SlotId,
        timeline: TimelineId,
        key: KeyId,
    },
    /// Declared parent bone is not available; composed onto the base transform.
    MissingParent {
        kind: SlotKind,
        slot: SlotId,
        parent: SlotId,
    },
    /// Bone sits on a parent cycle; composed onto the base transform.
    ParentCycle { slot: SlotId },
}

/// Bone or object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    Bone,
    Object,
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotKind::Bone => f.write_str("bone"),
            SlotKind::Object => f.write_str("object"),
        }
    }
}

impl std::fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTimeline {
                kind,
                slot,
                timeline,
            } => write!(f, "{kind} {slot}: missing timeline {timeline}"),
            Self::MissingTimelineKey {
                kind,
                slot,
                timeline,
                key,
            } => write!(f, "{kind} {slot}: timeline {timeline} has no key {key}"),
            Self::KindMismatch {
                kind,
                slot,
                timeline,
                key,
            } => write!(f, "{kind} {slot}: timeline {timeline} key {key} holds the wrong pose kind"),
            Self::NextKeyMismatch {
                kind,
                slot,
                timeline,
                key,
            } => write!(
                f,
                "{kind} {slot}: next key {key} of timeline {timeline} holds the wrong pose kind"
            ),
            Self::MissingParent { kind, slot, parent } => {
                write!(f, "{kind} {slot}: parent bone {parent} unavailable")
            }
            Self::ParentCycle { slot } => write!(f, "bone {slot}: parent cycle"),
        }
    }
}
