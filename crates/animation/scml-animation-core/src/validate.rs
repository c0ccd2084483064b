//! Structural checks run on every loaded document.
//!
//! A document that passes [`Document::validate`] can still produce runtime
//! warnings only through programmatic edits made after validation.

use crate::compose::dependency_order;
use crate::data::{Animation, BoneSlot, Document, KeyPose, MainlineKey, ObjectSlot, SlotRef};
use crate::error::{DocumentError, Location};
use crate::ids::SlotId;

impl Document {
    /// Reject duplicate ids, dangling references, kind mismatches, missing
    /// parents, parent cycles and out-of-range loop points. Stops at the first
    /// problem.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if let Some(&(what, id)) = self.duplicates.first() {
            return Err(DocumentError::DuplicateId {
                what,
                id,
                scope: "document".into(),
            });
        }
        for entity in self.entities.values() {
            for anim in entity.animations.values() {
                let at = Location {
                    entity: entity.id,
                    animation: anim.id,
                };
                validate_animation(anim, at)?;
            }
        }
        Ok(())
    }
}

fn validate_animation(anim: &Animation, at: Location) -> Result<(), DocumentError> {
    if let Some(&id) = anim.mainline.duplicate_ids().first() {
        return Err(DocumentError::DuplicateId {
            what: "mainline key",
            id: id.into(),
            scope: at.to_string(),
        });
    }
    if anim.loop_to > anim.length {
        return Err(DocumentError::InvalidField {
            field: "loop_to",
            scope: at.to_string(),
            reason: format!("{} exceeds length {}", anim.loop_to, anim.length),
        });
    }

    for timeline in anim.timelines.values() {
        if let Some(&id) = timeline.keys.duplicate_ids().first() {
            return Err(DocumentError::DuplicateId {
                what: "timeline key",
                id: id.into(),
                scope: format!("{at} timeline {}", timeline.id),
            });
        }
        for key in timeline.keys.iter() {
            let ok = match key.pose {
                KeyPose::Bone(_) => timeline.kind.is_bone(),
                KeyPose::Object(_) => !timeline.kind.is_bone(),
            };
            if !ok {
                return Err(DocumentError::TimelineKindMismatch {
                    at,
                    timeline: timeline.id,
                    timeline_key: key.id,
                    expected: if timeline.kind.is_bone() { "bone" } else { "object" },
                });
            }
        }
    }

    for key in anim.mainline.iter() {
        validate_mainline_key(anim, key, at)?;
    }
    Ok(())
}

fn validate_mainline_key(
    anim: &Animation,
    key: &MainlineKey,
    at: Location,
) -> Result<(), DocumentError> {
    for (&slot, bone) in &key.bones {
        if let BoneSlot::Ref(r) = bone {
            check_ref(anim, key, slot, r, true, at)?;
        }
        check_parent(key, slot, bone.parent(), at)?;
    }
    for (&slot, object) in &key.objects {
        if let ObjectSlot::Ref(r) = object {
            check_ref(anim, key, slot, r, false, at)?;
        }
        check_parent(key, slot, object.parent(), at)?;
    }

    let deps = dependency_order(key.bones.iter().map(|(&slot, b)| (slot, b.parent())));
    if let Some(&bone) = deps.cyclic.first() {
        return Err(DocumentError::ParentCycle {
            at,
            key: key.id,
            bone,
        });
    }
    Ok(())
}

fn check_ref(
    anim: &Animation,
    key: &MainlineKey,
    slot: SlotId,
    r: &SlotRef,
    bone: bool,
    at: Location,
) -> Result<(), DocumentError> {
    let Some(timeline) = anim.timeline(r.timeline) else {
        return Err(DocumentError::MissingTimeline {
            at,
            key: key.id,
            slot,
            timeline: r.timeline,
        });
    };
    if timeline.keys.get(r.key).is_none() {
        return Err(DocumentError::MissingTimelineKey {
            at,
            key: key.id,
            slot,
            timeline: r.timeline,
            timeline_key: r.key,
        });
    }
    if timeline.kind.is_bone() != bone {
        return Err(DocumentError::TimelineKindMismatch {
            at,
            timeline: r.timeline,
            timeline_key: r.key,
            expected: if bone { "bone" } else { "object" },
        });
    }
    Ok(())
}

fn check_parent(
    key: &MainlineKey,
    slot: SlotId,
    parent: Option<SlotId>,
    at: Location,
) -> Result<(), DocumentError> {
    match parent {
        Some(p) if !key.bones.contains_key(&p) => Err(DocumentError::MissingParent {
            at,
            key: key.id,
            slot,
            parent: p,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        BonePose, Entity, KeyTrack, LiteralBone, Timeline, TimelineKey, TimelineKind,
    };
    use crate::ids::{AnimId, EntityId, KeyId, TimelineId};
    use crate::interp::Curve;
    use crate::transform::Spin;
    use std::collections::BTreeMap;

    fn literal(parent: Option<u32>) -> BoneSlot {
        BoneSlot::Literal(LiteralBone {
            parent: parent.map(SlotId),
            pose: BonePose::default(),
        })
    }

    fn doc_with(anim: Animation) -> Document {
        Document::new(
            [],
            [Entity {
                animations: BTreeMap::from([(anim.id, anim)]),
                ..Entity::default()
            }],
        )
    }

    fn anim_with_bones(bones: Vec<(u32, BoneSlot)>) -> Animation {
        let key = MainlineKey {
            bones: bones.into_iter().map(|(s, b)| (SlotId(s), b)).collect(),
            ..MainlineKey::default()
        };
        Animation {
            length: 100,
            mainline: KeyTrack::new(vec![key]),
            ..Animation::default()
        }
    }

    #[test]
    fn well_formed_hierarchy_passes() {
        let anim = anim_with_bones(vec![(0, literal(None)), (1, literal(Some(0)))]);
        assert_eq!(doc_with(anim).validate(), Ok(()));
    }

    #[test]
    fn parent_cycle_is_rejected() {
        let anim = anim_with_bones(vec![(0, literal(Some(1))), (1, literal(Some(0)))]);
        assert_eq!(
            doc_with(anim).validate(),
            Err(DocumentError::ParentCycle {
                at: Location {
                    entity: EntityId(0),
                    animation: AnimId(0),
                },
                key: KeyId(0),
                bone: SlotId(0),
            })
        );
    }

    #[test]
    fn missing_parent_is_rejected() {
        let anim = anim_with_bones(vec![(0, literal(Some(7)))]);
        assert!(matches!(
            doc_with(anim).validate(),
            Err(DocumentError::MissingParent { parent: SlotId(7), .. })
        ));
    }

    #[test]
    fn bone_ref_into_sprite_timeline_is_rejected() {
        let mut anim = anim_with_bones(vec![(
            0,
            BoneSlot::Ref(SlotRef {
                parent: None,
                timeline: TimelineId(0),
                key: KeyId(0),
                z_index: 0,
            }),
        )]);
        anim.timelines.insert(
            TimelineId(0),
            Timeline {
                kind: TimelineKind::Sprite,
                keys: KeyTrack::new(vec![TimelineKey {
                    id: KeyId(0),
                    time: 0,
                    curve: Curve::Linear,
                    spin: Spin::CounterClockwise,
                    pose: KeyPose::Object(Default::default()),
                }]),
                ..Timeline::default()
            },
        );
        assert!(matches!(
            doc_with(anim).validate(),
            Err(DocumentError::TimelineKindMismatch { expected: "bone", .. })
        ));
    }

    #[test]
    fn loop_to_beyond_length_is_rejected() {
        let mut anim = anim_with_bones(vec![]);
        anim.loop_to = 101;
        assert!(matches!(
            doc_with(anim).validate(),
            Err(DocumentError::InvalidField { field: "loop_to", .. })
        ));
    }

    #[test]
    fn duplicate_mainline_key_ids_are_rejected() {
        let mut anim = anim_with_bones(vec![]);
        let again = MainlineKey {
            time: 50,
            ..MainlineKey::default()
        };
        anim.mainline = KeyTrack::new(vec![MainlineKey::default(), again]);
        assert_eq!(anim.mainline.len(), 1);
        assert!(matches!(
            doc_with(anim).validate(),
            Err(DocumentError::DuplicateId { what: "mainline key", id: 0, .. })
        ));
    }

    #[test]
    fn duplicate_timeline_key_ids_are_rejected() {
        let mut anim = anim_with_bones(vec![]);
        let key = |time| TimelineKey {
            id: KeyId(3),
            time,
            curve: Curve::Linear,
            spin: Spin::CounterClockwise,
            pose: KeyPose::Bone(BonePose::default()),
        };
        anim.timelines.insert(
            TimelineId(0),
            Timeline {
                keys: KeyTrack::new(vec![key(0), key(40)]),
                ..Timeline::default()
            },
        );
        assert!(matches!(
            doc_with(anim).validate(),
            Err(DocumentError::DuplicateId { what: "timeline key", id: 3, .. })
        ));
    }

    #[test]
    fn duplicate_entities_are_rejected() {
        let doc = Document::new([], [Entity::default(), Entity::default()]);
        assert_eq!(doc.entities.len(), 1);
        assert_eq!(
            doc.validate(),
            Err(DocumentError::DuplicateId {
                what: "entity",
                id: 0,
                scope: "document".into(),
            })
        );
    }
}
