//! Keyframe resolution.
//!
//! Model:
//! - The mainline key in effect at time `t` selects which bones and objects
//!   exist and whether each is a literal pose or a reference into a timeline.
//! - Literal slots are shown as-is; the mainline itself is never tweened.
//! - A reference starts at its named timeline key and blends towards the next
//!   key of that timeline by time, remapped through the left key's curve.
//! - After the last key a segment wraps to the first key only for looping
//!   animations; otherwise the pose freezes.
//!
//! Nothing here fails: unresolvable slots are skipped and reported as
//! [`ResolveWarning`]s.

use crate::data::{
    Animation, BonePose, BoneSlot, Keyframe, MainlineKey, ObjectPose, ObjectSlot, SlotRef,
    SubAnimation, Timeline, TimelineKey,
};
use crate::error::{ResolveWarning, SlotKind};
use crate::ids::SlotId;
use crate::interp::functions::{lerp_f32, lerp_vec2};
use crate::transform::Spin;

/// Bracketing mainline keys for an instant.
#[derive(Clone, Copy, Debug)]
pub struct MainlineCursor<'a> {
    pub key: &'a MainlineKey,
    pub next: &'a MainlineKey,
    /// Position between `key` and `next` in [0, 1]. Informational only:
    /// literal slots are not tweened.
    pub fraction: f32,
}

/// Locate the mainline keys around `t`. `None` when the mainline is empty.
pub fn mainline_cursor(anim: &Animation, t: u32) -> Option<MainlineCursor<'_>> {
    let key = anim.mainline.at_time(t)?;
    let (next, wrapped) = anim.mainline.next_after(key.id, anim.wraps())?;
    let fraction = segment_fraction(t, key.time, next.time, wrapped, anim.length);
    Some(MainlineCursor {
        key,
        next,
        fraction,
    })
}

/// Fraction of the way from a key at `t0` to the next key at `t1`, where a
/// wrapped next key lies one animation length later. 0 for degenerate
/// segments; clamped to [0, 1].
pub fn segment_fraction(t: u32, t0: u32, t1: u32, wrapped: bool, length: u32) -> f32 {
    let end = if wrapped {
        u64::from(t1) + u64::from(length)
    } else {
        u64::from(t1)
    };
    let start = u64::from(t0);
    if end <= start {
        return 0.0;
    }
    let f = (f64::from(t) - start as f64) / (end - start) as f64;
    f.clamp(0.0, 1.0) as f32
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedBone {
    pub slot: SlotId,
    pub parent: Option<SlotId>,
    pub pose: BonePose,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedObject {
    pub slot: SlotId,
    pub parent: Option<SlotId>,
    pub z_index: i32,
    pub pose: ObjectPose,
}

/// Local poses of every slot of one mainline key at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedKey {
    pub bones: Vec<ResolvedBone>,
    pub objects: Vec<ResolvedObject>,
}

/// Resolve every slot of `key` at time `t`, in slot id order.
pub fn resolve_key(
    anim: &Animation,
    key: &MainlineKey,
    t: u32,
    warnings: &mut Vec<ResolveWarning>,
) -> ResolvedKey {
    let mut out = ResolvedKey {
        bones: Vec::with_capacity(key.bones.len()),
        objects: Vec::with_capacity(key.objects.len()),
    };

    for (&slot, bone) in &key.bones {
        let pose = match bone {
            BoneSlot::Literal(b) => Some(b.pose),
            BoneSlot::Ref(r) => tween_bone(anim, slot, r, t, warnings),
        };
        if let Some(pose) = pose {
            out.bones.push(ResolvedBone {
                slot,
                parent: bone.parent(),
                pose,
            });
        }
    }

    for (&slot, object) in &key.objects {
        let pose = match object {
            ObjectSlot::Literal(o) => Some(o.pose.clone()),
            ObjectSlot::Ref(r) => tween_object(anim, slot, r, t, warnings),
        };
        if let Some(pose) = pose {
            out.objects.push(ResolvedObject {
                slot,
                parent: object.parent(),
                z_index: object.z_index(),
                pose,
            });
        }
    }

    out
}

/// The referenced key and its successor, with the remapped blend fraction.
struct Segment<'a> {
    from: &'a TimelineKey,
    to: &'a TimelineKey,
    t: f32,
}

fn segment<'a>(
    anim: &'a Animation,
    kind: SlotKind,
    slot: SlotId,
    r: &SlotRef,
    t: u32,
    warnings: &mut Vec<ResolveWarning>,
) -> Option<(&'a Timeline, Segment<'a>)> {
    let Some(timeline) = anim.timeline(r.timeline) else {
        warnings.push(ResolveWarning::MissingTimeline {
            kind,
            slot,
            timeline: r.timeline,
        });
        return None;
    };
    let Some((from, (to, wrapped))) = timeline
        .keys
        .get(r.key)
        .zip(timeline.keys.next_after(r.key, anim.wraps()))
    else {
        warnings.push(ResolveWarning::MissingTimelineKey {
            kind,
            slot,
            timeline: r.timeline,
            key: r.key,
        });
        return None;
    };

    let linear = if to.id() == from.id() {
        0.0
    } else {
        segment_fraction(t, from.time, to.time, wrapped, anim.length)
    };
    Some((
        timeline,
        Segment {
            from,
            to,
            t: from.curve.ease(linear),
        },
    ))
}

/// Interpolated local bone pose for a reference, or `None` when unresolvable.
pub fn tween_bone(
    anim: &Animation,
    slot: SlotId,
    r: &SlotRef,
    t: u32,
    warnings: &mut Vec<ResolveWarning>,
) -> Option<BonePose> {
    let (timeline, seg) = segment(anim, SlotKind::Bone, slot, r, t, warnings)?;
    let Some(a) = seg.from.pose.as_bone() else {
        warnings.push(ResolveWarning::KindMismatch {
            kind: SlotKind::Bone,
            slot,
            timeline: timeline.id,
            key: seg.from.id,
        });
        return None;
    };
    if seg.from.curve.is_instant() {
        return Some(*a);
    }
    let Some(b) = seg.to.pose.as_bone() else {
        warnings.push(ResolveWarning::NextKeyMismatch {
            kind: SlotKind::Bone,
            slot,
            timeline: timeline.id,
            key: seg.to.id,
        });
        return Some(*a);
    };
    Some(BonePose {
        transform: a.transform.lerp(&b.transform, seg.t, seg.from.spin),
        color: a.color.lerp(&b.color, seg.t),
    })
}

/// Interpolated local object pose for a reference, or `None` when unresolvable.
pub fn tween_object(
    anim: &Animation,
    slot: SlotId,
    r: &SlotRef,
    t: u32,
    warnings: &mut Vec<ResolveWarning>,
) -> Option<ObjectPose> {
    let (timeline, seg) = segment(anim, SlotKind::Object, slot, r, t, warnings)?;
    let Some(a) = seg.from.pose.as_object() else {
        warnings.push(ResolveWarning::KindMismatch {
            kind: SlotKind::Object,
            slot,
            timeline: timeline.id,
            key: seg.from.id,
        });
        return None;
    };
    if seg.from.curve.is_instant() {
        return Some(a.clone());
    }
    let Some(b) = seg.to.pose.as_object() else {
        warnings.push(ResolveWarning::NextKeyMismatch {
            kind: SlotKind::Object,
            slot,
            timeline: timeline.id,
            key: seg.to.id,
        });
        return Some(a.clone());
    };
    Some(blend_objects(a, b, seg.t, seg.from.spin))
}

fn blend_objects(a: &ObjectPose, b: &ObjectPose, t: f32, spin: Spin) -> ObjectPose {
    let blend_pair = |x: Option<[f32; 2]>, y: Option<[f32; 2]>| match (x, y) {
        (Some(x), Some(y)) => Some(lerp_vec2(x, y, t)),
        (x, _) => x,
    };
    let sub_animation = match (a.sub_animation, b.sub_animation) {
        (Some(sa), Some(sb)) if sa.animation == sb.animation => Some(SubAnimation {
            animation: sa.animation,
            t: lerp_f32(sa.t, sb.t, t),
        }),
        (sa, _) => sa,
    };
    ObjectPose {
        transform: a.transform.lerp(&b.transform, t, spin),
        color: a.color.lerp(&b.color, t),
        pivot: blend_pair(a.pivot, b.pivot),
        size: blend_pair(a.size, b.size),
        sub_animation,
        ..a.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{KeyPose, KeyTrack, LiteralBone, LoopMode, TimelineKind};
    use crate::ids::{KeyId, TimelineId};
    use crate::interp::Curve;
    use crate::transform::Transform;
    use std::collections::BTreeMap;

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() <= 1e-4, "left={a} right={b}");
    }

    fn bone_key(id: u32, time: u32, x: f32, curve: Curve) -> TimelineKey {
        TimelineKey {
            id: KeyId(id),
            time,
            curve,
            spin: Spin::CounterClockwise,
            pose: KeyPose::Bone(BonePose {
                transform: Transform::from_position(x, 0.0),
                ..BonePose::default()
            }),
        }
    }

    fn anim_with(looping: LoopMode, keys: Vec<TimelineKey>) -> Animation {
        let timeline = Timeline {
            id: TimelineId(0),
            name: "arm".into(),
            kind: TimelineKind::Bone,
            keys: KeyTrack::new(keys),
        };
        let mut mainline_key = MainlineKey::default();
        mainline_key.bones.insert(
            SlotId(0),
            BoneSlot::Ref(SlotRef {
                parent: None,
                timeline: TimelineId(0),
                key: KeyId(0),
                z_index: 0,
            }),
        );
        Animation {
            length: 1000,
            looping,
            mainline: KeyTrack::new(vec![mainline_key]),
            timelines: BTreeMap::from([(TimelineId(0), timeline)]),
            ..Animation::default()
        }
    }

    fn x_at(anim: &Animation, key: u32, t: u32) -> f32 {
        let r = SlotRef {
            parent: None,
            timeline: TimelineId(0),
            key: KeyId(key),
            z_index: 0,
        };
        let mut warnings = Vec::new();
        let pose = tween_bone(anim, SlotId(0), &r, t, &mut warnings).unwrap();
        assert!(warnings.is_empty(), "{warnings:?}");
        pose.transform.x
    }

    #[test]
    fn linear_segment_blends_by_time() {
        let anim = anim_with(
            LoopMode::NoLoop,
            vec![
                bone_key(0, 0, 0.0, Curve::Linear),
                bone_key(1, 500, 10.0, Curve::Linear),
            ],
        );
        approx(x_at(&anim, 0, 250), 5.0);
        approx(x_at(&anim, 0, 500), 10.0);
    }

    #[test]
    fn instant_curve_holds_left_pose() {
        let anim = anim_with(
            LoopMode::NoLoop,
            vec![
                bone_key(0, 0, 0.0, Curve::Instant),
                bone_key(1, 500, 10.0, Curve::Linear),
            ],
        );
        approx(x_at(&anim, 0, 499), 0.0);
    }

    #[test]
    fn last_key_freezes_without_looping() {
        let anim = anim_with(
            LoopMode::NoLoop,
            vec![
                bone_key(0, 0, 0.0, Curve::Linear),
                bone_key(1, 500, 10.0, Curve::Linear),
            ],
        );
        approx(x_at(&anim, 1, 900), 10.0);
    }

    #[test]
    fn last_key_wraps_towards_first_when_looping() {
        let anim = anim_with(
            LoopMode::Loop,
            vec![
                bone_key(0, 0, 0.0, Curve::Linear),
                bone_key(1, 500, 10.0, Curve::Linear),
            ],
        );
        // 500 -> 1000 (first key one length later): halfway at 750.
        approx(x_at(&anim, 1, 750), 5.0);
    }

    #[test]
    fn quadratic_curve_remaps_fraction() {
        let anim = anim_with(
            LoopMode::NoLoop,
            vec![
                bone_key(0, 0, 0.0, Curve::Quadratic { c1: 0.0 }),
                bone_key(1, 1000, 100.0, Curve::Linear),
            ],
        );
        approx(x_at(&anim, 0, 500), 25.0);
    }

    #[test]
    fn two_parameter_bezier_key_eases_through_its_controls() {
        let bezier = Curve::from_parts(Some("bezier"), 0.2, 0.9, None, None).unwrap();
        let anim = anim_with(
            LoopMode::NoLoop,
            vec![
                bone_key(0, 0, 0.0, bezier),
                bone_key(1, 1000, 100.0, Curve::Linear),
            ],
        );
        // (3 * 0.2 + 3 * 0.9 + 1) / 8 of the way at the midpoint.
        approx(x_at(&anim, 0, 500), 53.75);
        approx(x_at(&anim, 0, 1000), 100.0);
    }

    #[test]
    fn missing_timeline_key_warns_and_skips() {
        let anim = anim_with(LoopMode::NoLoop, vec![bone_key(0, 0, 0.0, Curve::Linear)]);
        let r = SlotRef {
            parent: None,
            timeline: TimelineId(0),
            key: KeyId(9),
            z_index: 0,
        };
        let mut warnings = Vec::new();
        assert!(tween_bone(&anim, SlotId(3), &r, 0, &mut warnings).is_none());
        assert_eq!(
            warnings,
            vec![ResolveWarning::MissingTimelineKey {
                kind: SlotKind::Bone,
                slot: SlotId(3),
                timeline: TimelineId(0),
                key: KeyId(9),
            }]
        );
    }

    #[test]
    fn literal_slots_pass_through_untweened() {
        let mut anim = anim_with(LoopMode::NoLoop, vec![bone_key(0, 0, 0.0, Curve::Linear)]);
        let mut key = MainlineKey::default();
        let pose = BonePose {
            transform: Transform::new(3.0, 4.0, 10.0, 1.0, 1.0),
            ..BonePose::default()
        };
        key.bones.insert(
            SlotId(5),
            BoneSlot::Literal(LiteralBone { parent: None, pose }),
        );
        anim.mainline = KeyTrack::new(vec![key.clone()]);
        let mut warnings = Vec::new();
        let resolved = resolve_key(&anim, &key, 700, &mut warnings);
        assert_eq!(resolved.bones.len(), 1);
        assert_eq!(resolved.bones[0].pose, pose);
    }

    #[test]
    fn cursor_fraction_spans_wrapped_segment() {
        let mut anim = anim_with(LoopMode::Loop, vec![bone_key(0, 0, 0.0, Curve::Linear)]);
        anim.mainline = KeyTrack::new(vec![
            MainlineKey {
                id: KeyId(0),
                time: 0,
                ..MainlineKey::default()
            },
            MainlineKey {
                id: KeyId(1),
                time: 600,
                ..MainlineKey::default()
            },
        ]);
        let cursor = mainline_cursor(&anim, 800).unwrap();
        assert_eq!(cursor.key.id, KeyId(1));
        assert_eq!(cursor.next.id, KeyId(0));
        approx(cursor.fraction, 0.5);
    }
}
