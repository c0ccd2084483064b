use std::collections::BTreeMap;
use std::sync::Arc;

use scml_animation_core::data::LiteralBone;
use scml_animation_core::{
    AnimId, Animation, BonePose, BoneSlot, Document, Entity, EntityId, Frame, KeyId, KeyTrack,
    MainlineKey, SlotId, Transform,
};
use scml_test_fixtures::documents;

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn stick_figure() -> Arc<Document> {
    let json = documents::json("stick_figure").expect("load stick_figure fixture");
    Arc::new(Document::from_scon_json(&json).expect("stick_figure should load"))
}

fn frame_at(doc: &Arc<Document>, anim: &str, time: u32, base: &Transform) -> Frame {
    let mut inst = doc.create_instance_by_name("stick").expect("stick entity");
    inst.select_by_name(anim).expect("animation");
    inst.seek(time).expect("seek");
    inst.transforms(base).clone()
}

#[test]
fn non_looping_animation_freezes_on_its_last_frame() {
    let doc = stick_figure();
    let base = Transform::IDENTITY;
    let last = frame_at(&doc, "fall", 599, &base);
    for t in [600, 601, 5_000] {
        assert_eq!(frame_at(&doc, "fall", t, &base), last, "t={t}");
    }

    let hip = last.bone(SlotId(0)).expect("hip");
    approx(hip.transform.y, 0.0, 1e-4);
    // Clockwise 0 -> 270 traverses -90 degrees.
    approx(hip.transform.angle, 270.0, 1e-3);
}

#[test]
fn advancing_past_the_end_of_a_non_looping_animation_is_a_no_op() {
    let doc = stick_figure();
    let mut inst = doc.create_instance(EntityId(0)).unwrap();
    inst.select_by_name("fall").unwrap();
    inst.advance(10_000);
    assert_eq!(inst.time(), 599);
    let before = inst.transforms(&Transform::IDENTITY).clone();
    let count = inst.recompute_count();
    inst.advance(250);
    assert_eq!(inst.time(), 599);
    assert_eq!(*inst.transforms(&Transform::IDENTITY), before);
    assert_eq!(inst.recompute_count(), count);
}

#[test]
fn clockwise_spin_blends_through_negative_angles() {
    let doc = stick_figure();
    let hip = frame_at(&doc, "fall", 150, &Transform::IDENTITY)
        .bone(SlotId(0))
        .cloned()
        .unwrap();
    // -45 degrees, normalised after composition.
    approx(hip.transform.angle, 315.0, 1e-3);
    approx(hip.transform.y, 50.0, 1e-3);
}

#[test]
fn looping_animation_is_periodic() {
    let doc = stick_figure();
    let base = Transform::from_position(3.0, -7.0);
    for t in [0, 125, 499, 500, 750, 999] {
        let a = frame_at(&doc, "wave", t, &base);
        let b = frame_at(&doc, "wave", t + 1000, &base);
        let c = frame_at(&doc, "wave", t + 3000, &base);
        assert_eq!(a, b, "t={t}");
        assert_eq!(a, c, "t={t}");
    }
}

#[test]
fn advance_wraps_looping_clock() {
    let doc = stick_figure();
    let mut inst = doc.create_instance(EntityId(0)).unwrap();
    inst.select(AnimId(0)).unwrap();
    inst.advance(600);
    inst.advance(650);
    assert_eq!(inst.time(), 250);
    assert_eq!(inst.key(), Some(KeyId(0)));
}

#[test]
fn wrapped_segment_blends_back_to_the_first_key() {
    let doc = stick_figure();
    let frame = frame_at(&doc, "wave", 750, &Transform::IDENTITY);

    let hip = frame.bone(SlotId(0)).unwrap();
    approx(hip.transform.y, 105.0, 1e-3);

    // 90 -> 0 with the default counter-clockwise spin goes up through 360.
    let shoulder = frame.bone(SlotId(1)).unwrap();
    approx(shoulder.transform.angle, 225.0, 1e-3);
    approx(shoulder.transform.x, 0.0, 1e-3);
    approx(shoulder.transform.y, 165.0, 1e-3);
}

#[test]
fn objects_follow_their_parent_bone() {
    let doc = stick_figure();
    let frame = frame_at(&doc, "wave", 250, &Transform::IDENTITY);

    let arm = frame.object(SlotId(2)).unwrap();
    approx(arm.transform.y, 165.0, 1e-3);
    approx(arm.transform.angle, 45.0, 1e-3);

    let head = frame.object(SlotId(1)).unwrap();
    approx(head.transform.y, 233.0, 1e-3);
    approx(head.color.a, 0.75, 1e-5);

    let z: Vec<u32> = frame.objects.iter().map(|o| o.slot.0).collect();
    assert_eq!(z, vec![0, 2, 1]);
}

#[test]
fn loop_to_skips_the_intro_after_the_first_pass() {
    let doc = stick_figure();
    let mut inst = doc.create_instance(EntityId(0)).unwrap();
    inst.select_by_name("intro").unwrap();
    inst.advance(200);
    let x = inst.bone_transform(SlotId(0), &Transform::IDENTITY).unwrap().x;
    approx(x, 20.0, 1e-3);

    inst.advance(800);
    assert_eq!(inst.time(), 400);
    assert_eq!(inst.key(), Some(KeyId(1)));

    inst.advance(300);
    assert_eq!(inst.time(), 700);
    let x = inst.bone_transform(SlotId(0), &Transform::IDENTITY).unwrap().x;
    approx(x, 20.0, 1e-3);

    for _ in 0..50 {
        inst.advance(37);
        assert!(inst.time() >= 400, "time {} re-entered the intro", inst.time());
    }
}

#[test]
fn ping_pong_reflects_and_never_wraps() {
    let doc = stick_figure();
    let x_at = |t: u32| {
        frame_at(&doc, "bounce", t, &Transform::IDENTITY)
            .bone(SlotId(0))
            .map(|b| b.transform.x)
            .unwrap()
    };
    approx(x_at(250), 50.0, 1e-3);
    approx(x_at(500), 100.0, 1e-3);
    approx(x_at(750), 50.0, 1e-3);
    approx(x_at(1000), 0.0, 1e-3);
}

fn two_bone_doc(parent: Transform, child: Transform) -> Arc<Document> {
    let mut key = MainlineKey::default();
    key.bones.insert(
        SlotId(0),
        BoneSlot::Literal(LiteralBone {
            parent: None,
            pose: BonePose {
                transform: parent,
                ..BonePose::default()
            },
        }),
    );
    key.bones.insert(
        SlotId(1),
        BoneSlot::Literal(LiteralBone {
            parent: Some(SlotId(0)),
            pose: BonePose {
                transform: child,
                ..BonePose::default()
            },
        }),
    );
    let anim = Animation {
        length: 100,
        mainline: KeyTrack::new(vec![key]),
        ..Animation::default()
    };
    let doc = Document::new(
        [],
        [Entity {
            animations: BTreeMap::from([(anim.id, anim)]),
            ..Entity::default()
        }],
    );
    doc.validate().expect("two-bone document is well formed");
    Arc::new(doc)
}

#[test]
fn child_bone_rotates_then_scales_then_translates() {
    let doc = two_bone_doc(
        Transform::new(0.0, 0.0, 90.0, 2.0, 1.0),
        Transform::from_position(1.0, 0.0),
    );
    let mut inst = doc.create_instance(EntityId(0)).unwrap();
    inst.select(AnimId(0)).unwrap();
    let child = inst
        .bone_transform(SlotId(1), &Transform::IDENTITY)
        .unwrap();
    approx(child.x, 0.0, 1e-4);
    approx(child.y, 2.0, 1e-4);

    // Same relation holds relative to a moved parent origin.
    let origin = Transform::from_position(10.0, 20.0);
    let child = inst.bone_transform(SlotId(1), &origin).unwrap();
    approx(child.x, 10.0, 1e-4);
    approx(child.y, 22.0, 1e-4);
}

#[test]
fn repeated_queries_hit_the_cache() {
    let doc = stick_figure();
    let mut inst = doc.create_instance(EntityId(0)).unwrap();
    inst.select(AnimId(0)).unwrap();
    inst.advance(120);
    let base = Transform::from_position(1.0, 2.0);

    let first = inst.transforms(&base).clone();
    let second = inst.transforms(&base).clone();
    assert_eq!(first, second);
    assert_eq!(inst.recompute_count(), 1);

    inst.advance(0);
    inst.transforms(&base);
    assert_eq!(inst.recompute_count(), 1);

    inst.advance(16);
    inst.transforms(&base);
    assert_eq!(inst.recompute_count(), 2);

    inst.transforms(&Transform::from_position(1.0, 2.5));
    assert_eq!(inst.recompute_count(), 3);

    inst.select(AnimId(0)).unwrap();
    inst.seek(136).unwrap();
    inst.transforms(&base);
    assert_eq!(inst.recompute_count(), 4);
}

#[test]
fn placements_list_bones_then_objects() {
    let doc = stick_figure();
    let frame = frame_at(&doc, "wave", 0, &Transform::IDENTITY);
    let kinds: Vec<_> = frame.placements().map(|p| (p.kind, p.slot.0)).collect();
    use scml_animation_core::SlotKind::{Bone, Object};
    assert_eq!(
        kinds,
        vec![(Bone, 0), (Bone, 1), (Object, 0), (Object, 2), (Object, 1)]
    );
}
