//! Hierarchy composition: local poses to world-space placements.
//!
//! Bones are composed in dependency order (every parent before its children),
//! starting from the caller's base transform. Objects are leaves composed onto
//! their parent bone and then sorted for drawing by z-index.

use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::error::{ResolveWarning, SlotKind};
use crate::frame::{Frame, PlacedBone, PlacedObject};
use crate::ids::SlotId;
use crate::resolve::ResolvedKey;
use crate::transform::Transform;

/// Result of ordering a bone set by parent links.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyOrder {
    /// Every bone, parents first. Bones whose parent is absent from the set
    /// count as roots, and so do bones on a parent cycle; their descendants
    /// follow them as usual.
    pub order: Vec<SlotId>,
    /// Bones on a parent cycle, in id order.
    pub cyclic: Vec<SlotId>,
}

/// Order `(bone, parent)` pairs so parents precede children. Ties resolve by
/// slot id so the order is deterministic.
pub fn dependency_order(
    bones: impl IntoIterator<Item = (SlotId, Option<SlotId>)>,
) -> DependencyOrder {
    let mut nodes: Vec<(SlotId, Option<SlotId>)> = bones.into_iter().collect();
    nodes.sort_by_key(|(id, _)| *id);

    let mut indeg: HashMap<SlotId, usize> = nodes.iter().map(|(id, _)| (*id, 0)).collect();
    let mut children: HashMap<SlotId, Vec<SlotId>> = HashMap::new();
    let mut parent_of: HashMap<SlotId, SlotId> = HashMap::new();
    for (id, parent) in &nodes {
        if let Some(p) = parent {
            if indeg.contains_key(p) {
                children.entry(*p).or_default().push(*id);
                parent_of.insert(*id, *p);
                *indeg.entry(*id).or_default() += 1;
            }
        }
    }

    let mut q: VecDeque<SlotId> = nodes
        .iter()
        .filter(|(id, _)| indeg.get(id) == Some(&0))
        .map(|(id, _)| *id)
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    drain(&mut q, &children, &mut indeg, &[], &mut order);

    // Whatever is left sits on a cycle or below one.
    let left: Vec<SlotId> = nodes
        .iter()
        .map(|(id, _)| *id)
        .filter(|id| indeg.get(id).is_some_and(|d| *d > 0))
        .collect();
    let cyclic: Vec<SlotId> = left
        .iter()
        .copied()
        .filter(|&id| on_cycle(id, &parent_of, left.len()))
        .collect();

    for id in &cyclic {
        indeg.insert(*id, 0);
        q.push_back(*id);
    }
    drain(&mut q, &children, &mut indeg, &cyclic, &mut order);

    DependencyOrder { order, cyclic }
}

fn drain(
    q: &mut VecDeque<SlotId>,
    children: &HashMap<SlotId, Vec<SlotId>>,
    indeg: &mut HashMap<SlotId, usize>,
    roots: &[SlotId],
    order: &mut Vec<SlotId>,
) {
    while let Some(u) = q.pop_front() {
        order.push(u);
        let Some(vs) = children.get(&u) else {
            continue;
        };
        for v in vs {
            if roots.contains(v) {
                continue;
            }
            if let Some(d) = indeg.get_mut(v) {
                *d -= 1;
                if *d == 0 {
                    q.push_back(*v);
                }
            }
        }
    }
}

/// Whether walking up from `id` leads back to `id` within `limit` steps.
fn on_cycle(id: SlotId, parent_of: &HashMap<SlotId, SlotId>, limit: usize) -> bool {
    let mut cur = id;
    for _ in 0..limit {
        match parent_of.get(&cur) {
            Some(&p) if p == id => return true,
            Some(&p) => cur = p,
            None => return false,
        }
    }
    false
}

/// Compose resolved local poses onto `base`, appending placements and
/// warnings to `frame`.
pub fn compose_key(resolved: ResolvedKey, base: &Transform, frame: &mut Frame) {
    let deps = dependency_order(resolved.bones.iter().map(|b| (b.slot, b.parent)));
    let by_slot: HashMap<SlotId, usize> = resolved
        .bones
        .iter()
        .enumerate()
        .map(|(i, b)| (b.slot, i))
        .collect();
    let mut world: HashMap<SlotId, Transform> = HashMap::with_capacity(by_slot.len());

    frame.bones.reserve(resolved.bones.len());
    for slot in &deps.order {
        let Some(&i) = by_slot.get(slot) else {
            continue;
        };
        let bone = &resolved.bones[i];
        let parent = if deps.cyclic.contains(slot) {
            frame
                .warnings
                .push(ResolveWarning::ParentCycle { slot: bone.slot });
            *base
        } else {
            parent_transform(SlotKind::Bone, bone.slot, bone.parent, &world, base, frame)
        };
        let transform = Transform::compose(&parent, &bone.pose.transform);
        world.insert(bone.slot, transform);
        frame.bones.push(PlacedBone {
            slot: bone.slot,
            parent: bone.parent,
            transform,
            color: bone.pose.color,
        });
    }

    frame.objects.reserve(resolved.objects.len());
    for object in resolved.objects {
        let parent = parent_transform(
            SlotKind::Object,
            object.slot,
            object.parent,
            &world,
            base,
            frame,
        );
        let pose = object.pose;
        frame.objects.push(PlacedObject {
            slot: object.slot,
            parent: object.parent,
            z_index: object.z_index,
            transform: Transform::compose(&parent, &pose.transform),
            color: pose.color,
            image: pose.image,
            pivot: pose.pivot,
            size: pose.size,
            blend_mode: pose.blend_mode,
            name: pose.name,
            sub_animation: pose.sub_animation,
        });
    }
    // Stable: equal z keeps slot id order.
    frame.objects.sort_by_key(|o| o.z_index);
}

fn parent_transform(
    kind: SlotKind,
    slot: SlotId,
    parent: Option<SlotId>,
    world: &HashMap<SlotId, Transform>,
    base: &Transform,
    frame: &mut Frame,
) -> Transform {
    let Some(p) = parent else {
        return *base;
    };
    match world.get(&p) {
        Some(t) => *t,
        None => {
            frame.warnings.push(ResolveWarning::MissingParent {
                kind,
                slot,
                parent: p,
            });
            *base
        }
    }
}
