use std::collections::BTreeMap;

use serde::Deserialize;

use crate::data::{
    Animation, BlendMode, BonePose, BoneSlot, CharacterMap, Document, DocumentInfo, Entity, File,
    FileMap, Folder, ImageRef, KeyPose, KeyTrack, LiteralBone, LiteralObject, LoopMode,
    MainlineKey, ObjectPose, ObjectSlot, SlotRef, SubAnimation, Timeline, TimelineKey,
    TimelineKind,
};
use crate::error::{DocumentError, Location};
use crate::ids::{
    optional_id, AnimId, CharacterMapId, EntityId, FileId, FolderId, KeyId, SlotId, TimelineId,
};
use crate::interp::Curve;
use crate::transform::{Color, Spin, Transform};

/// Public API: parse a document in the SCON (JSON) encoding into the canonical
/// [`Document`] model and validate it.
///
/// Notes:
/// - Ids are kept as the document assigns them; `-1` parents mean "root".
/// - Lengths, times and `loop_to` are milliseconds and must be non-negative.
/// - Keys are reordered by (time, id) at load; ids must be unique per map.
/// - Unknown curve names and timeline `object_type`s are load errors.
pub fn parse_scon_json(s: &str) -> Result<Document, DocumentError> {
    let raw: RawDocument = serde_json::from_str(s)?;
    let doc = convert_document(raw)?;
    doc.validate()?;
    log::debug!(
        "loaded document: {} folders, {} entities, {} animations",
        doc.folders.len(),
        doc.entities.len(),
        doc.entities
            .values()
            .map(|e| e.animations.len())
            .sum::<usize>()
    );
    Ok(doc)
}

impl Document {
    /// Parse and validate a SCON (JSON) document. See [`parse_scon_json`].
    pub fn from_scon_json(s: &str) -> Result<Self, DocumentError> {
        parse_scon_json(s)
    }
}

fn require_id(raw: i64, field: &'static str, scope: &str) -> Result<u32, DocumentError> {
    u32::try_from(raw).map_err(|_| DocumentError::InvalidField {
        field,
        scope: scope.to_string(),
        reason: format!("{raw} is not a valid id"),
    })
}

fn require_ms(raw: i64, field: &'static str, scope: &str) -> Result<u32, DocumentError> {
    u32::try_from(raw).map_err(|_| DocumentError::InvalidField {
        field,
        scope: scope.to_string(),
        reason: format!("{raw} is not a non-negative millisecond count"),
    })
}

fn insert_unique<K: Ord + Copy + Into<u32>, V>(
    map: &mut BTreeMap<K, V>,
    id: K,
    value: V,
    what: &'static str,
    scope: &str,
) -> Result<(), DocumentError> {
    if map.insert(id, value).is_some() {
        return Err(DocumentError::DuplicateId {
            what,
            id: id.into(),
            scope: scope.to_string(),
        });
    }
    Ok(())
}

fn convert_document(raw: RawDocument) -> Result<Document, DocumentError> {
    let mut folders = BTreeMap::new();
    for rf in raw.folder {
        let folder = convert_folder(rf)?;
        insert_unique(&mut folders, folder.id, folder, "folder", "document")?;
    }
    let mut entities = BTreeMap::new();
    for re in raw.entity {
        let entity = convert_entity(re)?;
        insert_unique(&mut entities, entity.id, entity, "entity", "document")?;
    }
    Ok(Document {
        version: raw.scon_version,
        generator: raw.generator,
        generator_version: raw.generator_version,
        pixel_art_mode: raw.pixel_mode.unwrap_or(0) != 0,
        info: raw.document_info,
        folders,
        entities,
        duplicates: Vec::new(),
    })
}

fn convert_folder(rf: RawFolder) -> Result<Folder, DocumentError> {
    let id = FolderId(require_id(rf.id, "folder id", "document")?);
    let scope = format!("folder {id}");
    let mut files = BTreeMap::new();
    for file in rf.file {
        let fid = FileId(require_id(file.id, "file id", &scope)?);
        let f = File {
            id: fid,
            name: file.name,
            width: u32::try_from(file.width).unwrap_or(0),
            height: u32::try_from(file.height).unwrap_or(0),
            pivot_x: file.pivot_x,
            pivot_y: file.pivot_y,
        };
        insert_unique(&mut files, fid, f, "file", &scope)?;
    }
    Ok(Folder {
        id,
        name: rf.name,
        files,
    })
}

fn convert_entity(re: RawEntity) -> Result<Entity, DocumentError> {
    let id = EntityId(require_id(re.id, "entity id", "document")?);
    let scope = format!("entity {id}");

    let mut character_maps = BTreeMap::new();
    for rc in re.character_map {
        let cid = CharacterMapId(require_id(rc.id, "character map id", &scope)?);
        let maps = rc
            .map
            .into_iter()
            .map(|m| {
                let from = image_ref(Some(m.folder), Some(m.file)).ok_or_else(|| {
                    DocumentError::InvalidField {
                        field: "character map source",
                        scope: format!("{scope} character map {cid}"),
                        reason: format!("({}, {}) is not an image", m.folder, m.file),
                    }
                })?;
                Ok(FileMap {
                    from,
                    to: image_ref(m.target_folder, m.target_file),
                })
            })
            .collect::<Result<Vec<_>, DocumentError>>()?;
        let map = CharacterMap {
            id: cid,
            name: rc.name,
            maps,
        };
        insert_unique(&mut character_maps, cid, map, "character map", &scope)?;
    }

    let mut animations = BTreeMap::new();
    for ra in re.animation {
        let anim = convert_animation(id, ra)?;
        insert_unique(&mut animations, anim.id, anim, "animation", &scope)?;
    }

    Ok(Entity {
        id,
        name: re.name,
        animations,
        character_maps,
    })
}

fn convert_animation(entity: EntityId, ra: RawAnimation) -> Result<Animation, DocumentError> {
    let id = AnimId(require_id(ra.id, "animation id", &format!("entity {entity}"))?);
    let at = Location {
        entity,
        animation: id,
    };
    let scope = at.to_string();
    let length = require_ms(ra.length, "length", &scope)?;
    let loop_to = require_ms(ra.loop_to, "loop_to", &scope)?;
    let looping = loop_mode(ra.looping, &scope)?;

    let mut timelines = BTreeMap::new();
    for rt in ra.timeline {
        let timeline = convert_timeline(at, rt)?;
        insert_unique(&mut timelines, timeline.id, timeline, "timeline", &scope)?;
    }

    let mut mainline = BTreeMap::new();
    for rk in ra.mainline.key {
        let key = convert_mainline_key(&scope, rk)?;
        insert_unique(&mut mainline, key.id, key, "mainline key", &scope)?;
    }

    Ok(Animation {
        id,
        name: ra.name,
        length,
        looping,
        loop_to,
        mainline: KeyTrack::new(mainline.into_values()),
        timelines,
    })
}

fn convert_mainline_key(anim_scope: &str, rk: RawMainlineKey) -> Result<MainlineKey, DocumentError> {
    let id = KeyId(require_id(rk.id, "mainline key id", anim_scope)?);
    let scope = format!("{anim_scope} mainline key {id}");
    let time = require_ms(rk.time, "time", &scope)?;

    let mut bones = BTreeMap::new();
    for b in rk.bone {
        let slot = SlotId(require_id(b.id, "bone id", &scope)?);
        let bone = BoneSlot::Literal(LiteralBone {
            parent: optional_id(b.parent),
            pose: b.pose.into(),
        });
        insert_unique(&mut bones, slot, bone, "bone", &scope)?;
    }
    for r in rk.bone_ref {
        let (slot, r) = convert_ref(&scope, r)?;
        insert_unique(&mut bones, slot, BoneSlot::Ref(r), "bone", &scope)?;
    }

    let mut objects = BTreeMap::new();
    for o in rk.object {
        let slot = SlotId(require_id(o.id, "object id", &scope)?);
        let object = ObjectSlot::Literal(LiteralObject {
            parent: optional_id(o.parent),
            z_index: o.z_index,
            pose: o.pose.into(),
        });
        insert_unique(&mut objects, slot, object, "object", &scope)?;
    }
    for r in rk.object_ref {
        let (slot, r) = convert_ref(&scope, r)?;
        insert_unique(&mut objects, slot, ObjectSlot::Ref(r), "object", &scope)?;
    }

    Ok(MainlineKey {
        id,
        time,
        bones,
        objects,
    })
}

fn convert_ref(scope: &str, r: RawRef) -> Result<(SlotId, SlotRef), DocumentError> {
    let slot = SlotId(require_id(r.id, "slot id", scope)?);
    Ok((
        slot,
        SlotRef {
            parent: optional_id(r.parent),
            timeline: TimelineId(require_id(r.timeline, "timeline", scope)?),
            key: KeyId(require_id(r.key, "key", scope)?),
            z_index: r.z_index,
        },
    ))
}

fn convert_timeline(at: Location, rt: RawTimeline) -> Result<Timeline, DocumentError> {
    let anim_scope = at.to_string();
    let id = TimelineId(require_id(rt.id, "timeline id", &anim_scope)?);
    let scope = format!("{anim_scope} timeline {id}");
    let kind = match rt.object_type.as_deref() {
        None => TimelineKind::default(),
        Some(name) => TimelineKind::from_name(name).ok_or_else(|| DocumentError::InvalidField {
            field: "object_type",
            scope: scope.clone(),
            reason: format!("unknown object type '{name}'"),
        })?,
    };

    let mut keys = BTreeMap::new();
    for rk in rt.key {
        let kid = KeyId(require_id(rk.id, "key id", &scope)?);
        let time = require_ms(rk.time, "time", &scope)?;
        let curve = Curve::from_parts(rk.curve_type.as_deref(), rk.c1, rk.c2, rk.c3, rk.c4)
            .ok_or_else(|| DocumentError::UnknownCurve {
                at,
                timeline: id,
                timeline_key: kid,
                name: rk.curve_type.clone().unwrap_or_default(),
            })?;
        let pose = match (rk.bone, rk.object) {
            (Some(b), _) => KeyPose::Bone(b.into()),
            (None, Some(o)) => KeyPose::Object(o.into()),
            (None, None) => {
                return Err(DocumentError::InvalidField {
                    field: "pose",
                    scope: format!("{scope} key {kid}"),
                    reason: "key carries neither a bone nor an object".into(),
                })
            }
        };
        let key = TimelineKey {
            id: kid,
            time,
            curve,
            spin: Spin::from_document(rk.spin),
            pose,
        };
        insert_unique(&mut keys, kid, key, "timeline key", &scope)?;
    }

    Ok(Timeline {
        id,
        name: rt.name,
        kind,
        keys: KeyTrack::new(keys.into_values()),
    })
}

fn image_ref(folder: Option<i64>, file: Option<i64>) -> Option<ImageRef> {
    Some(ImageRef {
        folder: optional_id(folder?)?,
        file: optional_id(file?)?,
    })
}

impl From<RawBonePose> for BonePose {
    fn from(b: RawBonePose) -> Self {
        BonePose {
            transform: Transform::new(b.x, b.y, b.angle, b.scale_x, b.scale_y),
            color: Color::new(b.r, b.g, b.b, b.a),
        }
    }
}

impl From<RawObjectPose> for ObjectPose {
    fn from(o: RawObjectPose) -> Self {
        let pivot = match (o.pivot_x, o.pivot_y) {
            (None, None) => None,
            (x, y) => Some([x.unwrap_or(0.0), y.unwrap_or(1.0)]),
        };
        let size = o.w.zip(o.h).map(|(w, h)| [w, h]);
        let sub_animation = optional_id(o.animation.unwrap_or(-1)).map(|animation| SubAnimation {
            animation,
            t: o.t,
        });
        ObjectPose {
            transform: Transform::new(o.x, o.y, o.angle, o.scale_x, o.scale_y),
            color: Color::new(o.r, o.g, o.b, o.a),
            image: image_ref(o.folder, o.file),
            pivot,
            size,
            blend_mode: o
                .blend_mode
                .as_deref()
                .map(BlendMode::from_name)
                .unwrap_or_default(),
            name: o.name,
            sub_animation,
        }
    }
}

fn loop_mode(l: RawLooping, scope: &str) -> Result<LoopMode, DocumentError> {
    let mode = match l {
        RawLooping::Flag(true) => LoopMode::Loop,
        RawLooping::Flag(false) => LoopMode::NoLoop,
        RawLooping::Name(name) => match name.as_str() {
            "true" => LoopMode::Loop,
            "false" => LoopMode::NoLoop,
            "ping_pong" | "pingpong" | "ping-pong" => LoopMode::PingPong,
            _ => {
                return Err(DocumentError::InvalidField {
                    field: "looping",
                    scope: scope.to_string(),
                    reason: format!("unknown looping mode '{name}'"),
                })
            }
        },
    };
    Ok(mode)
}

// ----- JSON schema (serde) -----

fn one() -> f32 {
    1.0
}

fn root() -> i64 {
    -1
}

fn ccw() -> i64 {
    1
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    scon_version: String,
    #[serde(default)]
    generator: String,
    #[serde(default)]
    generator_version: String,
    #[serde(default)]
    pixel_mode: Option<i64>,
    #[serde(default)]
    document_info: DocumentInfo,
    #[serde(default)]
    folder: Vec<RawFolder>,
    #[serde(default)]
    entity: Vec<RawEntity>,
}

#[derive(Deserialize)]
struct RawFolder {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    file: Vec<RawFile>,
}

#[derive(Deserialize)]
struct RawFile {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    width: i64,
    #[serde(default)]
    height: i64,
    #[serde(default)]
    pivot_x: f32,
    #[serde(default = "one")]
    pivot_y: f32,
}

#[derive(Deserialize)]
struct RawEntity {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    character_map: Vec<RawCharacterMap>,
    #[serde(default)]
    animation: Vec<RawAnimation>,
}

#[derive(Deserialize)]
struct RawCharacterMap {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    map: Vec<RawMap>,
}

#[derive(Deserialize)]
struct RawMap {
    folder: i64,
    file: i64,
    #[serde(default)]
    target_folder: Option<i64>,
    #[serde(default)]
    target_file: Option<i64>,
}

#[derive(Deserialize)]
struct RawAnimation {
    id: i64,
    #[serde(default)]
    name: String,
    length: i64,
    #[serde(default)]
    looping: RawLooping,
    #[serde(default)]
    loop_to: i64,
    #[serde(default)]
    mainline: RawMainline,
    #[serde(default)]
    timeline: Vec<RawTimeline>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLooping {
    Flag(bool),
    Name(String),
}

impl Default for RawLooping {
    fn default() -> Self {
        RawLooping::Flag(true)
    }
}

#[derive(Deserialize, Default)]
struct RawMainline {
    #[serde(default)]
    key: Vec<RawMainlineKey>,
}

#[derive(Deserialize)]
struct RawMainlineKey {
    id: i64,
    #[serde(default)]
    time: i64,
    #[serde(default)]
    bone: Vec<RawMainlineBone>,
    #[serde(default)]
    bone_ref: Vec<RawRef>,
    #[serde(default)]
    object: Vec<RawMainlineObject>,
    #[serde(default)]
    object_ref: Vec<RawRef>,
}

#[derive(Deserialize)]
struct RawMainlineBone {
    id: i64,
    #[serde(default = "root")]
    parent: i64,
    #[serde(flatten)]
    pose: RawBonePose,
}

#[derive(Deserialize)]
struct RawMainlineObject {
    id: i64,
    #[serde(default = "root")]
    parent: i64,
    #[serde(default)]
    z_index: i32,
    #[serde(flatten)]
    pose: RawObjectPose,
}

#[derive(Deserialize)]
struct RawRef {
    id: i64,
    #[serde(default = "root")]
    parent: i64,
    timeline: i64,
    key: i64,
    #[serde(default)]
    z_index: i32,
}

#[derive(Deserialize)]
struct RawTimeline {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    object_type: Option<String>,
    #[serde(default)]
    key: Vec<RawTimelineKey>,
}

#[derive(Deserialize)]
struct RawTimelineKey {
    id: i64,
    #[serde(default)]
    time: i64,
    #[serde(default = "ccw")]
    spin: i64,
    #[serde(default)]
    curve_type: Option<String>,
    #[serde(default)]
    c1: f32,
    #[serde(default)]
    c2: f32,
    #[serde(default)]
    c3: Option<f32>,
    #[serde(default)]
    c4: Option<f32>,
    #[serde(default)]
    bone: Option<RawBonePose>,
    #[serde(default)]
    object: Option<RawObjectPose>,
}

#[derive(Deserialize)]
struct RawBonePose {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    angle: f32,
    #[serde(default = "one")]
    scale_x: f32,
    #[serde(default = "one")]
    scale_y: f32,
    #[serde(default = "one")]
    r: f32,
    #[serde(default = "one")]
    g: f32,
    #[serde(default = "one")]
    b: f32,
    #[serde(default = "one")]
    a: f32,
}

#[derive(Deserialize)]
struct RawObjectPose {
    #[serde(default)]
    folder: Option<i64>,
    #[serde(default)]
    file: Option<i64>,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    angle: f32,
    #[serde(default = "one")]
    scale_x: f32,
    #[serde(default = "one")]
    scale_y: f32,
    #[serde(default)]
    pivot_x: Option<f32>,
    #[serde(default)]
    pivot_y: Option<f32>,
    #[serde(default)]
    w: Option<f32>,
    #[serde(default)]
    h: Option<f32>,
    #[serde(default = "one")]
    r: f32,
    #[serde(default = "one")]
    g: f32,
    #[serde(default = "one")]
    b: f32,
    #[serde(default = "one")]
    a: f32,
    #[serde(default)]
    blend_mode: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    animation: Option<i64>,
    #[serde(default)]
    t: f32,
}
