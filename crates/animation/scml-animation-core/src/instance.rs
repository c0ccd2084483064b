//! Playback instances: independent cursors over a shared document.
//!
//! An [`Instance`] never copies animation data. It holds an `Arc` to the
//! immutable [`Document`] plus its own cursor (animation, mainline key,
//! elapsed time), a single-entry frame cache, the active character map and a
//! per-instance image info cache filled on demand during drawing.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, TransformCache};
use crate::compose::compose_key;
use crate::config::Config;
use crate::data::{Animation, Document, Entity, ImageRef, LoopMode};
use crate::error::{LookupError, ResolveWarning};
use crate::frame::Frame;
use crate::ids::{AnimId, CharacterMapId, EntityId, KeyId, SlotId};
use crate::render::{ImageInfo, ImageStore, Renderer, Sprite};
use crate::resolve::resolve_key;
use crate::transform::Transform;

static EMPTY_FRAME: Frame = Frame {
    bones: Vec::new(),
    objects: Vec::new(),
    warnings: Vec::new(),
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Initial state, and after [`Instance::stop`]. `advance` is a no-op.
    #[default]
    Stopped,
    Playing,
}

impl Document {
    /// New instance of `entity` with the default [`Config`].
    pub fn create_instance(self: &Arc<Self>, entity: EntityId) -> Result<Instance, LookupError> {
        self.create_instance_with_config(entity, Config::default())
    }

    pub fn create_instance_by_name(self: &Arc<Self>, name: &str) -> Result<Instance, LookupError> {
        let entity = self
            .entity_by_name(name)
            .ok_or_else(|| LookupError::EntityNotFound(name.to_string()))?;
        self.create_instance(entity.id)
    }

    pub fn create_instance_with_config(
        self: &Arc<Self>,
        entity: EntityId,
        cfg: Config,
    ) -> Result<Instance, LookupError> {
        if self.entity(entity).is_none() {
            return Err(LookupError::EntityNotFound(entity.to_string()));
        }
        Ok(Instance {
            doc: Arc::clone(self),
            entity,
            cfg,
            animation: None,
            key: None,
            clock: 0,
            time: 0,
            state: PlaybackState::Stopped,
            character_map: None,
            cache: TransformCache::new(),
            images: HashMap::new(),
        })
    }
}

/// One playing copy of an entity.
#[derive(Clone, Debug)]
pub struct Instance {
    doc: Arc<Document>,
    entity: EntityId,
    cfg: Config,
    animation: Option<AnimId>,
    key: Option<KeyId>,
    /// Milliseconds since the animation was selected (or sought).
    clock: u64,
    /// `clock` mapped into the animation by its looping mode.
    time: u32,
    state: PlaybackState,
    character_map: Option<CharacterMapId>,
    cache: TransformCache,
    images: HashMap<ImageRef, ImageInfo>,
}

impl Instance {
    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn animation(&self) -> Option<AnimId> {
        self.animation
    }

    /// Current mainline key; `None` before selection or for an empty mainline.
    pub fn key(&self) -> Option<KeyId> {
        self.key
    }

    /// Current animation time in milliseconds.
    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn character_map(&self) -> Option<CharacterMapId> {
        self.character_map
    }

    pub fn animation_count(&self) -> usize {
        self.doc.animation_count(self.entity)
    }

    /// Bones present in the current mainline key.
    pub fn bone_count(&self) -> usize {
        self.current_key_counts().0
    }

    /// Objects present in the current mainline key.
    pub fn object_count(&self) -> usize {
        self.current_key_counts().1
    }

    fn current_key_counts(&self) -> (usize, usize) {
        let Some((anim, key)) = self.current_animation().zip(self.key) else {
            return (0, 0);
        };
        anim.mainline
            .get(key)
            .map_or((0, 0), |k| (k.bones.len(), k.objects.len()))
    }

    fn entity_data(&self) -> Option<&Entity> {
        self.doc.entity(self.entity)
    }

    fn current_animation(&self) -> Option<&Animation> {
        self.entity_data()?.animation(self.animation?)
    }

    /// Switch to `animation`: elapsed time restarts at 0, the cursor moves to
    /// the first mainline key and playback starts.
    pub fn select(&mut self, animation: AnimId) -> Result<(), LookupError> {
        let first = self
            .entity_data()
            .and_then(|e| e.animation(animation))
            .ok_or_else(|| LookupError::AnimationNotFound(animation.to_string()))?
            .mainline
            .first()
            .map(|k| k.id);
        self.animation = Some(animation);
        self.key = first;
        self.clock = 0;
        self.time = 0;
        self.state = PlaybackState::Playing;
        self.cache.invalidate();
        Ok(())
    }

    pub fn select_by_name(&mut self, name: &str) -> Result<(), LookupError> {
        let id = self
            .entity_data()
            .and_then(|e| e.animation_by_name(name))
            .map(|a| a.id)
            .ok_or_else(|| LookupError::AnimationNotFound(name.to_string()))?;
        self.select(id)
    }

    /// Move the clock forward by `dt_ms`. No-op while stopped or before an
    /// animation is selected. Transforms are recomputed lazily on query.
    pub fn advance(&mut self, dt_ms: u32) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let clock = self.clock.saturating_add(u64::from(dt_ms));
        self.set_clock(clock);
    }

    /// Jump to `time_ms` of the current animation, as if that much time had
    /// elapsed since selection. Works while stopped.
    pub fn seek(&mut self, time_ms: u32) -> Result<(), LookupError> {
        if self.animation.is_none() {
            return Err(LookupError::NoAnimation);
        }
        self.set_clock(u64::from(time_ms));
        Ok(())
    }

    fn set_clock(&mut self, clock: u64) {
        let doc = Arc::clone(&self.doc);
        let Some(anim) = doc
            .entity(self.entity)
            .and_then(|e| e.animation(self.animation?))
        else {
            return;
        };
        // Non-looping clocks stop at the last frame so later advances are no-ops.
        self.clock = match anim.looping {
            LoopMode::NoLoop => clock.min(u64::from(anim.length.saturating_sub(1))),
            _ => clock,
        };
        self.time = anim.normalize_time(self.clock);
        self.key = anim.mainline.at_time(self.time).map(|k| k.id);
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    /// Resume after [`Instance::stop`]. Has no effect before an animation is
    /// selected.
    pub fn play(&mut self) {
        if self.animation.is_some() {
            self.state = PlaybackState::Playing;
        }
    }

    /// Apply an alternate skin, or clear it with `None`.
    pub fn set_character_map(&mut self, map: Option<CharacterMapId>) -> Result<(), LookupError> {
        if let Some(id) = map {
            let known = self
                .entity_data()
                .is_some_and(|e| e.character_maps.contains_key(&id));
            if !known {
                return Err(LookupError::CharacterMapNotFound(id));
            }
        }
        if self.character_map != map {
            self.character_map = map;
            self.cache.invalidate();
        }
        Ok(())
    }

    /// World-space placements for the current instant with the entity placed
    /// at `base`. Served from the cache while (animation, key, time, base)
    /// are unchanged. Empty before an animation is selected.
    pub fn transforms(&mut self, base: &Transform) -> &Frame {
        if self.refresh(base) {
            self.cache.frame()
        } else {
            &EMPTY_FRAME
        }
    }

    /// Bring the cache up to date for `base`. Returns false when there is
    /// nothing to resolve.
    fn refresh(&mut self, base: &Transform) -> bool {
        let doc = Arc::clone(&self.doc);
        let Some(entity) = doc.entity(self.entity) else {
            return false;
        };
        let Some(anim) = self.animation.and_then(|id| entity.animation(id)) else {
            return false;
        };
        let Some(key) = self.key.filter(|k| anim.mainline.get(*k).is_some()) else {
            return false;
        };

        let cache_key = CacheKey {
            entity: self.entity,
            animation: anim.id,
            key,
            time: self.time,
            base: *base,
        };
        if self.cfg.cache_transforms && !self.cache.should_rebuild(&cache_key) {
            log::trace!("frame cache hit: {cache_key:?}");
            return true;
        }

        let time = self.time;
        let log_warnings = self.cfg.log_warnings;
        let map = self
            .character_map
            .and_then(|id| entity.character_maps.get(&id));
        self.cache.rebuild(cache_key, |frame| {
            let Some(mainline_key) = anim.mainline.get(key) else {
                return;
            };
            let resolved = resolve_key(anim, mainline_key, time, &mut frame.warnings);
            compose_key(resolved, base, frame);
            if let Some(map) = map {
                for object in &mut frame.objects {
                    object.image = object.image.and_then(|img| map.apply(img));
                }
            }
            if log_warnings {
                for w in &frame.warnings {
                    log::warn!("entity {} animation {}: {w}", entity.id, anim.id);
                }
            }
        });
        log::debug!(
            "frame rebuilt: entity {} animation {} key {} time {} ({} rebuilds)",
            self.entity,
            anim.id,
            key,
            time,
            self.cache.rebuilds()
        );
        true
    }

    pub fn bone_transform(&mut self, slot: SlotId, base: &Transform) -> Option<Transform> {
        self.transforms(base).bone(slot).map(|b| b.transform)
    }

    pub fn object_transform(&mut self, slot: SlotId, base: &Transform) -> Option<Transform> {
        self.transforms(base).object(slot).map(|o| o.transform)
    }

    /// Number of frames computed so far (cache misses plus uncached queries).
    pub fn recompute_count(&self) -> u64 {
        self.cache.rebuilds()
    }

    /// Warnings raised while building the last frame.
    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.cache.frame().warnings
    }

    /// Draw every visible image object in z order. `placement` is given in
    /// the renderer's coordinates and converted through
    /// [`Renderer::to_scml_coords`]. Returns the number of sprites drawn.
    pub fn draw(
        &mut self,
        renderer: &mut dyn Renderer,
        store: &dyn ImageStore,
        placement: &Transform,
    ) -> usize {
        let (x, y, angle) = renderer.to_scml_coords(placement.x, placement.y, placement.angle);
        let base = Transform::new(x, y, angle, placement.scale_x, placement.scale_y);
        if !self.refresh(&base) {
            return 0;
        }

        let doc = &self.doc;
        let default_pivot = self.cfg.default_pivot;
        let mut drawn = 0;
        for object in &self.cache.frame().objects {
            let Some(image) = object.image else {
                continue;
            };
            let info = *self
                .images
                .entry(image)
                .or_insert_with(|| ImageInfo::lookup(doc, store, image, default_pivot));
            renderer.draw_sprite(&Sprite {
                slot: object.slot,
                image,
                transform: object.transform,
                color: object.color,
                pivot: object.pivot.unwrap_or(info.pivot),
                size: object.size.unwrap_or(info.size),
                blend_mode: object.blend_mode,
                z_index: object.z_index,
            });
            drawn += 1;
        }
        drawn
    }
}
