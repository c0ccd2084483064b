//! Collaborator seams: image lookup and sprite drawing.
//!
//! The core never touches pixels or files. Hosts plug in an [`ImageStore`]
//! for image dimensions and a [`Renderer`] that receives one [`Sprite`] per
//! visible object, in draw order.

use serde::{Deserialize, Serialize};

use crate::data::{BlendMode, Document, ImageRef};
use crate::ids::{FileId, FolderId, SlotId};
use crate::transform::{Color, Transform};

/// Image dimension lookup.
pub trait ImageStore {
    /// Width and height in pixels, or `(0, 0)` when the image is unknown.
    fn image_dimensions(&self, folder: FolderId, file: FileId) -> (u32, u32);

    /// Load one image from `path`. Stores without loading support keep the
    /// default, which reports failure.
    fn load_image(&mut self, _folder: FolderId, _file: FileId, _path: &str) -> bool {
        false
    }

    /// Load every file the document declares. Returns the number loaded.
    fn load_document(&mut self, doc: &Document) -> usize {
        let mut loaded = 0;
        for folder in doc.folders.values() {
            for file in folder.files.values() {
                if self.load_image(folder.id, file.id, &file.name) {
                    loaded += 1;
                } else {
                    log::warn!(
                        "image store failed to load folder {} file {} ('{}')",
                        folder.id,
                        file.id,
                        file.name
                    );
                }
            }
        }
        loaded
    }
}

/// Fixed table of image sizes, for hosts that know dimensions up front and
/// for tests.
#[derive(Clone, Debug, Default)]
pub struct StaticImageStore {
    sizes: hashbrown::HashMap<ImageRef, (u32, u32)>,
}

impl StaticImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image: ImageRef, width: u32, height: u32) {
        self.sizes.insert(image, (width, height));
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl FromIterator<(ImageRef, (u32, u32))> for StaticImageStore {
    fn from_iter<I: IntoIterator<Item = (ImageRef, (u32, u32))>>(iter: I) -> Self {
        Self {
            sizes: iter.into_iter().collect(),
        }
    }
}

impl ImageStore for StaticImageStore {
    fn image_dimensions(&self, folder: FolderId, file: FileId) -> (u32, u32) {
        self.sizes
            .get(&ImageRef { folder, file })
            .copied()
            .unwrap_or((0, 0))
    }
}

/// One object ready to draw, in world space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub slot: SlotId,
    pub image: ImageRef,
    pub transform: Transform,
    pub color: Color,
    /// Normalised pivot, (0, 0) bottom-left.
    pub pivot: [f32; 2],
    /// Size in pixels.
    pub size: [f32; 2],
    pub blend_mode: BlendMode,
    pub z_index: i32,
}

/// Sprite sink.
pub trait Renderer {
    /// Convert a placement from the renderer's coordinate system into the
    /// format's (+y up, counter-clockwise degrees). Identity by default.
    fn to_scml_coords(&self, x: f32, y: f32, angle: f32) -> (f32, f32, f32) {
        (x, y, angle)
    }

    fn draw_sprite(&mut self, sprite: &Sprite);
}

/// Per-instance resolved image facts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ImageInfo {
    pub size: [f32; 2],
    pub pivot: [f32; 2],
}

impl ImageInfo {
    /// Size from the store, falling back to the document's declared size.
    /// Pivot from the document file, falling back to `default_pivot`.
    pub(crate) fn lookup(
        doc: &Document,
        store: &dyn ImageStore,
        image: ImageRef,
        default_pivot: [f32; 2],
    ) -> Self {
        let file = doc.file(image);
        let size = match store.image_dimensions(image.folder, image.file) {
            (0, 0) => file.map_or([0.0, 0.0], |f| [f.width as f32, f.height as f32]),
            (w, h) => [w as f32, h as f32],
        };
        let pivot = file.map_or(default_pivot, |f| [f.pivot_x, f.pivot_y]);
        Self { size, pivot }
    }
}
