use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    documents: HashMap<String, DocumentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentEntry {
    Path(String),
    Detailed {
        document: String,
        #[serde(default)]
        images: Option<String>,
    },
}

impl DocumentEntry {
    fn document(&self) -> &str {
        match self {
            DocumentEntry::Path(path) => path,
            DocumentEntry::Detailed { document, .. } => document,
        }
    }

    fn images(&self) -> Option<&str> {
        match self {
            DocumentEntry::Path(_) => None,
            DocumentEntry::Detailed { images, .. } => images.as_deref(),
        }
    }
}

/// One row of an image dimension table fixture.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ImageSize {
    pub folder: u32,
    pub file: u32,
    pub width: u32,
    pub height: u32,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod documents {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.documents.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Raw SCON text of a named document fixture.
    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.documents, "document", name)?;
        read_to_string(entry.document())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.documents, "document", name)?;
        super::load_json(entry.document())
    }

    /// Image dimension table paired with a document, if the manifest lists one.
    pub fn image_sizes(name: &str) -> Result<Vec<ImageSize>> {
        let entry = lookup(&MANIFEST.documents, "document", name)?;
        match entry.images() {
            Some(rel) => super::load_json(rel),
            None => Ok(Vec::new()),
        }
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.documents, "document", name)?;
        Ok(resolve_path(entry.document()))
    }
}
