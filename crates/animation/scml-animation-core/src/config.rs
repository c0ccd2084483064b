//! Per-instance configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a playback instance.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reuse the last computed frame while (animation, key, time, placement)
    /// are unchanged. Disabling forces a full resolve on every query.
    pub cache_transforms: bool,

    /// Emit every resolution warning through `log::warn!` when a frame is rebuilt.
    pub log_warnings: bool,

    /// Pivot used when neither the object nor the document file declares one.
    /// The format's convention is the image's top-left corner.
    pub default_pivot: [f32; 2],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_transforms: true,
            log_warnings: true,
            default_pivot: [0.0, 1.0],
        }
    }
}
