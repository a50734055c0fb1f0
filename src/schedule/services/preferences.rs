//! Display preferences mirrored through the shared settings table.

use serde::{Deserialize, Serialize};

/// Setting key under which display preferences are stored.
pub const DISPLAY_PREFERENCES_KEY: &str = "display_preferences";

/// Board layout preferences shared by every client of one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayPreferences {
    /// Width of one day column in pixels.
    pub column_width: u32,
    /// Base font size in points.
    pub font_size: u32,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            column_width: 40,
            font_size: 14,
        }
    }
}
