//! Render options, deserialized from the JSON option object callers send.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RenderError;

/// Smallest pixel cap honoured for `max-width` / `max-height`.
pub const MIN_MAX_DIMENSION: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RenderOptions {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub show_info_panels: bool,
    pub debug_bounds: bool,
    pub debug_placement: bool,
    pub debug_logistic: bool,
    pub debug_rail: bool,
    pub debug_inputs: bool,
    #[serde(rename = "debug-typeMapping")]
    pub debug_type_mapping: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            show_info_panels: true,
            debug_bounds: false,
            debug_placement: false,
            debug_logistic: false,
            debug_rail: false,
            debug_inputs: false,
            debug_type_mapping: false,
        }
    }
}

impl RenderOptions {
    pub fn from_json(value: &Value) -> Result<Self, RenderError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn parse(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pixel width cap, raised to the minimum when set lower.
    pub fn effective_max_width(&self) -> Option<u32> {
        self.max_width.map(|w| w.max(MIN_MAX_DIMENSION))
    }

    /// Pixel height cap, raised to the minimum when set lower.
    pub fn effective_max_height(&self) -> Option<u32> {
        self.max_height.map(|h| h.max(MIN_MAX_DIMENSION))
    }
}
