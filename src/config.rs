//! Runtime configuration: zoom thresholds and display-field metadata.
//!
//! Loadable from JSON and validated on load. The defaults reproduce the
//! thresholds the map client was tuned against.

use serde::{Deserialize, Serialize};

/// A property key the client renders, with its legend label and color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayField {
    pub key: String,
    pub label: String,
    pub color: String,
}

impl DisplayField {
    fn new(key: &str, label: &str, color: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

/// Zoom bands for POI serving: below `city` the province clusters show,
/// and so on up to `detail`, above which raw POIs are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoiLevels {
    pub province: u8,
    pub city: u8,
    pub district: u8,
    pub detail: u8,
}

impl Default for PoiLevels {
    fn default() -> Self {
        Self {
            province: 0,
            city: 8,
            district: 11,
            detail: 13,
        }
    }
}

/// Minimum display zoom per feature class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomConfig {
    /// Zoom at and above which city boundaries are shown.
    #[serde(default = "ZoomConfig::default_show_cities")]
    pub show_cities: u8,
    /// Zoom at and above which grid cells are served.
    #[serde(default = "ZoomConfig::default_show_cells")]
    pub show_cells: u8,
    #[serde(default)]
    pub poi_levels: PoiLevels,
}

impl ZoomConfig {
    const fn default_show_cities() -> u8 {
        4
    }

    const fn default_show_cells() -> u8 {
        8
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            show_cities: Self::default_show_cities(),
            show_cells: Self::default_show_cells(),
            poi_levels: PoiLevels::default(),
        }
    }
}

/// Full engine configuration, served verbatim to the client via
/// `/api/config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "AppConfig::default_display_fields")]
    pub display_fields: Vec<DisplayField>,
    #[serde(default = "AppConfig::default_poi_display_fields")]
    pub poi_display_fields: Vec<DisplayField>,
    #[serde(default)]
    pub zoom_config: ZoomConfig,
}

impl AppConfig {
    fn default_display_fields() -> Vec<DisplayField> {
        vec![
            DisplayField::new("wpop_change", "wpop change", "#3b82f6"),
            DisplayField::new("pop_6_11_change", "pop6-11 change", "#60a5fa"),
            DisplayField::new("pop_12_14_change", "pop12-14 change", "#8b5cf6"),
            DisplayField::new("ed_ps_change", "ed ps change", "#f59e0b"),
            DisplayField::new("ed_js_change", "ed js change", "#ef4444"),
        ]
    }

    fn default_poi_display_fields() -> Vec<DisplayField> {
        vec![
            DisplayField::new("name", "name", "#10b981"),
            DisplayField::new("survive_pop_change", "survive pop change", "#f59e0b"),
        ]
    }

    /// Validate threshold ordering.
    pub fn validate(&self) -> Result<(), String> {
        let levels = &self.zoom_config.poi_levels;
        if !(levels.province <= levels.city
            && levels.city <= levels.district
            && levels.district <= levels.detail)
        {
            return Err("POI zoom levels must be ordered province <= city <= district <= detail"
                .to_string());
        }
        if self.display_fields.is_empty() {
            return Err("displayFields must not be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: AppConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde::de::Error::custom(e));
        }
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display_fields: Self::default_display_fields(),
            poi_display_fields: Self::default_poi_display_fields(),
            zoom_config: ZoomConfig::default(),
        }
    }
}
