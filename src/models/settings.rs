use serde::{Deserialize, Serialize};

pub const AREA_TITLE: &str = "breakingnews_area_title";
pub const TEXT_COLOR: &str = "breakingnews_text_color";
pub const BG_COLOR: &str = "breakingnews_bg_color";
pub const AUTOINSERT: &str = "breakingnews_autoinsert";

/// Every setting name owned by the banner, in seeding order.
pub const ALL_KEYS: [&str; 4] = [AREA_TITLE, TEXT_COLOR, BG_COLOR, AUTOINSERT];

/// Global banner display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub area_title: String,
    /// Raw stored value; validated as a hex color only when rendered.
    pub text_color: String,
    pub bg_color: String,
    pub autoinsert: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            area_title: "Breaking news".into(),
            text_color: "#F0F0F0".into(),
            bg_color: "#333333".into(),
            autoinsert: true,
        }
    }
}

impl DisplaySettings {
    /// Name/value pairs in the stored representation.
    pub fn to_pairs(&self) -> [(&'static str, String); 4] {
        [
            (AREA_TITLE, self.area_title.clone()),
            (TEXT_COLOR, self.text_color.clone()),
            (BG_COLOR, self.bg_color.clone()),
            (AUTOINSERT, if self.autoinsert { "1" } else { "0" }.to_string()),
        ]
    }
}

/// Body for PUT /admin/settings. Omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub area_title: Option<String>,
    pub text_color: Option<String>,
    pub bg_color: Option<String>,
    pub autoinsert: Option<bool>,
}

impl UpdateSettingsRequest {
    pub fn apply(self, current: DisplaySettings) -> DisplaySettings {
        DisplaySettings {
            area_title: self.area_title.unwrap_or(current.area_title),
            text_color: self
                .text_color
                .map(|c| c.trim().to_string())
                .unwrap_or(current.text_color),
            bg_color: self
                .bg_color
                .map(|c| c.trim().to_string())
                .unwrap_or(current.bg_color),
            autoinsert: self.autoinsert.unwrap_or(current.autoinsert),
        }
    }
}
