use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pointer buttons accepted for the manual marker toggle.
///
/// Wire codes follow the host event model: 0 = primary, 1 = secondary,
/// 2 = auxiliary. Secondary is special: configuring it means the host must
/// also intercept the context-menu action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Primary,
    Secondary,
    Auxiliary,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Primary => "primary",
            MouseButton::Secondary => "secondary",
            MouseButton::Auxiliary => "auxiliary",
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            MouseButton::Primary => 0,
            MouseButton::Secondary => 1,
            MouseButton::Auxiliary => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MouseButton::Primary),
            1 => Some(MouseButton::Secondary),
            2 => Some(MouseButton::Auxiliary),
            _ => None,
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "primary" | "left" => Ok(MouseButton::Primary),
            "secondary" | "right" => Ok(MouseButton::Secondary),
            "auxiliary" | "middle" => Ok(MouseButton::Auxiliary),
            other => Err(format!("Unknown mouse button: {other}")),
        }
    }
}

/// Static configuration, fixed before the session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Days a watched record is retained. Zero disables eviction.
    #[serde(default = "default_max_age_days")]
    pub max_watched_video_age_days: u32,
    /// Delay before marking after a full document load.
    #[serde(default = "default_page_load_delay_ms")]
    pub page_load_mark_delay_ms: u64,
    /// Delay before marking after a content fragment is processed.
    #[serde(default = "default_content_load_delay_ms")]
    pub content_load_mark_delay_ms: u64,
    /// Buttons that toggle a marker when pressed with the modifier held.
    #[serde(default = "default_marker_mouse_buttons")]
    pub marker_mouse_buttons: Vec<MouseButton>,
}

fn default_max_age_days() -> u32 {
    180
}

fn default_page_load_delay_ms() -> u64 {
    400
}

fn default_content_load_delay_ms() -> u64 {
    600
}

fn default_marker_mouse_buttons() -> Vec<MouseButton> {
    vec![MouseButton::Primary, MouseButton::Secondary]
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            max_watched_video_age_days: default_max_age_days(),
            page_load_mark_delay_ms: default_page_load_delay_ms(),
            content_load_mark_delay_ms: default_content_load_delay_ms(),
            marker_mouse_buttons: default_marker_mouse_buttons(),
        }
    }
}

impl MarkerConfig {
    pub fn accepts_button(&self, button: MouseButton) -> bool {
        self.marker_mouse_buttons.contains(&button)
    }
}
