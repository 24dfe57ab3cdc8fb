// Theme configuration
// Built-in light palette, optionally overridden by a custom JSON theme file

use crate::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// JSON-serializable theme (hex strings). Missing keys use the built-in palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub name: String,
    pub primary: String,
    pub primary_light: String,
    pub primary_dark: String,
    pub background: String,
    pub paper: String,
    pub text: String,
    pub text_secondary: String,
    pub border: String,
    pub title_icon: String,
    pub icon_background: String,
    pub title_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "Light".into(),
            primary: "#f50057".into(),
            primary_light: "#ff4081".into(),
            primary_dark: "#c51162".into(),
            background: "#f5f5f5".into(),
            paper: "#ffffff".into(),
            text: "#222222".into(),
            text_secondary: "#555555".into(),
            border: "#e0e0e0".into(),
            title_icon: "📋".into(),
            icon_background: "#ffd217".into(),
            title_color: "#60091a".into(),
        }
    }
}

/// Runtime theme passed to renderers. Has no effect on data.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub primary: Color,
    pub primary_light: Color,
    pub primary_dark: Color,
    pub background: Color,
    pub paper: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub border: Color,
    pub title_icon: String,
    pub icon_background: Color,
    pub title_color: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    /// Built-in light theme
    pub fn light() -> Self {
        Theme {
            name: "Light".into(),
            primary: Color::from_hex(0xf50057),
            primary_light: Color::from_hex(0xff4081),
            primary_dark: Color::from_hex(0xc51162),
            background: Color::from_hex(0xf5f5f5),
            paper: Color::from_hex(0xffffff),
            text: Color::from_hex(0x222222),
            text_secondary: Color::from_hex(0x555555),
            border: Color::from_hex(0xe0e0e0),
            title_icon: "📋".into(),
            icon_background: Color::from_hex(0xffd217),
            title_color: Color::from_hex(0x60091a),
        }
    }

    /// Parse a `#rrggbb` color
    pub fn hex_to_color(hex: &str) -> Option<Color> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Color::from_hex)
    }

    /// Build a theme from config; unparseable colors keep the built-in value.
    pub fn from_config(config: &ThemeConfig) -> Self {
        let base = Self::light();
        let pick = |hex: &str, fallback: Color| Self::hex_to_color(hex).unwrap_or(fallback);
        Theme {
            name: config.name.clone(),
            primary: pick(&config.primary, base.primary),
            primary_light: pick(&config.primary_light, base.primary_light),
            primary_dark: pick(&config.primary_dark, base.primary_dark),
            background: pick(&config.background, base.background),
            paper: pick(&config.paper, base.paper),
            text: pick(&config.text, base.text),
            text_secondary: pick(&config.text_secondary, base.text_secondary),
            border: pick(&config.border, base.border),
            title_icon: config.title_icon.clone(),
            icon_background: pick(&config.icon_background, base.icon_background),
            title_color: pick(&config.title_color, base.title_color),
        }
    }

    /// Load a custom theme file, falling back to the built-in theme.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::light();
        };
        match Self::load_custom(path) {
            Ok(theme) => theme,
            Err(e) => {
                eprintln!("Failed to load theme {}: {}", path.display(), e);
                Self::light()
            }
        }
    }

    fn load_custom(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let config: ThemeConfig = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self::from_config(&config))
    }
}
