use crate::i18n::Language;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const FONT_SCALE_DEFAULT: f64 = 1.0;
pub const FONT_SCALE_MIN: f64 = 0.75;
pub const FONT_SCALE_MAX: f64 = 1.5;
pub const FONT_SCALE_STEP: f64 = 0.1;

/// Display language and text scale, passed explicitly to every renderer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub language: Language,
    pub font_scale: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            language: Language::En,
            font_scale: FONT_SCALE_DEFAULT,
        }
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if !scale.is_finite() {
        return FONT_SCALE_DEFAULT;
    }
    // округляем до сотых, чтобы шаги 0.1 не накапливали погрешность
    ((scale * 100.0).round() / 100.0).clamp(FONT_SCALE_MIN, FONT_SCALE_MAX)
}

impl DisplaySettings {
    pub fn with_font_scale(mut self, scale: f64) -> Self {
        self.font_scale = clamp_scale(scale);
        self
    }

    pub fn toggle_language(&mut self) {
        self.language = self.language.toggled();
    }

    pub fn increase_font(&mut self) {
        self.font_scale = clamp_scale(self.font_scale + FONT_SCALE_STEP);
    }

    pub fn decrease_font(&mut self) {
        self.font_scale = clamp_scale(self.font_scale - FONT_SCALE_STEP);
    }

    pub fn reset_font(&mut self) {
        self.font_scale = FONT_SCALE_DEFAULT;
    }

    pub fn is_rtl(&self) -> bool {
        self.language.is_rtl()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    display: DisplaySettings,
}

pub fn parse_config(source: &str) -> Result<DisplaySettings> {
    let file: ConfigFile = toml::from_str(source).context("invalid configuration")?;
    Ok(file.display.with_font_scale(file.display.font_scale))
}

pub fn load_config(path: &Path) -> Result<DisplaySettings> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    parse_config(&source).with_context(|| format!("in {}", path.display()))
}
