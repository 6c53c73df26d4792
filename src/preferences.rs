use crate::models::{Novel, Theme};
use std::collections::HashMap;

pub const FONT_SIZE_KEY: &str = "fontSize";
pub const LINE_HEIGHT_KEY: &str = "lineHeight";
pub const THEME_KEY: &str = "theme";

pub const DEFAULT_FONT_SIZE: u32 = 18;
pub const DEFAULT_LINE_HEIGHT: f32 = 1.8;

pub const MIN_FONT_SIZE: u32 = 10;
pub const MAX_FONT_SIZE: u32 = 40;
pub const MIN_LINE_HEIGHT: f32 = 1.0;
pub const MAX_LINE_HEIGHT: f32 = 3.0;

/// Persistent string key-value storage for reader preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> eyre::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> eyre::Result<()>;
}

/// Store that lives as long as the process; used by `--dump` when no
/// database can be opened, and by tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> eyre::Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> eyre::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    FontSize,
    LineHeight,
    Theme,
}

impl Setting {
    pub fn all() -> &'static [Setting] {
        &[Setting::FontSize, Setting::LineHeight, Setting::Theme]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Setting::FontSize => FONT_SIZE_KEY,
            Setting::LineHeight => LINE_HEIGHT_KEY,
            Setting::Theme => THEME_KEY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preferences {
    pub font_size: u32,
    pub line_height: f32,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            line_height: DEFAULT_LINE_HEIGHT,
            theme: Theme::Light,
        }
    }
}

fn parse_font_size(value: &str) -> u32 {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_FONT_SIZE)
}

fn parse_line_height(value: &str) -> f32 {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(DEFAULT_LINE_HEIGHT)
}

fn round_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

impl Preferences {
    /// Read every preference, falling back to the default for missing or
    /// malformed values.
    pub fn load(store: &dyn PreferenceStore) -> eyre::Result<Self> {
        let mut prefs = Self::default();
        for setting in Setting::all() {
            if let Some(value) = store.get(setting.key())? {
                prefs.assign(*setting, &value);
            }
        }
        Ok(prefs)
    }

    fn assign(&mut self, setting: Setting, value: &str) {
        match setting {
            Setting::FontSize => self.font_size = parse_font_size(value),
            Setting::LineHeight => self.line_height = parse_line_height(value),
            Setting::Theme => self.theme = value.trim().parse().unwrap_or_default(),
        }
    }

    /// Persist `value` under the setting's key, then apply it.
    pub fn apply_setting(
        &mut self,
        store: &mut dyn PreferenceStore,
        setting: Setting,
        value: &str,
    ) -> eyre::Result<()> {
        store.set(setting.key(), value)?;
        self.assign(setting, value);
        tracing::debug!("{} = {}", setting.key(), value);
        Ok(())
    }

    pub fn set_font_size(&mut self, store: &mut dyn PreferenceStore, size: u32) -> eyre::Result<()> {
        let size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.apply_setting(store, Setting::FontSize, &size.to_string())
    }

    pub fn adjust_font_size(&mut self, store: &mut dyn PreferenceStore, delta: i32) -> eyre::Result<()> {
        let size = (self.font_size as i64 + delta as i64).max(0) as u32;
        self.set_font_size(store, size)
    }

    pub fn set_line_height(&mut self, store: &mut dyn PreferenceStore, height: f32) -> eyre::Result<()> {
        let height = round_tenth(height.clamp(MIN_LINE_HEIGHT, MAX_LINE_HEIGHT));
        self.apply_setting(store, Setting::LineHeight, &height.to_string())
    }

    pub fn adjust_line_height(&mut self, store: &mut dyn PreferenceStore, steps: i32) -> eyre::Result<()> {
        let height = self.line_height + steps as f32 * 0.1;
        self.set_line_height(store, height)
    }

    pub fn toggle_theme(&mut self, store: &mut dyn PreferenceStore) -> eyre::Result<()> {
        let theme = self.theme.toggled();
        self.apply_setting(store, Setting::Theme, theme.as_str())
    }

    pub fn reset(&mut self, store: &mut dyn PreferenceStore, setting: Setting) -> eyre::Result<()> {
        let defaults = Preferences::default();
        let value = match setting {
            Setting::FontSize => defaults.font_size.to_string(),
            Setting::LineHeight => defaults.line_height.to_string(),
            Setting::Theme => defaults.theme.to_string(),
        };
        self.apply_setting(store, setting, &value)
    }

    pub fn display(&self) -> DisplayProperties {
        DisplayProperties::from(self)
    }
}

/// Last chapter index read in `novel`; 0 when absent or unparsable.
pub fn last_chapter(store: &dyn PreferenceStore, novel: &Novel) -> eyre::Result<usize> {
    Ok(store
        .get(&novel.last_chapter_key())?
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0))
}

pub fn remember_chapter(store: &mut dyn PreferenceStore, novel: &Novel, index: usize) -> eyre::Result<()> {
    store.set(&novel.last_chapter_key(), &index.to_string())
}

/// What the view should look like for a set of preferences.
///
/// Pure data; the terminal adapter in `ui::board` turns it into widths,
/// spacing and colours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayProperties {
    pub font_size_px: u32,
    pub line_height: f32,
    pub theme: Theme,
}

impl From<&Preferences> for DisplayProperties {
    fn from(prefs: &Preferences) -> Self {
        Self {
            font_size_px: prefs.font_size,
            line_height: prefs.line_height,
            theme: prefs.theme,
        }
    }
}

impl DisplayProperties {
    pub fn font_size_css(&self) -> String {
        format!("{}px", self.font_size_px)
    }

    pub fn line_height_css(&self) -> String {
        self.line_height.to_string()
    }

    pub fn theme_attr(&self) -> &'static str {
        self.theme.as_str()
    }

    /// Column width for the text: larger fonts make fewer characters fit,
    /// scaled from `base_width` at the default size.
    pub fn text_width(&self, base_width: usize) -> usize {
        let size = self.font_size_px.max(1) as usize;
        (base_width * DEFAULT_FONT_SIZE as usize / size).max(20)
    }

    /// Blank terminal rows inserted after every text row: the extra
    /// height rounded to whole rows, so 1.5 to 2.4 give one row.
    pub fn blank_rows_between(&self) -> usize {
        (round_tenth(self.line_height) - 1.0).max(0.0).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_with_empty_store() {
        let store = MemoryStore::new();
        let prefs = Preferences::load(&store).unwrap();
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.font_size, 18);
        assert_eq!(prefs.line_height, 1.8);
        assert_eq!(prefs.theme, Theme::Light);
    }

    #[test]
    fn stored_values_are_loaded() {
        let mut store = MemoryStore::new();
        store.set("fontSize", "24").unwrap();
        store.set("lineHeight", "2.2").unwrap();
        store.set("theme", "dark").unwrap();

        let prefs = Preferences::load(&store).unwrap();
        assert_eq!(prefs.font_size, 24);
        assert_eq!(prefs.line_height, 2.2);
        assert_eq!(prefs.theme, Theme::Dark);
    }

    #[test]
    fn malformed_values_fall_back_independently() {
        let mut store = MemoryStore::new();
        store.set("fontSize", "huge").unwrap();
        store.set("lineHeight", "-1").unwrap();
        store.set("theme", "dark").unwrap();

        let prefs = Preferences::load(&store).unwrap();
        assert_eq!(prefs.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(prefs.line_height, DEFAULT_LINE_HEIGHT);
        assert_eq!(prefs.theme, Theme::Dark);
    }

    #[test]
    fn setting_font_size_applies_and_persists() {
        let mut store = MemoryStore::new();
        let mut prefs = Preferences::default();

        prefs.apply_setting(&mut store, Setting::FontSize, "22").unwrap();

        assert_eq!(prefs.display().font_size_css(), "22px");
        assert_eq!(store.get("fontSize").unwrap().as_deref(), Some("22"));
    }

    #[test]
    fn adjustments_are_clamped() {
        let mut store = MemoryStore::new();
        let mut prefs = Preferences::default();

        prefs.set_font_size(&mut store, 99).unwrap();
        assert_eq!(prefs.font_size, MAX_FONT_SIZE);
        prefs.adjust_font_size(&mut store, -100).unwrap();
        assert_eq!(prefs.font_size, MIN_FONT_SIZE);

        prefs.adjust_line_height(&mut store, 2).unwrap();
        assert_eq!(prefs.line_height, 2.0);
        assert_eq!(store.get("lineHeight").unwrap().as_deref(), Some("2"));
        prefs.adjust_line_height(&mut store, -50).unwrap();
        assert_eq!(prefs.line_height, MIN_LINE_HEIGHT);
    }

    #[test]
    fn theme_toggle_round_trips_through_store() {
        let mut store = MemoryStore::new();
        let mut prefs = Preferences::default();

        prefs.toggle_theme(&mut store).unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(Preferences::load(&store).unwrap().theme, Theme::Dark);
    }

    #[test]
    fn reset_restores_default() {
        let mut store = MemoryStore::new();
        let mut prefs = Preferences::default();
        prefs.set_font_size(&mut store, 30).unwrap();
        prefs.reset(&mut store, Setting::FontSize).unwrap();
        assert_eq!(prefs.font_size, 18);
        assert_eq!(store.get("fontSize").unwrap().as_deref(), Some("18"));
    }

    #[test]
    fn last_chapter_defaults_to_zero() {
        let mut store = MemoryStore::new();
        let novel = Novel::new("demo");
        assert_eq!(last_chapter(&store, &novel).unwrap(), 0);

        store.set("lastChapter-demo", "abc").unwrap();
        assert_eq!(last_chapter(&store, &novel).unwrap(), 0);

        remember_chapter(&mut store, &novel, 7).unwrap();
        assert_eq!(last_chapter(&store, &novel).unwrap(), 7);
    }

    #[test]
    fn display_properties_scale_terminal_layout() {
        let display = Preferences::default().display();
        assert_eq!(display.line_height_css(), "1.8");
        assert_eq!(display.theme_attr(), "light");
        assert_eq!(display.text_width(72), 72);
        assert_eq!(display.blank_rows_between(), 1);

        let large = DisplayProperties {
            font_size_px: 36,
            line_height: 2.0,
            theme: Theme::Dark,
        };
        assert_eq!(large.text_width(72), 36);
        assert_eq!(large.blank_rows_between(), 1);
    }

    #[test]
    fn line_height_steps_map_to_blank_rows() {
        let rows = |line_height: f32| {
            DisplayProperties {
                font_size_px: DEFAULT_FONT_SIZE,
                line_height,
                theme: Theme::Light,
            }
            .blank_rows_between()
        };
        assert_eq!(rows(1.0), 0);
        assert_eq!(rows(1.4), 0);
        assert_eq!(rows(1.5), 1);
        assert_eq!(rows(1.9), 1);
        assert_eq!(rows(2.4), 1);
        assert_eq!(rows(2.5), 2);
        assert_eq!(rows(3.0), 2);
    }
}
