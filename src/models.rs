use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One entry of a novel's `manifest.json`.
///
/// Identity is positional: the index in the manifest array defines
/// navigation order, `number` is only what the generator printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterDescriptor {
    pub number: u32,
    pub title: String,
    pub file: String,
}

impl ChapterDescriptor {
    pub fn label(&self) -> String {
        format!("{}: {}", self.number, self.title)
    }
}

/// A novel folder on the source, e.g. `supreme-magus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Novel {
    id: String,
}

impl Novel {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Path prefix on the source, used verbatim.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_title(&self) -> String {
        self.id.replace('-', " ")
    }

    pub fn last_chapter_key(&self) -> String {
        format!("lastChapter-{}", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(eyre::eyre!("unknown theme '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryItem {
    pub last_read: DateTime<Utc>,
    pub novel: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum WindowType {
    #[default]
    Reader,
    Help,
    Picker,
    Library,
    Settings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_ignores_unknown_fields() {
        let json = r#"{"number": 3, "title": "The Gate", "file": "0003.txt", "url": "https://x/3"}"#;
        let chapter: ChapterDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(chapter.number, 3);
        assert_eq!(chapter.title, "The Gate");
        assert_eq!(chapter.file, "0003.txt");
        assert_eq!(chapter.label(), "3: The Gate");
    }

    #[test]
    fn test_novel_display_title_and_key() {
        let novel = Novel::new("supreme-magus");
        assert_eq!(novel.id(), "supreme-magus");
        assert_eq!(novel.display_title(), "supreme magus");
        assert_eq!(novel.last_chapter_key(), "lastChapter-supreme-magus");
    }

    #[test]
    fn test_theme_parse_and_toggle() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.to_string(), "dark");
    }

    #[test]
    fn test_window_type_default() {
        assert_eq!(WindowType::default(), WindowType::Reader);
    }
}
