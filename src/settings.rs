use serde::{Deserialize, Serialize};

pub const DEFAULT_TEXT_WIDTH: usize = 72;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory or http(s) URL holding the novel folders.
    pub default_source: String,
    pub show_progress_indicator: bool,
    /// No timeout when unset: a hung request keeps the placeholder up.
    pub request_timeout_secs: Option<u64>,
    /// Text column width at the default font size.
    pub text_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_source: ".".to_string(),
            show_progress_indicator: true,
            request_timeout_secs: None,
            text_width: DEFAULT_TEXT_WIDTH,
        }
    }
}

/// Key bindings as written in the configuration file, one key per action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfgDefaultKeymaps {
    pub scroll_up: String,
    pub scroll_down: String,
    pub page_up: String,
    pub page_down: String,
    pub next_chapter: String,
    pub prev_chapter: String,
    pub first_chapter: String,
    pub last_chapter: String,
    pub chapter_list: String,
    pub search: String,
    pub enlarge: String,
    pub shrink: String,
    pub taller_lines: String,
    pub shorter_lines: String,
    pub switch_color: String,
    pub settings: String,
    pub library: String,
    pub help: String,
    pub quit: String,
}

impl Default for CfgDefaultKeymaps {
    fn default() -> Self {
        Self {
            scroll_up: "k".to_string(),
            scroll_down: "j".to_string(),
            page_up: "b".to_string(),
            page_down: " ".to_string(),
            next_chapter: "l".to_string(),
            prev_chapter: "h".to_string(),
            first_chapter: "g".to_string(),
            last_chapter: "G".to_string(),
            chapter_list: "t".to_string(),
            search: "/".to_string(),
            enlarge: "+".to_string(),
            shrink: "-".to_string(),
            taller_lines: "]".to_string(),
            shorter_lines: "[".to_string(),
            switch_color: "c".to_string(),
            settings: "s".to_string(),
            library: "R".to_string(),
            help: "?".to_string(),
            quit: "q".to_string(),
        }
    }
}

impl CfgDefaultKeymaps {
    /// Every binding with the action it triggers, in help-menu order.
    pub fn bindings(&self) -> Vec<(Action, &str)> {
        vec![
            (Action::ScrollDown, self.scroll_down.as_str()),
            (Action::ScrollUp, self.scroll_up.as_str()),
            (Action::PageDown, self.page_down.as_str()),
            (Action::PageUp, self.page_up.as_str()),
            (Action::NextChapter, self.next_chapter.as_str()),
            (Action::PrevChapter, self.prev_chapter.as_str()),
            (Action::FirstChapter, self.first_chapter.as_str()),
            (Action::LastChapter, self.last_chapter.as_str()),
            (Action::ChapterList, self.chapter_list.as_str()),
            (Action::Search, self.search.as_str()),
            (Action::Enlarge, self.enlarge.as_str()),
            (Action::Shrink, self.shrink.as_str()),
            (Action::TallerLines, self.taller_lines.as_str()),
            (Action::ShorterLines, self.shorter_lines.as_str()),
            (Action::SwitchColor, self.switch_color.as_str()),
            (Action::Settings, self.settings.as_str()),
            (Action::Library, self.library.as_str()),
            (Action::Help, self.help.as_str()),
            (Action::Quit, self.quit.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    NextChapter,
    PrevChapter,
    FirstChapter,
    LastChapter,
    ChapterList,
    Search,
    Enlarge,
    Shrink,
    TallerLines,
    ShorterLines,
    SwitchColor,
    Settings,
    Library,
    Help,
    Quit,
}

impl Action {
    pub fn description(&self) -> &'static str {
        match self {
            Action::ScrollUp => "Scroll up",
            Action::ScrollDown => "Scroll down",
            Action::PageUp => "Page up",
            Action::PageDown => "Page down",
            Action::NextChapter => "Next chapter",
            Action::PrevChapter => "Previous chapter",
            Action::FirstChapter => "First chapter",
            Action::LastChapter => "Last chapter",
            Action::ChapterList => "Chapter list",
            Action::Search => "Search chapter titles",
            Action::Enlarge => "Larger font",
            Action::Shrink => "Smaller font",
            Action::TallerLines => "Increase line height",
            Action::ShorterLines => "Decrease line height",
            Action::SwitchColor => "Toggle light/dark theme",
            Action::Settings => "Settings",
            Action::Library => "Library",
            Action::Help => "Help",
            Action::Quit => "Quit",
        }
    }
}

/// Resolved single-character bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Keymap {
    bindings: Vec<(char, Action)>,
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl Keymap {
    /// Entries that are not exactly one character keep their default key.
    pub fn from_user_dict(user: &CfgDefaultKeymaps) -> Self {
        let defaults = CfgDefaultKeymaps::default();
        let bindings = user
            .bindings()
            .into_iter()
            .zip(defaults.bindings())
            .filter_map(|((action, key), (_, fallback))| {
                single_char(key)
                    .or_else(|| single_char(fallback))
                    .map(|c| (c, action))
            })
            .collect();
        Self { bindings }
    }

    pub fn action_for(&self, c: char) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(key, _)| *key == c)
            .map(|(_, action)| *action)
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::from_user_dict(&CfgDefaultKeymaps::default())
    }
}
