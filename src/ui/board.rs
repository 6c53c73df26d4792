use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Paragraph},
};

use crate::models::Theme;
use crate::preferences::DisplayProperties;

/// Foreground and background for a theme.
pub fn theme_colors(theme: Theme) -> (Color, Color) {
    match theme {
        Theme::Light => (Color::Rgb(40, 40, 40), Color::Rgb(250, 248, 240)),
        Theme::Dark => (Color::Rgb(220, 220, 215), Color::Rgb(28, 28, 30)),
    }
}

/// Break chapter text into terminal rows.
///
/// Source lines are kept as they are, leading whitespace included; only
/// lines wider than `width` are soft-wrapped. `blank_rows` empty rows
/// follow every source row.
pub fn layout_rows(text: &str, width: usize, blank_rows: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for line in text.lines() {
        if line.chars().count() <= width {
            rows.push(line.to_string());
        } else {
            rows.extend(
                textwrap::wrap(line, width)
                    .into_iter()
                    .map(|row| row.into_owned()),
            );
        }
        rows.extend(std::iter::repeat_n(String::new(), blank_rows));
    }

    rows
}

/// Board widget for rendering chapter text
pub struct Board {
    rows: Vec<String>,
    display: DisplayProperties,
    placeholder: bool,
    column_width: usize,
}

impl Board {
    pub fn new(display: DisplayProperties) -> Self {
        Self {
            rows: Vec::new(),
            display,
            placeholder: false,
            column_width: 0,
        }
    }

    pub fn display(&self) -> &DisplayProperties {
        &self.display
    }

    /// Re-layout `text` for the given base column width. The column never
    /// exceeds `available_width`, so no row is cut at the terminal edge.
    pub fn update_text(
        &mut self,
        text: &str,
        base_width: usize,
        available_width: usize,
        placeholder: bool,
    ) {
        let width = self.display.text_width(base_width).min(available_width.max(1));
        self.rows = layout_rows(text, width, self.display.blank_rows_between());
        self.column_width = width;
        self.placeholder = placeholder;
    }

    /// Width the current rows were laid out for.
    pub fn column_width(&self) -> usize {
        self.column_width
    }

    pub fn update_display(&mut self, display: DisplayProperties) {
        self.display = display;
    }

    /// Get the total number of rows in the current layout
    pub fn total_lines(&self) -> usize {
        self.rows.len()
    }

    /// Largest scroll offset that still fills a page of `height` rows.
    pub fn max_scroll(&self, height: usize) -> usize {
        self.rows.len().saturating_sub(height.max(1))
    }

    /// Get the content of a specific row
    pub fn get_line(&self, line: usize) -> Option<&str> {
        self.rows.get(line).map(String::as_str)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, scroll: usize) {
        let (fg, bg) = theme_colors(self.display.theme);
        let style = Style::default().fg(fg).bg(bg);
        frame.render_widget(Block::default().style(style), area);

        let width = (self.column_width as u16).min(area.width);
        let column = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y,
            width,
            height: area.height,
        };

        let height = area.height as usize;
        let start = scroll.min(self.rows.len());
        let end = (start + height).min(self.rows.len());
        let visible: Vec<Line> = self.rows[start..end]
            .iter()
            .map(|row| Line::from(row.clone()))
            .collect();

        let text_style = if self.placeholder {
            style.add_modifier(Modifier::ITALIC)
        } else {
            style
        };
        frame.render_widget(Paragraph::new(visible).style(text_style), column);
    }
}
