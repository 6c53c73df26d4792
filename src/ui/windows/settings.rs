use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::preferences::{Preferences, Setting};
use crate::ui::windows::selected_style;

pub struct SettingsWindow;

impl SettingsWindow {
    pub fn entries(prefs: &Preferences) -> Vec<String> {
        let display = prefs.display();
        Setting::all()
            .iter()
            .map(|setting| match setting {
                Setting::FontSize => format!("Font size      {}", display.font_size_css()),
                Setting::LineHeight => format!("Line height    {}", display.line_height_css()),
                Setting::Theme => format!("Theme          {}", display.theme_attr()),
            })
            .collect()
    }

    pub fn render(frame: &mut Frame, area: Rect, prefs: &Preferences, selected_index: usize) {
        let popup_area = Rect::new(
            area.x + area.width / 4,
            area.y + area.height / 4,
            area.width / 2,
            (Setting::all().len() as u16 + 4).min(area.height),
        );

        frame.render_widget(Clear, popup_area);
        let block = Block::default().title("Settings").borders(Borders::ALL);
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        let items: Vec<ListItem> = Self::entries(prefs)
            .into_iter()
            .map(|entry| ListItem::new(Line::from(entry)))
            .collect();
        let list = List::new(items).highlight_style(selected_style());
        let mut state = ListState::default().with_selected(Some(selected_index));

        frame.render_stateful_widget(list, rows[0], &mut state);
        frame.render_widget(
            Paragraph::new("Left/Right change | Enter toggle | r reset"),
            rows[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_show_display_values() {
        let entries = SettingsWindow::entries(&Preferences::default());
        assert_eq!(entries.len(), 3);
        assert!(entries[0].ends_with("18px"));
        assert!(entries[1].ends_with("1.8"));
        assert!(entries[2].ends_with("light"));
    }
}
