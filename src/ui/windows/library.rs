use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::ui::windows::{centered_popup_area, selected_style};

/// Novels offered when no novel is open: the source's index merged with
/// reading history.
#[derive(Debug)]
pub struct LibraryWindow {
    pub entries: Vec<LibraryEntry>,
    pub selected_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub novel: String,
    pub recently_read: bool,
}

impl LibraryWindow {
    pub fn new(index: Vec<String>, history: Vec<String>) -> Self {
        let mut entries: Vec<LibraryEntry> = history
            .iter()
            .map(|novel| LibraryEntry {
                novel: novel.clone(),
                recently_read: true,
            })
            .collect();
        for novel in index {
            if !entries.iter().any(|e| e.novel == novel) {
                entries.push(LibraryEntry {
                    novel,
                    recently_read: false,
                });
            }
        }

        Self {
            entries,
            selected_index: 0,
        }
    }

    pub fn next_entry(&mut self) {
        if !self.entries.is_empty() {
            self.selected_index = (self.selected_index + 1).min(self.entries.len() - 1);
        }
    }

    pub fn previous_entry(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn get_selected_entry(&self) -> Option<&LibraryEntry> {
        self.entries.get(self.selected_index)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_popup_area(area, 50, 60);
        frame.render_widget(Clear, popup_area);
        let block = Block::default().title("Library").borders(Borders::ALL);

        if self.entries.is_empty() {
            let paragraph = Paragraph::new(vec![
                Line::from("No novels found"),
                Line::from(""),
                Line::from("Pass --novel NAME or a reader URL"),
            ])
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
            frame.render_widget(paragraph, popup_area);
            return;
        }

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| {
                let title = entry.novel.replace('-', " ");
                let text = if entry.recently_read {
                    format!("{title}  (recent)")
                } else {
                    title
                };
                ListItem::new(Line::from(text))
            })
            .collect();

        let list = List::new(items).block(block).highlight_style(selected_style());
        let mut state = ListState::default().with_selected(Some(self.selected_index));
        frame.render_stateful_widget(list, popup_area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_first_without_duplicates() {
        let window = LibraryWindow::new(
            vec!["alpha".to_string(), "beta".to_string()],
            vec!["beta".to_string()],
        );
        let names: Vec<&str> = window.entries.iter().map(|e| e.novel.as_str()).collect();
        assert_eq!(names, vec!["beta", "alpha"]);
        assert!(window.entries[0].recently_read);
        assert!(!window.entries[1].recently_read);
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut window = LibraryWindow::new(vec!["a".to_string(), "b".to_string()], Vec::new());
        window.previous_entry();
        assert_eq!(window.selected_index, 0);
        window.next_entry();
        window.next_entry();
        assert_eq!(window.get_selected_entry().map(|e| e.novel.as_str()), Some("b"));
    }
}
