use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::picker::ChapterPicker;
use crate::ui::windows::{centered_popup_area, selected_style};

pub struct ChaptersWindow;

impl ChaptersWindow {
    pub fn render(frame: &mut Frame, area: Rect, picker: &ChapterPicker, current: usize) {
        let popup_area = centered_popup_area(area, 60, 80);
        frame.render_widget(Clear, popup_area);

        let header = Paragraph::new(Line::from(format!("/{}", picker.query())))
            .block(Block::default().title("Chapters").borders(Borders::ALL))
            .style(Style::default().add_modifier(Modifier::BOLD));
        let header_area = Rect::new(popup_area.x, popup_area.y, popup_area.width, 3.min(popup_area.height));
        frame.render_widget(header, header_area);

        let list_area = Rect::new(
            popup_area.x,
            popup_area.y + header_area.height,
            popup_area.width,
            popup_area.height.saturating_sub(header_area.height),
        );

        if picker.entries().is_empty() {
            let empty = Paragraph::new(vec![
                Line::from("No matching chapters"),
                Line::from(""),
                Line::from(Span::styled(
                    "Backspace widens the search, Esc closes",
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ])
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(empty, list_area);
            return;
        }

        let items: Vec<ListItem> = picker
            .entries()
            .iter()
            .map(|entry| {
                let marker = if entry.index == current { "> " } else { "  " };
                ListItem::new(Line::from(format!("{marker}{}", entry.label)))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(selected_style());

        let mut state = ListState::default().with_selected(Some(picker.selected()));
        frame.render_stateful_widget(list, list_area, &mut state);
    }
}
