use ratatui::{
    Frame,
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::settings::CfgDefaultKeymaps;

pub struct HelpWindow;

fn key_label(key: &str) -> String {
    match key {
        " " => "Space".to_string(),
        other => other.to_string(),
    }
}

impl HelpWindow {
    pub fn lines(keymaps: &CfgDefaultKeymaps) -> Vec<String> {
        let mut lines = vec![" Key Bindings:".to_string()];
        for (action, key) in keymaps.bindings() {
            lines.push(format!("   {:<18}{}", key_label(key), action.description()));
        }
        lines.extend([
            String::new(),
            " Always available:".to_string(),
            format!("   {:<18}{}", "Left / Right", "Previous / Next chapter"),
            format!("   {:<18}{}", "Up / Down", "Scroll"),
            format!("   {:<18}{}", "PgUp / PgDn", "Page"),
            format!("   {:<18}{}", "Esc", "Close window"),
        ]);
        lines
    }

    pub fn get_total_lines(keymaps: &CfgDefaultKeymaps) -> usize {
        Self::lines(keymaps).len()
    }

    pub fn render(frame: &mut Frame, area: Rect, keymaps: &CfgDefaultKeymaps, scroll_offset: u16) {
        let help_content: Vec<Line> = Self::lines(keymaps).into_iter().map(Line::from).collect();

        let max_width = help_content.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
        let width = (max_width + 4).min(area.width);
        let height = (help_content.len() as u16 + 2).min(area.height);

        let x = area.x + (area.width - width) / 2;
        let y = area.y + (area.height - height) / 2;
        let popup_area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, popup_area);

        let help_paragraph = Paragraph::new(help_content)
            .block(Block::default().title("Help").borders(Borders::ALL))
            .scroll((scroll_offset, 0));

        frame.render_widget(help_paragraph, popup_area);
    }
}
