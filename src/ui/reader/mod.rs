use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::config::Config;
use crate::loader;
use crate::models::{Novel, WindowType};
use crate::picker::ChapterPicker;
use crate::preferences::{PreferenceStore, Preferences, Setting};
use crate::session::{ChapterView, LoadOutcome, LoadRequest, ReaderSession};
use crate::settings::Action;
use crate::source::Source;
use crate::state::State;
use crate::ui::board::Board;
use crate::ui::windows::{
    chapters::ChaptersWindow, help::HelpWindow, library::LibraryWindow, settings::SettingsWindow,
};

const NO_NOVEL_TEXT: &str = "No novel open. Press R to browse the library.";

/// Rows taken by the header, the footer and the gaps around the text.
const CHROME_ROWS: u16 = 4;

/// Follow-up work a key press asks the event loop to perform.
#[derive(Debug)]
pub enum Command {
    None,
    Load(LoadRequest),
    ShowLibrary,
    OpenNovel(String),
    ForgetNovel(String),
}

#[derive(Debug, Default)]
pub struct UiState {
    pub active_window: WindowType,
    pub picker: Option<ChapterPicker>,
    pub library: Option<LibraryWindow>,
    pub settings_selected_index: usize,
    pub help_scroll_offset: u16,
    /// Text rows visible at once; kept in sync with the terminal size.
    pub page_height: usize,
    /// Columns available to the text column.
    pub page_width: usize,
}

impl UiState {
    pub fn open_window(&mut self, window_type: WindowType) {
        match window_type {
            WindowType::Reader => {
                self.picker = None;
                self.library = None;
            }
            WindowType::Help => self.help_scroll_offset = 0,
            WindowType::Settings => self.settings_selected_index = 0,
            WindowType::Picker | WindowType::Library => {}
        }
        self.active_window = window_type;
    }
}

/// Everything the reader shows, independent of the terminal.
pub struct ApplicationState {
    pub config: Config,
    pub session: Option<ReaderSession>,
    pub prefs: Preferences,
    pub board: Board,
    pub ui_state: UiState,
    pub should_quit: bool,
}

impl ApplicationState {
    pub fn new(config: Config, prefs: Preferences) -> Self {
        let mut state = Self {
            board: Board::new(prefs.display()),
            config,
            session: None,
            prefs,
            ui_state: UiState {
                page_height: 20,
                page_width: 80,
                ..UiState::default()
            },
            should_quit: false,
        };
        state.refresh_board();
        state
    }

    /// Follow a terminal resize: re-layout so rows fit the new width and
    /// the scroll limit matches the new row count.
    pub fn set_page_size(&mut self, width: usize, height: usize) {
        self.ui_state.page_width = width.max(1);
        self.ui_state.page_height = height.max(1);
        self.refresh_board();
    }

    /// Install a freshly opened session and start loading its first chapter.
    pub fn open_session(
        &mut self,
        session: ReaderSession,
        store: &dyn PreferenceStore,
    ) -> eyre::Result<Option<LoadRequest>> {
        let mut session = session;
        let request = if session.manifest_failed() {
            None
        } else {
            let index = session.initial_index(store)?;
            session.begin_load(index)
        };
        self.session = Some(session);
        self.ui_state.open_window(WindowType::Reader);
        self.refresh_board();
        Ok(request)
    }

    /// Apply a finished fetch. A failure to remember the chapter is logged;
    /// the chapter is still shown.
    pub fn complete_load(&mut self, outcome: LoadOutcome, store: &mut dyn PreferenceStore) {
        if let Some(session) = self.session.as_mut()
            && let Err(err) = session.complete_load(outcome, store)
        {
            tracing::error!("could not save reading position: {:#}", err);
        }
        self.refresh_board();
    }

    /// Re-layout the current view with the current display properties.
    pub fn refresh_board(&mut self) {
        self.board.update_display(self.prefs.display());
        let (text, placeholder) = match &self.session {
            Some(session) => (
                session.view().text(),
                matches!(session.view(), ChapterView::Placeholder(_)),
            ),
            None => (NO_NOVEL_TEXT, false),
        };
        self.board.update_text(
            text,
            self.config.settings.text_width,
            self.ui_state.page_width,
            placeholder,
        );
        self.clamp_scroll();
    }

    fn max_scroll(&self) -> usize {
        self.board.max_scroll(self.ui_state.page_height)
    }

    fn clamp_scroll(&mut self) {
        let max = self.max_scroll();
        if let Some(session) = self.session.as_mut() {
            let row = session.scroll();
            session.scroll_to(row, max);
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.max_scroll();
        if let Some(session) = self.session.as_mut() {
            session.scroll_by(delta, max);
        }
    }

    fn navigate(&mut self, go: fn(&mut ReaderSession) -> Option<LoadRequest>) -> Command {
        let request = self.session.as_mut().and_then(go);
        match request {
            Some(request) => {
                self.refresh_board();
                Command::Load(request)
            }
            None => Command::None,
        }
    }

    /// Handle a key press without ever ending the session: storage errors
    /// are logged and the key is otherwise ignored.
    pub fn handle_key_event(&mut self, key: KeyEvent, store: &mut dyn PreferenceStore) -> Command {
        match self.handle_key(key, store) {
            Ok(command) => command,
            Err(err) => {
                tracing::error!("could not apply {:?}: {:#}", key.code, err);
                self.refresh_board();
                Command::None
            }
        }
    }

    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        store: &mut dyn PreferenceStore,
    ) -> eyre::Result<Command> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(Command::None);
        }

        match self.ui_state.active_window {
            WindowType::Reader => self.handle_reader_keys(key, store),
            WindowType::Picker => Ok(self.handle_picker_keys(key)),
            WindowType::Library => Ok(self.handle_library_keys(key)),
            WindowType::Settings => {
                self.handle_settings_keys(key, store)?;
                Ok(Command::None)
            }
            WindowType::Help => {
                self.handle_help_keys(key);
                Ok(Command::None)
            }
        }
    }

    fn handle_reader_keys(
        &mut self,
        key: KeyEvent,
        store: &mut dyn PreferenceStore,
    ) -> eyre::Result<Command> {
        let page = self.ui_state.page_height as isize;
        let action = match key.code {
            KeyCode::Left => Some(Action::PrevChapter),
            KeyCode::Right => Some(Action::NextChapter),
            KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::Home => {
                self.scroll_by(isize::MIN);
                None
            }
            KeyCode::End => {
                self.scroll_by(isize::MAX);
                None
            }
            KeyCode::Char(c) => self.config.keymap.action_for(c),
            _ => None,
        };
        let Some(action) = action else {
            return Ok(Command::None);
        };

        match action {
            Action::ScrollUp => self.scroll_by(-1),
            Action::ScrollDown => self.scroll_by(1),
            Action::PageUp => self.scroll_by(-page),
            Action::PageDown => self.scroll_by(page),
            Action::PrevChapter => return Ok(self.navigate(ReaderSession::go_previous)),
            Action::NextChapter => return Ok(self.navigate(ReaderSession::go_next)),
            Action::FirstChapter => return Ok(self.navigate(ReaderSession::go_first)),
            Action::LastChapter => return Ok(self.navigate(ReaderSession::go_last)),
            Action::ChapterList | Action::Search => {
                if let Some(session) = &self.session
                    && !session.chapters().is_empty()
                {
                    let picker = ChapterPicker::open(session.chapters(), session.current_index());
                    self.ui_state.picker = Some(picker);
                    self.ui_state.open_window(WindowType::Picker);
                }
            }
            Action::Enlarge => {
                self.prefs.adjust_font_size(store, 1)?;
                self.refresh_board();
            }
            Action::Shrink => {
                self.prefs.adjust_font_size(store, -1)?;
                self.refresh_board();
            }
            Action::TallerLines => {
                self.prefs.adjust_line_height(store, 1)?;
                self.refresh_board();
            }
            Action::ShorterLines => {
                self.prefs.adjust_line_height(store, -1)?;
                self.refresh_board();
            }
            Action::SwitchColor => {
                self.prefs.toggle_theme(store)?;
                self.refresh_board();
            }
            Action::Settings => self.ui_state.open_window(WindowType::Settings),
            Action::Library => return Ok(Command::ShowLibrary),
            Action::Help => self.ui_state.open_window(WindowType::Help),
            Action::Quit => self.should_quit = true,
        }
        Ok(Command::None)
    }

    fn handle_picker_keys(&mut self, key: KeyEvent) -> Command {
        let (Some(picker), Some(session)) = (self.ui_state.picker.as_mut(), self.session.as_mut())
        else {
            self.ui_state.open_window(WindowType::Reader);
            return Command::None;
        };

        match key.code {
            KeyCode::Esc => self.ui_state.open_window(WindowType::Reader),
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::PageUp => picker.move_selection(-10),
            KeyCode::PageDown => picker.move_selection(10),
            KeyCode::Backspace => picker.pop_char(session.chapters()),
            KeyCode::Char(c) => picker.push_char(session.chapters(), c),
            KeyCode::Enter => {
                let request = picker
                    .selected_chapter()
                    .and_then(|index| session.begin_load(index));
                self.ui_state.open_window(WindowType::Reader);
                if let Some(request) = request {
                    self.refresh_board();
                    return Command::Load(request);
                }
            }
            _ => {}
        }
        Command::None
    }

    fn handle_library_keys(&mut self, key: KeyEvent) -> Command {
        let Some(library) = self.ui_state.library.as_mut() else {
            self.ui_state.open_window(WindowType::Reader);
            return Command::None;
        };

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.ui_state.open_window(WindowType::Reader),
            KeyCode::Char('j') | KeyCode::Down => library.next_entry(),
            KeyCode::Char('k') | KeyCode::Up => library.previous_entry(),
            KeyCode::Char('d') => {
                if let Some(entry) = library.get_selected_entry()
                    && entry.recently_read
                {
                    let novel = entry.novel.clone();
                    library.entries.retain(|e| e.novel != novel);
                    library.selected_index = library
                        .selected_index
                        .min(library.entries.len().saturating_sub(1));
                    return Command::ForgetNovel(novel);
                }
            }
            KeyCode::Enter => {
                if let Some(entry) = library.get_selected_entry() {
                    return Command::OpenNovel(entry.novel.clone());
                }
            }
            _ => {}
        }
        Command::None
    }

    fn handle_settings_keys(
        &mut self,
        key: KeyEvent,
        store: &mut dyn PreferenceStore,
    ) -> eyre::Result<()> {
        let selected = Setting::all()
            .get(self.ui_state.settings_selected_index)
            .copied();
        match (key.code, selected) {
            (KeyCode::Esc | KeyCode::Char('q'), _) => {
                self.ui_state.open_window(WindowType::Reader);
                return Ok(());
            }
            (KeyCode::Char('j') | KeyCode::Down, _) => {
                let last = Setting::all().len() - 1;
                self.ui_state.settings_selected_index =
                    (self.ui_state.settings_selected_index + 1).min(last);
                return Ok(());
            }
            (KeyCode::Char('k') | KeyCode::Up, _) => {
                self.ui_state.settings_selected_index =
                    self.ui_state.settings_selected_index.saturating_sub(1);
                return Ok(());
            }
            (KeyCode::Right | KeyCode::Char('l'), Some(Setting::FontSize)) => {
                self.prefs.adjust_font_size(store, 1)?
            }
            (KeyCode::Left | KeyCode::Char('h'), Some(Setting::FontSize)) => {
                self.prefs.adjust_font_size(store, -1)?
            }
            (KeyCode::Right | KeyCode::Char('l'), Some(Setting::LineHeight)) => {
                self.prefs.adjust_line_height(store, 1)?
            }
            (KeyCode::Left | KeyCode::Char('h'), Some(Setting::LineHeight)) => {
                self.prefs.adjust_line_height(store, -1)?
            }
            (
                KeyCode::Right | KeyCode::Left | KeyCode::Char('l' | 'h') | KeyCode::Enter,
                Some(Setting::Theme),
            ) => self.prefs.toggle_theme(store)?,
            (KeyCode::Char('r'), Some(setting)) => self.prefs.reset(store, setting)?,
            _ => return Ok(()),
        }
        self.refresh_board();
        Ok(())
    }

    fn handle_help_keys(&mut self, key: KeyEvent) {
        let max_offset = HelpWindow::get_total_lines(self.config.keymap_user_dict())
            .saturating_sub(self.ui_state.page_height) as u16;
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
                self.ui_state.open_window(WindowType::Reader)
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.ui_state.help_scroll_offset =
                    self.ui_state.help_scroll_offset.saturating_add(1).min(max_offset);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.ui_state.help_scroll_offset = self.ui_state.help_scroll_offset.saturating_sub(1);
            }
            _ => {}
        }
    }
}

/// Terminal front end: draws `ApplicationState`, runs chapter fetches on
/// worker threads and persists through the SQLite state.
pub struct Reader {
    state: ApplicationState,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    db_state: State,
    source: Arc<dyn Source>,
    source_location: String,
    load_tx: Sender<LoadOutcome>,
    load_rx: Receiver<LoadOutcome>,
}

impl Reader {
    pub fn new(
        config: Config,
        db_state: State,
        source: Arc<dyn Source>,
        source_location: String,
    ) -> eyre::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        let prefs = Preferences::load(&db_state)?;
        let (load_tx, load_rx) = mpsc::channel();

        Ok(Self {
            state: ApplicationState::new(config, prefs),
            terminal,
            db_state,
            source,
            source_location,
            load_tx,
            load_rx,
        })
    }

    /// Open `novel`, or the library when none is given.
    pub fn start(&mut self, novel: Option<&str>) -> eyre::Result<()> {
        match novel {
            Some(novel) => self.open_novel(novel),
            None => {
                self.open_library_window();
                Ok(())
            }
        }
    }

    fn open_novel(&mut self, id: &str) -> eyre::Result<()> {
        tracing::info!("opening {} from {}", id, self.source.describe());
        let session = ReaderSession::open(self.source.as_ref(), Novel::new(id));
        if !session.manifest_failed() {
            self.db_state.update_library(id, &self.source_location)?;
        }
        if let Some(request) = self.state.open_session(session, &self.db_state)? {
            self.dispatch(request);
        }
        Ok(())
    }

    fn open_library_window(&mut self) {
        let index = match loader::load_novel_index(self.source.as_ref()) {
            Ok(index) => index,
            Err(err) => {
                tracing::debug!("no novel index at {}: {}", self.source.describe(), err);
                Vec::new()
            }
        };
        let history = match self.db_state.get_from_history() {
            Ok(items) => items
                .into_iter()
                .filter(|item| item.source == self.source_location)
                .map(|item| item.novel)
                .collect(),
            Err(err) => {
                tracing::warn!("could not read reading history: {}", err);
                Vec::new()
            }
        };
        self.state.ui_state.library = Some(LibraryWindow::new(index, history));
        self.state.ui_state.open_window(WindowType::Library);
    }

    /// Fetch on a worker thread; the result comes back through `load_rx`.
    fn dispatch(&self, request: LoadRequest) {
        tracing::debug!("loading chapter {} (request {})", request.index + 1, request.seq);
        let source = Arc::clone(&self.source);
        let tx = self.load_tx.clone();
        thread::spawn(move || {
            let outcome = request.run(source.as_ref());
            // The receiver is gone only when the reader is shutting down
            let _ = tx.send(outcome);
        });
    }

    fn run_command(&mut self, command: Command) -> eyre::Result<()> {
        match command {
            Command::None => {}
            Command::Load(request) => self.dispatch(request),
            Command::ShowLibrary => self.open_library_window(),
            Command::OpenNovel(novel) => self.open_novel(&novel)?,
            Command::ForgetNovel(novel) => {
                self.db_state
                    .delete_from_library(&novel, &self.source_location)?;
            }
        }
        Ok(())
    }

    fn sync_page_size(&mut self) {
        let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
        self.state
            .set_page_size(width as usize, height.saturating_sub(CHROME_ROWS) as usize);
    }

    /// Run the main application loop
    pub fn run(&mut self) -> eyre::Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;

        self.terminal.clear()?;
        self.terminal.hide_cursor()?;
        self.sync_page_size();

        let result = self.event_loop();

        self.terminal.clear()?;
        self.terminal.show_cursor()?;
        crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
        crossterm::terminal::disable_raw_mode()?;

        result
    }

    fn event_loop(&mut self) -> eyre::Result<()> {
        while !self.state.should_quit {
            while let Ok(outcome) = self.load_rx.try_recv() {
                self.state.complete_load(outcome, &mut self.db_state);
            }

            let state = &self.state;
            self.terminal.draw(|f| render(f, state))?;

            // Poll faster while a fetch is outstanding so its result shows promptly
            let loading = self
                .state
                .session
                .as_ref()
                .is_some_and(ReaderSession::is_loading);
            let poll_timeout = if loading {
                Duration::from_millis(50)
            } else {
                Duration::from_millis(500)
            };
            if !crossterm::event::poll(poll_timeout)? {
                continue;
            }

            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let command = self.state.handle_key_event(key, &mut self.db_state);
                    if let Err(err) = self.run_command(command) {
                        tracing::error!("{:#}", err);
                    }
                }
                Event::Resize(width, height) => self
                    .state
                    .set_page_size(width as usize, height.saturating_sub(CHROME_ROWS) as usize),
                _ => {}
            }
        }
        Ok(())
    }
}

fn build_header_line(title: &str, right_text: Option<&str>, width: u16) -> String {
    let width = width as usize;
    if width == 0 {
        return String::new();
    }

    let mut buffer = vec![' '; width];
    let right_len = right_text.map(|text| text.chars().count()).unwrap_or(0);
    let content_width = if right_len > 0 {
        width.saturating_sub(right_len + 1)
    } else {
        width
    };

    let title_chars: Vec<char> = title.chars().take(content_width).collect();
    let title_start = (content_width.saturating_sub(title_chars.len())) / 2;
    for (i, ch) in title_chars.into_iter().enumerate() {
        if title_start + i < buffer.len() {
            buffer[title_start + i] = ch;
        }
    }

    if let Some(right_text) = right_text {
        let start = width.saturating_sub(right_len);
        for (i, ch) in right_text.chars().enumerate() {
            if start + i < buffer.len() {
                buffer[start + i] = ch;
            }
        }
    }

    buffer.into_iter().collect()
}

fn footer_line(state: &ApplicationState) -> Line<'static> {
    let (can_prev, can_next, loading) = match &state.session {
        Some(session) => (
            session.can_go_previous(),
            session.can_go_next(),
            session.is_loading(),
        ),
        None => (false, false, false),
    };
    let button = |label: &'static str, enabled: bool| {
        if enabled {
            Span::styled(label, Style::default().add_modifier(Modifier::BOLD))
        } else {
            Span::styled(label, Style::default().fg(Color::DarkGray))
        }
    };

    let display = state.prefs.display();
    let mut status = format!(
        "  {} | {} | {}  ",
        display.font_size_css(),
        display.line_height_css(),
        display.theme_attr()
    );
    if loading {
        status.push_str("loading...  ");
    }

    Line::from(vec![
        button("< Prev", can_prev),
        Span::raw(status),
        button("Next >", can_next),
    ])
    .centered()
}

pub fn render(frame: &mut Frame, state: &ApplicationState) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(frame.area());

    let (title, indicator) = match &state.session {
        Some(session) => (session.title(), session.indicator()),
        None => ("novel-reader".to_string(), None),
    };
    let indicator = indicator.filter(|_| state.config.settings.show_progress_indicator);
    let header = build_header_line(&title, indicator.as_deref(), chunks[0].width);
    frame.render_widget(
        Paragraph::new(Line::from(header)).style(Style::default().add_modifier(Modifier::BOLD)),
        chunks[0],
    );

    let scroll = state.session.as_ref().map_or(0, ReaderSession::scroll);
    state
        .board
        .render(frame, chunks[2], scroll);

    frame.render_widget(Paragraph::new(footer_line(state)), chunks[4]);

    let area = frame.area();
    match state.ui_state.active_window {
        WindowType::Reader => {}
        WindowType::Help => HelpWindow::render(
            frame,
            area,
            state.config.keymap_user_dict(),
            state.ui_state.help_scroll_offset,
        ),
        WindowType::Picker => {
            if let (Some(picker), Some(session)) = (&state.ui_state.picker, &state.session) {
                ChaptersWindow::render(frame, area, picker, session.current_index());
            }
        }
        WindowType::Library => {
            if let Some(library) = &state.ui_state.library {
                library.render(frame, area);
            }
        }
        WindowType::Settings => {
            SettingsWindow::render(frame, area, &state.prefs, state.ui_state.settings_selected_index)
        }
    }
}
