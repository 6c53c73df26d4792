use crate::loader::{self, LoadedChapter};
use crate::models::{ChapterDescriptor, Novel};
use crate::preferences::{self, PreferenceStore};
use crate::source::{FetchError, Source};

pub const MANIFEST_ERROR: &str = "Error loading novel.";
pub const CHAPTER_ERROR: &str = "Failed to load chapter. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading { index: usize, seq: u64 },
    Displayed { index: usize },
    Failed { index: usize },
}

/// What the content area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterView {
    Empty,
    Placeholder(String),
    Text(String),
    Failed,
}

impl ChapterView {
    pub fn text(&self) -> &str {
        match self {
            ChapterView::Empty => "",
            ChapterView::Placeholder(text) | ChapterView::Text(text) => text,
            ChapterView::Failed => CHAPTER_ERROR,
        }
    }
}

/// A chapter fetch to run, possibly off the UI thread.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub seq: u64,
    pub index: usize,
    pub novel: Novel,
    pub chapter: ChapterDescriptor,
}

impl LoadRequest {
    pub fn run(&self, source: &dyn Source) -> LoadOutcome {
        LoadOutcome {
            seq: self.seq,
            index: self.index,
            result: loader::fetch_chapter(source, &self.novel, &self.chapter),
        }
    }
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub seq: u64,
    pub index: usize,
    pub result: Result<LoadedChapter, FetchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Displayed { index: usize },
    Failed { index: usize },
    /// A newer load started after this one; nothing was changed.
    Stale,
}

/// Everything the reader knows about the open novel.
#[derive(Debug, Clone)]
pub struct ReaderSession {
    novel: Novel,
    chapters: Vec<ChapterDescriptor>,
    manifest_failed: bool,
    current: usize,
    state: LoadState,
    view: ChapterView,
    scroll: usize,
    latest_seq: u64,
}

impl ReaderSession {
    pub fn new(novel: Novel, chapters: Vec<ChapterDescriptor>) -> Self {
        Self {
            novel,
            chapters,
            manifest_failed: false,
            current: 0,
            state: LoadState::Idle,
            view: ChapterView::Empty,
            scroll: 0,
            latest_seq: 0,
        }
    }

    /// Session for a novel whose manifest could not be loaded: no chapters,
    /// navigation disabled, title replaced by the error message.
    pub fn unavailable(novel: Novel) -> Self {
        Self {
            manifest_failed: true,
            ..Self::new(novel, Vec::new())
        }
    }

    pub fn open(source: &dyn Source, novel: Novel) -> Self {
        match loader::load_manifest(source, &novel) {
            Ok(chapters) => Self::new(novel, chapters),
            Err(err) => {
                tracing::error!("failed to load manifest for {}: {}", novel.id(), err);
                Self::unavailable(novel)
            }
        }
    }

    pub fn novel(&self) -> &Novel {
        &self.novel
    }

    pub fn chapters(&self) -> &[ChapterDescriptor] {
        &self.chapters
    }

    pub fn manifest_failed(&self) -> bool {
        self.manifest_failed
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_chapter(&self) -> Option<&ChapterDescriptor> {
        self.chapters.get(self.current)
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn view(&self) -> &ChapterView {
        &self.view
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading { .. })
    }

    pub fn title(&self) -> String {
        if self.manifest_failed {
            MANIFEST_ERROR.to_string()
        } else {
            self.novel.display_title()
        }
    }

    pub fn indicator(&self) -> Option<String> {
        if self.chapters.is_empty() {
            return None;
        }
        Some(format!("Chapter {} / {}", self.current + 1, self.chapters.len()))
    }

    pub fn can_go_previous(&self) -> bool {
        !self.chapters.is_empty() && self.current > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.current + 1 < self.chapters.len()
    }

    /// Index to open first: the stored last chapter, kept inside the list.
    pub fn initial_index(&self, store: &dyn PreferenceStore) -> eyre::Result<usize> {
        let stored = preferences::last_chapter(store, &self.novel)?;
        Ok(stored.min(self.chapters.len().saturating_sub(1)))
    }

    /// Start loading `index`. Out of range indices are ignored and leave
    /// the session untouched.
    pub fn begin_load(&mut self, index: usize) -> Option<LoadRequest> {
        let chapter = self.chapters.get(index)?.clone();

        self.latest_seq += 1;
        let seq = self.latest_seq;
        self.state = LoadState::Loading { index, seq };
        self.view = ChapterView::Placeholder(format!(
            "Loading Chapter {}: {}...",
            chapter.number, chapter.title
        ));
        self.scroll = 0;

        Some(LoadRequest {
            seq,
            index,
            novel: self.novel.clone(),
            chapter,
        })
    }

    pub fn go_previous(&mut self) -> Option<LoadRequest> {
        let index = self.current.checked_sub(1)?;
        self.begin_load(index)
    }

    pub fn go_next(&mut self) -> Option<LoadRequest> {
        self.begin_load(self.current + 1)
    }

    pub fn go_first(&mut self) -> Option<LoadRequest> {
        self.begin_load(0)
    }

    pub fn go_last(&mut self) -> Option<LoadRequest> {
        let last = self.chapters.len().checked_sub(1)?;
        self.begin_load(last)
    }

    /// Apply a finished fetch. Results of superseded requests are dropped.
    pub fn complete_load(
        &mut self,
        outcome: LoadOutcome,
        store: &mut dyn PreferenceStore,
    ) -> eyre::Result<Completion> {
        if outcome.seq != self.latest_seq {
            tracing::debug!(
                "discarding chapter {} result (request {} superseded by {})",
                outcome.index,
                outcome.seq,
                self.latest_seq
            );
            return Ok(Completion::Stale);
        }

        match outcome.result {
            Ok(loaded) => {
                self.current = outcome.index;
                self.state = LoadState::Displayed {
                    index: outcome.index,
                };
                self.view = ChapterView::Text(loaded.body);
                self.scroll = 0;
                preferences::remember_chapter(store, &self.novel, outcome.index)?;
                tracing::info!(
                    "displayed chapter {} of {} ({:?})",
                    outcome.index + 1,
                    self.novel.id(),
                    loaded.variant
                );
                Ok(Completion::Displayed {
                    index: outcome.index,
                })
            }
            Err(err) => {
                tracing::warn!(
                    "failed to load chapter {} of {}: {}",
                    outcome.index + 1,
                    self.novel.id(),
                    err
                );
                self.state = LoadState::Failed {
                    index: outcome.index,
                };
                self.view = ChapterView::Failed;
                self.scroll = 0;
                Ok(Completion::Failed {
                    index: outcome.index,
                })
            }
        }
    }

    /// Load `index` on the calling thread.
    pub fn load_now(
        &mut self,
        source: &dyn Source,
        store: &mut dyn PreferenceStore,
        index: usize,
    ) -> eyre::Result<Option<Completion>> {
        let Some(request) = self.begin_load(index) else {
            return Ok(None);
        };
        let outcome = request.run(source);
        self.complete_load(outcome, store).map(Some)
    }

    pub fn scroll_by(&mut self, delta: isize, max_row: usize) {
        self.scroll = self.scroll.saturating_add_signed(delta).min(max_row);
    }

    pub fn scroll_to(&mut self, row: usize, max_row: usize) {
        self.scroll = row.min(max_row);
    }
}
