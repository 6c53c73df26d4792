use crate::models::{ChapterDescriptor, Novel};
use crate::source::{FetchError, Source};

/// The two trees a chapter body may live in, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterVariant {
    /// Post-processed text, `llm_chapters/`.
    Processed,
    /// Text as scraped, `raw_chapters/`.
    Raw,
}

impl ChapterVariant {
    pub fn folder(&self) -> &'static str {
        match self {
            ChapterVariant::Processed => "llm_chapters",
            ChapterVariant::Raw => "raw_chapters",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedChapter {
    pub body: String,
    pub variant: ChapterVariant,
}

pub fn manifest_path(novel: &Novel) -> String {
    format!("{}/manifest.json", novel.id())
}

pub fn chapter_path(novel: &Novel, variant: ChapterVariant, file: &str) -> String {
    format!("{}/{}/{}", novel.id(), variant.folder(), file)
}

pub const NOVEL_INDEX_PATH: &str = "manifest.json";

fn parse_json<T: serde::de::DeserializeOwned>(path: &str, text: &str) -> Result<T, FetchError> {
    serde_json::from_str(text).map_err(|e| FetchError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Fetch and parse `{novel}/manifest.json`.
///
/// Entries are taken as they are: duplicate files or gaps in `number`
/// are not rejected.
pub fn load_manifest(source: &dyn Source, novel: &Novel) -> Result<Vec<ChapterDescriptor>, FetchError> {
    let path = manifest_path(novel);
    let text = source.fetch_text(&path)?;
    let chapters: Vec<ChapterDescriptor> = parse_json(&path, &text)?;
    tracing::info!("manifest for {} lists {} chapters", novel.id(), chapters.len());
    Ok(chapters)
}

/// Fetch a chapter body, trying the processed tree first.
///
/// The raw tree is consulted once, and only when the processed copy is
/// missing; any other failure is returned as is.
pub fn fetch_chapter(
    source: &dyn Source,
    novel: &Novel,
    chapter: &ChapterDescriptor,
) -> Result<LoadedChapter, FetchError> {
    let preferred = chapter_path(novel, ChapterVariant::Processed, &chapter.file);
    match source.fetch_text(&preferred) {
        Ok(body) => Ok(LoadedChapter {
            body,
            variant: ChapterVariant::Processed,
        }),
        Err(err) if err.is_not_found() => {
            tracing::debug!("{} missing, falling back to raw text", preferred);
            let fallback = chapter_path(novel, ChapterVariant::Raw, &chapter.file);
            let body = source.fetch_text(&fallback)?;
            Ok(LoadedChapter {
                body,
                variant: ChapterVariant::Raw,
            })
        }
        Err(err) => Err(err),
    }
}

/// The optional root `manifest.json`: a list of novel folder names.
pub fn load_novel_index(source: &dyn Source) -> Result<Vec<String>, FetchError> {
    let text = source.fetch_text(NOVEL_INDEX_PATH)?;
    parse_json(NOVEL_INDEX_PATH, &text)
}
