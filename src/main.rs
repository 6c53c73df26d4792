use novel_reader::{
    cli::Cli,
    config::{self, Config},
    logging::{self, LogLevel},
    models::Novel,
    preferences::{MemoryStore, PreferenceStore},
    session::{CHAPTER_ERROR, Completion, MANIFEST_ERROR, ReaderSession},
    source::{self, Source},
    state::State,
    ui::reader::Reader,
};

use chrono::Local;
use clap::Parser;
use eyre::{Result, WrapErr};
use std::process::ExitCode;
use std::time::Duration;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let prefix = config::get_app_data_prefix()?;
    let _log_guard = logging::init(
        LogLevel::from_flags(cli.verbose, cli.debug),
        &prefix.join("logs"),
    );

    let config = match &cli.config {
        Some(path) => Config::load_from(path.clone())?,
        None => Config::new().wrap_err("could not load configuration")?,
    };
    tracing::debug!("configuration loaded from {}", config.filepath().display());

    if cli.history {
        print_history()?;
        return Ok(ExitCode::SUCCESS);
    }

    let target = cli.target()?;
    let location = normalize_source(
        target
            .source
            .as_deref()
            .unwrap_or(&config.settings.default_source),
    );
    let timeout = config
        .settings
        .request_timeout_secs
        .map(Duration::from_secs);
    let source = source::open_source(&location, timeout)?;

    if cli.dump {
        let Some(novel) = target.novel else {
            eyre::bail!("--dump needs a novel: pass --novel NAME or a reader URL");
        };
        return dump_chapter(source.as_ref(), &novel, cli.chapter);
    }

    let mut reader = Reader::new(config, State::new()?, source, location)?;
    reader.start(target.novel.as_deref())?;
    reader.run()?;
    Ok(ExitCode::SUCCESS)
}

/// Local directories are stored canonicalized so history entries match
/// no matter how the path was typed.
fn normalize_source(location: &str) -> String {
    if source::is_remote(location) {
        return location.to_string();
    }
    match std::fs::canonicalize(location) {
        Ok(path) => path.display().to_string(),
        Err(err) => {
            tracing::debug!("could not canonicalize source {}: {}", location, err);
            location.to_string()
        }
    }
}

fn print_history() -> Result<()> {
    let state = State::new()?;
    let items = state.get_from_history()?;
    if items.is_empty() {
        println!("No reading history.");
        return Ok(());
    }

    for item in items {
        println!(
            "{}  {}  {}",
            item.last_read.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            item.novel,
            item.source
        );
    }
    Ok(())
}

fn dump_chapter(source: &dyn Source, novel: &str, chapter: Option<usize>) -> Result<ExitCode> {
    let mut store: Box<dyn PreferenceStore> = match State::new() {
        Ok(state) => Box::new(state),
        Err(err) => {
            tracing::warn!("reading state unavailable, last chapter not remembered: {}", err);
            Box::new(MemoryStore::new())
        }
    };
    let mut session = ReaderSession::open(source, Novel::new(novel));
    if session.manifest_failed() {
        eprintln!("{MANIFEST_ERROR}");
        return Ok(ExitCode::FAILURE);
    }

    let index = match chapter {
        Some(number) => number.checked_sub(1),
        None => Some(session.initial_index(store.as_ref())?),
    };
    let completion = match index {
        Some(index) => session.load_now(source, store.as_mut(), index)?,
        None => None,
    };

    match completion {
        Some(Completion::Displayed { .. }) => {
            let body = session.view().text();
            print!("{body}");
            if !body.ends_with('\n') {
                println!();
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Completion::Failed { .. }) | Some(Completion::Stale) => {
            eprintln!("{CHAPTER_ERROR}");
            Ok(ExitCode::FAILURE)
        }
        None => {
            eprintln!(
                "No chapter {} in {} ({} chapters)",
                chapter.unwrap_or(0),
                novel,
                session.chapters().len()
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
