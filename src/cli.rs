use clap::{ArgAction, Parser};
use reqwest::Url;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "novel-reader",
    version,
    about = "Terminal reader for serialized novels published as static chapter files.",
    long_about = None
)]
pub struct Cli {
    /// Print reading history
    #[clap(short = 'r', long)]
    pub history: bool,

    /// Print a chapter to stdout instead of starting the reader
    #[clap(short, long)]
    pub dump: bool,

    /// Chapter number to dump (1-based position in the manifest)
    #[clap(long, value_name = "N", requires = "dump")]
    pub chapter: Option<usize>,

    /// Directory or http(s) URL containing the novel folders
    #[clap(short = 's', long, value_name = "DIR|URL")]
    pub source: Option<String>,

    /// Novel folder name, e.g. `supreme-magus`
    #[clap(short = 'n', long)]
    pub novel: Option<String>,

    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug output
    #[clap(long)]
    pub debug: bool,

    /// Reader URL such as `https://host/novels/index.html?novel=supreme-magus`
    #[clap(name = "URL")]
    pub url: Option<String>,
}

/// Where to read from, resolved from the flags and a reader URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub source: Option<String>,
    pub novel: Option<String>,
}

impl Cli {
    /// Explicit `--source`/`--novel` win over what the URL carries.
    pub fn target(&self) -> eyre::Result<Target> {
        let from_url = match self.url.as_deref() {
            Some(url) => parse_reader_url(url)?,
            None => Target {
                source: None,
                novel: None,
            },
        };

        Ok(Target {
            source: self.source.clone().or(from_url.source),
            novel: self.novel.clone().or(from_url.novel),
        })
    }
}

/// Split a reader page URL into its directory (the source) and the
/// `novel` query parameter.
pub fn parse_reader_url(input: &str) -> eyre::Result<Target> {
    let url = Url::parse(input)?;
    let novel = url
        .query_pairs()
        .find(|(key, _)| key == "novel")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty());

    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);
    // The page itself lives next to the novel folders
    let source = base.join("./")?.to_string();

    Ok(Target {
        source: Some(source),
        novel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_url_is_split() {
        let target = parse_reader_url("https://example.org/novels/index.html?novel=supreme-magus").unwrap();
        assert_eq!(target.source.as_deref(), Some("https://example.org/novels/"));
        assert_eq!(target.novel.as_deref(), Some("supreme-magus"));
    }

    #[test]
    fn test_reader_url_without_novel() {
        let target = parse_reader_url("https://example.org/novels/").unwrap();
        assert_eq!(target.source.as_deref(), Some("https://example.org/novels/"));
        assert_eq!(target.novel, None);
    }

    #[test]
    fn test_flags_override_url() {
        let cli = Cli::parse_from([
            "novel-reader",
            "--novel",
            "other",
            "https://example.org/index.html?novel=demo",
        ]);
        let target = cli.target().unwrap();
        assert_eq!(target.novel.as_deref(), Some("other"));
        assert_eq!(target.source.as_deref(), Some("https://example.org/"));
    }

    #[test]
    fn test_chapter_requires_dump() {
        assert!(Cli::try_parse_from(["novel-reader", "--chapter", "2"]).is_err());
        let cli = Cli::try_parse_from(["novel-reader", "--dump", "--chapter", "2", "-n", "demo"]).unwrap();
        assert_eq!(cli.chapter, Some(2));
    }
}
