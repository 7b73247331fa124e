use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use subtitle_tool::{
    Language, ProgressEvent, ProviderEvent, SearchQuery, Settings, Subtitle, SubtitleToolError,
    download_subtitle, open_in_editor, search_subtitles,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// How results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One line per subtitle
    Text,
    /// A single JSON array
    Json,
}

/// Search subtitles for a TV show on several providers at once
#[derive(Debug, Parser)]
#[command(name = "subtitle_tool", version, about)]
struct Cli {
    /// Name of the show
    #[arg(long)]
    name: String,

    /// Season number
    #[arg(long)]
    season: Option<u32>,

    /// Episode number
    #[arg(long)]
    episode: Option<u32>,

    /// Language code, or "all"
    #[arg(long, default_value = Language::ALL)]
    language: String,

    /// Download and extract the subtitles
    #[arg(long, default_value_t = false)]
    download: bool,

    /// Where to write extracted subtitles
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Open each extracted subtitle with this editor
    #[arg(long)]
    editor: Option<String>,

    /// Keep only the first N results (0 keeps all)
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Output extra info
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Refuse to search unless both season and episode are given
    #[arg(long, default_value_t = false)]
    require_episode: bool,

    /// Give up on providers that take longer than this many seconds (0 waits forever)
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

impl Cli {
    /// Validates the arguments and turns them into a search query
    fn query(&self) -> Result<SearchQuery, SubtitleToolError> {
        let mut query = SearchQuery::new(self.name.as_str())?
            .with_language(Language::parse(&self.language))
            .with_limit(self.limit);

        if let Some(season) = self.season {
            query = query.with_season(season)?;
        }
        if let Some(episode) = self.episode {
            query = query.with_episode(episode)?;
        }
        if self.require_episode {
            query.require_episode()?;
        }

        Ok(query)
    }

    fn settings(&self) -> Settings {
        Settings {
            search_deadline: (self.timeout > 0).then(|| Duration::from_secs(self.timeout)),
            ..Settings::default()
        }
    }
}

/// Sets up logging to stderr, keeping stdout for results
///
/// `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,subtitle_tool=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Handles progress events and logs them
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Started {
            show_name,
            provider_count,
        } => {
            info!("Searching {} provider(s) for '{}'...", provider_count, show_name);
        }
        ProgressEvent::Provider(ProviderEvent::Succeeded { provider, count }) => {
            info!("{} found {} subtitle(s)", provider, count);
        }
        ProgressEvent::Provider(ProviderEvent::Failed { provider, message }) => {
            info!("{} failed: {}", provider, message);
        }
        ProgressEvent::Ranked { count } => {
            info!("{} subtitle(s) after ranking", count);
        }
    }
}

fn print_subtitles(subtitles: &[Subtitle], format: OutputFormat) -> Result<(), SubtitleToolError> {
    match format {
        OutputFormat::Text => {
            for subtitle in subtitles {
                println!(
                    "Subtitle for: {} available in lang: {}",
                    subtitle.title, subtitle.language
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(subtitles)?);
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), SubtitleToolError> {
    let query = cli.query()?;
    let settings = cli.settings();

    let client = settings.http_client()?;
    let providers = settings.providers(&client);

    let outcome = search_subtitles(
        &query,
        &providers,
        settings.search_deadline,
        handle_progress_event,
    );

    if let Some(error) = &outcome.error {
        if outcome.is_partial() {
            warn!("Some providers failed: {}", error);
        } else {
            warn!("No provider returned results, failures: {}", error);
        }
    }

    if outcome.subtitles.is_empty() {
        return Err(SubtitleToolError::NoSubtitlesFound);
    }

    // JSON output is for scripts; it never downloads
    if cli.format == OutputFormat::Json || !cli.download {
        return print_subtitles(&outcome.subtitles, cli.format);
    }

    info!("downloading subtitles: {}", outcome.subtitles.len());
    for subtitle in &outcome.subtitles {
        let saved_to = download_subtitle(&client, subtitle, &cli.output)?;
        info!("successfully downloaded {}", subtitle.url);
        println!("{}", saved_to.display());

        if let Some(editor) = &cli.editor {
            open_in_editor(editor, &saved_to)?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        if matches!(e, SubtitleToolError::Query(_)) {
            eprintln!(
                "usage: subtitle_tool --name <name> --season <season_number> --episode <episode_number> --download"
            );
        }
        process::exit(1);
    }
}
