use clap::{Parser, Subcommand};
use regex::Regex;

use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::time::Duration;

use log::*;
use err_derive::Error;
use validator::Validate;

mod aspect;
#[cfg(feature = "bert")]
mod bert;
mod config;
mod dataset;
mod lang;
#[cfg(not(feature = "bert"))]
mod lexicon;
mod render;
mod senti;
mod studio;
mod tally;
mod youtube;

use self::config::Config;
use self::dataset::DatasetError;
use self::render::render;
use self::senti::{ClassificationError, Senti, VocabularyError};
use self::studio::{Limits, Report, Studio};
use self::youtube::{YouTube, YoutubeError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(display = "Config file invalid: {}", _0)]
    ValidationError(#[error(source)] validator::ValidationErrors),
    #[error(display = "Config syntax invalid: {}", _0)]
    ConfigError(#[error(source)] toml::de::Error),
    #[error(display = "Cannot read input")]
    IoError(#[error(source)] std::io::Error),
    #[error(display = "{}", _0)]
    Dataset(#[error(source)] DatasetError),
    #[error(display = "{}", _0)]
    Vocabulary(#[error(source)] VocabularyError),
    #[error(display = "Cannot load model: {}", _0)]
    Model(#[error(source)] ClassificationError),
    #[error(display = "YouTube unavailable: {}", _0)]
    Youtube(#[error(source)] YoutubeError),
    #[error(display = "Cannot watch for Ctrl-C")]
    Signal(#[error(source)] ctrlc::Error),
    #[error(display = "Bad command pattern")]
    Pattern(#[error(source)] regex::Error),
    #[error(display = "No YouTube API key, set youtube_api_key or YOUTUBE_API_KEY")]
    MissingApiKey,
    #[error(display = "Please enter a product, topic or channel")]
    EmptyQuery,
    #[error(display = "Channel {:?} not found", _0)]
    ChannelNotFound(String),
    #[error(display = "No comments found for {:?}", _0)]
    NoComments(String),
    #[error(display = "Unknown command {:?}, try dataset, search, channel or quit", _0)]
    UnknownCommand(String),
}

const APP_NAME: &str = "sentistudio";

#[derive(Debug, Parser)]
#[command(name = APP_NAME, version, about = "Sentiment of datasets and YouTube comments")]
struct Opt {
    /// TOML config, defaults are used when it does not exist
    #[arg(short, long, default_value = "sentistudio.toml")]
    config: PathBuf,

    #[arg(long)]
    debug: bool,

    /// Treat predictions under the confidence threshold as Neutral
    #[arg(long)]
    gate: bool,

    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify the text column of a CSV file
    Dataset {
        file: PathBuf,
        /// Write the table with its Sentiment column here
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// Classify comments under videos found for a product or topic
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Classify comments under the latest videos of a channel
    Channel {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Keep the models loaded and take one request per line
    Session,
}

#[derive(Debug, Clone, PartialEq)]
enum Request {
    Dataset { file: PathBuf, export: Option<PathBuf> },
    Search(String),
    Channel(String),
}

fn main() -> Result<(), Error> {
    let opt = Opt::parse();
    let mut config = load_config(&opt.config)?;
    if opt.debug {
        config.debug = true;
    }
    if opt.gate {
        config = config.with_gate();
    }
    if opt.api_key.is_some() {
        config.youtube_api_key = opt.api_key.clone();
    }
    config.validate()?;

    if config.debug {
        std::env::set_var("RUST_LOG", format!("{}=debug", APP_NAME));
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", format!("{}=info", APP_NAME));
    }
    pretty_env_logger::init();

    info!("Loading sentiment models");
    let senti = load_senti(&config)?;
    let studio = Studio::new(&senti, config.aspects);

    let request = match opt.cmd {
        Command::Session => return session(&studio, &config),
        Command::Dataset { file, export } => Request::Dataset { file, export },
        Command::Search { query } => Request::Search(query.join(" ")),
        Command::Channel { name } => Request::Channel(name.join(" ")),
    };
    run(&studio, &config, request)
}

fn load_config(path: &Path) -> Result<Config, Error> {
    if path.exists() {
        Ok(toml::from_str(&std::fs::read_to_string(path)?)?)
    } else {
        Ok(Config::default())
    }
}

#[cfg(not(feature = "bert"))]
fn load_senti(config: &Config) -> Result<Senti, Error> {
    use self::lexicon::Lexicon;

    for model in config.english_model.iter().chain(config.multilingual_model.iter()) {
        warn!("Built without the bert feature, ignoring model {}", model);
    }
    Ok(Senti::new(
        Box::new(Lexicon::new()),
        Box::new(Lexicon::new()),
        config.policy(),
    )?)
}

#[cfg(feature = "bert")]
fn load_senti(config: &Config) -> Result<Senti, Error> {
    use self::bert::{LocalBert, Sst2};
    use self::senti::Classifier;

    let english: Box<dyn Classifier> = match &config.english_model {
        Some(model) => Box::new(LocalBert::english(model)?),
        None => {
            info!("No english model configured, falling back to SST-2 without a neutral class");
            Box::new(Sst2::new()?)
        }
    };
    let multilingual: Box<dyn Classifier> = match &config.multilingual_model {
        Some(model) => Box::new(LocalBert::multilingual(model)?),
        None => {
            info!("No multilingual model configured, SST-2 handles every language");
            Box::new(Sst2::new()?)
        }
    };
    Ok(Senti::new(english, multilingual, config.policy())?)
}

fn youtube(config: &Config) -> Result<YouTube, Error> {
    let key = config
        .youtube_api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or(Error::MissingApiKey)?;
    Ok(YouTube::new(key, Duration::from_secs(config.timeout_secs))?)
}

fn run(studio: &Studio, config: &Config, request: Request) -> Result<(), Error> {
    let report: Report = match request {
        Request::Dataset { file, export } => {
            let report = studio.dataset_file(&file)?;
            if let (Some(export), Some(table)) = (export, report.table.as_ref()) {
                table.save(export)?;
            }
            report
        }
        Request::Search(topic) => studio.topic(
            &youtube(config)?,
            &topic,
            Limits {
                videos: config.topic_videos,
                comments: config.topic_comments,
            },
        )?,
        Request::Channel(name) => studio.channel(
            &youtube(config)?,
            &name,
            Limits {
                videos: config.channel_videos,
                comments: config.channel_comments,
            },
        )?,
    };
    println!("{}", render(&report, config.sample_rows));
    Ok(())
}

/// `Ok(None)` asks the session to end.
fn parse_request(pattern: &Regex, line: &str) -> Result<Option<Request>, Error> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        return Ok(None);
    }
    let caps = pattern
        .captures(line)
        .ok_or_else(|| Error::UnknownCommand(line.to_string()))?;
    let rest = caps["rest"].trim();
    let request = match caps["verb"].to_lowercase().as_str() {
        "dataset" => {
            let mut args = rest.split_whitespace();
            let file = args.next().map(PathBuf::from).ok_or(Error::EmptyQuery)?;
            Request::Dataset {
                file,
                export: args.next().map(PathBuf::from),
            }
        }
        "search" => Request::Search(rest.to_string()),
        _ => Request::Channel(rest.to_string()),
    };
    Ok(Some(request))
}

fn session(studio: &Studio, config: &Config) -> Result<(), Error> {
    let keep_running_arc = Arc::new(AtomicBool::new(true));

    debug!("Setting up stop signals");
    let keep_running_signal = keep_running_arc.clone();
    let mut signal_count = 0;
    ctrlc::set_handler(move || {
        if signal_count > 0 {
            std::process::exit(1);
        } else {
            (*keep_running_signal).store(false, Ordering::Relaxed);
            signal_count += 1;
        }
    })?;

    let pattern = Regex::new(r"(?i)^(?P<verb>dataset|search|channel)\s+(?P<rest>.+)$")?;
    println!("Commands: dataset <file.csv> [export.csv] | search <topic> | channel <name> | quit");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while (*keep_running_arc).load(Ordering::Relaxed) {
        print!("> ");
        io::stdout().flush()?;
        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        if !(*keep_running_arc).load(Ordering::Relaxed) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        match parse_request(&pattern, &line) {
            Ok(Some(request)) => {
                if let Err(e) = run(studio, config, request) {
                    error!("{}", e);
                }
            }
            Ok(None) => break,
            Err(e) => error!("{}", e),
        }
    }
    info!("Session over");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Regex {
        Regex::new(r"(?i)^(?P<verb>dataset|search|channel)\s+(?P<rest>.+)$").unwrap()
    }

    #[test]
    fn session_lines_become_requests() {
        let p = pattern();
        assert_eq!(
            parse_request(&p, "search iPhone 16 ").unwrap(),
            Some(Request::Search("iPhone 16".into()))
        );
        assert_eq!(
            parse_request(&p, "Channel Marques Brownlee").unwrap(),
            Some(Request::Channel("Marques Brownlee".into()))
        );
        assert_eq!(
            parse_request(&p, "dataset reviews.csv out.csv").unwrap(),
            Some(Request::Dataset {
                file: "reviews.csv".into(),
                export: Some("out.csv".into()),
            })
        );
        assert_eq!(parse_request(&p, "QUIT").unwrap(), None);
    }

    #[test]
    fn unknown_lines_are_rejected() {
        let p = pattern();
        assert!(matches!(parse_request(&p, "dance"), Err(Error::UnknownCommand(_))));
        assert!(matches!(parse_request(&p, "search"), Err(Error::UnknownCommand(_))));
    }

    #[test]
    fn missing_config_file_means_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = load_config(&dir.path().join("absent.toml"))?;
        assert_eq!(config.sample_rows, Config::default().sample_rows);

        let path = dir.path().join("sentistudio.toml");
        std::fs::write(&path, "sample_rows = 5\naspects = \"extended\"\n")?;
        assert_eq!(load_config(&path)?.sample_rows, 5);
        Ok(())
    }

    #[test]
    fn search_needs_an_api_key() {
        let config = Config::default();
        assert!(matches!(youtube(&config), Err(Error::MissingApiKey)));
    }

    #[test]
    fn cli_parses_subcommands() {
        let opt = Opt::try_parse_from(["sentistudio", "--gate", "dataset", "in.csv", "-e", "out.csv"]).unwrap();
        assert!(opt.gate);
        match opt.cmd {
            Command::Dataset { file, export } => {
                assert_eq!(file, PathBuf::from("in.csv"));
                assert_eq!(export, Some(PathBuf::from("out.csv")));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Opt::try_parse_from(["sentistudio", "search"]).is_err());
    }
}
