mod board;
mod commands;
mod config;
mod error;
mod output;

use clap::{Parser, Subcommand};
use kz_core::types::event::Event;
use kz_core::{Kazi, RequestContext};
use kz_events::bus::{drain, EventBus};
use kz_events::types::{EventRecord, EventSource};
use owo_colors::{OwoColorize, Stream};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::dashboard::DashboardArgs;
use crate::commands::review::ReviewCommand;
use crate::commands::templates::TemplatesCommand;
use crate::config::Config;
use crate::error::{CliError, Result};

#[derive(Parser)]
#[command(name = "kz", version, about = "Multi-stage client review workflows")]
struct Cli {
    /// Board file holding review snapshots
    #[arg(long, global = true, env = "KAZI_BOARD")]
    board: Option<PathBuf>,
    /// Extra review templates (TOML)
    #[arg(long, global = true, env = "KAZI_TEMPLATES")]
    templates: Option<PathBuf>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(subcommand)]
    Templates(TemplatesCommand),
    #[command(subcommand)]
    Review(ReviewCommand),
    Dashboard(DashboardArgs),
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!(
                "{} {err}",
                "error:".if_supports_color(Stream::Stderr, |t| t.red())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("KAZI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let root = std::env::current_dir().map_err(|err| CliError::Config {
        message: format!("cannot read working directory: {err}"),
    })?;
    let config = Config::resolve(&root, cli.board, cli.templates, cli.json);
    let catalog = config.catalog()?;

    match cli.command {
        Command::Templates(cmd) => {
            let result = commands::templates::handle(&catalog, cmd)?;
            output::print_templates(&result, config.json)
        }
        Command::Review(cmd) => {
            let (store, baseline) = board::load(&config.board_path)?;
            let bus = EventBus::default();
            let mut rx = bus.subscribe();
            let kazi = Kazi::new(store, bus, catalog);
            let ctx = RequestContext::new(EventSource::Cli, None);

            let result = commands::review::handle(&kazi, &ctx, cmd)?;
            if result.mutated() {
                board::save(&config.board_path, &baseline, kazi.store().snapshot())?;
                debug!(path = %config.board_path.display(), "board saved");
            }
            let notifications = decode(&drain(&mut rx));
            output::print_review(&result, &notifications, config.json)
        }
        Command::Dashboard(args) => {
            let (store, _) = board::load(&config.board_path)?;
            let kazi = Kazi::new(store, EventBus::default(), catalog);
            let result = commands::dashboard::handle(&kazi, args)?;
            output::print_dashboard(&result, config.json)
        }
    }
}

fn decode(records: &[EventRecord]) -> Vec<Event> {
    records
        .iter()
        .filter_map(|record| match Event::from_record(record) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(kind = record.kind().unwrap_or("unknown"), error = %err, "skipping undecodable notification");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kz_core::types::{EventBody, ReviewId};
    use serde_json::json;

    #[test]
    fn test_decode_skips_unknown_bodies() {
        let id = ReviewId::generate();
        let opened = serde_json::to_value(EventBody::ReviewOpened {
            review_id: id.clone(),
        })
        .unwrap();
        let records = vec![
            EventRecord::new(1, EventSource::Cli, None, opened),
            EventRecord::new(2, EventSource::Cli, None, json!({ "type": "Ping" })),
        ];

        let events = decode(&records);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].seq, 1);
        assert_eq!(events[0].body, EventBody::ReviewOpened { review_id: id });
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "kz",
            "review",
            "list",
            "--filter",
            "in-review",
            "--json",
            "--board",
            "b.json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.board, Some(PathBuf::from("b.json")));
        assert!(matches!(cli.command, Command::Review(ReviewCommand::List { .. })));
    }
}
