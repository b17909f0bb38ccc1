use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input};

use crate::backend::http::HttpBackend;
use crate::backend::Backend;
use crate::config::{self, BackendConfig};
use crate::core::card::StreamStatus;
use crate::core::query;
use crate::core::state::{self, AppState, Event};

pub const METADATA_ONLY_NOTICE: &str = "No full stream available; showing metadata only.";
pub const IDLE_HINT: &str =
    "Search for music from Jamendo, SoundCloud, Audiomack, and Internet Archive.";

#[derive(Parser)]
#[command(
    name = "fulltrack",
    about = "Full-track music search across Jamendo, SoundCloud, Audiomack and Internet Archive"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Open the desktop window
    #[arg(long)]
    pub gui: bool,

    /// Backend base URL (overrides config and FULLTRACK_BACKEND_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub backend: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search every provider and resolve playable streams
    Search {
        /// Search text (at least 2 characters)
        query: Vec<String>,
        /// Also return tracks that only have previews or metadata
        /// (`--allow-metadata-only=false` overrides a configured default)
        #[arg(
            long,
            value_name = "BOOL",
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "true"
        )]
        allow_metadata_only: Option<bool>,
        /// Print the raw results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a single provider URL through the backend proxy
    Stream {
        #[arg(long)]
        url: String,
        #[arg(long)]
        provider: String,
    },
    /// Configure the backend address
    Config,
}

pub fn run(cli: Cli) -> Result<()> {
    let cfg = config::load_config();
    let base_url = cli.backend.clone().unwrap_or_else(|| cfg.base_url());

    match cli.command {
        Some(Commands::Search {
            query,
            allow_metadata_only,
            json,
        }) => {
            let backend = connect(&base_url)?;
            cmd_search(
                &backend,
                &query.join(" "),
                allow_metadata_only.unwrap_or(cfg.allow_metadata_only),
                json,
            )
        }
        Some(Commands::Stream { url, provider }) => {
            let backend = connect(&base_url)?;
            cmd_stream(&backend, &url, &provider)
        }
        Some(Commands::Config) => cmd_config(),
        None => {
            if cli.gui {
                #[cfg(feature = "gui")]
                {
                    let backend = connect(&base_url)?;
                    crate::gui::launch(backend, cfg.allow_metadata_only);
                    Ok(())
                }
                #[cfg(not(feature = "gui"))]
                {
                    anyhow::bail!(
                        "GUI support is not enabled. Rebuild with: cargo build --features gui"
                    );
                }
            } else {
                println!("usage: fulltrack <command> or fulltrack --gui");
                println!("Run fulltrack --help for more information.");
                Ok(())
            }
        }
    }
}

fn connect(base_url: &str) -> Result<HttpBackend> {
    let backend = HttpBackend::new(base_url)
        .with_context(|| format!("cannot use backend at {}", base_url))?;
    tracing::info!("using backend {}", backend.base_url());
    Ok(backend)
}

fn cmd_search(
    backend: &dyn Backend,
    text: &str,
    allow_metadata_only: bool,
    json: bool,
) -> Result<()> {
    if query::accept_query(text).is_none() {
        println!(
            "Type at least {} characters to search.",
            query::MIN_QUERY_LEN
        );
        return Ok(());
    }

    let mut app = AppState::new(allow_metadata_only);
    state::dispatch(&mut app, backend, Event::Submit(text.to_string()));

    if json {
        let results: Vec<_> = app.results().collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if app.is_empty() {
        println!("No results. {}", IDLE_HINT);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Title", "Artist", "Source", "License", "Download", "Stream"]);

    for card in app.cards() {
        let track = card.track();
        tracing::debug!("result: {} ({:?})", track.summary(), card.status());
        let (provider, license, download) = match card.best_source() {
            Some(s) => (
                s.provider_name.as_str(),
                s.license.as_deref().unwrap_or("-"),
                if s.download_allowed() { "allowed" } else { "-" },
            ),
            None => ("-", "-", "-"),
        };
        let stream = match card.status() {
            StreamStatus::Ready(url) => url.as_str(),
            _ => METADATA_ONLY_NOTICE,
        };

        table.add_row(vec![
            Cell::new(&track.title),
            Cell::new(track.display_artist()),
            Cell::new(provider),
            Cell::new(license),
            Cell::new(download),
            Cell::new(stream),
        ]);
    }

    println!("{table}");
    let total = app.cards().len();
    let playable = app.cards().iter().filter(|c| !c.is_metadata_only()).count();
    println!(
        "\n{} ({} playable, {} metadata only)",
        count_label(total, "result", "results"),
        playable,
        total - playable,
    );

    Ok(())
}

fn count_label(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

fn cmd_stream(backend: &dyn Backend, url: &str, provider: &str) -> Result<()> {
    let proxied = backend
        .resolve_stream(url, provider)
        .with_context(|| format!("could not resolve stream from {}", provider))?;
    println!("{}", proxied);
    Ok(())
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config();

    println!("Backend settings");
    println!(
        "({} overrides the saved address when set)\n",
        config::BACKEND_URL_ENV
    );

    let current_url = cfg
        .backend
        .base_url
        .clone()
        .unwrap_or_else(|| config::DEFAULT_BACKEND_URL.to_string());

    let base_url: String = Input::new()
        .with_prompt("Backend URL")
        .with_initial_text(current_url)
        .validate_with(|input: &String| -> Result<(), String> {
            HttpBackend::new(input).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()?;

    let allow_metadata_only = Confirm::new()
        .with_prompt("Allow metadata-only results by default?")
        .default(cfg.allow_metadata_only)
        .interact()?;

    cfg.backend = BackendConfig {
        base_url: Some(base_url),
    };
    cfg.allow_metadata_only = allow_metadata_only;

    config::save_config(&cfg)?;
    println!("\nSaved to {}", config::config_path().display());
    Ok(())
}
