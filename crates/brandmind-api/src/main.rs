//! Brandmind CLI entry point.
//!
//! Binary name: `brandmind`
//!
//! Parses CLI arguments, initializes tracing, the database and services, then
//! dispatches to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use brandmind_observe::{LogFormat, TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, PreferenceCommand, ProfileCommand, require_owner};
use state::{AppState, load_app_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut tracing_options = TracingOptions::from_verbosity(cli.verbose, cli.quiet);
    tracing_options.enable_otel = cli.otel;
    if cli.log_json {
        tracing_options.format = LogFormat::Json;
    }
    if let Err(e) = init_tracing(&tracing_options) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "brandmind", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_app_config().await;

    // Chunking is pure and needs no database
    if let Commands::Chunk { file, size, overlap } = cli.command {
        let size = size.unwrap_or(config.storage.chunk_size);
        let overlap = overlap.unwrap_or(config.storage.chunk_overlap);
        return cli::content::chunk(file.as_deref(), size, overlap, cli.json).await;
    }

    let state = AppState::init(config).await?;
    let json = cli.json;

    match cli.command {
        Commands::Store {
            text,
            file,
            content_type,
            title,
            content_ref_id,
            tags,
        } => {
            let owner = require_owner(cli.owner)?;
            let text = cli::read_input(text, file.as_deref()).await?;
            let metadata = cli::content::cli_metadata(title, tags);
            cli::content::store(&state, owner, content_type, &text, metadata, content_ref_id, json)
                .await?;
        }

        Commands::Ingest {
            file,
            content_type,
            title,
        } => {
            let owner = require_owner(cli.owner)?;
            cli::content::ingest(&state, owner, &file, content_type, title, json).await?;
        }

        Commands::Retrieve {
            query,
            limit,
            threshold,
            content_types,
            no_metadata,
        } => {
            let owner = require_owner(cli.owner)?;
            let options = cli::retrieve::RetrieveOptions {
                limit,
                threshold,
                content_types,
                include_metadata: !no_metadata,
            };
            cli::retrieve::retrieve(&state, owner, &query, options, json).await?;
        }

        Commands::Feedback {
            agent,
            action,
            original,
            edited,
            note,
        } => {
            let owner = require_owner(cli.owner)?;
            cli::feedback::record(
                &state,
                owner,
                &agent,
                action,
                &original,
                edited.as_deref(),
                note.as_deref(),
                json,
            )
            .await?;
        }

        Commands::Preference { action } => {
            let owner = require_owner(cli.owner)?;
            match action {
                PreferenceCommand::Set {
                    preference_type,
                    value,
                    confidence,
                } => {
                    cli::feedback::set_preference(&state, owner, &preference_type, &value, confidence, json)
                        .await?;
                }
                PreferenceCommand::List => {
                    cli::feedback::list_preferences(&state, owner, json).await?;
                }
            }
        }

        Commands::Profile { action } => {
            let owner = require_owner(cli.owner)?;
            match action {
                ProfileCommand::Show => cli::profile::show(&state, owner, json).await?,
                ProfileCommand::Set {
                    name,
                    tones,
                    values,
                    colors,
                    taboo_topics,
                    style,
                } => {
                    let update = cli::profile::build_update(name, tones, values, colors, taboo_topics, style)?;
                    cli::profile::set(&state, owner, update, json).await?;
                }
            }
        }

        Commands::Learn { text, file, tier } => {
            let owner = require_owner(cli.owner)?;
            let text = cli::read_input(text, file.as_deref()).await?;
            cli::profile::learn(&state, owner, &text, tier, json).await?;
        }

        Commands::VoiceContext => {
            let owner = require_owner(cli.owner)?;
            cli::profile::voice_context(&state, owner, json).await?;
        }

        Commands::Status => {
            cli::status::status(&state, cli.owner, json).await?;
        }

        Commands::Chunk { .. } | Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
