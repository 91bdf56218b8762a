//! CLI command definitions and dispatch for the `brandmind` binary.
//!
//! Uses clap derive macros for argument parsing. Every command that touches
//! stored data is scoped to one owner, given by `--owner` or
//! `BRANDMIND_OWNER_ID`.

pub mod content;
pub mod feedback;
pub mod profile;
pub mod retrieve;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

use brandmind_types::content::ContentType;
use brandmind_types::feedback::FeedbackAction;
use brandmind_types::profile::PerformanceTier;

/// Semantic memory and brand voice learning for marketing agents.
#[derive(Parser)]
#[command(name = "brandmind", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log lines as JSON on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Owner (tenant) whose data the command reads and writes.
    #[arg(long, global = true, env = "BRANDMIND_OWNER_ID")]
    pub owner: Option<Uuid>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split text into overlapping chunks without storing anything.
    Chunk {
        /// File to read; reads stdin when omitted.
        file: Option<PathBuf>,

        /// Target chunk length in characters (defaults to config).
        #[arg(long)]
        size: Option<usize>,

        /// Characters shared between chunks (defaults to config).
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Embed and store one piece of content.
    Store {
        /// Content text; use --file to read it from disk instead.
        text: Option<String>,

        /// Read the content from a file.
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Content type (marketing_copy, campaign, document, ...).
        #[arg(long = "type", default_value = "marketing_copy")]
        content_type: ContentType,

        /// Human-readable title shown as the source label.
        #[arg(long)]
        title: Option<String>,

        /// Identifier of the domain record this content came from.
        #[arg(long = "ref")]
        content_ref_id: Option<String>,

        /// Tag to attach (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Chunk a document and store every chunk.
    Ingest {
        /// Document to ingest.
        file: PathBuf,

        #[arg(long = "type", default_value = "document")]
        content_type: ContentType,

        /// Title for every chunk (defaults to the file name).
        #[arg(long)]
        title: Option<String>,
    },

    /// Retrieve stored content similar to a query.
    Retrieve {
        query: String,

        /// Maximum number of chunks (defaults to config).
        #[arg(long)]
        limit: Option<usize>,

        /// Minimum similarity in [0, 1] (defaults to config).
        #[arg(long)]
        threshold: Option<f32>,

        /// Restrict to a content type (repeatable).
        #[arg(long = "type")]
        content_types: Vec<ContentType>,

        /// Omit chunk metadata from the result.
        #[arg(long)]
        no_metadata: bool,
    },

    /// Record feedback on an agent's output.
    Feedback {
        /// Agent that produced the output.
        agent: String,

        /// approve, reject or edit.
        action: FeedbackAction,

        /// The output as the agent produced it.
        #[arg(long)]
        original: String,

        /// The output after a human edited it.
        #[arg(long)]
        edited: Option<String>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Manage learned preferences.
    Preference {
        #[command(subcommand)]
        action: PreferenceCommand,
    },

    /// Show or edit the brand profile.
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Nudge the brand profile toward the style of a piece of copy.
    Learn {
        /// Copy text; use --file to read it from disk instead.
        text: Option<String>,

        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// How well the copy performed: high, medium or low.
        #[arg(long, default_value = "medium")]
        tier: PerformanceTier,
    },

    /// Print the prompt-ready brand voice description.
    #[command(name = "voice-context")]
    VoiceContext,

    /// Show configuration, cache sizing and stored row counts.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum PreferenceCommand {
    /// Seed or overwrite a preference.
    Set {
        /// Preference type (e.g. "tone").
        preference_type: String,

        /// Value as JSON; plain text is stored as a JSON string.
        value: String,

        /// Initial confidence in [0, 1].
        #[arg(long, default_value_t = 0.5)]
        confidence: f32,
    },

    /// List the owner's preferences.
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Show the current profile.
    Show,

    /// Update profile fields; omitted fields are left unchanged.
    Set {
        #[arg(long)]
        name: Option<String>,

        /// Tone weight as `dimension=weight` (repeatable, replaces all tones).
        #[arg(long = "tone", value_parser = parse_tone)]
        tones: Vec<(String, f32)>,

        /// Brand value (repeatable, replaces all values).
        #[arg(long = "value")]
        values: Vec<String>,

        /// Brand color (repeatable, replaces all colors).
        #[arg(long = "color")]
        colors: Vec<String>,

        /// Topic to avoid (repeatable, replaces all taboo topics).
        #[arg(long = "avoid")]
        taboo_topics: Vec<String>,

        /// Style guidelines as a JSON object.
        #[arg(long)]
        style: Option<String>,
    },
}

/// Parse `dimension=weight`.
fn parse_tone(raw: &str) -> Result<(String, f32), String> {
    let (name, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected dimension=weight, got '{raw}'"))?;
    let weight: f32 = weight
        .trim()
        .parse()
        .map_err(|_| format!("invalid tone weight in '{raw}'"))?;
    Ok((name.trim().to_lowercase(), weight))
}

/// The owner id every data command is scoped to.
pub fn require_owner(owner: Option<Uuid>) -> Result<Uuid> {
    owner.context("an owner id is required (pass --owner or set BRANDMIND_OWNER_ID)")
}

/// Inline text, a file, or stdin, in that order.
pub async fn read_input(text: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut tokio::io::stdin(), &mut buf)
        .await
        .context("failed to read stdin")?;
    Ok(buf)
}

/// First `max` characters of `text` on one line, with an ellipsis when cut.
pub fn preview(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}
