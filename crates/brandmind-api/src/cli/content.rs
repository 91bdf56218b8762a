//! Content commands: chunk, store and ingest.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use brandmind_core::storage::{chunk_spans, chunk_text};
use brandmind_types::content::{ContentMetadata, ContentType};

use super::{preview, read_input};
use crate::state::AppState;

/// Metadata for content entered on the command line.
pub fn cli_metadata(title: Option<String>, tags: Vec<String>) -> ContentMetadata {
    ContentMetadata {
        source: Some("cli".to_string()),
        title,
        tags,
        ..ContentMetadata::default()
    }
}

/// Split text into chunks and print them.
pub async fn chunk(file: Option<&Path>, size: usize, overlap: usize, json: bool) -> Result<()> {
    let text = read_input(None, file).await?;
    let spans = chunk_spans(&text, size, overlap);
    let chunks = chunk_text(&text, size, overlap);

    if json {
        let items: Vec<serde_json::Value> = spans
            .iter()
            .zip(&chunks)
            .enumerate()
            .map(|(index, (span, chunk))| {
                serde_json::json!({
                    "index": index,
                    "start": span.start,
                    "end": span.end,
                    "text": chunk,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if chunks.is_empty() {
        println!();
        println!("  {} Nothing to chunk.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Bytes").fg(Color::White),
        Cell::new("Chars").fg(Color::White),
        Cell::new("Preview").fg(Color::White),
    ]);
    for (index, (span, chunk)) in spans.iter().zip(&chunks).enumerate() {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(format!("{}..{}", span.start, span.end)),
            Cell::new(chunk.chars().count()),
            Cell::new(preview(chunk, 60)),
        ]);
    }

    println!();
    println!("{table}");
    println!(
        "  {} chunk(s), size {size}, overlap {overlap}",
        style(chunks.len()).bold()
    );
    println!();
    Ok(())
}

/// Embed and store one piece of content.
pub async fn store(
    state: &AppState,
    owner: Uuid,
    content_type: ContentType,
    text: &str,
    metadata: ContentMetadata,
    content_ref_id: Option<String>,
    json: bool,
) -> Result<()> {
    let id = state
        .content
        .store(owner, content_type.clone(), text, metadata, content_ref_id)
        .await
        .context("failed to store content")?;

    if json {
        let result = serde_json::json!({
            "id": id,
            "owner_id": owner,
            "content_type": content_type,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Stored {} as {}",
            style("ok").green(),
            style(content_type.label()).cyan(),
            style(id).dim(),
        );
        println!();
    }
    Ok(())
}

/// Chunk a document file and store every chunk.
pub async fn ingest(
    state: &AppState,
    owner: Uuid,
    file: &Path,
    content_type: ContentType,
    title: Option<String>,
    json: bool,
) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let title = title.or_else(|| file.file_name().map(|n| n.to_string_lossy().into_owned()));
    let metadata = ContentMetadata {
        source: Some(file.display().to_string()),
        title,
        ..ContentMetadata::default()
    };

    let storage = &state.config.storage;
    let expected = chunk_text(&text, storage.chunk_size, storage.chunk_overlap).len();
    let ids = state
        .content
        .store_document(owner, content_type, &text, metadata)
        .await;

    if json {
        let result = serde_json::json!({
            "file": file.display().to_string(),
            "chunks": expected,
            "stored": ids,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    if ids.len() == expected {
        println!(
            "  {} Ingested {} in {} chunk(s)",
            style("ok").green(),
            style(file.display()).cyan(),
            style(ids.len()).bold(),
        );
    } else {
        println!(
            "  {} Stored {} of {} chunk(s) from {} (see logs with -v)",
            style("!").yellow().bold(),
            style(ids.len()).bold(),
            expected,
            style(file.display()).cyan(),
        );
    }
    println!();
    Ok(())
}
