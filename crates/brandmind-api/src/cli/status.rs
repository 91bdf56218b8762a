//! System status command.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use brandmind_core::storage::EmbeddingRepository;

use crate::state::AppState;

/// Display configuration, cache sizing and, for an owner, stored row counts.
pub async fn status(state: &AppState, owner: Option<Uuid>, json: bool) -> Result<()> {
    let stored_rows = match owner {
        Some(owner) => Some(
            state
                .content
                .repository()
                .count(&owner)
                .await
                .context("failed to count stored content")?,
        ),
        None => None,
    };
    let purged = state.caches.purge_expired();
    let caches = state.caches.stats();
    let embedding = &state.config.embedding;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "embedding": {
                "base_url": embedding.base_url,
                "model": embedding.model,
                "dimension": embedding.dimension,
            },
            "caches": caches,
            "purged_expired": purged,
            "owner_id": owner,
            "stored_rows": stored_rows,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} Brandmind v{}", style("*").bold(), env!("CARGO_PKG_VERSION"));
    println!();
    println!("  {}", style("── Storage ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).cyan());
    if let (Some(owner), Some(rows)) = (owner, stored_rows) {
        println!("  Rows for {}: {}", style(owner).dim(), style(rows).bold());
    }
    println!();
    println!("  {}", style("── Embedding ──").dim());
    println!("  Model:     {} ({} dims)", style(&embedding.model).cyan(), embedding.dimension);
    println!("  Endpoint:  {}", embedding.base_url);
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Cache").fg(Color::White),
        Cell::new("Entries").fg(Color::White),
        Cell::new("Capacity").fg(Color::White),
        Cell::new("TTL (s)").fg(Color::White),
    ]);
    for cache in &caches {
        table.add_row(vec![
            Cell::new(cache.name).fg(Color::Cyan),
            Cell::new(cache.len),
            Cell::new(cache.capacity),
            Cell::new(cache.ttl_secs),
        ]);
    }
    println!("{table}");
    if purged > 0 {
        println!("  {}", style(format!("Purged {purged} expired entries")).dim());
    }
    println!();
    Ok(())
}
