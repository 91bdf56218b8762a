//! `brandmind retrieve`: semantic lookup over stored content.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use brandmind_types::content::ContentType;
use brandmind_types::retrieval::RetrievalQuery;

use super::preview;
use crate::state::AppState;

pub struct RetrieveOptions {
    pub limit: Option<usize>,
    pub threshold: Option<f32>,
    pub content_types: Vec<ContentType>,
    pub include_metadata: bool,
}

impl RetrieveOptions {
    fn into_query(self, state: &AppState, owner: Uuid, text: &str) -> RetrievalQuery {
        let defaults = &state.config.retrieval;
        RetrievalQuery::new(owner, text)
            .with_limit(self.limit.unwrap_or(defaults.default_limit))
            .with_threshold(self.threshold.unwrap_or(defaults.default_threshold))
            .with_content_types(self.content_types)
            .with_metadata(self.include_metadata)
    }
}

pub async fn retrieve(
    state: &AppState,
    owner: Uuid,
    text: &str,
    options: RetrieveOptions,
    json: bool,
) -> Result<()> {
    let query = options.into_query(state, owner, text);
    let result = state.retrieval.retrieve(&query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    if result.chunks.is_empty() {
        println!(
            "  {} No relevant context found (threshold {:.2}).",
            style("i").blue().bold(),
            query.similarity_threshold
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Similarity").fg(Color::White),
        Cell::new("Source").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Content").fg(Color::White),
    ]);

    for (rank, chunk) in result.chunks.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(format!("{:.3}", chunk.similarity)).fg(Color::Green),
            Cell::new(&chunk.source_label).fg(Color::Cyan),
            Cell::new(chunk.content_type.to_string()),
            Cell::new(preview(&chunk.content, 80)),
        ]);
    }

    println!("{table}");
    println!(
        "  {} of {} match(es) in {} ms",
        style(result.chunks.len()).bold(),
        result.total_matched,
        result.elapsed_ms
    );
    println!();
    Ok(())
}
