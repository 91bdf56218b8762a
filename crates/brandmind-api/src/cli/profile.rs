//! Brand profile commands: show, set, learn and voice-context.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use console::style;
use tokio::sync::broadcast;
use uuid::Uuid;

use brandmind_types::event::LearningEvent;
use brandmind_types::profile::{BrandProfile, PerformanceTier, ProfileUpdate, StyleGuidelines};

use crate::state::AppState;

/// Build a profile update from `profile set` flags. Empty lists leave the
/// field unchanged.
pub fn build_update(
    name: Option<String>,
    tones: Vec<(String, f32)>,
    values: Vec<String>,
    colors: Vec<String>,
    taboo_topics: Vec<String>,
    style: Option<String>,
) -> Result<ProfileUpdate> {
    let style_guidelines = style
        .map(|raw| serde_json::from_str::<StyleGuidelines>(&raw))
        .transpose()
        .context("--style must be a JSON object of style guidelines")?;

    let update = ProfileUpdate {
        brand_name: name,
        voice_tone: non_empty(tones).map(|t| t.into_iter().collect::<BTreeMap<_, _>>()),
        style_guidelines,
        brand_colors: non_empty(colors).map(|c| c.into_iter().collect::<BTreeSet<_>>()),
        brand_values: non_empty(values).map(|v| v.into_iter().collect::<BTreeSet<_>>()),
        competitor_mentions: None,
        taboo_topics: non_empty(taboo_topics).map(|t| t.into_iter().collect::<BTreeSet<_>>()),
    };

    if update.brand_name.is_none()
        && update.voice_tone.is_none()
        && update.style_guidelines.is_none()
        && update.brand_colors.is_none()
        && update.brand_values.is_none()
        && update.taboo_topics.is_none()
    {
        bail!("nothing to update; pass at least one of --name, --tone, --value, --color, --avoid, --style");
    }
    Ok(update)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

pub async fn show(state: &AppState, owner: Uuid, json: bool) -> Result<()> {
    let profile = state.brand.get_profile(owner).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    match profile {
        Some(profile) => print_profile(&profile),
        None => {
            println!();
            println!(
                "  {} No brand profile yet. Create one with `brandmind profile set`.",
                style("i").blue().bold()
            );
            println!();
        }
    }
    Ok(())
}

pub async fn set(state: &AppState, owner: Uuid, update: ProfileUpdate, json: bool) -> Result<()> {
    let rx = state.events.subscribe();
    let profile = state
        .brand
        .upsert_profile(owner, update)
        .await
        .context("failed to update brand profile")?;
    let refreshed = wait_for_refresh(state, rx).await;

    report_profile(&profile, refreshed, "Updated", json)
}

pub async fn learn(
    state: &AppState,
    owner: Uuid,
    text: &str,
    tier: PerformanceTier,
    json: bool,
) -> Result<()> {
    let rx = state.events.subscribe();
    let profile = state
        .brand
        .learn_from_copy(owner, text, tier)
        .await
        .context("failed to learn from copy")?;
    let refreshed = wait_for_refresh(state, rx).await;

    report_profile(&profile, refreshed, &format!("Learned from {tier}-performing copy;"), json)
}

pub async fn voice_context(state: &AppState, owner: Uuid, json: bool) -> Result<()> {
    let context = state.brand.voice_context(owner).await;
    if json {
        let result = serde_json::json!({ "owner_id": owner, "voice_context": context });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{context}");
    }
    Ok(())
}

/// Wait for the detached profile re-embedding so it is not cut off at exit.
///
/// Returns `Some(true)` when it succeeded, `Some(false)` when it failed and
/// `None` when it did not finish in time.
async fn wait_for_refresh(state: &AppState, mut rx: broadcast::Receiver<LearningEvent>) -> Option<bool> {
    let limit = Duration::from_secs(state.config.embedding.timeout_secs + 5);
    let outcome = tokio::time::timeout(limit, async {
        loop {
            match rx.recv().await {
                Ok(LearningEvent::ProfileRefreshed { .. }) => return Some(true),
                Ok(LearningEvent::ProfileRefreshFailed { error, .. }) => {
                    tracing::warn!(%error, "brand profile was saved but not re-embedded");
                    return Some(false);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await;
    outcome.ok().flatten()
}

fn report_profile(profile: &BrandProfile, refreshed: Option<bool>, verb: &str, json: bool) -> Result<()> {
    if json {
        let result = serde_json::json!({ "profile": profile, "reembedded": refreshed });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!("  {} {verb} brand profile", style("ok").green());
    match refreshed {
        Some(true) => {}
        Some(false) => println!(
            "  {} Profile saved, but its searchable copy was not refreshed",
            style("!").yellow().bold()
        ),
        None => println!(
            "  {} Profile saved; re-embedding did not finish in time",
            style("!").yellow().bold()
        ),
    }
    print_profile(profile);
    Ok(())
}

fn print_profile(profile: &BrandProfile) {
    println!();
    println!(
        "  {}",
        style(profile.brand_name.as_deref().unwrap_or("(unnamed brand)")).cyan().bold()
    );
    println!("  {}", style("── Voice ──").dim());
    if profile.voice_tone.is_empty() {
        println!("  {}", style("no tone learned yet").dim());
    }
    for (dimension, weight) in profile.top_tones(profile.voice_tone.len()) {
        let filled = (weight * 10.0).round() as usize;
        println!(
            "  {:<14} {}{} {:.2}",
            dimension,
            style("█".repeat(filled)).green(),
            style("░".repeat(10usize.saturating_sub(filled))).dim(),
            weight
        );
    }

    let guidelines = profile.style_guidelines.describe();
    if !guidelines.is_empty() {
        println!("  {}", style("── Style ──").dim());
        for line in guidelines {
            println!("  - {line}");
        }
    }
    print_set("Values", &profile.brand_values);
    print_set("Colors", &profile.brand_colors);
    print_set("Avoid", &profile.taboo_topics);
    println!(
        "  {}",
        style(format!("updated {}", profile.updated_at.format("%Y-%m-%d %H:%M UTC"))).dim()
    );
    println!();
}

fn print_set(label: &str, items: &BTreeSet<String>) {
    if items.is_empty() {
        return;
    }
    let joined: Vec<&str> = items.iter().map(String::as_str).collect();
    println!("  {:<8} {}", style(label).dim(), joined.join(", "));
}
