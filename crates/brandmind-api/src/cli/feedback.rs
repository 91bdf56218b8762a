//! Feedback and preference commands.

use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use brandmind_core::learning::learner::{MIN_EVENTS_FOR_LEARNING, POSITIVE_RATE_THRESHOLD};
use brandmind_types::event::LearningEvent;
use brandmind_types::feedback::FeedbackAction;
use brandmind_types::preference::TONE_PREFERENCE;

use crate::state::AppState;

/// How long to wait for a detached reinforcement before the process exits.
const REINFORCEMENT_WAIT: Duration = Duration::from_secs(5);

/// Record feedback, then report what the learner did with it.
#[allow(clippy::too_many_arguments)]
pub async fn record(
    state: &AppState,
    owner: Uuid,
    agent: &str,
    action: FeedbackAction,
    original: &str,
    edited: Option<&str>,
    note: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut rx = state.events.subscribe();
    state
        .learner
        .record_feedback(owner, agent, action, original, edited, note)
        .await;

    let summary = state
        .learner
        .feedback_summary(owner, agent)
        .await
        .context("failed to load the feedback window")?;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    // A reinforcement runs detached; wait for it so it is not cut off at exit.
    let has_tone = state
        .learner
        .preferences(owner)
        .await
        .map(|prefs| prefs.iter().any(|p| p.preference_type == TONE_PREFERENCE))
        .unwrap_or(false);
    let reinforced = events
        .iter()
        .any(|e| matches!(e, LearningEvent::PreferenceReinforced { .. }));
    if has_tone
        && !reinforced
        && summary.total >= MIN_EVENTS_FOR_LEARNING
        && summary.positive_rate() > POSITIVE_RATE_THRESHOLD
    {
        let waited = tokio::time::timeout(REINFORCEMENT_WAIT, async {
            loop {
                match rx.recv().await {
                    Ok(event @ LearningEvent::PreferenceReinforced { .. }) => return Some(event),
                    Ok(_) => continue,
                    Err(_) => return None,
                }
            }
        })
        .await;
        match waited {
            Ok(Some(event)) => events.push(event),
            _ => tracing::warn!("tone reinforcement did not finish before exit"),
        }
    }

    if json {
        let result = serde_json::json!({
            "owner_id": owner,
            "agent": agent,
            "action": action,
            "window": summary,
            "events": events,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    if !events.iter().any(|e| matches!(e, LearningEvent::FeedbackRecorded { .. })) {
        println!(
            "  {} Feedback could not be saved (see logs with -v)",
            style("!").yellow().bold()
        );
    } else {
        println!(
            "  {} Recorded {} for '{}'",
            style("ok").green(),
            style(action).cyan(),
            style(agent).cyan(),
        );
    }
    println!(
        "  Window: {} event(s), {:.0}% positive, {:.0}% edits",
        summary.total,
        summary.positive_rate() * 100.0,
        summary.edit_rate() * 100.0
    );
    for event in &events {
        match event {
            LearningEvent::PreferenceReinforced {
                confidence_score,
                sample_size,
                ..
            } => println!(
                "  {} Tone preference reinforced: confidence {:.2} over {} sample(s)",
                style("+").green().bold(),
                confidence_score,
                sample_size
            ),
            LearningEvent::PreferenceReviewSuggested { edit_rate, .. } => println!(
                "  {} Edits dominate ({:.0}%); consider reviewing preferences",
                style("!").yellow().bold(),
                edit_rate * 100.0
            ),
            _ => {}
        }
    }
    println!();
    Ok(())
}

/// Seed or overwrite a preference. Non-JSON values are stored as strings.
pub async fn set_preference(
    state: &AppState,
    owner: Uuid,
    preference_type: &str,
    value: &str,
    confidence: f32,
    json: bool,
) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    let record = state
        .learner
        .set_preference(owner, preference_type, value, confidence)
        .await
        .context("failed to save preference")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!();
        println!(
            "  {} Set '{}' = {} (confidence {:.2})",
            style("ok").green(),
            style(&record.preference_type).cyan(),
            record.value,
            record.confidence_score
        );
        println!();
    }
    Ok(())
}

pub async fn list_preferences(state: &AppState, owner: Uuid, json: bool) -> Result<()> {
    let records = state
        .learner
        .preferences(owner)
        .await
        .context("failed to load preferences")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!();
    if records.is_empty() {
        println!("  {} No preferences learned yet.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Type").fg(Color::White),
        Cell::new("Value").fg(Color::White),
        Cell::new("Confidence").fg(Color::White),
        Cell::new("Samples").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);
    for record in &records {
        table.add_row(vec![
            Cell::new(&record.preference_type).fg(Color::Cyan),
            Cell::new(record.value.to_string()),
            Cell::new(format!("{:.2}", record.confidence_score)),
            Cell::new(record.sample_size),
            Cell::new(record.last_updated.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }
    println!("{table}");
    println!();
    Ok(())
}
