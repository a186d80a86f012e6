use anyhow::{Context, Result};
use caldir_skill_core::{CreationOutcome, EventStore, Locale, SkillConfig, SlotFillOrchestrator};
use owo_colors::OwoColorize;

use crate::terminal::TerminalConversation;

pub async fn run(utterance: Vec<String>, locale: Option<Locale>) -> Result<()> {
    let mut config = SkillConfig::load().context("Failed to load configuration")?;
    if let Some(locale) = locale {
        config.locale = locale;
    }

    let orchestrator = SlotFillOrchestrator::from_config(&config)?;
    let mut store = EventStore::from_config(&config)
        .with_context(|| format!("Failed to open calendar in {}", config.mirror_path().display()))?;

    // Ends once the store, and with it the sender, is dropped.
    let mut notifications = store.subscribe();
    let relay = tokio::spawn(async move {
        while let Ok(notification) = notifications.recv().await {
            println!(
                "{}",
                format!("  {} {}", notification.topic, notification.payload()).dimmed()
            );
        }
    });

    let utterance = (!utterance.is_empty()).then(|| utterance.join(" "));
    let locale = config.locale;
    let retries = config.prompt_retries;

    let outcome = tokio::task::spawn_blocking(move || {
        let mut conversation = TerminalConversation::new(locale, retries);
        orchestrator.create_event(utterance.as_deref(), &mut conversation, &mut store)
    })
    .await
    .context("Event creation task failed")??;

    relay.await.context("Notification relay failed")?;

    if let CreationOutcome::Created(event) = outcome {
        tracing::info!(uid = %event.uid, "Created event");
    }

    Ok(())
}
