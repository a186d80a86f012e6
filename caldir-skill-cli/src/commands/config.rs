use anyhow::{Context, Result};
use caldir_skill_core::{Locale, SkillConfig};
use owo_colors::OwoColorize;

pub fn run(locale: Option<Locale>, timezone: Option<String>) -> Result<()> {
    let config_path = SkillConfig::config_path()?;
    let mut config = SkillConfig::load()?;

    if locale.is_some() || timezone.is_some() {
        if let Some(locale) = locale {
            config.locale = locale;
        }
        if let Some(timezone) = timezone {
            config.timezone = Some(timezone);
        }

        // Refuse unknown zones before anything is written.
        config.timezone()?;
        config.save().context("Failed to save configuration")?;

        println!("{}", format!("Saved {}", config_path.display()).green());
        println!();
    }

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!(
        "  Calendar:   {}",
        config.mirror_path().join(&config.calendar_path).display()
    );

    println!();
    println!("{}", "Settings".bold());
    println!("  Locale:     {}", config.locale);
    println!(
        "  Time zone:  {}{}",
        config.timezone()?,
        if config.timezone.is_none() { " (system)" } else { "" }
    );
    println!("  Notify URL: {}", config.notify_url);
    println!("  Threshold:  {}", config.score_threshold);
    println!(
        "  Retries:    {}",
        config
            .prompt_retries
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );

    Ok(())
}
