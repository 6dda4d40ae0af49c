pub mod list;
pub mod remove;
pub mod setup;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use console::style;
use wikimon_domain::ConfigEntry;
use wikimon_hub::{CoordinatorState, SensorState};
use wikimon_storage::TomlConfigStore;

/// The single stored entry, or `None` after telling the user how to add one.
pub(crate) fn configured_entry(store: &TomlConfigStore) -> Result<Option<ConfigEntry>> {
    let entry = store
        .list_entries()
        .context("Failed to load config entries")?
        .into_iter()
        .next();

    if entry.is_none() {
        println!("{} No MediaWiki instance configured.", style("!").yellow().bold());
        println!("Run {} to add one.", style("wikimon setup").cyan());
    }
    Ok(entry)
}

pub(crate) fn print_sensor(state: &SensorState) {
    let value = match (&state.value, state.available) {
        (_, false) => style("unavailable".to_string()).red(),
        (Some(value), true) => style(value.to_string()).yellow(),
        (None, true) => style("unknown".to_string()).dim(),
    };
    println!("  {:<18} {}", state.key, value);
}

/// One line per refresh attempt, as printed by `watch`.
pub(crate) fn summary_line(state: &CoordinatorState) -> String {
    let at = state
        .last_update
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    if !state.last_update_success {
        let error = state.last_error.as_deref().unwrap_or("unknown error");
        return format!("[{}] {}: update failed: {}", at, state.instance.name, error);
    }

    let field = |value: Option<&serde_json::Value>| {
        value.map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };
    match &state.data {
        Some(data) => format!(
            "[{}] {}: pages={} images={} version={}",
            at,
            state.instance.name,
            field(data.statistic("pages")).unwrap_or_else(|| "?".into()),
            field(data.statistic("images")).unwrap_or_else(|| "?".into()),
            data.generator().unwrap_or("?"),
        ),
        None => format!("[{}] {}: no data yet", at, state.instance.name),
    }
}
