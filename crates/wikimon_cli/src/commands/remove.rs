use anyhow::{Context, Result};
use console::style;
use dialoguer::Confirm;
use wikimon_storage::TomlConfigStore;

use super::configured_entry;

pub fn run(store: &TomlConfigStore, yes: bool) -> Result<()> {
    let Some(entry) = configured_entry(store)? else {
        return Ok(());
    };

    let urls: Vec<_> = entry.instance_urls().collect();
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove entry for {}?", urls.join(", ")))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .remove_entry(entry.entry_id)
        .context("Failed to remove config entry")?;
    println!("{} Removed entry {}", style("✓").green().bold(), style(entry.entry_id).dim());
    Ok(())
}
