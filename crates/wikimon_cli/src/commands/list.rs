use anyhow::{Context, Result};
use console::style;
use wikimon_storage::TomlConfigStore;

pub fn run(store: &TomlConfigStore) -> Result<()> {
    let entries = store.list_entries().context("Failed to load config entries")?;
    if entries.is_empty() {
        println!("No MediaWiki instances configured.");
        return Ok(());
    }

    println!("{}", style("Configured instances").bold().cyan());
    for entry in &entries {
        println!();
        println!("Entry:   {}", style(entry.entry_id).dim());
        println!("Added:   {}", entry.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!(
            "Polling: {}",
            if entry.pref_disable_polling {
                style("disabled").yellow()
            } else {
                style("enabled").green()
            }
        );
        for (i, url) in entry.instance_urls().enumerate() {
            println!("  {}. {}", style(i + 1).dim(), url);
        }
    }
    Ok(())
}
