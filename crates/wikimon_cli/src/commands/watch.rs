use anyhow::{Context, Result};
use console::style;
use wikimon_hub::Hub;
use wikimon_mw_api::ReqwestConnector;
use wikimon_storage::TomlConfigStore;

use super::{configured_entry, summary_line};

pub async fn run(store: &TomlConfigStore) -> Result<()> {
    let Some(entry) = configured_entry(store)? else {
        return Ok(());
    };

    let hub = Hub::new(ReqwestConnector::default());
    let loaded = hub
        .setup_entry(&entry)
        .await
        .context("Failed to fetch site statistics")?;

    println!("{}", style("Watching MediaWiki instances").bold().cyan());
    if entry.pref_disable_polling {
        println!(
            "{} Polling is disabled for this entry; no further updates will arrive.",
            style("!").yellow().bold()
        );
    }
    println!("Press Ctrl+C to stop.");
    println!();

    let mut listeners = Vec::new();
    for coordinator in loaded.coordinators.values() {
        let mut rx = coordinator.watch();
        println!("{}", summary_line(&rx.borrow_and_update()));
        // Ends once the coordinator is dropped and the channel closes.
        listeners.push(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let line = summary_line(&rx.borrow_and_update());
                println!("{}", line);
            }
        }));
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    println!();
    hub.unload_entry(loaded);
    for listener in listeners {
        listener.abort();
    }
    println!("{}", style("Stopped").green().bold());
    Ok(())
}
