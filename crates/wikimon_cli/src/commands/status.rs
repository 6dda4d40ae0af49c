use anyhow::{Context, Result};
use console::style;
use std::collections::BTreeMap;
use wikimon_hub::Hub;
use wikimon_mw_api::ReqwestConnector;
use wikimon_storage::TomlConfigStore;

use super::{configured_entry, print_sensor};

pub async fn run(store: &TomlConfigStore, json: bool) -> Result<()> {
    let Some(entry) = configured_entry(store)? else {
        return Ok(());
    };

    // One-shot: never schedule refreshes.
    let hub = Hub::new(ReqwestConnector::default());
    let loaded = hub
        .setup_entry(&entry.with_polling_disabled(true))
        .await
        .context("Failed to fetch site statistics")?;

    if json {
        let states: BTreeMap<_, Vec<_>> = loaded
            .coordinators
            .keys()
            .map(|url| (url.clone(), loaded.sensors_for_instance(url).map(|s| s.state()).collect()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&states)?);
    } else {
        for (url, coordinator) in &loaded.coordinators {
            println!("{}", style(coordinator.name()).bold().cyan());
            println!("  {}", style(url).dim());
            for sensor in loaded.sensors_for_instance(url) {
                print_sensor(&sensor.state());
            }
            println!();
        }
    }

    hub.unload_entry(loaded);
    Ok(())
}
