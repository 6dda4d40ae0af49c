use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use wikimon_domain::ConfigEntry;
use wikimon_hub::config_flow::{ERROR_CANNOT_CONNECT, FormField};
use wikimon_hub::{FlowResult, Hub, UserInput};
use wikimon_mw_api::ReqwestConnector;
use wikimon_storage::TomlConfigStore;

pub async fn run(store: &TomlConfigStore, url: Option<String>, no_polling: bool) -> Result<()> {
    println!("{}", style("Add MediaWiki instance").bold().cyan());
    println!("Config: {}", store.path().display());
    println!();

    let existing = store.list_entries().context("Failed to load config entries")?;
    let interactive = url.is_none();

    let hub = Hub::new(ReqwestConnector::default());
    let mut flow = hub.config_flow();
    let mut result = probe(flow.step_user(&existing, url.map(UserInput::new))).await;

    loop {
        match result {
            FlowResult::Abort { reason } => {
                bail!("Setup aborted: {} (run `wikimon remove` first)", reason);
            }
            FlowResult::ShowForm { schema, errors, .. } => {
                if let Some(error) = errors.get("base") {
                    println!("{} {}", style("✗").red().bold(), describe_error(error));
                    if !interactive {
                        bail!("Could not validate the MediaWiki API");
                    }
                }
                let input = prompt(&schema)?;
                result = probe(flow.step_instances(Some(input))).await;
            }
            FlowResult::CreateEntry { title, data } => {
                let entry = ConfigEntry::new(title, data).with_polling_disabled(no_polling);
                store.save_entry(&entry).context("Failed to save config entry")?;

                println!("{} Instance validated", style("✓").green().bold());
                for url in entry.instance_urls() {
                    println!("  {}", style(url).yellow());
                }
                println!("Entry id: {}", style(entry.entry_id).dim());
                if no_polling {
                    println!("Polling disabled; use {} to refresh.", style("wikimon status").cyan());
                }
                return Ok(());
            }
        }
    }
}

async fn probe(step: impl std::future::Future<Output = FlowResult>) -> FlowResult {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message("Contacting wiki API...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = step.await;
    spinner.finish_and_clear();
    result
}

fn prompt(schema: &[FormField]) -> Result<UserInput> {
    let mut url = String::new();
    for field in schema {
        url = Input::new()
            .with_prompt(format!("Wiki API {}", field.name))
            .interact_text()
            .context("Failed to read input")?;
    }
    Ok(UserInput::new(url))
}

fn describe_error(code: &str) -> String {
    match code {
        ERROR_CANNOT_CONNECT => {
            "Cannot connect. Check that the URL points at api.php of a MediaWiki site.".to_string()
        }
        other => format!("Setup failed: {}", other),
    }
}
