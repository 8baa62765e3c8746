use std::sync::Arc;
use std::time::Duration;

use label_station::{
    LabelJob, SearchCommand, SearchController, SearchOutcome, SqliteItemStore, StationConfig,
    StationService, init_logger,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Headless operator console: the thinnest possible client of the engine's
/// channel surface, standing in for the desktop shell.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("LABEL_STATION_CONFIG").ok())
        .unwrap_or_else(|| "barcode.json".to_string());

    let config = StationConfig::load(&config_path)?;
    tracing::info!(path = %config_path, "Configuration loaded");

    let store = SqliteItemStore::connect(&config.database_url).await?;
    let service = Arc::new(StationService::new(Arc::new(store), config.clone()));

    match service.reload().await {
        Ok(count) => tracing::info!(count, "Initial fetch complete"),
        Err(e) => tracing::error!(error = %e, "Initial fetch failed, starting with empty index"),
    }

    // Wire the search controller the same way a desktop shell would.
    let (command_tx, command_rx) = mpsc::channel::<SearchCommand>(64);
    let (result_tx, mut result_rx) = mpsc::channel::<SearchOutcome>(16);
    let shutdown = CancellationToken::new();

    let controller = SearchController::new(
        service.index(),
        config.display_cap,
        Duration::from_millis(config.debounce_ms),
    );
    tokio::spawn(controller.run(command_rx, result_tx, shutdown.clone()));

    let display_config = config.clone();
    tokio::spawn(async move {
        while let Some(outcome) = result_rx.recv().await {
            println!("-- {} row(s) for '{}'", outcome.rows.len(), outcome.query);
            for row in &outcome.rows {
                println!(
                    "  {:<12} {:<30} {:<14} {:>10} {:>10}",
                    row.item_code,
                    row.description,
                    row.barcode,
                    row.display_price(&display_config.currency),
                    row.display_cost(&display_config.currency, display_config.hide_cost),
                );
            }
        }
    });

    println!("label-station console. Commands:");
    println!("  find <text>       debounced exact lookup (sort-key field)");
    println!("  search <text>     multi-keyword description search");
    println!("  print <barcode> [copies]");
    println!("  reload            refetch items from storage");
    println!("  config            reload {config_path} and rebuild");
    println!("  quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "" => {}
            "find" => {
                command_tx
                    .send(SearchCommand::TextChanged(rest.to_string()))
                    .await?;
            }
            "search" => {
                command_tx
                    .send(SearchCommand::Submit(rest.to_string()))
                    .await?;
            }
            "print" => {
                let mut parts = rest.split_whitespace();
                let Some(barcode) = parts.next() else {
                    println!("usage: print <barcode> [copies]");
                    continue;
                };
                let copies: u32 = parts.next().and_then(|c| c.parse().ok()).unwrap_or(1);

                let matches = service.index().exact_lookup(barcode).await;
                if matches.is_empty() {
                    println!("no item with barcode '{barcode}'");
                    continue;
                }
                let jobs: Vec<LabelJob> = matches
                    .into_iter()
                    .map(|item| LabelJob::new(item, copies))
                    .collect();
                let report = service.print_selection(jobs).await;
                println!("{}", report.summary());
            }
            "reload" => match service.reload().await {
                Ok(count) => println!("reloaded {count} items"),
                Err(e) => println!("reload failed: {e}"),
            },
            "config" => match StationConfig::load(&config_path) {
                Ok(new_config) => match service.apply_config(new_config).await {
                    Ok(count) => println!("configuration applied, {count} items"),
                    Err(e) => println!("rebuild after config change failed: {e}"),
                },
                Err(e) => println!("config reload failed: {e}"),
            },
            "quit" | "exit" => break,
            other => println!("unknown command: {other}"),
        }
    }

    shutdown.cancel();
    Ok(())
}
