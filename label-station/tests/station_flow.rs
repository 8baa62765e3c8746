//! End-to-end engine flow: SQLite fetch -> index rebuild -> search -> print

use std::sync::{Arc, Mutex};
use std::time::Duration;

use label_station::{
    LabelDispatcher, LabelJob, SearchCommand, SearchController, SearchOutcome, SqliteItemStore,
    StationConfig, StationService,
};
use sqlx::sqlite::SqlitePoolOptions;
use tag_printer::{PrintError, PrintResult, Printer};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

async fn seeded_service() -> Arc<StationService> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::raw_sql(
        r#"
        CREATE TABLE item (item_code TEXT PRIMARY KEY, description TEXT);
        CREATE TABLE item_uom (
            item_code TEXT NOT NULL,
            uom TEXT,
            price REAL,
            cost REAL,
            barcode TEXT
        );
        CREATE TABLE pos_price_plan (
            item_code TEXT NOT NULL,
            location TEXT NOT NULL,
            price REAL
        );
        INSERT INTO item VALUES
            ('A1', 'Instant Noodles'),
            ('A2', 'Soap Bar');
        INSERT INTO item_uom VALUES
            ('A1', 'PCS', 4.50, 3.10, '100'),
            ('A2', 'PCS', 2.00, 1.20, '200'),
            ('A2', 'CTN', 20.00, 12.00, '200');
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let config = StationConfig {
        company_name: "Demo Mart".to_string(),
        ..Default::default()
    };
    let service = Arc::new(StationService::new(
        Arc::new(SqliteItemStore::new(pool)),
        config,
    ));
    service.reload().await.unwrap();
    service
}

#[derive(Default)]
struct ScriptedPrinter {
    sent: Mutex<Vec<String>>,
    fail_at: Option<usize>,
}

impl Printer for ScriptedPrinter {
    async fn send_job(&self, _clear: &[u8], payload: &[u8]) -> PrintResult<()> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_at == Some(sent.len() + 1) {
            return Err(PrintError::PortClosed {
                host: "192.168.1.100".to_string(),
                port: 9100,
            });
        }
        sent.push(String::from_utf8(payload.to_vec()).unwrap());
        Ok(())
    }

    async fn is_online(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn test_duplicate_barcode_run_through_full_stack() {
    let service = seeded_service().await;

    let hits = service.index().exact_lookup("200").await;
    assert_eq!(hits.len(), 2);
    // Query order (uom within item code) is preserved inside the run.
    assert_eq!(hits[0].unit_of_measure.as_deref(), Some("CTN"));
    assert_eq!(hits[1].unit_of_measure.as_deref(), Some("PCS"));

    assert!(service.index().exact_lookup("150").await.is_empty());
}

#[tokio::test]
async fn test_search_channel_round_trip() {
    let service = seeded_service().await;

    let (command_tx, command_rx) = mpsc::channel::<SearchCommand>(8);
    let (result_tx, mut result_rx) = mpsc::channel::<SearchOutcome>(8);
    let shutdown = CancellationToken::new();

    let controller =
        SearchController::new(service.index(), 100, Duration::from_millis(400));
    tokio::spawn(controller.run(command_rx, result_tx, shutdown.clone()));

    command_tx
        .send(SearchCommand::Submit("soap".to_string()))
        .await
        .unwrap();

    let outcome = result_rx.recv().await.unwrap();
    assert_eq!(outcome.rows.len(), 2);
    assert!(outcome.rows.iter().all(|r| r.description == "Soap Bar"));

    shutdown.cancel();
}

#[tokio::test]
async fn test_batch_partial_failure_reported_positionally() {
    let service = seeded_service().await;
    let config = service.config().await;

    let mut jobs: Vec<LabelJob> = Vec::new();
    for barcode in ["100", "200", "100"] {
        let item = service.index().exact_lookup(barcode).await.remove(0);
        jobs.push(LabelJob::new(item, 1));
    }

    let printer = ScriptedPrinter {
        fail_at: Some(2),
        ..Default::default()
    };
    let report = LabelDispatcher::from_config(&config)
        .dispatch_batch(&printer, &jobs)
        .await;

    assert_eq!(report.succeeded, 1);
    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.position, 2);
    assert!(matches!(failure.reason, PrintError::PortClosed { .. }));
    // Item 3 was never attempted.
    assert_eq!(printer.sent.lock().unwrap().len(), 1);

    let summary = report.summary();
    assert!(summary.contains("1 of 3 sent"));
    assert!(summary.contains("item 2"));
    assert!(summary.contains("not open"));
}

#[tokio::test]
async fn test_clean_batch_renders_prices_from_storage() {
    let service = seeded_service().await;
    let config = service.config().await;

    let item = service.index().exact_lookup("100").await.remove(0);
    let printer = ScriptedPrinter::default();
    let report = LabelDispatcher::from_config(&config)
        .dispatch_batch(&printer, &[LabelJob::new(item, 2)])
        .await;

    assert!(report.all_sent());
    let sent = printer.sent.lock().unwrap();
    assert!(sent[0].contains("\"Demo Mart\""));
    assert!(sent[0].contains("\"100\""));
    assert!(sent[0].contains("RM 4.50"));
    assert!(sent[0].contains("PRINT 2"));
}
