//! End-to-end data path: ingest -> aggregate -> store -> project, run
//! against the in-memory engine.

use chartdeck::aggregate::{self, AVERAGE_LABEL};
use chartdeck::engine::{MemoryEngine, QueryEngine};
use chartdeck::error::ChartError;
use chartdeck::ingest;
use chartdeck::project;
use chartdeck::store::TableStore;
use chartdeck::table::Value;
use uuid::Uuid;

async fn temp_store() -> TableStore {
    let root = std::env::temp_dir().join(format!("chartdeck-it-{}", Uuid::new_v4()));
    TableStore::open(root).await.unwrap()
}

#[tokio::test]
async fn csv_to_bar_chart_scenario() {
    let engine = MemoryEngine::open();
    let text = "DATE,PTS\n2024/01/01,10\n2024/01/02,20\n";

    let mut table = ingest::ingest_text(&engine, "foo", text).await.unwrap();
    assert_eq!(table.rows.len(), 2);

    aggregate::append_average_row(&engine, &mut table)
        .await
        .unwrap();
    assert_eq!(table.rows.len(), 3);
    let last = table.rows.last().unwrap();
    assert_eq!(last.get(0), &Value::Str(AVERAGE_LABEL.into()));
    assert_eq!(last.get(1), &Value::Num(15.0));

    let chart = project::bar_line_series(&table, &["PTS".to_string()], false);
    assert_eq!(chart.labels, vec!["2024/01/01", "2024/01/02", AVERAGE_LABEL]);
    assert_eq!(chart.series[0].values, vec![10.0, 20.0, 15.0]);
}

#[tokio::test]
async fn sentinel_labeled_data_row_survives_the_full_pipeline() {
    let engine = MemoryEngine::open();
    let text = "DATE,PTS\n平均,10\n2024/01/02,20\n";

    let mut table = ingest::ingest_text(&engine, "foo", text).await.unwrap();
    aggregate::append_average_row(&engine, &mut table)
        .await
        .unwrap();

    // the first row is data that happens to be labeled with the sentinel;
    // only the tracked summary row is synthetic
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[0].get(0), &Value::Str(AVERAGE_LABEL.into()));
    assert_eq!(table.rows[0].get(1), &Value::Num(10.0));
    assert_eq!(table.summary_row().unwrap().get(1), &Value::Num(15.0));
}

#[tokio::test]
async fn stored_entry_reloads_through_ingestion() {
    let engine = MemoryEngine::open();
    let store = temp_store().await;
    let text = "DATE,PTS\n2024/01/01,10\n2024/01/02,20\n";

    store.save("upload.csv", text).await.unwrap();
    assert_eq!(store.list().await.unwrap(), vec!["upload.csv".to_string()]);

    let table = ingest::ingest_stored_entry(&engine, &store, "upload.csv", "foo")
        .await
        .unwrap();
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].get(1), &Value::Num(10.0));
}

#[tokio::test]
async fn failed_ingestion_leaves_previous_table_untouched() {
    let engine = MemoryEngine::open();

    let table = ingest::ingest_text(&engine, "foo", "A,B\n1,2\n")
        .await
        .unwrap();

    // a second ingestion that dies inside the engine must not produce a new
    // handle; the caller keeps using the old one
    engine.close().await.unwrap();
    let err = ingest::ingest_text(&engine, "foo", "A,B\n9,9\n").await;
    assert!(matches!(err, Err(ChartError::Engine(_))));

    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].get(0), &Value::Num(1.0));
}

#[tokio::test]
async fn store_failures_do_not_block_projection() {
    let engine = MemoryEngine::open();
    let store = temp_store().await;

    let err = store.load("nope.csv").await;
    assert!(matches!(err, Err(ChartError::Storage(_))));

    // the data path keeps working after the storage error
    let mut table = ingest::ingest_text(&engine, "foo", "DATE,MIN\n2024/01/01,24\n")
        .await
        .unwrap();
    aggregate::append_average_row(&engine, &mut table)
        .await
        .unwrap();
    let slices =
        project::pie_used_remaining(&table, "2024/01/01", "MIN", project::FULL_GAME_MINUTES);
    assert_eq!(slices.len(), 2);
    assert!((slices[0].value - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn scraped_table_feeds_the_ingestion_pipeline() {
    let html = r#"<table id="per_game">
        <thead><tr><th>DATE</th><th>PTS</th></tr></thead>
        <tbody>
          <tr><td>2024/01/01</td><td>10</td></tr>
          <tr><td>2024/01/02</td><td>20</td></tr>
        </tbody></table>"#;

    let scraped = chartdeck::scrape::extract_table(html, "per_game").unwrap();
    let text = chartdeck::scrape::to_delimited_text(&scraped).unwrap();

    let engine = MemoryEngine::open();
    let mut table = ingest::ingest_text(&engine, "table_data", &text)
        .await
        .unwrap();
    aggregate::append_average_row(&engine, &mut table)
        .await
        .unwrap();

    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows.last().unwrap().get(1), &Value::Num(15.0));
}
