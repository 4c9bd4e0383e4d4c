//! Same pipeline contract, run against the Polars-backed engine.

use chartdeck::aggregate::{self, AVERAGE_LABEL};
use chartdeck::engine::{PolarsEngine, QueryEngine};
use chartdeck::ingest;
use chartdeck::schema::ColumnKind;
use chartdeck::table::Value;
use std::path::PathBuf;
use uuid::Uuid;

fn temp_data_dir() -> PathBuf {
    std::env::temp_dir().join(format!("chartdeck-engine-{}", Uuid::new_v4()))
}

#[tokio::test]
async fn round_trip_preserves_count_and_order() {
    let engine = PolarsEngine::open(temp_data_dir()).await.unwrap();
    let text = "DATE,PTS\n2024/01/03,30\n2024/01/01,10\n2024/01/02,20\n";

    let table = ingest::ingest_text(&engine, "foo", text).await.unwrap();

    assert_eq!(table.rows.len(), 3);
    let labels: Vec<String> = table.rows.iter().map(|r| r.get(0).as_label()).collect();
    assert_eq!(labels, vec!["2024/01/03", "2024/01/01", "2024/01/02"]);
    assert_eq!(table.columns[0].kind, ColumnKind::Date);
    assert_eq!(table.columns[1].kind, ColumnKind::Number);
}

#[tokio::test]
async fn average_query_appends_summary_row() {
    let engine = PolarsEngine::open(temp_data_dir()).await.unwrap();
    let text = "DATE,PTS\n2024/01/01,10\n2024/01/02,20\n";

    let mut table = ingest::ingest_text(&engine, "foo", text).await.unwrap();
    aggregate::append_average_row(&engine, &mut table)
        .await
        .unwrap();

    assert_eq!(table.rows.len(), 3);
    let last = table.rows.last().unwrap();
    assert_eq!(last.get(0), &Value::Str(AVERAGE_LABEL.into()));
    assert_eq!(last.get(1), &Value::Num(15.0));

    // mean equals sum/count over the data rows, summary row excluded
    let mean = aggregate::mean_of_column(&table, "PTS");
    assert!((mean - 15.0).abs() < 1e-9);
}

#[tokio::test]
async fn null_cells_count_as_zero_in_the_mean() {
    let engine = PolarsEngine::open(temp_data_dir()).await.unwrap();

    // the short first row leaves B null; the mean divides by the full row
    // count, matching the in-memory engine
    let mut table = ingest::ingest_text(&engine, "foo", "A,B\n1\n2,3\n").await.unwrap();
    aggregate::append_average_row(&engine, &mut table)
        .await
        .unwrap();

    let last = table.summary_row().unwrap();
    assert_eq!(last.get(0), &Value::Num(1.5));
    assert_eq!(last.get(1), &Value::Num(1.5));
}

#[tokio::test]
async fn dropped_table_is_gone_from_later_queries() {
    let engine = PolarsEngine::open(temp_data_dir()).await.unwrap();
    engine
        .create_table_from_text("foo", "A\n1\n")
        .await
        .unwrap();

    engine.drop_table("foo").await.unwrap();
    assert!(engine.query("SELECT * FROM \"foo\"").await.is_err());
    // dropping again is a no-op
    engine.drop_table("foo").await.unwrap();
}

#[tokio::test]
async fn unknown_table_query_is_a_recoverable_engine_error() {
    let engine = PolarsEngine::open(temp_data_dir()).await.unwrap();
    let err = engine.query("SELECT * FROM \"missing\"").await;
    assert!(err.is_err());

    // the connection stays usable afterwards
    let table = ingest::ingest_text(&engine, "foo", "A,B\n1,2\n")
        .await
        .unwrap();
    assert_eq!(table.rows.len(), 1);
}

#[tokio::test]
async fn close_rejects_further_queries() {
    let engine = PolarsEngine::open(temp_data_dir()).await.unwrap();
    engine
        .create_table_from_text("foo", "A\n1\n")
        .await
        .unwrap();
    engine.close().await.unwrap();
    assert!(engine.query("SELECT * FROM \"foo\"").await.is_err());
}
