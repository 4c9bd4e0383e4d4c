use anyhow::Result;
use chartdeck::aggregate;
use chartdeck::config::Config;
use chartdeck::engine::{PolarsEngine, QueryEngine};
use chartdeck::ingest;
use chartdeck::project;
use chartdeck::scrape;
use chartdeck::store::TableStore;
use chartdeck::table::Table;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "chartdeck")]
#[command(about = "Load delimited files, derive averages, and print chart-ready projections")]
struct Args {
    /// Engine data directory (virtual file area)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Durable store root
    #[arg(long)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a delimited file, append the average row, and print the grid
    Load {
        file: PathBuf,

        /// Also persist the raw text in the durable store under this name
        #[arg(long)]
        store_as: Option<String>,

        /// Print the table as JSON instead of a grid
        #[arg(long)]
        json: bool,
    },
    /// List entries in the durable store
    List,
    /// Reload a stored entry through the ingestion path and print the grid
    Show { entry: String },
    /// Print a bar/line projection for selected value fields
    Chart {
        file: PathBuf,

        /// Comma-separated value field identifiers
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Sort data rows ascending by the date column before projecting
        #[arg(long)]
        sort: bool,
    },
    /// Fetch a page, scrape one HTML table by id, and ingest it
    Fetch {
        url: String,

        /// Element id of the target table
        #[arg(long, default_value = "per_game")]
        table_id: String,

        /// Persist the scraped text in the durable store under this name
        #[arg(long)]
        store_as: Option<String>,
    },
}

fn print_grid(table: &Table) {
    if table.columns.is_empty() {
        println!("(no data)");
        return;
    }
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            table
                .rows
                .iter()
                .map(|r| r.get(idx).as_label().chars().count())
                .chain(std::iter::once(col.label.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<width$}", c.label, width = *w))
        .collect();
    println!("{}", header.join("  "));

    for row in &table.rows {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(idx, w)| format!("{:<width$}", row.get(idx).as_label(), width = *w))
            .collect();
        println!("{}", cells.join("  "));
    }
}

async fn load_and_summarize(engine: &dyn QueryEngine, raw_text: &str) -> Result<Table> {
    let mut table = ingest::ingest_text(engine, ingest::DEFAULT_TABLE_NAME, raw_text).await?;
    aggregate::append_average_row(engine, &mut table).await?;
    Ok(table)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let defaults = Config::from_env();
    let config = Config {
        data_dir: args.data_dir.unwrap_or(defaults.data_dir),
        store_dir: args.store_dir.unwrap_or(defaults.store_dir),
    };

    let engine = PolarsEngine::open(config.data_dir.clone()).await?;
    let store = TableStore::open(config.store_dir.clone()).await?;

    match args.command {
        Command::Load {
            file,
            store_as,
            json,
        } => {
            let raw_text = tokio::fs::read_to_string(&file).await?;
            let table = load_and_summarize(&engine, &raw_text).await?;
            if let Some(name) = store_as {
                store.save(&name, &raw_text).await?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                print_grid(&table);
            }
        }
        Command::List => {
            for name in store.list().await? {
                println!("{}", name);
            }
        }
        Command::Show { entry } => {
            let table =
                ingest::ingest_stored_entry(&engine, &store, &entry, ingest::DEFAULT_TABLE_NAME)
                    .await?;
            print_grid(&table);
        }
        Command::Chart { file, fields, sort } => {
            let raw_text = tokio::fs::read_to_string(&file).await?;
            let table = load_and_summarize(&engine, &raw_text).await?;
            let chart = project::bar_line_series(&table, &fields, sort);
            if chart.is_empty() {
                println!("(empty projection)");
            } else {
                println!("labels: {}", chart.labels.join(", "));
                for series in &chart.series {
                    let values: Vec<String> =
                        series.values.iter().map(|v| format!("{}", v)).collect();
                    println!("{}: {}", series.label, values.join(", "));
                }
            }
        }
        Command::Fetch {
            url,
            table_id,
            store_as,
        } => {
            let scraped = scrape::fetch_table(&url, &table_id).await?;
            let raw_text = scrape::to_delimited_text(&scraped)?;
            if let Some(name) = store_as {
                store.save(&name, &raw_text).await?;
            }
            let table = load_and_summarize(&engine, &raw_text).await?;
            print_grid(&table);
        }
    }

    engine.close().await?;
    info!("done");
    Ok(())
}
