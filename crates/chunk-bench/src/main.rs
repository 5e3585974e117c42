use anyhow::Context;
use chunk_bench::TestDatasource;
use chunked::WriterConfig;
use clap::Parser;
use proto_data::DataQuery;
use std::path::PathBuf;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Benchmark single-response and chunked delivery of query results.
///
/// Timings are logged at the info level: run with `RUST_LOG=info`.
#[derive(Debug, Parser)]
#[command(about, version)]
pub struct Cli {
    /// Datasource to query.
    #[arg(value_enum)]
    datasource: Datasource,
    /// Delivery path to exercise.
    #[arg(long, value_enum)]
    test: Test,
    /// Buffered rows at which the chunked writer flushes.
    #[arg(long, default_value = "1000", env = "MAX_BATCH_ROWS")]
    max_batch_rows: usize,
    /// Override the number of rows in each table of the datasource.
    #[arg(long)]
    rows_per_frame: Option<usize>,
    /// Queries to run, as REF_ID=MAX_DATA_POINTS.
    /// Each query is answered with MAX_DATA_POINTS tables.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "1=10,2=100",
        value_parser = chunk_bench::parse_query
    )]
    queries: Vec<DataQuery>,
    /// Directory into which `<test>.resp.json` is written.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(clap::ValueEnum, Debug, Copy, Clone, PartialEq)]
enum Datasource {
    /// Many small tables, of 10 rows each.
    Many,
    /// Few huge tables, of 100,000 rows each.
    Few,
}

#[derive(clap::ValueEnum, Debug, Copy, Clone, PartialEq)]
enum Test {
    /// Each query's tables are returned in a single response.
    Query,
    /// Tables are streamed in chunks and reassembled.
    Stream,
}

impl Test {
    fn as_str(&self) -> &'static str {
        match self {
            Test::Query => "query",
            Test::Stream => "stream",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into()) // Otherwise it's ERROR.
        .from_env_lossy();

    tracing_subscriber::fmt::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(?cli, "starting chunk-bench");

    let rows_per_frame = cli.rows_per_frame.unwrap_or(match cli.datasource {
        Datasource::Many => 10,
        Datasource::Few => 100_000,
    });
    let adapter = chunk_bench::adapter(
        TestDatasource { rows_per_frame },
        WriterConfig {
            max_batch_rows: cli.max_batch_rows,
        },
    );

    let started = std::time::Instant::now();
    let response = match cli.test {
        Test::Query => chunk_bench::run_query(&adapter, cli.queries).await?,
        Test::Stream => chunk_bench::run_stream(&adapter, cli.queries).await?,
    };
    let elapsed = started.elapsed();

    let summary = chunk_bench::summarize(&response);
    let path = cli.output_dir.join(format!("{}.resp.json", cli.test.as_str()));

    std::fs::write(&path, serde_json::to_vec_pretty(&summary)?)
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(
        test = cli.test.as_str(),
        rows_per_frame,
        elapsed_ms = elapsed.as_millis() as u64,
        path = %path.display(),
        "benchmark completed"
    );
    Ok(())
}
