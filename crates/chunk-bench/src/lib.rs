use anyhow::Context;
use chrono::DateTime;
use chunked::{
    read_all, ChunkedDataHandler, ChunkedWriter, DataAdapter, DataResponse, Handler,
    QueryDataHandler, QueryDataResponse, WriterConfig,
};
use data_table::{Table, Value};
use proto_data::{ChunkedDataRequest, DataQuery, QueryDataRequest};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

/// TestDatasource answers each query with `max_data_points` tables,
/// each having `rows_per_frame` rows of every element type.
#[derive(Debug, Clone, Copy)]
pub struct TestDatasource {
    pub rows_per_frame: usize,
}

#[async_trait::async_trait]
impl QueryDataHandler for TestDatasource {
    async fn query_data(&self, request: QueryDataRequest) -> anyhow::Result<QueryDataResponse> {
        tracing::info!(queries = request.queries.len(), "QueryData");

        let mut out = QueryDataResponse::default();
        for query in &request.queries {
            let frames = (0..query.max_data_points)
                .map(|i| new_frame(&frame_name(i, &query.ref_id), self.rows_per_frame))
                .collect::<anyhow::Result<Vec<_>>>()?;

            out.responses
                .insert(query.ref_id.clone(), DataResponse::from_frames(frames));
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl ChunkedDataHandler for TestDatasource {
    async fn query_chunked_data(
        &self,
        request: ChunkedDataRequest,
        writer: &mut ChunkedWriter,
    ) -> anyhow::Result<()> {
        tracing::info!(queries = request.queries.len(), "QueryChunkedData");

        for query in &request.queries {
            for i in 0..query.max_data_points {
                let frame = new_frame(&frame_name(i, &query.ref_id), 0)?;
                writer.open_table(&query.ref_id, frame).await?;

                for n in 0..self.rows_per_frame {
                    writer.append_row(&query.ref_id, row(n)?).await?;
                }
            }
        }
        Ok(())
    }
}

fn frame_name(i: i64, ref_id: &str) -> String {
    format!("F:{i}, R:{ref_id}")
}

/// Build a Table of the thirteen-column reference schema, having `rows` rows.
pub fn new_frame(name: &str, rows: usize) -> anyhow::Result<Table> {
    let mut table = Table::new(name)
        .with_column("f32", Vec::<f32>::new())
        .with_column("f64", Vec::<f64>::new())
        .with_column("s", Vec::<String>::new())
        .with_column("i8", Vec::<i8>::new())
        .with_column("i16", Vec::<i16>::new())
        .with_column("i32", Vec::<i32>::new())
        .with_column("i64", Vec::<i64>::new())
        .with_column("u8", Vec::<u8>::new())
        .with_column("u16", Vec::<u16>::new())
        .with_column("u32", Vec::<u32>::new())
        .with_column("u64", Vec::<u64>::new())
        .with_column("t", Vec::<DateTime<chrono::Utc>>::new())
        .with_column("b", Vec::<bool>::new());

    for n in 0..rows {
        table.append_row(row(n)?)?;
    }
    Ok(table)
}

/// Sample row `n` of the reference schema. Integer columns wrap at their width.
pub fn row(n: usize) -> anyhow::Result<Vec<Value>> {
    let t = DateTime::from_timestamp_millis(n as i64)
        .with_context(|| format!("row {n} is not a representable timestamp"))?;

    Ok(vec![
        (n as f32).into(),
        (n as f64).into(),
        "str".into(),
        (n as i8).into(),
        (n as i16).into(),
        (n as i32).into(),
        (n as i64).into(),
        (n as u8).into(),
        (n as u16).into(),
        (n as u32).into(),
        (n as u64).into(),
        t.into(),
        false.into(),
    ])
}

/// Build a DataAdapter exposing both capabilities of a TestDatasource.
pub fn adapter(datasource: TestDatasource, config: WriterConfig) -> DataAdapter {
    let datasource = Arc::new(datasource);
    DataAdapter::new([
        Handler::Query(datasource.clone()),
        Handler::Chunked(datasource),
    ])
    .with_config(config)
}

/// Run `queries` through the single-response path, including its wire mapping.
pub async fn run_query(
    adapter: &DataAdapter,
    queries: Vec<DataQuery>,
) -> anyhow::Result<QueryDataResponse> {
    let response = adapter
        .query_data(QueryDataRequest {
            queries,
            ..Default::default()
        })
        .await
        .context("QueryData failed")?;

    Ok(QueryDataResponse::from_proto(response)?)
}

/// Run `queries` through the chunked path, and reassemble its stream.
pub async fn run_stream(
    adapter: &DataAdapter,
    queries: Vec<DataQuery>,
) -> anyhow::Result<QueryDataResponse> {
    let rx = adapter.spawn_chunked(ChunkedDataRequest {
        queries,
        ..Default::default()
    });

    read_all(ReceiverStream::new(rx))
        .await
        .context("QueryChunkedData failed")
}

/// Parse a query argument of the form `REF_ID=MAX_DATA_POINTS`.
pub fn parse_query(arg: &str) -> anyhow::Result<DataQuery> {
    let (ref_id, points) = arg
        .split_once('=')
        .with_context(|| format!("query {arg:?} is not of the form REF_ID=MAX_DATA_POINTS"))?;

    if ref_id.is_empty() {
        anyhow::bail!("query {arg:?} has an empty REF_ID");
    }
    let max_data_points = points
        .parse::<i64>()
        .with_context(|| format!("invalid MAX_DATA_POINTS of query {arg:?}"))?;

    Ok(DataQuery {
        ref_id: ref_id.to_string(),
        query_type: format!("test{ref_id}"),
        max_data_points,
        ..Default::default()
    })
}

#[derive(Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub frames: usize,
    pub rows: usize,
    pub status: chunked::Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_source: Option<chunked::ErrorSource>,
}

/// Summarize each response by its frame and row counts.
pub fn summarize(response: &QueryDataResponse) -> BTreeMap<String, Summary> {
    response
        .responses
        .iter()
        .map(|(ref_id, r)| {
            if let Some(failure) = &r.failure {
                tracing::warn!(%ref_id, error = ?failure, "response was not fully reassembled");
            }
            let summary = Summary {
                frames: r.frames.len(),
                rows: r.rows(),
                status: r.status,
                error: r.error.clone(),
                error_source: r.error_source,
            };
            (ref_id.clone(), summary)
        })
        .collect()
}
