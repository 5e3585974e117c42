use crate::{enrich_with_error_source, ChunkedWriter, QueryDataResponse, WriterConfig};
use proto_data::{ChunkedDataRequest, ChunkedDataResponse, QueryDataRequest};
use std::sync::Arc;
use tokio::sync::mpsc;

/// QueryDataHandler answers each request with one complete response.
#[async_trait::async_trait]
pub trait QueryDataHandler: Send + Sync {
    async fn query_data(&self, request: QueryDataRequest) -> anyhow::Result<QueryDataResponse>;
}

/// ChunkedDataHandler streams its answer through a ChunkedWriter.
/// Buffered data of the writer is flushed once the handler returns.
#[async_trait::async_trait]
pub trait ChunkedDataHandler: Send + Sync {
    async fn query_chunked_data(
        &self,
        request: ChunkedDataRequest,
        writer: &mut ChunkedWriter,
    ) -> anyhow::Result<()>;
}

/// Handler is a capability of a datasource.
#[derive(Clone)]
pub enum Handler {
    Query(Arc<dyn QueryDataHandler>),
    Chunked(Arc<dyn ChunkedDataHandler>),
}

/// DataAdapter dispatches wire requests to the handlers of a datasource,
/// and maps their results back to wire responses.
#[derive(Clone, Default)]
pub struct DataAdapter {
    query: Option<Arc<dyn QueryDataHandler>>,
    chunked: Option<Arc<dyn ChunkedDataHandler>>,
    config: WriterConfig,
}

impl DataAdapter {
    /// Build a DataAdapter from the capabilities a datasource implements.
    /// A later Handler of the same kind replaces an earlier one.
    pub fn new(handlers: impl IntoIterator<Item = Handler>) -> Self {
        let mut adapter = Self::default();

        for handler in handlers {
            match handler {
                Handler::Query(h) => adapter.query = Some(h),
                Handler::Chunked(h) => adapter.chunked = Some(h),
            }
        }
        adapter
    }

    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Answer a request with a single response.
    pub async fn query_data(
        &self,
        request: QueryDataRequest,
    ) -> tonic::Result<proto_data::QueryDataResponse> {
        let Some(handler) = &self.query else {
            return Err(tonic::Status::unimplemented(
                "this datasource does not implement QueryData",
            ));
        };

        let response = handler
            .query_data(request)
            .await
            .map_err(enrich_with_error_source)?;

        response
            .into_proto()
            .map_err(|err| tonic::Status::internal(format!("{:#}", anyhow::Error::new(err))))
    }

    /// Answer a request with a chunked stream of responses.
    ///
    /// The handler runs on a spawned task, which writes into the returned
    /// channel. The channel ends when the handler completes; if it fails,
    /// its error is the final item.
    pub fn spawn_chunked(
        &self,
        request: ChunkedDataRequest,
    ) -> mpsc::Receiver<tonic::Result<ChunkedDataResponse>> {
        let (response_tx, response_rx) = new_channel();

        let Some(handler) = self.chunked.clone() else {
            let _ = response_tx.try_send(Err(tonic::Status::unimplemented(
                "this datasource does not implement QueryChunkedData",
            )));
            return response_rx;
        };

        let error_tx = response_tx.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            let mut writer = ChunkedWriter::new(response_tx, config);

            let result = match handler.query_chunked_data(request, &mut writer).await {
                Ok(()) => writer.close().await.map_err(anyhow::Error::new),
                Err(err) => Err(err),
            };
            std::mem::drop(writer);

            if let Err(err) = result {
                tracing::debug!(error = ?err, "chunked data handler failed");
                let _ = error_tx.send(Err(enrich_with_error_source(err))).await;
            }
        });

        response_rx
    }
}

fn new_channel<T>() -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel::<T>(32)
}
