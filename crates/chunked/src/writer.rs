use crate::key_state::KeyState;
use crate::QueryError;
use data_table::{Table, Value};
use proto_data::ChunkedDataResponse;
use std::collections::BTreeMap;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Number of buffered rows, across all identifiers, at which a flush happens.
    pub max_batch_rows: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_batch_rows: 1000,
        }
    }
}

/// ChunkedWriter buffers tables and rows of multiple identifiers, and sends
/// them as batches over its channel whenever enough rows have accumulated.
///
/// A ChunkedWriter has a single owner: all of its methods take `&mut self`.
/// Sends await available capacity of the channel, which applies backpressure
/// to the producer. If the receiver has gone away, sends fail immediately
/// with `Error::TransportFailure`.
pub struct ChunkedWriter {
    tx: mpsc::Sender<tonic::Result<ChunkedDataResponse>>,
    config: WriterConfig,
    states: BTreeMap<String, KeyState>,
    // Rows buffered since the last flush.
    pending: usize,
}

impl ChunkedWriter {
    pub fn new(tx: mpsc::Sender<tonic::Result<ChunkedDataResponse>>, config: WriterConfig) -> Self {
        Self {
            tx,
            config,
            states: BTreeMap::new(),
            pending: 0,
        }
    }

    /// Begin a new table for `ref_id`. Rows of `table` are sent as-is,
    /// and further rows may be appended with `append_row`.
    pub async fn open_table(&mut self, ref_id: &str, mut table: Table) -> crate::Result<()> {
        table.ref_id = ref_id.to_string();
        self.pending += table.rows();

        self.state(ref_id).open_table(table);
        self.maybe_flush().await
    }

    /// Append a row to the current table of `ref_id`.
    pub async fn append_row(&mut self, ref_id: &str, row: Vec<Value>) -> crate::Result<()> {
        let Some(state) = self.states.get_mut(ref_id) else {
            return Err(crate::Error::NoOpenFragment(ref_id.to_string()));
        };
        state.append_row(ref_id, row)?;

        self.pending += 1;
        self.maybe_flush().await
    }

    /// Fail the query of `ref_id`, and flush all buffered data
    /// so that the error isn't held back by other identifiers.
    pub async fn signal_error(
        &mut self,
        ref_id: &str,
        error: impl Into<QueryError>,
    ) -> crate::Result<()> {
        let error = error.into();
        tracing::debug!(ref_id, %error, status = error.status.0, "query failed");

        self.state(ref_id).set_error(error);

        self.pending += 1;
        self.flush().await
    }

    /// Flush all remaining buffered data. Closing an idle writer does nothing.
    pub async fn close(&mut self) -> crate::Result<()> {
        self.flush().await
    }

    /// Number of rows buffered since the last flush.
    pub fn pending_rows(&self) -> usize {
        self.pending
    }

    fn state(&mut self, ref_id: &str) -> &mut KeyState {
        self.states.entry(ref_id.to_string()).or_default()
    }

    async fn maybe_flush(&mut self) -> crate::Result<()> {
        if self.pending < self.config.max_batch_rows {
            return Ok(());
        }
        self.flush().await
    }

    /// Send a batch for every identifier having buffered data.
    ///
    /// All batches are encoded before any is sent, and an encoding failure
    /// leaves buffered data as it was.
    pub async fn flush(&mut self) -> crate::Result<()> {
        if self.pending == 0 {
            return Ok(());
        }

        let mut batches = Vec::with_capacity(self.states.len());
        for (ref_id, state) in &self.states {
            if let Some(batch) = state.encode(ref_id)? {
                batches.push(batch);
            }
        }

        let (rows, count) = (self.pending, batches.len());

        for batch in batches {
            tracing::trace!(
                ref_id = %batch.ref_id,
                frames = batch.frames.len(),
                error = %batch.error,
                "sending chunked data batch"
            );

            if self.tx.send(Ok(batch)).await.is_err() {
                return Err(crate::Error::TransportFailure(tonic::Status::cancelled(
                    "chunked data receiver is closed",
                )));
            }
        }

        for state in self.states.values_mut() {
            state.reset();
        }
        self.pending = 0;

        tracing::debug!(rows, batches = count, "flushed chunked data");
        Ok(())
    }
}
