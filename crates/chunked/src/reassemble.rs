use crate::{DataResponse, Error, ErrorSource, QueryDataResponse, Status};
use data_table::Table;
use futures::StreamExt;
use proto_data::ChunkedDataResponse;
use std::collections::BTreeMap;

/// Reassembler rebuilds the complete tables of each identifier
/// from a sequence of chunked batches.
#[derive(Debug, Default)]
pub struct Reassembler {
    states: BTreeMap<String, ClientState>,
}

#[derive(Debug, Default)]
struct ClientState {
    // Tables rebuilt so far, in the order they began.
    accumulated: Vec<Table>,
    // Index of the table which is extended by further fragments.
    open: Option<usize>,
    status: Status,
    error: Option<String>,
    error_source: Option<ErrorSource>,
    // Once set, further fragments of the identifier are ignored.
    failure: Option<Error>,
}

/// Interrupted is returned when a chunked stream fails before it completes.
/// It holds everything which was rebuilt up to the failure.
#[derive(Debug, thiserror::Error)]
#[error("chunked data stream was interrupted")]
pub struct Interrupted {
    pub partial: QueryDataResponse,
    #[source]
    pub error: Error,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a batch into the tables of its identifier.
    ///
    /// A fragment which cannot be decoded or merged fails its identifier,
    /// and does not affect any other identifier.
    pub fn push(&mut self, batch: ChunkedDataResponse) {
        let ChunkedDataResponse {
            ref_id,
            frames,
            status,
            error,
            error_source,
        } = batch;

        let state = self.states.entry(ref_id.clone()).or_default();

        if status != 0 {
            state.status = Status(status);
        }
        if !error.is_empty() {
            state.error = Some(error);
        }
        if let Some(source) = ErrorSource::parse(&error_source) {
            state.error_source = Some(source);
        }

        if state.failure.is_some() {
            return;
        }
        for frame in &frames {
            if let Err(err) = state.merge(&ref_id, frame) {
                tracing::warn!(%ref_id, error = ?err, "failed to reassemble chunked data (ignoring its further fragments)");
                state.failure = Some(err);
                break;
            }
        }
    }

    /// Consume the Reassembler, returning the response of every identifier seen.
    pub fn finish(self) -> QueryDataResponse {
        let responses = self
            .states
            .into_iter()
            .map(|(ref_id, state)| {
                let ClientState {
                    accumulated,
                    open: _,
                    status,
                    error,
                    error_source,
                    failure,
                } = state;

                let response = DataResponse {
                    frames: accumulated,
                    status,
                    error,
                    error_source,
                    failure,
                };
                (ref_id, response)
            })
            .collect();

        QueryDataResponse { responses }
    }
}

impl ClientState {
    fn merge(&mut self, ref_id: &str, frame: &[u8]) -> crate::Result<()> {
        let fragment = Table::decode(frame).map_err(|source| Error::Decode {
            ref_id: ref_id.to_string(),
            source,
        })?;

        // A fragment without rows is a MARKER, and ends the current table.
        if fragment.rows() == 0 {
            self.open = None;
            return Ok(());
        }

        match self.open.and_then(|i| self.accumulated.get_mut(i)) {
            Some(table) => table
                .append_table(fragment)
                .map_err(|source| Error::SchemaMismatch {
                    ref_id: ref_id.to_string(),
                    source,
                }),
            None => {
                self.accumulated.push(fragment);
                self.open = Some(self.accumulated.len() - 1);
                Ok(())
            }
        }
    }
}

/// Read a chunked stream to its end, and return the rebuilt response
/// of each identifier. Nothing is returned until the stream ends.
pub async fn read_all<S>(stream: S) -> Result<QueryDataResponse, Interrupted>
where
    S: futures::Stream<Item = tonic::Result<ChunkedDataResponse>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut reassembler = Reassembler::new();
    let mut batches = 0;

    while let Some(result) = stream.next().await {
        match result {
            Ok(batch) => {
                batches += 1;
                reassembler.push(batch);
            }
            Err(status) => {
                tracing::debug!(%status, batches, "chunked data stream failed");

                return Err(Interrupted {
                    partial: reassembler.finish(),
                    error: Error::TransportFailure(status),
                });
            }
        }
    }
    tracing::debug!(batches, "chunked data stream completed");

    Ok(reassembler.finish())
}
