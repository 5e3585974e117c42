//! Chunked delivery of query results as tables.
//!
//! A [`ChunkedWriter`] accepts tables and rows for any number of queries,
//! keyed on their identifier (`ref_id`), and flushes them as batches of encoded
//! table fragments over a single ordered channel. A [`Reassembler`] consumes
//! those batches and rebuilds the complete tables of each identifier.
//!
//! Fragments of one identifier are delimited by the [`MARKER`]: a table having
//! no columns and no rows. A marker ends the identifier's current table, and the
//! next fragment having rows begins a new one. Any other fragment continues the
//! current table. Writers emit a marker only when a table is opened, so a table
//! may span any number of flushes.

use data_table::Table;

mod adapter;
mod error_source;
mod key_state;
mod reassemble;
mod response;
mod status;
mod writer;

pub use adapter::{ChunkedDataHandler, DataAdapter, Handler, QueryDataHandler};
pub use error_source::{enrich_with_error_source, error_source_from_status};
pub use reassemble::{read_all, Interrupted, Reassembler};
pub use response::{DataResponse, QueryDataResponse};
pub use status::{ErrorSource, QueryError, Status};
pub use writer::{ChunkedWriter, WriterConfig};

/// MARKER is the boundary between two tables of one identifier.
pub static MARKER: Table = Table::empty();

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no table has been opened for '{0}', cannot append row")]
    NoOpenFragment(String),
    #[error("field count mismatch for '{ref_id}': got {got}, want {want}")]
    FieldArityMismatch {
        ref_id: String,
        got: usize,
        want: usize,
    },
    #[error("row of '{ref_id}' does not match its table")]
    FieldType {
        ref_id: String,
        #[source]
        source: data_table::Error,
    },
    #[error("failed to encode a table fragment of '{ref_id}'")]
    EncodingFailure {
        ref_id: String,
        #[source]
        source: data_table::Error,
    },
    #[error("failed to decode a table fragment of '{ref_id}'")]
    Decode {
        ref_id: String,
        #[source]
        source: data_table::Error,
    },
    #[error("table fragment of '{ref_id}' cannot be merged into its current table")]
    SchemaMismatch {
        ref_id: String,
        #[source]
        source: data_table::Error,
    },
    #[error("chunked data transport failed")]
    TransportFailure(#[from] tonic::Status),
}

pub type Result<T> = std::result::Result<T, Error>;
