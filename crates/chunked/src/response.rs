use crate::{Error, ErrorSource, QueryError, Status};
use data_table::Table;
use std::collections::BTreeMap;

/// DataResponse is the complete answer to one query.
#[derive(Debug, Default)]
pub struct DataResponse {
    pub frames: Vec<Table>,
    pub status: Status,
    /// Error reported by the producer of this response.
    pub error: Option<String>,
    pub error_source: Option<ErrorSource>,
    /// Failure to rebuild this response from its fragments.
    /// Frames rebuilt before the failure are retained.
    pub failure: Option<Error>,
}

/// QueryDataResponse holds a DataResponse for each query of a request,
/// keyed on the query identifier.
#[derive(Debug, Default)]
pub struct QueryDataResponse {
    pub responses: BTreeMap<String, DataResponse>,
}

impl DataResponse {
    pub fn from_frames(frames: Vec<Table>) -> Self {
        Self {
            frames,
            status: Status::OK,
            ..Default::default()
        }
    }

    pub fn from_error(err: impl Into<QueryError>) -> Self {
        let QueryError {
            message,
            status,
            error_source,
        } = err.into();

        Self {
            status,
            error: Some(message),
            error_source,
            ..Default::default()
        }
    }

    /// Total number of rows across all frames.
    pub fn rows(&self) -> usize {
        self.frames.iter().map(Table::rows).sum()
    }

    fn into_proto(self, ref_id: &str) -> crate::Result<proto_data::DataResponse> {
        let frames = self
            .frames
            .into_iter()
            .map(|mut frame| {
                frame.ref_id = ref_id.to_string();
                frame.encode().map_err(|source| Error::EncodingFailure {
                    ref_id: ref_id.to_string(),
                    source,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(proto_data::DataResponse {
            frames,
            error: self.error.unwrap_or_default(),
            status: self.status.0,
            error_source: self
                .error_source
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
        })
    }

    fn from_proto(ref_id: &str, proto: proto_data::DataResponse) -> crate::Result<Self> {
        let proto_data::DataResponse {
            frames,
            error,
            status,
            error_source,
        } = proto;

        let frames = frames
            .iter()
            .map(|frame| {
                Table::decode(frame).map_err(|source| Error::Decode {
                    ref_id: ref_id.to_string(),
                    source,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(Self {
            frames,
            status: Status(status),
            error: (!error.is_empty()).then_some(error),
            error_source: ErrorSource::parse(&error_source),
            failure: None,
        })
    }
}

impl QueryDataResponse {
    pub fn into_proto(self) -> crate::Result<proto_data::QueryDataResponse> {
        let responses = self
            .responses
            .into_iter()
            .map(|(ref_id, response)| {
                let response = response.into_proto(&ref_id)?;
                Ok((ref_id, response))
            })
            .collect::<crate::Result<_>>()?;

        Ok(proto_data::QueryDataResponse { responses })
    }

    pub fn from_proto(proto: proto_data::QueryDataResponse) -> crate::Result<Self> {
        let responses = proto
            .responses
            .into_iter()
            .map(|(ref_id, response)| {
                let response = DataResponse::from_proto(&ref_id, response)?;
                Ok((ref_id, response))
            })
            .collect::<crate::Result<_>>()?;

        Ok(Self { responses })
    }
}
