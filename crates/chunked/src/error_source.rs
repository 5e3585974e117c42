use crate::{ErrorSource, QueryError};
use prost::Message;
use proto_data::rpc;
use std::collections::BTreeMap;

const ERROR_SOURCE_METADATA_KEY: &str = "errorSource";

/// Map a handler error into a tonic::Status.
///
/// Errors classified by a QueryError as plugin or downstream errors become
/// `Code::Unknown` statuses whose details carry a `google.rpc.ErrorInfo`
/// with the classification. Other errors are mapped without enrichment.
pub fn enrich_with_error_source(err: anyhow::Error) -> tonic::Status {
    let Some(source) = err
        .downcast_ref::<QueryError>()
        .and_then(|err| err.error_source)
    else {
        return anyhow_to_status(err);
    };
    let message = format!("{err:#}");

    let info = rpc::ErrorInfo {
        metadata: BTreeMap::from([(
            ERROR_SOURCE_METADATA_KEY.to_string(),
            source.as_str().to_string(),
        )]),
        ..Default::default()
    };
    let details = rpc::Status {
        code: tonic::Code::Unknown as i32,
        message: message.clone(),
        details: vec![pbjson_types::Any {
            type_url: proto_data::ERROR_INFO_TYPE_URL.to_string(),
            value: info.encode_to_vec().into(),
        }],
    };

    tonic::Status::with_details(
        tonic::Code::Unknown,
        message,
        bytes::Bytes::from(details.encode_to_vec()),
    )
}

/// Extract the ErrorSource which `enrich_with_error_source` attached to a Status.
pub fn error_source_from_status(status: &tonic::Status) -> Option<ErrorSource> {
    let details = rpc::Status::decode(status.details()).ok()?;

    for any in details.details {
        if any.type_url != proto_data::ERROR_INFO_TYPE_URL {
            continue;
        }
        let Ok(info) = rpc::ErrorInfo::decode(&any.value[..]) else {
            continue;
        };
        let Some(tag) = info.metadata.get(ERROR_SOURCE_METADATA_KEY) else {
            break;
        };

        match ErrorSource::parse(tag) {
            Some(source) => return Some(source),
            None => tracing::warn!(%tag, "status carries an unknown error source"),
        }
    }
    None
}

// Map an anyhow::Error into a tonic::Status.
fn anyhow_to_status(err: anyhow::Error) -> tonic::Status {
    match err.downcast::<tonic::Status>() {
        Ok(status) => status,
        Err(err) => tonic::Status::internal(format!("{err:#}")),
    }
}
