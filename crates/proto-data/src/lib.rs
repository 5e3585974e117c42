mod data;
pub use data::*;

/// Subset of the `google.rpc` package, used to attach
/// structured details to gRPC statuses.
#[path = "google.rpc.rs"]
pub mod rpc;

/// Type URL of an `ErrorInfo` packed into a `google.protobuf.Any`.
pub const ERROR_INFO_TYPE_URL: &str = "type.googleapis.com/google.rpc.ErrorInfo";
