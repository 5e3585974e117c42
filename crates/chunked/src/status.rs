/// Status is an HTTP-like status code attached to the response of a query.
/// The zero value means no status was set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct Status(pub i32);

impl Status {
    pub const OK: Status = Status(200);
    pub const BAD_REQUEST: Status = Status(400);
    pub const UNAUTHORIZED: Status = Status(401);
    pub const FORBIDDEN: Status = Status(403);
    pub const NOT_FOUND: Status = Status(404);
    pub const TOO_MANY_REQUESTS: Status = Status(429);
    pub const INTERNAL: Status = Status(500);
    pub const NOT_IMPLEMENTED: Status = Status(501);
    pub const BAD_GATEWAY: Status = Status(502);
    pub const TIMEOUT: Status = Status(504);

    pub fn is_set(&self) -> bool {
        self.0 != 0
    }
}

/// ErrorSource classifies whose fault an error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSource {
    /// The error was caused by the datasource producing the data.
    Plugin,
    /// The error was caused by a system the datasource depends on.
    Downstream,
}

impl ErrorSource {
    /// Tag of the ErrorSource as it's represented on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSource::Plugin => "plugin",
            ErrorSource::Downstream => "downstream",
        }
    }

    /// Parse a wire tag. Empty and unrecognized tags have no ErrorSource.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "plugin" => Some(ErrorSource::Plugin),
            "downstream" => Some(ErrorSource::Downstream),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// QueryError is a failure of a single query, which is delivered to the
/// consumer as part of that query's response rather than ending the stream.
///
/// Handlers may also return a QueryError (within an `anyhow::Error`) to
/// classify an error which fails the whole request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
    pub status: Status,
    pub error_source: Option<ErrorSource>,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Status::INTERNAL,
            error_source: None,
        }
    }

    /// A QueryError caused by the datasource itself.
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::new(message).with_source(ErrorSource::Plugin)
    }

    /// A QueryError caused by a system the datasource depends on.
    pub fn downstream(message: impl Into<String>) -> Self {
        Self::new(message)
            .with_source(ErrorSource::Downstream)
            .with_status(Status::BAD_GATEWAY)
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_source(mut self, source: ErrorSource) -> Self {
        self.error_source = Some(source);
        self
    }
}

impl From<&str> for QueryError {
    fn from(message: &str) -> Self {
        QueryError::new(message)
    }
}

impl From<String> for QueryError {
    fn from(message: String) -> Self {
        QueryError::new(message)
    }
}

impl From<anyhow::Error> for QueryError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<QueryError>() {
            Ok(err) => err,
            Err(err) => QueryError::new(format!("{err:#}")),
        }
    }
}
