use thiserror::Error;

/// Why an inbound text frame could not be turned into a `ProtocolMessage`.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// The payload is not valid JSON.
    #[error("malformed payload: {0}")]
    Decode(#[source] serde_json::Error),
    /// Valid JSON, but the envelope is missing or has bad fields for its type.
    #[error("unclassifiable message: {0}")]
    Classification(#[source] serde_json::Error),
    #[error("{tag} message is missing required field `{field}`")]
    MissingField {
        tag: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("hub connection is not established")]
    NotConnected,
    #[error("outbound queue is full")]
    QueueFull,
    #[error("transport worker has stopped")]
    Closed,
}

/// Returned when an identity is assigned while one is already held.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("identity already assigned as {held}")]
pub struct IdentityConflict {
    pub held: String,
}
