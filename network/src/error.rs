use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("outbound queue full")]
    Full,

    #[error("transport closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),
}
