use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HlcError {
    #[error(
        "remote timestamp {remote_ns}ns is more than {max_drift_ns}ns ahead of local clock {local_ns}ns"
    )]
    DriftExceeded {
        remote_ns: u64,
        local_ns: u64,
        max_drift_ns: u64,
    },
}
