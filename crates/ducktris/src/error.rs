//! Unified error type for the Ducktris server.

use ducktris_protocol::ProtocolError;
use ducktris_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates `From` impls, so the
/// `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DucktrisError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
