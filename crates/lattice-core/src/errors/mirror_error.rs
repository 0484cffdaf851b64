/// Dual-write mirror failures. Logged and counted by the compatibility layer,
/// never propagated out of a canonical write.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("legacy mirror write failed for `{id}`: {reason}")]
    WriteFailed { id: String, reason: String },

    #[error("legacy lookup failed for `{id}`: {reason}")]
    ReadFailed { id: String, reason: String },

    #[error("invalid migration phase transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}
