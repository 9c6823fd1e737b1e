// Upstream proxy errors

/// Errors raised while resolving or fetching an upstream resource.
///
/// `Clone` so that requests coalesced onto one fetch can all receive the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    #[error("Upstream returned status {status} for {url}")]
    Upstream { status: u16, url: String },

    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    #[error("No origin configured for channel {0}")]
    UnknownChannel(String),

    #[error("Upstream fetch abandoned before completion")]
    Abandoned,
}

pub type Result<T> = std::result::Result<T, ProxyError>;
