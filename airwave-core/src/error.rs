use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid channel: {channel}. Valid: {}", valid.join(", "))]
    InvalidChannel { channel: String, valid: Vec<String> },

    #[error("Invalid resource path: {0}")]
    InvalidResource(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_channel_message_lists_valid_channels() {
        let err = Error::InvalidChannel {
            channel: "xyz".to_string(),
            valid: vec!["rthk1".to_string(), "metro104".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid channel: xyz. Valid: rthk1, metro104");
    }
}
