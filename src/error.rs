pub type Result<T> = std::result::Result<T, ChartError>;

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("invalid chart input: {reason}")]
    InvalidInput { reason: String },
    #[error("node not found: {id}")]
    UnknownNodeReference { id: String },
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl ChartError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn unknown_node(id: impl Into<String>) -> Self {
        Self::UnknownNodeReference { id: id.into() }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
