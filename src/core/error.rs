use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Failed to load topology '{path}': {reason}")]
    Load { path: String, reason: String },

    #[error("Failed to load credential store '{path}': {reason}")]
    StoreLoad { path: String, reason: String },

    #[error("Failed to persist credential store '{path}': {reason}")]
    StorePersist { path: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{endpoint} unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("{endpoint} rejected AUTH: {reason}")]
    AuthFailed { endpoint: String, reason: String },

    #[error("{endpoint} rejected CONFIG SET requirepass: {reason}")]
    ConfigRejected { endpoint: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Endpoint the error refers to, for rotation failures.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Unreachable { endpoint, .. }
            | Self::AuthFailed { endpoint, .. }
            | Self::ConfigRejected { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    /// Protocol phase label used in log fields.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Load { .. } => "topology",
            Self::StoreLoad { .. } => "store-load",
            Self::StorePersist { .. } => "store-persist",
            Self::InvalidArgument(_) => "argument",
            Self::Unreachable { .. } => "connect",
            Self::AuthFailed { .. } => "auth",
            Self::ConfigRejected { .. } => "config-set",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }

    /// Only a broken topology (or configuration) stops the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Load { .. } | Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
