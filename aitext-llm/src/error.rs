use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerateError>;

/// Failure outcomes of a single `ai_generate_text` call.
///
/// The `Display` text of each variant is the exact string handed back to the
/// query engine in place of a result. `InvalidJson` is shared by override
/// parse failures and response parse/extraction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("Invalid Json")]
    InvalidJson,

    #[error("Invalid Protocol, use https")]
    InvalidProtocol,

    #[error("Unsupported Endpoint")]
    UnsupportedEndpoint,

    #[error("Invalid Prompt, cannot be null or empty")]
    InvalidPrompt,

    #[error("Invalid override, 'messages' cannot be overriden")]
    MessagesOverrideForbidden,

    #[error("{0}")]
    Secret(String),

    #[error("{0}")]
    Transport(String),
}

impl GenerateError {
    /// True for failures caused by the caller's arguments, false for
    /// keystore and network failures.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::Secret(_) | Self::Transport(_))
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: status={status} url={url}")]
    Status { status: u16, url: String },

    #[error("http error: {0}")]
    Http(String),
}

// reqwest's Display omits the cause, so the source chain is appended.
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let mut msg = if e.is_timeout() {
            format!("timed out: {e}")
        } else if e.is_connect() {
            format!("connect failed: {e}")
        } else {
            e.to_string()
        };
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            msg.push_str(": ");
            msg.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Http(msg)
    }
}

impl From<TransportError> for GenerateError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SecretError {
    #[error("secret '{0}' not found in keystore")]
    NotFound(String),

    #[error("invalid secret name: {0:?}")]
    InvalidName(String),
}

impl From<SecretError> for GenerateError {
    fn from(e: SecretError) -> Self {
        Self::Secret(e.to_string())
    }
}

impl From<serde_json::Error> for GenerateError {
    fn from(_: serde_json::Error) -> Self {
        Self::InvalidJson
    }
}
