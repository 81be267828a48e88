//! `ai_generate_text` scalar function core.
//!
//! Builds a chat-completion request from a prompt and optional overrides,
//! posts it to an OpenAI-compatible endpoint and extracts the generated text.
//! Every failure is rendered as a string outcome so the function can be used
//! as an ordinary scalar inside query execution.

mod config;
mod endpoint;
mod error;
mod generate;
mod request;
mod response;
mod secrets;
mod transport;

pub use config::{AiFunctionConfig, ApiKey, DEFAULT_CONNECTION_TIMEOUT_S};
pub use endpoint::{is_endpoint_supported, is_endpoint_valid};
pub use error::{GenerateError, Result, SecretError, TransportError};
pub use generate::AiTextGenerator;
pub use request::{GenerateTextParams, Header, PreparedRequest};
pub use response::extract_content;
pub use secrets::SecretResolver;
pub use transport::{ReqwestTransport, Transport};
