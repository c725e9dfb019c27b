//! Command-line arguments and environment configuration.

use std::path::PathBuf;

use clap::Parser;
use stream_chat_core::Error;
use stream_chat_dify::{DifyConfig, DifyConfigBuilder};

/// The variable holding the API key.
pub const API_KEY_VAR: &str = "DIFY_API_KEY";

/// The variable holding the chat messages endpoint.
pub const ENDPOINT_VAR: &str = "DIFY_ENDPOINT";

/// The variable holding the end-user identifier.
pub const USER_ID_VAR: &str = "USER_ID";

/// Shown when the environment is incomplete.
pub const ENV_HELP: &str = "\
Set the required environment variables, for example:
  export DIFY_API_KEY=your-api-key
  export DIFY_ENDPOINT=https://api.dify.ai/v1/chat-messages
  export USER_ID=your-user-id";

/// Shown when no prompt is given.
pub const PROMPT_HELP: &str = "\
Provide a prompt, for example:
  stream-chat \"Any other recommendations?\"";

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "stream-chat", version, about)]
pub struct Cli {
    /// The prompt to send.
    pub prompt: Option<String>,

    /// Path of the history file.
    #[arg(long, env = "STREAM_CHAT_HISTORY", default_value = "history.json")]
    pub history: PathBuf,

    /// Show or hide reasoning spans; remembered for later runs.
    #[arg(long, value_name = "BOOL")]
    pub show_think: Option<bool>,

    /// Delay between rendered characters; remembered for later runs.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,
}

impl Cli {
    /// Returns the prompt, or a configuration error if there is none.
    pub fn prompt(&self) -> Result<&str, Error> {
        match self.prompt.as_deref() {
            Some(prompt) if !prompt.trim().is_empty() => Ok(prompt),
            _ => Err(Error::config("no prompt given")),
        }
    }
}

/// Builds the provider configuration from environment variables.
///
/// `lookup` returns the value of a variable; blank values count as
/// missing. The error names every missing variable.
pub fn provider_config(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<DifyConfig, Error> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    match (get(API_KEY_VAR), get(ENDPOINT_VAR), get(USER_ID_VAR)) {
        (Some(api_key), Some(endpoint), Some(user)) => {
            Ok(DifyConfigBuilder::with_api_key(api_key)
                .with_endpoint(endpoint)
                .with_user(user)
                .build())
        }
        (api_key, endpoint, user) => {
            let missing: Vec<_> = [
                (API_KEY_VAR, api_key.is_none()),
                (ENDPOINT_VAR, endpoint.is_none()),
                (USER_ID_VAR, user.is_none()),
            ]
            .into_iter()
            .filter_map(|(key, missing)| missing.then_some(key))
            .collect();
            Err(Error::config(format!(
                "missing environment variables: {}",
                missing.join(", ")
            )))
        }
    }
}
