use std::fmt;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.dify.ai/v1/chat-messages";

/// An API key that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct ApiKey(String);

impl ApiKey {
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Builder for [`DifyConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DifyConfigBuilder {
    api_key: ApiKey,
    endpoint: Option<String>,
    user: Option<String>,
}

impl DifyConfigBuilder {
    /// Starts a configuration for the app identified by `api_key`.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: ApiKey(api_key.into()),
            endpoint: None,
            user: None,
        }
    }

    /// Full URL of the chat messages endpoint. Defaults to
    /// [`DEFAULT_ENDPOINT`].
    pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..self
        }
    }

    /// End-user identifier sent with every request. Empty when unset.
    pub fn with_user(self, user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ..self
        }
    }

    /// Finishes the configuration.
    pub fn build(self) -> DifyConfig {
        let Self {
            api_key,
            endpoint,
            user,
        } = self;
        DifyConfig {
            api_key,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            user: user.unwrap_or_default(),
        }
    }
}

/// Connection settings for [`DifyProvider`](crate::DifyProvider).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DifyConfig {
    pub(crate) api_key: ApiKey,
    pub(crate) endpoint: String,
    pub(crate) user: String,
}

impl DifyConfig {
    /// The URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The end-user identifier.
    pub fn user(&self) -> &str {
        &self.user
    }
}
