use std::error::Error;

use crate::error::ErrorKind;
use crate::request::TurnRequest;
use crate::response::ChatResponse;

/// The error type for a chat provider.
pub trait ProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;

    /// Returns the diagnostic lines the remote service sent along with a
    /// failure status, verbatim and in order.
    ///
    /// Errors that didn't come from a remote response have none.
    fn diagnostic(&self) -> &[String] {
        &[]
    }
}

/// A type that represents a remote chat service.
///
/// Once the provider is created, it should behave like a stateless
/// object. Everything a turn needs is carried by the [`TurnRequest`].
pub trait ChatProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ProviderError;

    /// The response type for this provider.
    type Response: ChatResponse<Error = Self::Error>;

    /// Sends a request to the remote service.
    ///
    /// The future resolves once the response status is known. A
    /// non-success status resolves to an error of kind
    /// [`ErrorKind::Remote`].
    fn send_request(
        &self,
        req: &TurnRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
