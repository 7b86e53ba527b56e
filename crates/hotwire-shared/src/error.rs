use thiserror::Error;

/// Failure of a single control-connection or tracker exchange.
///
/// Every failure is terminal for its exchange; no retry happens anywhere
/// in this layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("request could not be transmitted")]
    SendFailed,

    #[error("server declined the request: {0}")]
    Declined(String),

    #[error("link closed before a reply arrived")]
    LinkClosed,
}
