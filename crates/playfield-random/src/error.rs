//! Error types for the randomness layer.

/// Errors raised by the generator and its consumers.
///
/// Nothing here is ever clamped into a "close enough" value: a battle
/// client that silently adjusted a bad argument could draw a different
/// number of values than its opponent and drift out of sync.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RandomError {
    /// The seed could not be turned into an integer state
    /// (NaN, infinite, fractional, or too large to be exact).
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// A caller passed arguments outside the operation's contract,
    /// e.g. an empty slice to `pick` or `max <= min` to `next_int`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
