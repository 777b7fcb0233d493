//! Wire protocol for Playfield battles.
//!
//! Battle clients never exchange boards. Each side simulates its own game
//! from the shared seed, and the wire only carries what the opponent needs
//! to display and what the relay needs to arbitrate:
//!
//! - **Types** ([`Envelope`], [`SystemMessage`], [`BattleMessage`],
//!   [`RelayEvent`]): the messages.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how they become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! client ──Battle──→ relay ──Relay──→ opponent
//!        ←─System──→
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ArbitrationMode, BattleMessage, Envelope, FinalReport, MatchId, MatchOutcome, Payload,
    PlayerId, Progress, RelayEvent, SystemMessage, PROTOCOL_VERSION,
};
