// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod notifier;

pub use notifier::{LoggingNotifier, MarketEvent, NoOpNotifier, Notifier, RecordingNotifier};

#[cfg(feature = "async")]
pub use notifier::ChannelNotifier;
