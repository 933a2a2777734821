//! Channel state tracking
//!
//! Sixteen per-channel records plus the activity indicator. The table is an
//! explicit value owned by the router; nothing here is global, so tests build
//! isolated instances.

mod activity;
mod channel;
mod table;

pub use activity::{ActivityIndicator, ACTIVE_FRAMES};
pub use channel::ChannelState;
pub use table::ChannelTable;
