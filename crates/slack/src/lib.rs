//! Slack interface for the pelada bot.
//!
//! - **Socket Mode** (`socket`) - event loop with reconnect backoff
//! - **Slash Commands** (`commands`) - `/futebol`, `/teams [rank]`, `/remake`, `/pelada help`
//! - **Events** (`events`) - dispatch of slash commands and attendance button clicks
//! - **Block Kit** (`blocks`) - attendance panel, summary and team cards
//! - **Outbound** (`sink`) - channel posts and in-place panel updates
//! - **Service** (`service`) - wiring into the attendance sequencer and team desk
//!
//! ```text
//! Slack Events → EventDispatcher → PeladaService → AttendanceSequencer / TeamDesk
//!                                       ↓
//!                     MessageSink (panel) / SocketTransport::respond (replies)
//! ```
//!
//! Set `PELADA_SLACK_APP_TOKEN` and `PELADA_SLACK_BOT_TOKEN` before running the server.

pub mod blocks;
pub mod commands;
pub mod events;
pub mod service;
pub mod sink;
pub mod socket;
