//! Native messaging host for the tabmark browser extension.
//!
//! The extension forwards tab events, popup and omnibox requests over a
//! length-prefixed JSON pipe. The host answers them with the background
//! services and pushes badge, navigation and notification commands back.

pub mod api_client;
pub mod badge_sink;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod server;
pub mod telemetry;

pub use api_client::{ApiClientError, HttpGatewayFactory, LinkdingClient};
pub use badge_sink::ChannelBadgeHost;
pub use config::{HostConfig, HostConfigError};
pub use dispatch::Dispatcher;
pub use error::HostError;
pub use framing::{native_codec, FramingError, MAX_INBOUND_FRAME};
pub use protocol::{Envelope, HostMessage, HostRequest};
pub use server::{outbound_channel, serve};
