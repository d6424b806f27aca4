//! SDCP Core
//!
//! Wire types and JSON encoding for the SDCP resin printer protocol.
//!
//! This crate provides:
//! - Command codes and the typed request/response catalogue ([`CommandCode`], [`Command`])
//! - Device state snapshots ([`Status`], [`Attributes`])
//! - Envelope shapes and per-device topics ([`Request`], [`Response`], [`Topics`])
//! - Frame classification for the inbound side of a session ([`codec::decode_inbound`])
//! - Discovery reply records ([`DiscoveryMessage`])

#[macro_use]
mod macros;

pub mod codec;
pub mod command;
pub mod error;
pub mod message;
pub mod path;
pub mod time;
pub mod types;

pub use codec::{decode, decode_inbound, encode, Inbound};
pub use command::*;
pub use error::{Error, Result};
pub use message::*;
pub use path::FilePath;
pub use types::*;

use std::net::Ipv4Addr;

/// Default WebSocket port exposed by the printer mainboard
pub const DEFAULT_WS_PORT: u16 = 3030;

/// WebSocket path on the printer
pub const WS_PATH: &str = "/websocket";

/// UDP port printers listen on for discovery probes
pub const DEFAULT_DISCOVERY_PORT: u16 = 3000;

/// Limited broadcast address used for discovery
pub const BROADCAST_ADDR: Ipv4Addr = Ipv4Addr::BROADCAST;

/// Discovery probe datagram
pub const DISCOVERY_PROBE: &[u8] = b"M99999";

/// Brand identifier sent in the `Id` field of every request
pub const CLIENT_IDENTIFIER: &str = "fluxsdcp";
