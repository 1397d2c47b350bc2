//! Core wire protocol for skinny station signaling
//!
//! This crate implements the binary message layer a call server uses to
//! talk to skinny phones: framing and per-version payload codecs, the
//! protocol version negotiation tables, the codec registry, and the
//! capability set algebra that picks a joint media codec for a call.
//!
//! # Organization
//!
//! - [`packet`]: message framing, payload structures, encode and decode
//! - [`protocol`]: family and version negotiation, per-version builders
//! - [`codec`]: codec registry and capability sets
//! - [`net`]: socket address helpers shared by signaling and media
//! - [`error`]: the error type for the whole crate
//!
//! # Example
//!
//! ```
//! use skinny_core::packet::{decode_message, encode_message, Payload, SccpMessage};
//! use skinny_core::protocol::{negotiate, ProtocolFamily};
//!
//! let proto = negotiate(ProtocolFamily::Sccp, 17);
//! let ack = proto.register_ack(30, "D/M/Y", 30);
//! let wire = encode_message(&ack, proto.version).unwrap();
//! let decoded = decode_message(&wire, proto.version).unwrap();
//! assert_eq!(decoded.payload, ack.payload);
//! # let _ = SccpMessage::new(Payload::KeepAlive);
//! ```

pub mod codec;
pub mod error;
pub mod net;
pub mod packet;
pub mod protocol;

pub use codec::{
    find_best_joint, AudioCapabilities, CapabilitySet, DataCapabilities, SkinnyCodec,
    VideoCapabilities,
};
pub use error::{Result, SccpError};
pub use packet::{decode_message, encode_message, MessageId, Payload, SccpMessage};
pub use protocol::{is_supported, negotiate, ProtocolDescriptor, ProtocolFamily};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
