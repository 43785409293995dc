//! Glint Codec - bencode control messages
//!
//! Control traffic (scroll lists, damage regions, pixel buffer
//! descriptions) crosses the transport as bencode: a length-prefixed
//! binary format with one canonical encoding per value. Dictionaries
//! encode with byte-sorted keys and integers in minimal decimal form, so
//! equal values always produce equal bytes.

pub mod decode;
pub mod encode;
pub mod value;
pub mod wire;

pub use decode::{decode, decode_with_limits, DecodeLimits};
pub use encode::{encode, encode_to};
pub use value::{FromBencode, ToBencode, Value};
pub use wire::{pixel_buffer_from_value, pixel_buffer_to_value};
