pub mod api;
pub mod classify;
pub mod codec;
pub mod config;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod hasher;
pub mod metrics;
pub mod report;
pub mod script;
pub mod size;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use classify::{classify_script_pubkey, Classification, ScriptType};
pub use codec::{AddressCodec, BitcoinAddressCodec, Network};
pub use decoder::{decode_hex, decode_transaction};
pub use error::{CodecError, DecodeError};
pub use hasher::{Sha256dHasher, TxHasher};
pub use report::{build_report, decode_report, TransactionReport};

/// Segwit v0 spend with one input and two P2WPKH outputs
pub const SAMPLE_TX_HEX: &str = "020000000001018f105811203439c1a1f0325eb553eb7dc7ddfb11f434bf8dfb640f1244eea4df0000000000ffffffff021010e9000000000016001456d46899fe8a6d2694abe1294d14888ccebb66bfd79c4122000000001600149c38191f20275ea9ececd2f762c450ff159508f802473044022070181cd1291be94ae0ef7976ffc77a9644f223e0a91c0059c364ecf148809e3202203be57465271368a823410a1a3578c761c6cb2cd582871ec4064e4a336c0121cb012103e6bbd3f40f01ddd7587915a514c30998561d26abf8baf1cc53ac1360fae860f600000000";
