/// Codec Module - Address Codec
///
/// The classifier only extracts hash/key spans and hands them here. All text
/// encodings (Base58Check, Bech32, Bech32m) live behind `AddressCodec`.

use std::fmt;
use std::str::FromStr;

use bitcoin::secp256k1::XOnlyPublicKey;
use bitcoin::util::address::{Payload, WitnessVersion};
use bitcoin::{Address, PublicKey, Script};
use ripemd160::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CodecError;

/// Network selector for address prefixes and HRPs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Signet,
    Regtest,
}

impl Network {
    /// Base58Check version byte for P2PKH
    pub fn p2pkh_prefix(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet | Network::Signet | Network::Regtest => 0x6f,
        }
    }

    /// Base58Check version byte for P2SH
    pub fn p2sh_prefix(&self) -> u8 {
        match self {
            Network::Mainnet => 0x05,
            Network::Testnet | Network::Signet | Network::Regtest => 0xc4,
        }
    }
}

impl From<Network> for bitcoin::Network {
    fn from(network: Network) -> Self {
        match network {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
            Network::Signet => bitcoin::Network::Signet,
            Network::Regtest => bitcoin::Network::Regtest,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Signet => "signet",
            Network::Regtest => "regtest",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "signet" => Ok(Network::Signet),
            "regtest" => Ok(Network::Regtest),
            other => Err(format!("unknown network: {}", other)),
        }
    }
}

/// Standard output templates the codec can probe for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
}

impl TemplateKind {
    /// Probe order used by the classifier's fallback path
    pub const PROBE_ORDER: [TemplateKind; 5] = [
        TemplateKind::P2pkh,
        TemplateKind::P2sh,
        TemplateKind::P2wpkh,
        TemplateKind::P2wsh,
        TemplateKind::P2tr,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateKind::P2pkh => "P2PKH",
            TemplateKind::P2sh => "P2SH",
            TemplateKind::P2wpkh => "P2WPKH",
            TemplateKind::P2wsh => "P2WSH",
            TemplateKind::P2tr => "P2TR",
        }
    }
}

/// One operation per template plus a generic "match and derive" probe.
pub trait AddressCodec {
    /// 20-byte pubkey hash -> Base58Check address
    fn encode_p2pkh_hash(&self, hash: &[u8], network: Network) -> Result<String, CodecError>;

    /// 20-byte script hash -> Base58Check address
    fn encode_p2sh_hash(&self, hash: &[u8], network: Network) -> Result<String, CodecError>;

    /// Witness v0 program (20 or 32 bytes) -> Bech32 address
    fn encode_segwit_v0(&self, program: &[u8], network: Network) -> Result<String, CodecError>;

    /// x-only taproot output key -> Bech32m address. Fails when the key is not a curve point.
    fn encode_taproot(&self, output_key: &[u8], network: Network) -> Result<String, CodecError>;

    /// Witness v1 program encoded as-is, no key validation
    fn encode_segwit_v1_raw(&self, program: &[u8], network: Network) -> Result<String, CodecError>;

    /// Full public key -> address of the equivalent P2PKH output
    fn encode_p2pkh_pubkey(&self, pubkey: &[u8], network: Network) -> Result<String, CodecError>;

    /// If `script` is exactly the given template, the address it pays to
    fn match_template(&self, template: TemplateKind, script: &[u8], network: Network) -> Option<String>;
}

/// Default codec: Base58Check via bs58 + sha2, Bech32/Bech32m via the
/// `bitcoin` crate's address payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitcoinAddressCodec;

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> Vec<u8> {
    let sha = Sha256::digest(data);
    Ripemd160::digest(&sha).to_vec()
}

/// Version byte + payload + first 4 bytes of SHA256(SHA256(version + payload))
pub fn base58check_encode(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + 4);
    data.push(version);
    data.extend_from_slice(payload);

    let first_hash = Sha256::digest(&data);
    let second_hash = Sha256::digest(&first_hash);
    data.extend_from_slice(&second_hash[..4]);

    bs58::encode(&data).into_string()
}

fn expect_len(bytes: &[u8], expected: usize) -> Result<(), CodecError> {
    if bytes.len() != expected {
        return Err(CodecError::BadLength { expected, actual: bytes.len() });
    }
    Ok(())
}

fn witness_address(version: WitnessVersion, program: &[u8], network: Network) -> String {
    Address {
        payload: Payload::WitnessProgram { version, program: program.to_vec() },
        network: network.into(),
    }
    .to_string()
}

impl AddressCodec for BitcoinAddressCodec {
    fn encode_p2pkh_hash(&self, hash: &[u8], network: Network) -> Result<String, CodecError> {
        expect_len(hash, 20)?;
        Ok(base58check_encode(network.p2pkh_prefix(), hash))
    }

    fn encode_p2sh_hash(&self, hash: &[u8], network: Network) -> Result<String, CodecError> {
        expect_len(hash, 20)?;
        Ok(base58check_encode(network.p2sh_prefix(), hash))
    }

    fn encode_segwit_v0(&self, program: &[u8], network: Network) -> Result<String, CodecError> {
        if program.len() != 20 && program.len() != 32 {
            return Err(CodecError::BadLength { expected: 32, actual: program.len() });
        }
        Ok(witness_address(WitnessVersion::V0, program, network))
    }

    fn encode_taproot(&self, output_key: &[u8], network: Network) -> Result<String, CodecError> {
        // Output key as it appears in the script, not tweaked again
        expect_len(output_key, 32)?;
        XOnlyPublicKey::from_slice(output_key)
            .map_err(|e| CodecError::InvalidXOnlyKey(e.to_string()))?;
        Ok(witness_address(WitnessVersion::V1, output_key, network))
    }

    fn encode_segwit_v1_raw(&self, program: &[u8], network: Network) -> Result<String, CodecError> {
        // BIP141 bounds on witness program size
        if program.len() < 2 || program.len() > 40 {
            return Err(CodecError::BadLength { expected: 32, actual: program.len() });
        }
        Ok(witness_address(WitnessVersion::V1, program, network))
    }

    fn encode_p2pkh_pubkey(&self, pubkey: &[u8], network: Network) -> Result<String, CodecError> {
        PublicKey::from_slice(pubkey).map_err(|e| CodecError::InvalidPublicKey(e.to_string()))?;
        Ok(base58check_encode(network.p2pkh_prefix(), &hash160(pubkey)))
    }

    fn match_template(&self, template: TemplateKind, script: &[u8], network: Network) -> Option<String> {
        let script = Script::from(script.to_vec());
        let matches = match template {
            TemplateKind::P2pkh => script.is_p2pkh(),
            TemplateKind::P2sh => script.is_p2sh(),
            TemplateKind::P2wpkh => script.is_v0_p2wpkh(),
            TemplateKind::P2wsh => script.is_v0_p2wsh(),
            TemplateKind::P2tr => script.is_v1_p2tr(),
        };
        if !matches {
            return None;
        }
        Address::from_script(&script, network.into()).ok().map(|addr| addr.to_string())
    }
}
