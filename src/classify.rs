/// Classify Module - Output Classifier
///
/// Matches a scriptPubKey against the standard templates and asks the
/// address codec for the address it pays to. Matching is by exact length and
/// byte pattern, tried in a fixed priority order because some templates share
/// a length (P2WSH and P2TR are both 34 bytes):
///
/// 1. `OP_RETURN` (first byte 0x6a), payload extracted
/// 2. P2PKH  `76 a9 14 <20> 88 ac`
/// 3. P2SH   `a9 14 <20> 87`
/// 4. P2WPKH `00 14 <20>`
/// 5. P2WSH  `00 20 <32>`
/// 6. P2TR   `51 20 <32>`
/// 7. P2PK   `41 <65> ac` or `21 <33> ac`
/// 8. P2MS   ends in `OP_CHECKMULTISIG`, at least 37 bytes
/// 9. Codec probe for each template, else UNKNOWN
///
/// Every input maps to exactly one `Classification`. Nothing here panics or
/// propagates: slice errors become an ERROR classification and codec
/// failures keep the recognized type without an address.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use crate::codec::{AddressCodec, Network, TemplateKind};
use crate::script::opcodes::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScriptType {
    P2PKH,
    P2SH,
    P2WPKH,
    P2WSH,
    P2TR,
    P2PK,
    P2MS,
    #[serde(rename = "OP_RETURN")]
    OpReturn,
    #[serde(rename = "UNKNOWN")]
    Unknown,
    #[serde(rename = "INVALID")]
    Invalid,
    #[serde(rename = "ERROR")]
    Error,
}

impl ScriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::P2PKH => "P2PKH",
            ScriptType::P2SH => "P2SH",
            ScriptType::P2WPKH => "P2WPKH",
            ScriptType::P2WSH => "P2WSH",
            ScriptType::P2TR => "P2TR",
            ScriptType::P2PK => "P2PK",
            ScriptType::P2MS => "P2MS",
            ScriptType::OpReturn => "OP_RETURN",
            ScriptType::Unknown => "UNKNOWN",
            ScriptType::Invalid => "INVALID",
            ScriptType::Error => "ERROR",
        }
    }

    /// Human description of the template
    pub fn description(&self) -> &'static str {
        match self {
            ScriptType::P2PKH => "Pay-to-Public-Key-Hash",
            ScriptType::P2SH => "Pay-to-Script-Hash",
            ScriptType::P2WPKH => "Segwit Pay-to-Public-Key-Hash",
            ScriptType::P2WSH => "Segwit Pay-to-Script-Hash",
            ScriptType::P2TR => "Taproot output (Pay-to-Taproot)",
            ScriptType::P2PK => "Pay-to-Public-Key",
            ScriptType::P2MS => "Multisig",
            ScriptType::OpReturn => "OP_RETURN data output (Null Data)",
            ScriptType::Unknown => "Unrecognized script type",
            ScriptType::Invalid => "Invalid script",
            ScriptType::Error => "Parse error",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unexpected failure while matching. Downgraded to an ERROR classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    #[error("read of {len} bytes at offset {offset} is outside a {script_len}-byte script")]
    OutOfRange { offset: usize, len: usize, script_len: usize },
}

fn serialize_opt_hex<S>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match data {
        Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
        None => serializer.serialize_none(),
    }
}

/// Result of classifying one scriptPubKey
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub script_type: ScriptType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub description: String,
    /// OP_RETURN payload
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_opt_hex")]
    pub data: Option<Vec<u8>>,
}

impl Classification {
    fn new(script_type: ScriptType, address: Option<String>) -> Self {
        Self {
            script_type,
            address,
            description: script_type.description().to_string(),
            data: None,
        }
    }

    fn annotated(mut self, note: impl fmt::Display) -> Self {
        self.description = format!("{} ({})", self.description, note);
        self
    }

    pub fn data_hex(&self) -> Option<String> {
        self.data.as_ref().map(hex::encode)
    }
}

type MatchResult = Result<Option<Classification>, ClassifierError>;
type Matcher = fn(&[u8], &dyn AddressCodec, Network) -> MatchResult;

/// Template matchers in priority order. The first `Some` wins.
const MATCHERS: [Matcher; 9] = [
    match_op_return,
    match_p2pkh,
    match_p2sh,
    match_p2wpkh,
    match_p2wsh,
    match_p2tr,
    match_p2pk,
    match_p2ms,
    match_codec_probe,
];

/// Classify a scriptPubKey. Total and deterministic.
pub fn classify_script_pubkey(
    script: &[u8],
    codec: &dyn AddressCodec,
    network: Network,
) -> Classification {
    if script.is_empty() {
        return Classification::new(ScriptType::Invalid, None);
    }

    for matcher in MATCHERS {
        match matcher(script, codec, network) {
            Ok(Some(classification)) => return classification,
            Ok(None) => continue,
            Err(e) => {
                return Classification::new(ScriptType::Error, None).annotated(e);
            }
        }
    }

    Classification::new(ScriptType::Unknown, None)
}

fn span(script: &[u8], offset: usize, len: usize) -> Result<&[u8], ClassifierError> {
    script
        .get(offset..offset.saturating_add(len))
        .filter(|s| s.len() == len)
        .ok_or(ClassifierError::OutOfRange { offset, len, script_len: script.len() })
}

/// Address from a recognized template, or the bare type when the codec refuses
fn with_address<E: fmt::Display>(script_type: ScriptType, encoded: Result<String, E>) -> Classification {
    match encoded {
        Ok(address) => Classification::new(script_type, Some(address)),
        Err(e) => {
            warn!(script_type = %script_type, error = %e, "Address derivation failed");
            Classification::new(script_type, None).annotated(format!("address unavailable: {}", e))
        }
    }
}

fn match_op_return(script: &[u8], _codec: &dyn AddressCodec, _network: Network) -> MatchResult {
    if script[0] != OP_RETURN {
        return Ok(None);
    }

    let mut result = Classification::new(ScriptType::OpReturn, None);
    if script.len() < 2 {
        return Ok(Some(result));
    }

    // PUSHDATA4 payloads are not unpacked
    let push = script[1];
    let located = match push {
        0x00..=OP_PUSHBYTES_75 => Some((2usize, push as usize)),
        OP_PUSHDATA1 => script.get(2).map(|len| (3usize, *len as usize)),
        OP_PUSHDATA2 => {
            let len = span(script, 2, 2)?;
            Some((4usize, u16::from_le_bytes([len[0], len[1]]) as usize))
        }
        _ => None,
    };

    if let Some((start, len)) = located {
        if start + len <= script.len() {
            result.data = Some(script[start..start + len].to_vec());
        }
    }
    Ok(Some(result))
}

fn match_p2pkh(script: &[u8], codec: &dyn AddressCodec, network: Network) -> MatchResult {
    match script {
        [OP_DUP, OP_HASH160, 0x14, .., OP_EQUALVERIFY, OP_CHECKSIG] if script.len() == 25 => {
            let hash = span(script, 3, 20)?;
            Ok(Some(with_address(ScriptType::P2PKH, codec.encode_p2pkh_hash(hash, network))))
        }
        _ => Ok(None),
    }
}

fn match_p2sh(script: &[u8], codec: &dyn AddressCodec, network: Network) -> MatchResult {
    match script {
        [OP_HASH160, 0x14, .., OP_EQUAL] if script.len() == 23 => {
            let hash = span(script, 2, 20)?;
            Ok(Some(with_address(ScriptType::P2SH, codec.encode_p2sh_hash(hash, network))))
        }
        _ => Ok(None),
    }
}

fn match_p2wpkh(script: &[u8], codec: &dyn AddressCodec, network: Network) -> MatchResult {
    match script {
        [OP_0, 0x14, ..] if script.len() == 22 => {
            let program = span(script, 2, 20)?;
            Ok(Some(with_address(ScriptType::P2WPKH, codec.encode_segwit_v0(program, network))))
        }
        _ => Ok(None),
    }
}

fn match_p2wsh(script: &[u8], codec: &dyn AddressCodec, network: Network) -> MatchResult {
    match script {
        [OP_0, 0x20, ..] if script.len() == 34 => {
            let program = span(script, 2, 32)?;
            Ok(Some(with_address(ScriptType::P2WSH, codec.encode_segwit_v0(program, network))))
        }
        _ => Ok(None),
    }
}

fn match_p2tr(script: &[u8], codec: &dyn AddressCodec, network: Network) -> MatchResult {
    match script {
        [OP_1, 0x20, ..] if script.len() == 34 => {
            let key = span(script, 2, 32)?;
            match codec.encode_taproot(key, network) {
                Ok(address) => Ok(Some(Classification::new(ScriptType::P2TR, Some(address)))),
                Err(taproot_err) => match codec.encode_segwit_v1_raw(key, network) {
                    Ok(address) => Ok(Some(
                        Classification::new(ScriptType::P2TR, Some(address)).annotated("derived"),
                    )),
                    Err(raw_err) => {
                        // Neither encoding worked: fall through to the later templates
                        warn!(taproot = %taproot_err, raw = %raw_err, "Taproot address derivation failed");
                        Ok(None)
                    }
                },
            }
        }
        _ => Ok(None),
    }
}

fn match_p2pk(script: &[u8], codec: &dyn AddressCodec, network: Network) -> MatchResult {
    let is_p2pk = matches!(
        (script.len(), script[0], script.last()),
        (67, 0x41, Some(&OP_CHECKSIG)) | (35, 0x21, Some(&OP_CHECKSIG))
    );
    if !is_p2pk {
        return Ok(None);
    }

    let pubkey = span(script, 1, script[0] as usize)?;
    let result = match codec.encode_p2pkh_pubkey(pubkey, network) {
        Ok(address) => {
            Classification::new(ScriptType::P2PK, Some(address)).annotated("address shown as equivalent P2PKH")
        }
        Err(e) => {
            warn!(error = %e, "P2PK public key rejected by codec");
            Classification::new(ScriptType::P2PK, None).annotated("address could not be extracted")
        }
    };
    Ok(Some(result))
}

fn match_p2ms(script: &[u8], _codec: &dyn AddressCodec, _network: Network) -> MatchResult {
    if script.len() >= 37 && script.last() == Some(&OP_CHECKMULTISIG) {
        return Ok(Some(Classification::new(ScriptType::P2MS, None)));
    }
    Ok(None)
}

fn match_codec_probe(script: &[u8], codec: &dyn AddressCodec, network: Network) -> MatchResult {
    let address = TemplateKind::PROBE_ORDER
        .iter()
        .find_map(|template| codec.match_template(*template, script, network));

    let result = match address {
        Some(address) => {
            let mut c = Classification::new(ScriptType::Unknown, Some(address));
            c.description = "Unknown script type (address extracted)".to_string();
            c
        }
        None => Classification::new(ScriptType::Unknown, None),
    };
    Ok(Some(result))
}
