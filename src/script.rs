/// Script Module - Script Disassembler
///
/// Walks a raw script byte stream and produces mnemonic tokens:
///
/// - **Opcodes**: `OP_DUP`, `OP_HASH160`, ... from a fixed table; any other
///   non-push byte renders as `[0xhh]`
/// - **Data pushes**: direct pushes (0x01-0x4b) and `OP_PUSHDATA1/2/4`,
///   rendered as `<hex>`
/// - **Invalid markers**: a push whose length field or payload runs past the
///   end of the script. The marker is always the last token.
///
/// Disassembly never fails. Scripts come from untrusted transactions and a
/// malformed one must still render next to its input or output.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

/// Script opcodes recognised by the disassembler
#[allow(dead_code)]
pub mod opcodes {
    pub const OP_0: u8 = 0x00;
    pub const OP_PUSHBYTES_75: u8 = 0x4b;
    pub const OP_PUSHDATA1: u8 = 0x4c;
    pub const OP_PUSHDATA2: u8 = 0x4d;
    pub const OP_PUSHDATA4: u8 = 0x4e;
    pub const OP_1: u8 = 0x51;
    pub const OP_16: u8 = 0x60;
    pub const OP_NOP: u8 = 0x61;
    pub const OP_RETURN: u8 = 0x6a;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_CHECKSIG: u8 = 0xac;
    pub const OP_CHECKSIGVERIFY: u8 = 0xad;
    pub const OP_CHECKMULTISIG: u8 = 0xae;
    pub const OP_CHECKLOCKTIMEVERIFY: u8 = 0xb1;
    pub const OP_CHECKSEQUENCEVERIFY: u8 = 0xb2;
    pub const OP_CHECKSIGADD: u8 = 0xba;
}

use opcodes::*;

const OP_N_NAMES: [&str; 16] = [
    "OP_1", "OP_2", "OP_3", "OP_4", "OP_5", "OP_6", "OP_7", "OP_8",
    "OP_9", "OP_10", "OP_11", "OP_12", "OP_13", "OP_14", "OP_15", "OP_16",
];

/// Mnemonic for a single-byte opcode, `None` for pushes and unmapped bytes
pub fn mnemonic(op: u8) -> Option<&'static str> {
    match op {
        OP_0 => Some("OP_0"),
        OP_1..=OP_16 => Some(OP_N_NAMES[(op - OP_1) as usize]),
        OP_NOP => Some("OP_NOP"),
        OP_RETURN => Some("OP_RETURN"),
        OP_DUP => Some("OP_DUP"),
        OP_EQUAL => Some("OP_EQUAL"),
        OP_EQUALVERIFY => Some("OP_EQUALVERIFY"),
        OP_HASH160 => Some("OP_HASH160"),
        OP_CHECKSIG => Some("OP_CHECKSIG"),
        OP_CHECKSIGVERIFY => Some("OP_CHECKSIGVERIFY"),
        OP_CHECKMULTISIG => Some("OP_CHECKMULTISIG"),
        OP_CHECKLOCKTIMEVERIFY => Some("OP_CHECKLOCKTIMEVERIFY"),
        OP_CHECKSEQUENCEVERIFY => Some("OP_CHECKSEQUENCEVERIFY"),
        OP_CHECKSIGADD => Some("OP_CHECKSIGADD"),
        _ => None,
    }
}

/// Push-data variants with an explicit length field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PushDataKind {
    PushData1,
    PushData2,
    PushData4,
}

impl PushDataKind {
    fn from_opcode(op: u8) -> Option<Self> {
        match op {
            OP_PUSHDATA1 => Some(PushDataKind::PushData1),
            OP_PUSHDATA2 => Some(PushDataKind::PushData2),
            OP_PUSHDATA4 => Some(PushDataKind::PushData4),
            _ => None,
        }
    }

    /// Width of the little-endian length field
    pub fn length_width(&self) -> usize {
        match self {
            PushDataKind::PushData1 => 1,
            PushDataKind::PushData2 => 2,
            PushDataKind::PushData4 => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PushDataKind::PushData1 => "OP_PUSHDATA1",
            PushDataKind::PushData2 => "OP_PUSHDATA2",
            PushDataKind::PushData4 => "OP_PUSHDATA4",
        }
    }
}

/// Why a push could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPush {
    /// The length field of an `OP_PUSHDATAn` is cut off
    MissingLength(PushDataKind),
    /// The declared payload is longer than what is left of the script
    ExceedsBuffer { declared: u64, available: usize },
}

impl fmt::Display for MalformedPush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedPush::MissingLength(kind) => {
                write!(f, "invalid {}: missing length bytes", kind.name())
            }
            MalformedPush::ExceedsBuffer { .. } => write!(f, "push length exceeds buffer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptToken<'a> {
    /// Any non-push byte. Rendered by mnemonic or as `[0xhh]`.
    Opcode(u8),
    /// Payload of a direct or `OP_PUSHDATAn` push
    DataPush { opcode: u8, data: &'a [u8] },
    /// Terminal marker for a malformed push
    InvalidMarker(MalformedPush),
}

impl<'a> ScriptToken<'a> {
    /// Number of script bytes this token covers
    pub fn encoded_len(&self) -> usize {
        match self {
            ScriptToken::Opcode(_) => 1,
            ScriptToken::DataPush { opcode, data } => {
                let header = PushDataKind::from_opcode(*opcode)
                    .map(|k| k.length_width())
                    .unwrap_or(0);
                1 + header + data.len()
            }
            ScriptToken::InvalidMarker(_) => 0,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ScriptToken::InvalidMarker(_))
    }
}

impl fmt::Display for ScriptToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptToken::Opcode(op) => match mnemonic(*op) {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "[0x{:02x}]", op),
            },
            ScriptToken::DataPush { data, .. } => write!(f, "<{}>", hex::encode(data)),
            ScriptToken::InvalidMarker(reason) => write!(f, "[{}]", reason),
        }
    }
}

/// Disassemble a script into tokens. An empty script yields no tokens.
pub fn disassemble(script: &[u8]) -> Vec<ScriptToken<'_>> {
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < script.len() {
        let op = script[i];
        i += 1;

        // Mapped opcodes first: OP_0 shares the push range's lower bound
        if mnemonic(op).is_some() {
            tokens.push(ScriptToken::Opcode(op));
            continue;
        }

        let declared: u64 = match op {
            0x01..=OP_PUSHBYTES_75 => u64::from(op),
            OP_PUSHDATA1..=OP_PUSHDATA4 => {
                // from_opcode cannot miss inside this range
                let kind = match PushDataKind::from_opcode(op) {
                    Some(kind) => kind,
                    None => break,
                };
                let width = kind.length_width();
                if script.len() - i < width {
                    tokens.push(ScriptToken::InvalidMarker(MalformedPush::MissingLength(kind)));
                    break;
                }
                let len = LittleEndian::read_uint(&script[i..i + width], width);
                i += width;
                len
            }
            _ => {
                tokens.push(ScriptToken::Opcode(op));
                continue;
            }
        };

        let available = script.len() - i;
        if declared > available as u64 {
            tokens.push(ScriptToken::InvalidMarker(MalformedPush::ExceedsBuffer {
                declared,
                available,
            }));
            break;
        }
        let end = i + declared as usize;
        tokens.push(ScriptToken::DataPush { opcode: op, data: &script[i..end] });
        i = end;
    }

    tokens
}

/// Join tokens with single spaces
pub fn render_tokens(tokens: &[ScriptToken<'_>]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Disassemble and render in one step
pub fn render_script(script: &[u8]) -> String {
    render_tokens(&disassemble(script))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_script() {
        assert!(disassemble(&[]).is_empty());
        assert_eq!(render_script(&[]), "");
    }

    #[test]
    fn test_p2pkh_script() {
        let mut script = vec![0x76, 0xa9, 0x14];
        script.extend_from_slice(&[0x11; 20]);
        script.extend_from_slice(&[0x88, 0xac]);

        let rendered = render_script(&script);
        assert_eq!(
            rendered,
            format!("OP_DUP OP_HASH160 <{}> OP_EQUALVERIFY OP_CHECKSIG", "11".repeat(20))
        );
    }

    #[test]
    fn test_small_integers_and_table() {
        let script = [0x00, 0x51, 0x52, 0x60, 0x61, 0xae, 0xb1, 0xb2, 0xba, 0xad, 0x6a];
        assert_eq!(
            render_script(&script),
            "OP_0 OP_1 OP_2 OP_16 OP_NOP OP_CHECKMULTISIG OP_CHECKLOCKTIMEVERIFY \
             OP_CHECKSEQUENCEVERIFY OP_CHECKSIGADD OP_CHECKSIGVERIFY OP_RETURN"
        );
    }

    #[test]
    fn test_unmapped_bytes_render_as_hex() {
        // OP_1NEGATE, OP_IF, OP_CODESEPARATOR, 0xff
        assert_eq!(render_script(&[0x4f, 0x63, 0xab, 0xff]), "[0x4f] [0x63] [0xab] [0xff]");
    }

    #[test]
    fn test_direct_push_exceeds_buffer() {
        let script = [0x76, 0x05, 0x01, 0x02];
        let tokens = disassemble(&script);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], ScriptToken::Opcode(0x76));
        assert_eq!(
            tokens[1],
            ScriptToken::InvalidMarker(MalformedPush::ExceedsBuffer { declared: 5, available: 2 })
        );
        assert_eq!(render_tokens(&tokens), "OP_DUP [push length exceeds buffer]");
    }

    #[test]
    fn test_pushdata_variants() {
        let script = [0x4c, 0x02, 0xaa, 0xbb, 0x4d, 0x01, 0x00, 0xcc, 0x4e, 0x00, 0x00, 0x00, 0x00];
        let tokens = disassemble(&script);
        assert_eq!(tokens.len(), 3);
        assert_eq!(render_tokens(&tokens), "<aabb> <cc> <>");
        let consumed: usize = tokens.iter().map(|t| t.encoded_len()).sum();
        assert_eq!(consumed, script.len());
    }

    #[test]
    fn test_pushdata_missing_length() {
        let tokens = disassemble(&[0x4c]);
        assert_eq!(
            tokens,
            vec![ScriptToken::InvalidMarker(MalformedPush::MissingLength(PushDataKind::PushData1))]
        );

        let tokens = disassemble(&[0x51, 0x4d, 0x01]);
        assert_eq!(render_tokens(&tokens), "OP_1 [invalid OP_PUSHDATA2: missing length bytes]");

        let tokens = disassemble(&[0x4e, 0x01, 0x00, 0x00]);
        assert_eq!(render_tokens(&tokens), "[invalid OP_PUSHDATA4: missing length bytes]");
    }

    #[test]
    fn test_pushdata_payload_exceeds_buffer() {
        let tokens = disassemble(&[0x4d, 0xff, 0xff, 0x01]);
        assert_eq!(
            tokens,
            vec![ScriptToken::InvalidMarker(MalformedPush::ExceedsBuffer {
                declared: 0xffff,
                available: 1
            })]
        );
    }

    #[test]
    fn test_marker_is_always_last() {
        let scripts: [&[u8]; 4] = [&[0x02, 0x01], &[0x4c], &[0x00, 0x4e, 0xff], &[0x51, 0x4c, 0x09, 0x00]];
        for script in scripts {
            let tokens = disassemble(script);
            let markers = tokens.iter().filter(|t| t.is_invalid()).count();
            assert_eq!(markers, 1);
            assert!(tokens.last().unwrap().is_invalid());
        }
    }

    #[test]
    fn test_consumed_lengths_cover_valid_scripts() {
        let mut script = vec![0x00, 0x14];
        script.extend_from_slice(&[0x42; 20]);
        script.extend_from_slice(&[0x6a, 0x4c, 0x03, 1, 2, 3, 0xfe]);
        let tokens = disassemble(&script);
        assert!(tokens.iter().all(|t| !t.is_invalid()));
        let consumed: usize = tokens.iter().map(|t| t.encoded_len()).sum();
        assert_eq!(consumed, script.len());
    }
}
