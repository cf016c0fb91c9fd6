/// Report Module - Report Builder
///
/// Turns a decoded `Transaction` into one immutable `TransactionReport`:
/// ids from the hasher, sizes, per-input and per-output fields with
/// disassembled scripts, and one classification per output. The report
/// owns all of its strings so it outlives the input buffer.

use std::fmt::Write;

use serde::Serialize;
use tracing::{debug, info_span};

use crate::classify::{classify_script_pubkey, Classification};
use crate::codec::{AddressCodec, Network};
use crate::decoder::{decode_hex, decode_transaction};
use crate::error::DecodeError;
use crate::hasher::TxHasher;
use crate::metrics;
use crate::script::render_script;
use crate::size::{compute_sizes, is_rbf};
use crate::types::Transaction;

const SATS_PER_BTC: u64 = 100_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionReport {
    pub txid: String,
    /// Only present for segwit serializations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wtxid: Option<String>,
    pub network: Network,
    pub version: i32,
    pub size: usize,
    pub weight: usize,
    pub vsize: usize,
    pub has_witness: bool,
    pub is_rbf: bool,
    pub locktime: u32,
    pub total_output_value: u64,
    pub total_output_amount: String,
    pub inputs: Vec<InputReport>,
    pub outputs: Vec<OutputReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputReport {
    pub index: usize,
    /// Previous transaction id, display order
    pub txid: String,
    pub vout: u32,
    pub sequence: u32,
    pub sequence_hex: String,
    pub script_sig: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_sig_asm: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub witness: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputReport {
    pub index: usize,
    pub value: u64,
    pub amount: String,
    pub script_pubkey: String,
    pub script_pubkey_asm: String,
    pub classification: Classification,
}

/// Format satoshis as `1,000 sat (0.00001000 BTC)`
pub fn format_btc_amount(sats: u64) -> String {
    let whole = sats / SATS_PER_BTC;
    let frac = sats % SATS_PER_BTC;
    format!("{} sat ({}.{:08} BTC)", group_thousands(sats), whole, frac)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Assemble the report for an already decoded transaction
pub fn build_report(
    tx: &Transaction<'_>,
    codec: &dyn AddressCodec,
    hasher: &dyn TxHasher,
    network: Network,
) -> TransactionReport {
    let sizes = compute_sizes(tx);

    let txid = hasher.txid(&tx.stripped_bytes());
    let wtxid = tx.has_witness.then(|| hasher.wtxid(tx.raw));

    let inputs = tx
        .inputs
        .iter()
        .enumerate()
        .map(|(index, input)| InputReport {
            index,
            txid: input.prev_txid(),
            vout: input.prev_index,
            sequence: input.sequence,
            sequence_hex: format!("0x{:x}", input.sequence),
            script_sig: hex::encode(input.script_sig),
            script_sig_asm: (!input.script_sig.is_empty()).then(|| render_script(input.script_sig)),
            witness: input.witness.iter().map(hex::encode).collect(),
        })
        .collect();

    let outputs = tx
        .outputs
        .iter()
        .enumerate()
        .map(|(index, output)| {
            let classification = classify_script_pubkey(output.script_pubkey, codec, network);
            metrics::increment_outputs_classified(classification.script_type.as_str());
            debug!(index, script_type = %classification.script_type, "Classified output");
            OutputReport {
                index,
                value: output.value,
                amount: format_btc_amount(output.value),
                script_pubkey: hex::encode(output.script_pubkey),
                script_pubkey_asm: render_script(output.script_pubkey),
                classification,
            }
        })
        .collect();

    let total_output_value = tx.total_output_value();

    TransactionReport {
        txid,
        wtxid,
        network,
        version: tx.version,
        size: sizes.size,
        weight: sizes.weight,
        vsize: sizes.vsize,
        has_witness: tx.has_witness,
        is_rbf: is_rbf(tx),
        locktime: tx.lock_time,
        total_output_value,
        total_output_amount: format_btc_amount(total_output_value),
        inputs,
        outputs,
    }
}

/// Decode hex and build the report in one step, recording metrics
pub fn decode_report(
    input: &str,
    codec: &dyn AddressCodec,
    hasher: &dyn TxHasher,
    network: Network,
) -> Result<TransactionReport, DecodeError> {
    let _span = info_span!("decode_report", hex_len = input.len(), %network).entered();
    let timer = metrics::Timer::new();

    let result = decode_hex(input).and_then(|raw| {
        let tx = decode_transaction(&raw)?;
        Ok(build_report(&tx, codec, hasher, network))
    });

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::record_decode(outcome, timer.elapsed_secs());

    result
}

impl TransactionReport {
    /// Sectioned plain-text rendering
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "=== Transaction ===")?;
        writeln!(out, "TxID: {}", self.txid)?;
        if let Some(wtxid) = &self.wtxid {
            writeln!(out, "WTxID: {}", wtxid)?;
        }
        writeln!(out, "Version: {}", self.version)?;
        writeln!(out, "Size: {} bytes", self.size)?;
        if self.has_witness {
            writeln!(out, "Virtual size: {} vB", self.vsize)?;
        }
        writeln!(out, "Weight: {} WU", self.weight)?;
        writeln!(out, "Segregated witness: {}", yes_no(self.has_witness))?;
        writeln!(out, "Replace-By-Fee (RBF): {}", yes_no(self.is_rbf))?;
        writeln!(out, "Total output: {}", self.total_output_amount)?;

        writeln!(out, "\n=== Inputs ({}) ===", self.inputs.len())?;
        for input in &self.inputs {
            writeln!(out, "\nInput #{}:", input.index)?;
            writeln!(out, "  Previous tx: {}", input.txid)?;
            writeln!(out, "  Output index (vout): {}", input.vout)?;
            writeln!(out, "  Sequence: {} ({})", input.sequence, input.sequence_hex)?;
            match &input.script_sig_asm {
                Some(asm) => {
                    writeln!(out, "  ScriptSig: {}", input.script_sig)?;
                    writeln!(out, "  Disassembly: {}", asm)?;
                }
                None => writeln!(out, "  ScriptSig: [empty]")?,
            }
            if !input.witness.is_empty() {
                writeln!(out, "  Witness:")?;
                for (i, item) in input.witness.iter().enumerate() {
                    writeln!(out, "    [{}] {}", i, item)?;
                }
            }
        }

        writeln!(out, "\n=== Outputs ({}) ===", self.outputs.len())?;
        for output in &self.outputs {
            let c = &output.classification;
            writeln!(out, "\nOutput #{}:", output.index)?;
            writeln!(out, "  Amount: {}", output.amount)?;
            writeln!(out, "  ScriptPubKey: {}", output.script_pubkey)?;
            writeln!(out, "  Disassembly: {}", output.script_pubkey_asm)?;
            writeln!(out, "  Type: {}", c.script_type)?;
            writeln!(out, "  Description: {}", c.description)?;
            if let Some(address) = &c.address {
                writeln!(out, "  Address: {}", address)?;
            }
            if let Some(data) = c.data_hex().filter(|d| !d.is_empty()) {
                writeln!(out, "  Data: {}", data)?;
            }
        }

        writeln!(out, "\n=== Other ===")?;
        writeln!(out, "Locktime: {}", self.locktime)?;
        Ok(())
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ScriptType;
    use crate::codec::BitcoinAddressCodec;
    use crate::fixtures::*;
    use crate::hasher::Sha256dHasher;

    fn report(hex: &str) -> Result<TransactionReport, DecodeError> {
        decode_report(hex, &BitcoinAddressCodec, &Sha256dHasher, Network::Mainnet)
    }

    #[test]
    fn test_format_btc_amount() {
        assert_eq!(format_btc_amount(0), "0 sat (0.00000000 BTC)");
        assert_eq!(format_btc_amount(999), "999 sat (0.00000999 BTC)");
        assert_eq!(format_btc_amount(15_274_000), "15,274,000 sat (0.15274000 BTC)");
        assert_eq!(format_btc_amount(5_000_000_000), "5,000,000,000 sat (50.00000000 BTC)");
        assert_eq!(
            format_btc_amount(u64::MAX),
            "18,446,744,073,709,551,615 sat (184467440737.09551615 BTC)"
        );
    }

    #[test]
    fn test_segwit_report() {
        let r = report(SEGWIT_TX).unwrap();
        assert_eq!(r.txid, SEGWIT_TXID);
        assert_eq!(r.wtxid.as_deref(), Some(SEGWIT_WTXID));
        assert_eq!(r.version, 2);
        assert_eq!(r.size, 222);
        assert_eq!(r.weight, 576);
        assert_eq!(r.vsize, 144);
        assert!(r.has_witness);
        assert!(!r.is_rbf);
        assert_eq!(r.total_output_value, 589_999_335);

        let input = &r.inputs[0];
        assert_eq!(input.txid, "dfa4ee44120f64fb8dbf34f411fbddc77deb53b55e32f0a1c13934201158108f");
        assert_eq!(input.sequence_hex, "0xffffffff");
        assert_eq!(input.script_sig_asm, None);
        assert_eq!(input.witness.len(), 2);

        assert_eq!(r.outputs[0].classification.script_type, ScriptType::P2WPKH);
        assert_eq!(
            r.outputs[0].classification.address.as_deref(),
            Some("bc1q2m2x3x073fkjd99tuy5569yg3n8tke4lfqwgt9")
        );
        assert_eq!(
            r.outputs[1].classification.address.as_deref(),
            Some("bc1qnsupj8eqya02nm8v6tmk93zslu2e2z8chlmcej")
        );
        assert_eq!(r.outputs[1].value, 574_725_335);
    }

    #[test]
    fn test_legacy_report() {
        let r = report(LEGACY_TX).unwrap();
        assert_eq!(r.txid, LEGACY_TXID);
        assert_eq!(r.wtxid, None);
        assert_eq!(r.size, 275);
        assert_eq!(r.vsize, 275);
        assert_eq!(r.total_output_value, 5_000_000_000);
        assert!(r.inputs[0].script_sig_asm.is_some());

        let out0 = &r.outputs[0].classification;
        assert_eq!(out0.script_type, ScriptType::P2PK);
        assert_eq!(out0.address.as_deref(), Some("1Q2TWHE3GMdB6BZKafqwxXtWAWgFt5Jvm3"));
        let out1 = &r.outputs[1].classification;
        assert_eq!(out1.address.as_deref(), Some("12cbQLTFMXRnSzktFkuoG3eHoMeFtpTu3S"));
    }

    #[test]
    fn test_op_return_and_rbf_report() {
        let raw = legacy_tx_with(0xfffffffd, &[0x6a, 0x04, 0x74, 0x65, 0x73, 0x74]);
        let r = report(&hex::encode(raw)).unwrap();
        assert!(r.is_rbf);
        let c = &r.outputs[0].classification;
        assert_eq!(c.script_type, ScriptType::OpReturn);
        assert_eq!(c.data_hex().as_deref(), Some("74657374"));
        assert_eq!(r.outputs[0].script_pubkey_asm, "OP_RETURN <74657374>");

        let text = r.render_text();
        assert!(text.contains("Data: 74657374"));
        assert!(text.contains("Replace-By-Fee (RBF): yes"));
    }

    #[test]
    fn test_decode_report_errors() {
        assert!(matches!(report(""), Err(DecodeError::EmptyInput)));
        assert!(matches!(report("   \n"), Err(DecodeError::EmptyInput)));
        assert!(matches!(report("abc"), Err(DecodeError::InvalidHex(_))));
        assert!(matches!(report("zz"), Err(DecodeError::InvalidHex(_))));
        assert!(matches!(report("0100"), Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn test_render_text_sections() {
        let text = report(SEGWIT_TX).unwrap().render_text();
        assert!(text.starts_with("=== Transaction ===\nTxID: d529cf35"));
        assert!(text.contains("Virtual size: 144 vB"));
        assert!(text.contains("=== Inputs (1) ==="));
        assert!(text.contains("ScriptSig: [empty]"));
        assert!(text.contains("=== Outputs (2) ==="));
        assert!(text.contains("Amount: 15,274,000 sat (0.15274000 BTC)"));
        assert!(text.contains("Type: P2WPKH"));
        assert!(text.ends_with("=== Other ===\nLocktime: 0\n"));
    }

    #[test]
    fn test_report_json_shape() {
        let r = report(SEGWIT_TX).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["txid"], SEGWIT_TXID);
        assert_eq!(json["network"], "mainnet");
        assert_eq!(json["outputs"][0]["classification"]["type"], "P2WPKH");
        assert_eq!(json["inputs"][0]["witness"].as_array().unwrap().len(), 2);

        let legacy = serde_json::to_value(report(LEGACY_TX).unwrap()).unwrap();
        assert!(legacy.get("wtxid").is_none());
    }
}
