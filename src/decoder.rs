/// Transaction Decoder
///
/// Sequential state machine over a `ByteCursor`:
///
/// ```text
/// Version -> SegwitMarker -> InputCount -> Inputs -> OutputCount -> Outputs
///         -> (segwit only) Witnesses -> Locktime -> Done
/// ```
///
/// No backtracking. The first truncated field aborts the whole decode and no
/// partial transaction is returned. Script contents are not interpreted here;
/// disassembly and classification happen per script in the report builder.

use tracing::{debug, trace};

use crate::cursor::{ByteCursor, Truncated};
use crate::error::{DecodeError, DecodeStage};
use crate::types::{Transaction, TxInput, TxOutput};

/// Segwit marker and flag directly after the version
pub const SEGWIT_MARKER_FLAG: [u8; 2] = [0x00, 0x01];

/// prev hash + prev index + empty script varint + sequence
const MIN_INPUT_SIZE: usize = 32 + 4 + 1 + 4;

/// value + empty script varint
const MIN_OUTPUT_SIZE: usize = 8 + 1;

fn at(stage: DecodeStage) -> impl Fn(Truncated) -> DecodeError {
    move |source| DecodeError::Truncated { stage, source }
}

/// Parse user-supplied hex. Whitespace around the string is ignored.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::EmptyInput);
    }
    Ok(hex::decode(trimmed)?)
}

/// Decode a raw serialized transaction
pub fn decode_transaction(raw: &[u8]) -> Result<Transaction<'_>, DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let mut cursor = ByteCursor::new(raw);

    let version = cursor.read_i32_le().map_err(at(DecodeStage::Version))?;

    let has_witness = cursor.peek(2) == Some(&SEGWIT_MARKER_FLAG[..]);
    if has_witness {
        cursor.read_bytes(2).map_err(at(DecodeStage::Version))?;
    }
    trace!(version, has_witness, "Read transaction header");

    let body_start = cursor.position();

    let input_count = cursor.read_varint().map_err(at(DecodeStage::InputCount))?;
    let mut inputs = Vec::with_capacity(capacity_hint(input_count, cursor.remaining(), MIN_INPUT_SIZE));
    let mut index = 0usize;
    while (index as u64) < input_count {
        inputs.push(read_input(&mut cursor).map_err(at(DecodeStage::Input(index)))?);
        index += 1;
    }

    let output_count = cursor.read_varint().map_err(at(DecodeStage::OutputCount))?;
    let mut outputs = Vec::with_capacity(capacity_hint(output_count, cursor.remaining(), MIN_OUTPUT_SIZE));
    let mut index = 0usize;
    while (index as u64) < output_count {
        outputs.push(read_output(&mut cursor).map_err(at(DecodeStage::Output(index)))?);
        index += 1;
    }

    let body_end = cursor.position();

    if has_witness {
        for (i, input) in inputs.iter_mut().enumerate() {
            input.witness = read_witness(&mut cursor).map_err(at(DecodeStage::Witness(i)))?;
        }
    }

    let lock_time = cursor.read_u32_le().map_err(at(DecodeStage::Locktime))?;

    if !cursor.at_end() {
        return Err(DecodeError::TrailingBytes { count: cursor.remaining() });
    }

    debug!(
        version,
        has_witness,
        inputs = inputs.len(),
        outputs = outputs.len(),
        size = raw.len(),
        "Decoded transaction"
    );

    Ok(Transaction {
        version,
        inputs,
        outputs,
        lock_time,
        has_witness,
        raw,
        body: body_start..body_end,
    })
}

/// Pre-allocate no more elements than the remaining bytes could hold
fn capacity_hint(count: u64, remaining: usize, min_size: usize) -> usize {
    let max_fit = remaining / min_size;
    usize::try_from(count).map(|c| c.min(max_fit)).unwrap_or(max_fit)
}

fn read_input<'a>(cursor: &mut ByteCursor<'a>) -> Result<TxInput<'a>, Truncated> {
    let hash_bytes = cursor.read_bytes(32)?;
    let prev_hash: &'a [u8; 32] = match hash_bytes.try_into() {
        Ok(hash) => hash,
        Err(_) => {
            return Err(Truncated { offset: cursor.position(), needed: 32, remaining: hash_bytes.len() })
        }
    };
    let prev_index = cursor.read_u32_le()?;
    let script_sig = cursor.read_var_bytes()?;
    let sequence = cursor.read_u32_le()?;

    Ok(TxInput {
        prev_hash,
        prev_index,
        script_sig,
        sequence,
        witness: Vec::new(),
    })
}

fn read_output<'a>(cursor: &mut ByteCursor<'a>) -> Result<TxOutput<'a>, Truncated> {
    let value = cursor.read_u64_le()?;
    let script_pubkey = cursor.read_var_bytes()?;
    Ok(TxOutput { value, script_pubkey })
}

fn read_witness<'a>(cursor: &mut ByteCursor<'a>) -> Result<Vec<&'a [u8]>, Truncated> {
    let count = cursor.read_varint()?;
    // Every item carries at least its one-byte length prefix
    let mut items = Vec::with_capacity(capacity_hint(count, cursor.remaining(), 1));
    let mut read = 0u64;
    while read < count {
        items.push(cursor.read_var_bytes()?);
        read += 1;
    }
    Ok(items)
}
