use serde::Serialize;

use crate::types::Transaction;

/// Size figures used for fee-rate display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeInfo {
    /// Full serialized length in bytes
    pub size: usize,
    pub weight: usize,
    pub vsize: usize,
    /// Sum of every witness item length
    pub witness_bytes: usize,
    /// Length of the witness-stripped serialization
    pub stripped_size: usize,
}

/// Size, weight and virtual size of a decoded transaction.
///
/// Witness data is discounted by counting each witness item byte once
/// instead of four times. Only the item payloads are discounted, not their
/// length prefixes or the marker and flag.
pub fn compute_sizes(tx: &Transaction<'_>) -> SizeInfo {
    let size = tx.size();

    if !tx.has_witness {
        return SizeInfo {
            size,
            weight: size * 4,
            vsize: size,
            witness_bytes: 0,
            stripped_size: size,
        };
    }

    let witness_bytes = tx.witness_bytes();
    let weight = (size * 4).saturating_sub(witness_bytes * 3);
    let stripped_size = 4 + tx.body.len() + 4;

    SizeInfo {
        size,
        weight,
        vsize: (weight + 3) / 4,
        witness_bytes,
        stripped_size,
    }
}

/// True when any input opts in to Replace-By-Fee
pub fn is_rbf(tx: &Transaction<'_>) -> bool {
    tx.inputs.iter().any(|input| input.signals_rbf())
}
