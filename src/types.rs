use std::fmt;
use std::ops::Range;

/// Sequence value that opts out of replacement and relative locktime
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Inputs with a sequence below this signal opt-in Replace-By-Fee
pub const RBF_THRESHOLD: u32 = SEQUENCE_FINAL - 1;

/// 32-byte hash stored in wire order, displayed reversed
pub struct Hash<'a>(pub &'a [u8; 32]);

impl fmt::LowerHex for Hash<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Decoded transaction. Every byte span borrows from the input buffer.
#[derive(Clone)]
pub struct Transaction<'a> {
    pub version: i32,
    pub inputs: Vec<TxInput<'a>>,
    pub outputs: Vec<TxOutput<'a>>,
    pub lock_time: u32,
    pub has_witness: bool,
    /// The whole serialized transaction
    pub raw: &'a [u8],
    /// Input count through last output, i.e. what sits between the
    /// version (or marker/flag) and the witnesses/locktime
    pub body: Range<usize>,
}

impl<'a> Transaction<'a> {
    /// Serialized size in bytes
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    /// Witness-stripped serialization: version, body, locktime
    pub fn stripped_bytes(&self) -> Vec<u8> {
        if !self.has_witness {
            return self.raw.to_vec();
        }
        let mut out = Vec::with_capacity(8 + self.body.len());
        out.extend_from_slice(&self.raw[..4]);
        out.extend_from_slice(&self.raw[self.body.clone()]);
        out.extend_from_slice(&self.raw[self.raw.len() - 4..]);
        out
    }

    /// Sum of the lengths of every witness item across every input
    pub fn witness_bytes(&self) -> usize {
        self.inputs
            .iter()
            .flat_map(|input| input.witness.iter())
            .map(|item| item.len())
            .sum()
    }

    /// Total of all output values in satoshis
    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().fold(0u64, |acc, o| acc.saturating_add(o.value))
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transaction {{")?;
        writeln!(f, "    version: {}", self.version)?;
        writeln!(f, "    has_witness: {}", self.has_witness)?;
        writeln!(f, "    inputs: {:?}", self.inputs)?;
        writeln!(f, "    outputs: {:?}", self.outputs)?;
        writeln!(f, "    lock_time: {}", self.lock_time)?;
        writeln!(f, "}}")?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct TxInput<'a> {
    pub prev_hash: &'a [u8; 32],
    pub prev_index: u32,
    pub script_sig: &'a [u8],
    pub sequence: u32,
    pub witness: Vec<&'a [u8]>,
}

impl TxInput<'_> {
    /// Previous txid in conventional display order
    pub fn prev_txid(&self) -> String {
        format!("{:x}", Hash(self.prev_hash))
    }

    pub fn signals_rbf(&self) -> bool {
        self.sequence < RBF_THRESHOLD
    }
}

impl fmt::Debug for TxInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        writeln!(f, "    prevout: {}:{}", self.prev_txid(), self.prev_index)?;
        writeln!(f, "    script_sig: {:?}", hex::encode(self.script_sig))?;
        writeln!(f, "    sequence: {}", self.sequence)?;
        let witness: Vec<String> = self.witness.iter().map(hex::encode).collect();
        writeln!(f, "    witness: {:?}", witness)?;
        write!(f, "}}")
    }
}

#[derive(Clone)]
pub struct TxOutput<'a> {
    pub value: u64,
    pub script_pubkey: &'a [u8],
}

impl fmt::Debug for TxOutput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        writeln!(f, "    value: {}", self.value)?;
        writeln!(f, "    script_pubkey: {:?}", hex::encode(self.script_pubkey))?;
        write!(f, "}}")
    }
}
