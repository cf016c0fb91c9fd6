use std::fmt;
use thiserror::Error;

use crate::cursor::Truncated;

/// Field the decoder was reading when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Version,
    InputCount,
    Input(usize),
    OutputCount,
    Output(usize),
    Witness(usize),
    Locktime,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeStage::Version => write!(f, "version"),
            DecodeStage::InputCount => write!(f, "input count"),
            DecodeStage::Input(i) => write!(f, "input #{}", i),
            DecodeStage::OutputCount => write!(f, "output count"),
            DecodeStage::Output(i) => write!(f, "output #{}", i),
            DecodeStage::Witness(i) => write!(f, "witness for input #{}", i),
            DecodeStage::Locktime => write!(f, "locktime"),
        }
    }
}

/// Transaction-level failure. Any of these aborts the whole decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no transaction data supplied")]
    EmptyInput,

    #[error("invalid transaction hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("transaction truncated while reading {stage}: {source}")]
    Truncated {
        stage: DecodeStage,
        #[source]
        source: Truncated,
    },

    #[error("{count} unexpected bytes after locktime")]
    TrailingBytes { count: usize },
}

impl DecodeError {
    /// Short label used for metrics and API error codes
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::EmptyInput => "empty_input",
            DecodeError::InvalidHex(_) => "invalid_hex",
            DecodeError::Truncated { .. } => "truncated",
            DecodeError::TrailingBytes { .. } => "trailing_bytes",
        }
    }
}

/// The address codec could not derive an address from otherwise-recognized bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("expected {expected} bytes, got {actual}")]
    BadLength { expected: usize, actual: usize },

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid x-only public key: {0}")]
    InvalidXOnlyKey(String),

    #[error("script does not match the {0} template")]
    TemplateMismatch(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_message_names_stage() {
        let err = DecodeError::Truncated {
            stage: DecodeStage::Output(2),
            source: Truncated { offset: 40, needed: 8, remaining: 3 },
        };
        let msg = err.to_string();
        assert!(msg.contains("output #2"));
        assert!(msg.contains("needed 8 bytes at offset 40"));
        assert_eq!(err.kind(), "truncated");
    }

    #[test]
    fn test_hex_error_conversion() {
        let err: DecodeError = hex::decode("abc").unwrap_err().into();
        assert_eq!(err.kind(), "invalid_hex");
    }
}
