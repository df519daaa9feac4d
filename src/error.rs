use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
  #[error("unknown instruction byte {byte:#010b} at offset {offset}")]
  UnknownInstruction { offset: usize, byte: u8 },
  /// Indicates a defect in the catalog or matcher, not a malformed stream:
  /// every mod/rm combination a schema can produce has a defined size.
  #[error("unknown displacement size for mod={mod_bits:02b} rm={rm:03b} at offset {offset}")]
  UnknownDisplacementSize { offset: usize, mod_bits: u8, rm: u8 },
  #[error("instruction at offset {offset} needs {needed} bytes, only {available} remain")]
  TruncatedInstruction {
    offset: usize,
    needed: usize,
    available: usize,
  },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
