use crate::error::{DecodeError, Result};

/// Locates one named bit field inside an instruction's raw bytes:
/// pick a byte, mask it, shift it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
  byte: usize,
  mask: u8,
  shift: u8,
}

impl BitField {
  pub const fn new(byte: usize, mask: u8, shift: u8) -> Self {
    BitField { byte, mask, shift }
  }

  /// A locator covering an entire byte of the instruction window.
  pub const fn byte(index: usize) -> Self {
    BitField::new(index, 0b1111_1111, 0)
  }

  pub fn read(&self, bytes: &[u8]) -> u8 {
    (bytes[self.byte] & self.mask) >> self.shift
  }
}

/// A variable-width opcode pattern plus the fixed part of the
/// instruction's size, before any displacement or immediate bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
  pub pattern: u8,
  pub width: u8,
  pub mnemonic: &'static str,
  pub base_size: usize,
}

impl Opcode {
  const fn new(pattern: u8, width: u8, mnemonic: &'static str, base_size: usize) -> Self {
    Opcode { pattern, width, mnemonic, base_size }
  }

  pub fn matches(&self, byte: u8) -> bool {
    byte >> (8 - self.width) == self.pattern
  }
}

/// The fields an encoding form actually has, as explicitly optional
/// locators rather than a runtime name-to-locator map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
  pub d: Option<BitField>,
  pub w: Option<BitField>,
  pub mode: Option<BitField>,
  pub reg: Option<BitField>,
  pub rm: Option<BitField>,
  pub sr: Option<BitField>,
  pub s: Option<BitField>,
  pub disp_lo: Option<BitField>,
  pub disp_hi: Option<BitField>,
  pub addr_lo: Option<BitField>,
  pub addr_hi: Option<BitField>,
}

impl FieldMap {
  pub const EMPTY: FieldMap = FieldMap {
    d: None,
    w: None,
    mode: None,
    reg: None,
    rm: None,
    sr: None,
    s: None,
    disp_lo: None,
    disp_hi: None,
    addr_lo: None,
    addr_hi: None,
  };
}

const D_FLAG: BitField = BitField::new(0, 0b0000_0010, 1);
const S_FLAG: BitField = BitField::new(0, 0b0000_0010, 1);
const W_FLAG_BIT0: BitField = BitField::new(0, 0b0000_0001, 0);
const W_FLAG_BIT3: BitField = BitField::new(0, 0b0000_1000, 3);
const MOD_FLAG: BitField = BitField::new(1, 0b1100_0000, 6);
const REG_FLAG_BYTE1: BitField = BitField::new(1, 0b0011_1000, 3);
const REG_FLAG_BYTE0: BitField = BitField::new(0, 0b0000_0111, 0);
const RM_FLAG: BitField = BitField::new(1, 0b0000_0111, 0);
const SR_FLAG: BitField = BitField::new(1, 0b0001_1000, 3);
const DISP_LO: BitField = BitField::byte(2);
const DISP_HI: BitField = BitField::byte(3);
const ADDR_LO: BitField = BitField::byte(1);
const ADDR_HI: BitField = BitField::byte(2);

/// One encoding form: its opcode matcher, its fields, whether trailing
/// immediate data follows, and whether operand 0 is implicitly the
/// accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
  pub opcode: Opcode,
  pub fields: FieldMap,
  pub has_data: bool,
  pub accumulator: bool,
}

impl Schema {
  /// Displacement byte count implied by the mod and rm fields of a
  /// two-byte window. `mod == 0 && rm == 6` carries a 2-byte direct
  /// address where no displacement would otherwise follow.
  fn displacement_size(&self, window: &[u8], offset: usize) -> Result<usize> {
    let mode = self.fields.mode.map_or(0, |f| f.read(window));
    let rm = self.fields.rm.map_or(0, |f| f.read(window));
    match (mode, rm) {
      (0b11, _) => Ok(0),
      (0b00, 0b110) => Ok(2),
      (0b00, _) => Ok(0),
      (0b01, _) => Ok(1),
      (0b10, _) => Ok(2),
      (mod_bits, rm) => Err(DecodeError::UnknownDisplacementSize { offset, mod_bits, rm }),
    }
  }

  /// Total instruction length and displacement length, computed from the
  /// first byte and (when a mod field exists) the second byte only. Never
  /// reads the yet-unsliced tail.
  pub fn instruction_size(&self, stream: &[u8], offset: usize) -> Result<(usize, usize)> {
    let window = &stream[offset..];
    let mut size = self.opcode.base_size;
    let mut disp_size = 0;
    if self.fields.mode.is_some() {
      if window.len() < 2 {
        return Err(DecodeError::TruncatedInstruction {
          offset,
          needed: 2,
          available: window.len(),
        });
      }
      disp_size = self.displacement_size(window, offset)?;
      size += disp_size;
    }
    if self.has_data {
      size += 1;
      if self.fields.w.map_or(0, |f| f.read(window)) == 1 {
        size += 1;
      }
    }
    Ok((size, disp_size))
  }
}

/// Every encoding form the decoder understands, in priority order. The
/// order is part of the contract: more than one pattern can structurally
/// match a leading byte, and the first hit wins.
pub static CATALOG: [Schema; 10] = [
  // MOV register/memory to/from register
  Schema {
    opcode: Opcode::new(0b_100010, 6, "mov", 2),
    fields: FieldMap {
      d: Some(D_FLAG),
      w: Some(W_FLAG_BIT0),
      mode: Some(MOD_FLAG),
      reg: Some(REG_FLAG_BYTE1),
      rm: Some(RM_FLAG),
      disp_lo: Some(DISP_LO),
      disp_hi: Some(DISP_HI),
      ..FieldMap::EMPTY
    },
    has_data: false,
    accumulator: false,
  },
  // MOV immediate to register/memory
  Schema {
    opcode: Opcode::new(0b_1100011, 7, "mov", 2),
    fields: FieldMap {
      w: Some(W_FLAG_BIT0),
      mode: Some(MOD_FLAG),
      rm: Some(RM_FLAG),
      disp_lo: Some(DISP_LO),
      disp_hi: Some(DISP_HI),
      ..FieldMap::EMPTY
    },
    has_data: true,
    accumulator: false,
  },
  // MOV immediate to register
  Schema {
    opcode: Opcode::new(0b_1011, 4, "mov", 1),
    fields: FieldMap {
      w: Some(W_FLAG_BIT3),
      reg: Some(REG_FLAG_BYTE0),
      ..FieldMap::EMPTY
    },
    has_data: true,
    accumulator: false,
  },
  // MOV memory to accumulator
  Schema {
    opcode: Opcode::new(0b_1010000, 7, "mov", 3),
    fields: FieldMap {
      d: Some(D_FLAG),
      w: Some(W_FLAG_BIT0),
      addr_lo: Some(ADDR_LO),
      addr_hi: Some(ADDR_HI),
      ..FieldMap::EMPTY
    },
    has_data: false,
    accumulator: true,
  },
  // MOV accumulator to memory
  Schema {
    opcode: Opcode::new(0b_1010001, 7, "mov", 3),
    fields: FieldMap {
      d: Some(D_FLAG),
      w: Some(W_FLAG_BIT0),
      addr_lo: Some(ADDR_LO),
      addr_hi: Some(ADDR_HI),
      ..FieldMap::EMPTY
    },
    has_data: false,
    accumulator: true,
  },
  // MOV register/memory to segment register
  Schema {
    opcode: Opcode::new(0b_10001110, 8, "mov", 2),
    fields: FieldMap {
      d: Some(D_FLAG),
      mode: Some(MOD_FLAG),
      sr: Some(SR_FLAG),
      rm: Some(RM_FLAG),
      disp_lo: Some(DISP_LO),
      disp_hi: Some(DISP_HI),
      ..FieldMap::EMPTY
    },
    has_data: false,
    accumulator: false,
  },
  // MOV segment register to register/memory
  Schema {
    opcode: Opcode::new(0b_10001100, 8, "mov", 2),
    fields: FieldMap {
      d: Some(D_FLAG),
      mode: Some(MOD_FLAG),
      sr: Some(SR_FLAG),
      rm: Some(RM_FLAG),
      disp_lo: Some(DISP_LO),
      disp_hi: Some(DISP_HI),
      ..FieldMap::EMPTY
    },
    has_data: false,
    accumulator: false,
  },
  // ADD register/memory with register to either
  Schema {
    opcode: Opcode::new(0b_000000, 6, "add", 2),
    fields: FieldMap {
      d: Some(D_FLAG),
      w: Some(W_FLAG_BIT0),
      mode: Some(MOD_FLAG),
      reg: Some(REG_FLAG_BYTE1),
      rm: Some(RM_FLAG),
      disp_lo: Some(DISP_LO),
      disp_hi: Some(DISP_HI),
      ..FieldMap::EMPTY
    },
    has_data: false,
    accumulator: false,
  },
  // ADD immediate to register/memory. The `s` field is located but not
  // consumed; sign-extension semantics are deliberately left out.
  Schema {
    opcode: Opcode::new(0b_100000, 6, "add", 2),
    fields: FieldMap {
      s: Some(S_FLAG),
      w: Some(W_FLAG_BIT0),
      mode: Some(MOD_FLAG),
      rm: Some(RM_FLAG),
      disp_lo: Some(DISP_LO),
      disp_hi: Some(DISP_HI),
      ..FieldMap::EMPTY
    },
    has_data: true,
    accumulator: false,
  },
  // ADD immediate to accumulator
  Schema {
    opcode: Opcode::new(0b_0000010, 7, "add", 1),
    fields: FieldMap {
      w: Some(W_FLAG_BIT0),
      ..FieldMap::EMPTY
    },
    has_data: true,
    accumulator: true,
  },
];

/// First catalog entry whose opcode pattern matches the leading byte.
pub fn match_schema(byte: u8, offset: usize) -> Result<&'static Schema> {
  CATALOG
    .iter()
    .find(|schema| schema.opcode.matches(byte))
    .ok_or(DecodeError::UnknownInstruction { offset, byte })
}
