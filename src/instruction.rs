use crate::error::{DecodeError, Result};
use crate::schema::{match_schema, BitField, Schema};

/// The closed set of operand arrangements an encoding form can decode
/// into. Classified once when the instruction is built; the renderer
/// dispatches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
  /// mod == 3 with a reg field: both operands are registers.
  RegisterToRegister,
  /// mod in {0, 1, 2} with a reg field: register versus effective address.
  Memory,
  /// mod == 0, rm == 6 with a reg field: register versus a bracketed
  /// 16-bit absolute address.
  DirectAddress,
  /// Trailing immediate into an effective address or direct address.
  ImmediateToMemory,
  /// Trailing immediate into a register, either from a reg field in the
  /// opcode byte or from rm when mod == 3.
  ImmediateToRegister,
  /// Trailing immediate into the implicit accumulator.
  AccumulatorImmediate,
  /// Accumulator versus a bracketed absolute address, direction per d.
  AccumulatorAddress,
  /// Segment register versus a 16-bit register or memory operand.
  SegmentTransfer,
}

/// One decoded instruction: its schema, the exact bytes it consumed, and
/// the offsets worked out before slicing. Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
  schema: &'static Schema,
  bytes: &'a [u8],
  shape: Shape,
  size: usize,
  disp_size: usize,
  data_start: usize,
}

impl<'a> Instruction<'a> {
  /// Matches, sizes, and slices the instruction starting at `offset`.
  /// The only step that determines how far the stream advances.
  pub fn read(stream: &'a [u8], offset: usize) -> Result<Instruction<'a>> {
    let schema = match_schema(stream[offset], offset)?;
    let (size, disp_size) = schema.instruction_size(stream, offset)?;
    if offset + size > stream.len() {
      return Err(DecodeError::TruncatedInstruction {
        offset,
        needed: size,
        available: stream.len() - offset,
      });
    }
    let bytes = &stream[offset..offset + size];
    Ok(Instruction {
      schema,
      bytes,
      shape: classify(schema, bytes),
      size,
      disp_size,
      data_start: schema.opcode.base_size + disp_size,
    })
  }

  pub fn mnemonic(&self) -> &'static str {
    self.schema.opcode.mnemonic
  }

  pub fn shape(&self) -> Shape {
    self.shape
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn bytes(&self) -> &'a [u8] {
    self.bytes
  }

  pub fn displacement_size(&self) -> usize {
    self.disp_size
  }

  fn field(&self, locator: Option<BitField>) -> Option<u8> {
    locator.map(|f| f.read(self.bytes))
  }

  /// True when the w bit selects the 16-bit register table. Forms without
  /// a w field (the segment transfers) are always 16-bit.
  pub fn wide(&self) -> bool {
    self.field(self.schema.fields.w).map_or(true, |w| w == 1)
  }

  /// Direction bit: 1 means the reg (or sr) field is the destination.
  /// Forms without a d field keep reg as the destination.
  pub fn d(&self) -> u8 {
    self.field(self.schema.fields.d).unwrap_or(1)
  }

  pub fn mode(&self) -> u8 {
    self.field(self.schema.fields.mode).unwrap_or(0)
  }

  pub fn reg(&self) -> u8 {
    self.field(self.schema.fields.reg).unwrap_or(0)
  }

  pub fn rm(&self) -> u8 {
    self.field(self.schema.fields.rm).unwrap_or(0)
  }

  pub fn sr(&self) -> u8 {
    self.field(self.schema.fields.sr).unwrap_or(0)
  }

  fn disp8(&self) -> u8 {
    self.field(self.schema.fields.disp_lo).unwrap_or(0)
  }

  pub fn disp16(&self) -> u16 {
    let lo = self.field(self.schema.fields.disp_lo).unwrap_or(0) as u16;
    let hi = self.field(self.schema.fields.disp_hi).unwrap_or(0) as u16;
    lo | (hi << 8)
  }

  /// Decoded displacement for the current mode; zero when none follows.
  pub fn displacement(&self) -> u16 {
    match self.disp_size {
      1 => self.disp8() as u16,
      2 => self.disp16(),
      _ => 0,
    }
  }

  /// Absolute address of the accumulator forms, little-endian when wide.
  pub fn address(&self) -> u16 {
    let lo = self.field(self.schema.fields.addr_lo).unwrap_or(0) as u16;
    if self.wide() {
      let hi = self.field(self.schema.fields.addr_hi).unwrap_or(0) as u16;
      lo | (hi << 8)
    } else {
      lo
    }
  }

  /// Trailing immediate data, read at `data_start`: one byte, or a
  /// little-endian word when the w bit is set.
  pub fn immediate(&self) -> u16 {
    let lo = self.bytes[self.data_start] as u16;
    if self.wide() {
      let hi = self.bytes[self.data_start + 1] as u16;
      lo | (hi << 8)
    } else {
      lo
    }
  }
}

fn classify(schema: &Schema, bytes: &[u8]) -> Shape {
  if let Some(mode_field) = schema.fields.mode {
    let mode = mode_field.read(bytes);
    let rm = schema.fields.rm.map_or(0, |f| f.read(bytes));
    if schema.fields.sr.is_some() {
      Shape::SegmentTransfer
    } else if schema.has_data {
      if mode == 0b11 {
        Shape::ImmediateToRegister
      } else {
        Shape::ImmediateToMemory
      }
    } else if mode == 0b11 {
      Shape::RegisterToRegister
    } else if mode == 0b00 && rm == 0b110 {
      Shape::DirectAddress
    } else {
      Shape::Memory
    }
  } else if schema.accumulator {
    if schema.has_data {
      Shape::AccumulatorImmediate
    } else {
      Shape::AccumulatorAddress
    }
  } else {
    Shape::ImmediateToRegister
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn read(bytes: &[u8]) -> Instruction<'_> {
    Instruction::read(bytes, 0).unwrap()
  }

  #[test]
  fn builder_consumes_exactly_the_computed_size() {
    let stream = [0x8b, 0b_01_000_000, 0x04, 0xb0, 0x05];
    let first = Instruction::read(&stream, 0).unwrap();
    assert_eq!(first.size(), 3);
    assert_eq!(first.bytes(), &stream[..3]);
    assert_eq!(first.displacement_size(), 1);
    let second = Instruction::read(&stream, first.size()).unwrap();
    assert_eq!(second.size(), 2);
    assert_eq!(second.bytes(), &stream[3..]);
  }

  #[test]
  fn shapes_cover_the_catalog() {
    assert_eq!(read(&[0x8b, 0xc3]).shape(), Shape::RegisterToRegister);
    assert_eq!(read(&[0x8b, 0x00]).shape(), Shape::Memory);
    assert_eq!(read(&[0x8b, 0x06, 0x07, 0x00]).shape(), Shape::DirectAddress);
    assert_eq!(
      read(&[0xc6, 0x07, 0x05]).shape(),
      Shape::ImmediateToMemory
    );
    assert_eq!(read(&[0xb0, 0x05]).shape(), Shape::ImmediateToRegister);
    assert_eq!(
      read(&[0x81, 0xc3, 0x07, 0x00]).shape(),
      Shape::ImmediateToRegister
    );
    assert_eq!(
      read(&[0x05, 0x0a, 0x00]).shape(),
      Shape::AccumulatorImmediate
    );
    assert_eq!(
      read(&[0xa1, 0x0b, 0x00]).shape(),
      Shape::AccumulatorAddress
    );
    assert_eq!(read(&[0x8e, 0xc0]).shape(), Shape::SegmentTransfer);
  }

  #[test]
  fn word_immediate_is_little_endian() {
    let inst = read(&[0xb9, 0x0c, 0x01]);
    assert_eq!(inst.immediate(), 0x010c);
  }

  #[test]
  fn displacement_reads_match_their_size() {
    assert_eq!(read(&[0x8b, 0b_01_000_000, 0x04]).displacement(), 4);
    assert_eq!(
      read(&[0x8b, 0b_10_000_000, 0x34, 0x12]).displacement(),
      0x1234
    );
    assert_eq!(read(&[0x8b, 0b_00_000_000]).displacement(), 0);
  }

  #[test]
  fn rereading_a_window_is_idempotent() {
    let stream = [0x8b, 0x06, 0x07, 0x00];
    assert_eq!(Instruction::read(&stream, 0), Instruction::read(&stream, 0));
  }

  #[test]
  fn slicing_past_the_buffer_is_truncation() {
    assert_eq!(
      Instruction::read(&[0xb8, 0x01], 0),
      Err(DecodeError::TruncatedInstruction { offset: 0, needed: 3, available: 2 })
    );
  }
}
