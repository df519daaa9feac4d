use crate::instruction::{Instruction, Shape};

const WORD_REGISTERS: [&str; 8] = ["ax", "cx", "dx", "bx", "sp", "bp", "si", "di"];
const BYTE_REGISTERS: [&str; 8] = ["al", "cl", "dl", "bl", "ah", "ch", "dh", "bh"];
const SEGMENT_REGISTERS: [&str; 4] = ["es", "cs", "ss", "ds"];

/// Base register combinations of the effective address calculation,
/// indexed by rm.
const EA_BASES: [&str; 8] = [
  "bx + si",
  "bx + di",
  "bp + si",
  "bp + di",
  "si",
  "di",
  "bp",
  "bx",
];

pub fn line(inst: &Instruction) -> String {
  let (op1, op2) = operands(inst);
  format!("{} {op1}, {op2}", inst.mnemonic())
}

fn register(index: u8, wide: bool) -> &'static str {
  if wide {
    WORD_REGISTERS[index as usize]
  } else {
    BYTE_REGISTERS[index as usize]
  }
}

/// Bracketed base-register sum; a zero displacement is omitted rather
/// than rendered as `+ 0`.
fn effective_address(inst: &Instruction) -> String {
  let base = EA_BASES[inst.rm() as usize];
  match inst.displacement() {
    0 => format!("[{base}]"),
    disp => format!("[{base} + {disp}]"),
  }
}

fn direct_address(addr: u16) -> String {
  format!("[{addr}]")
}

/// Memory operand of a mod-bearing form: either the direct 16-bit
/// address or the effective address calculation.
fn memory_operand(inst: &Instruction) -> String {
  if inst.mode() == 0b00 && inst.rm() == 0b110 {
    direct_address(inst.disp16())
  } else {
    effective_address(inst)
  }
}

fn operands(inst: &Instruction) -> (String, String) {
  let wide = inst.wide();
  match inst.shape() {
    Shape::RegisterToRegister => {
      let reg = register(inst.reg(), wide).to_string();
      let rm = register(inst.rm(), wide).to_string();
      if inst.d() == 1 {
        (reg, rm)
      } else {
        (rm, reg)
      }
    }
    Shape::Memory => {
      let reg = register(inst.reg(), wide).to_string();
      let ea = effective_address(inst);
      if inst.d() == 1 {
        (reg, ea)
      } else {
        (ea, reg)
      }
    }
    Shape::DirectAddress => (
      register(inst.reg(), wide).to_string(),
      direct_address(inst.disp16()),
    ),
    Shape::ImmediateToMemory => {
      let prefix = if wide { "word" } else { "byte" };
      (
        memory_operand(inst),
        format!("{prefix} {}", inst.immediate()),
      )
    }
    Shape::ImmediateToRegister => {
      // the register index lives in rm for mod == 3 forms and in the
      // opcode byte's reg field otherwise
      let index = if inst.mode() == 0b11 { inst.rm() } else { inst.reg() };
      (
        register(index, wide).to_string(),
        inst.immediate().to_string(),
      )
    }
    Shape::AccumulatorImmediate => (
      register(0, wide).to_string(),
      inst.immediate().to_string(),
    ),
    Shape::AccumulatorAddress => {
      let accumulator = register(0, wide).to_string();
      let addr = direct_address(inst.address());
      if inst.d() == 0 {
        (accumulator, addr)
      } else {
        (addr, accumulator)
      }
    }
    Shape::SegmentTransfer => {
      let segment = SEGMENT_REGISTERS[inst.sr() as usize].to_string();
      let other = if inst.mode() == 0b11 {
        WORD_REGISTERS[inst.rm() as usize].to_string()
      } else {
        memory_operand(inst)
      };
      if inst.d() == 1 {
        (segment, other)
      } else {
        (other, segment)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn render(bytes: &[u8]) -> String {
    line(&Instruction::read(bytes, 0).unwrap())
  }

  #[test]
  fn register_direction_follows_the_d_bit() {
    assert_eq!(render(&[0x8b, 0xc3]), "mov ax, bx");
    assert_eq!(render(&[0x89, 0xd9]), "mov cx, bx");
  }

  #[test]
  fn memory_direction_follows_the_d_bit() {
    assert_eq!(render(&[0x8b, 0x00]), "mov ax, [bx + si]");
    assert_eq!(render(&[0x89, 0x09]), "mov [bx + di], cx");
  }

  #[test]
  fn zero_displacement_is_omitted() {
    assert_eq!(render(&[0x8b, 0b_01_000_000, 0x00]), "mov ax, [bx + si]");
    assert_eq!(render(&[0x8b, 0b_01_000_000, 0x04]), "mov ax, [bx + si + 4]");
  }

  #[test]
  fn wide_displacement_renders_in_decimal() {
    assert_eq!(
      render(&[0x8b, 0b_10_000_110, 0x34, 0x12]),
      "mov ax, [bp + 4660]"
    );
  }

  #[test]
  fn immediate_to_memory_carries_a_size_prefix() {
    assert_eq!(render(&[0xc6, 0x07, 0x05]), "mov [bx], byte 5");
    assert_eq!(
      render(&[0xc7, 0x46, 0x04, 0x07, 0x00]),
      "mov [bp + 4], word 7"
    );
    assert_eq!(render(&[0x80, 0x07, 0x05]), "add [bx], byte 5");
  }

  #[test]
  fn immediate_to_direct_memory() {
    assert_eq!(
      render(&[0xc7, 0x06, 0x07, 0x00, 0x05, 0x00]),
      "mov [7], word 5"
    );
  }

  #[test]
  fn immediate_to_register_mode_targets_rm() {
    assert_eq!(render(&[0x81, 0xc3, 0x07, 0x00]), "add bx, 7");
  }

  #[test]
  fn accumulator_address_reverses_per_d() {
    assert_eq!(render(&[0xa1, 0x0b, 0x00]), "mov ax, [11]");
    assert_eq!(render(&[0xa3, 0x0c, 0x00]), "mov [12], ax");
  }

  #[test]
  fn segment_transfers_use_the_segment_table() {
    assert_eq!(render(&[0x8e, 0xc0]), "mov es, ax");
    assert_eq!(render(&[0x8c, 0xdb]), "mov bx, ds");
    assert_eq!(render(&[0x8e, 0x1e, 0x07, 0x00]), "mov ds, [7]");
  }

  #[test]
  fn rendering_is_deterministic() {
    let stream = [0x03, 0x5e, 0x00];
    let inst = Instruction::read(&stream, 0).unwrap();
    assert_eq!(line(&inst), line(&inst));
    assert_eq!(line(&inst), "add bx, [bp]");
  }
}
