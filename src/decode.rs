use crate::error::Result;
use crate::instruction::Instruction;
use crate::render;

/// Walks the whole buffer and renders one line of assembly per decoded
/// instruction, preceded by the `bits 16` header.
pub fn disassemble(stream: &[u8]) -> Result<String> {
  let mut lines = vec!["bits 16".to_string()];
  for instruction in decode_stream(stream)? {
    lines.push(render::line(&instruction));
  }
  lines.push(String::new());
  Ok(lines.join("\n"))
}

/// Decodes the buffer into an ordered sequence of instructions. Each
/// step advances by the instruction's own size; the first failure aborts
/// the walk, so no bytes are ever skipped.
pub fn decode_stream(stream: &[u8]) -> Result<Vec<Instruction<'_>>> {
  let mut instructions = Vec::new();
  let mut offset = 0;
  while offset < stream.len() {
    let instruction = Instruction::read(stream, offset)?;
    offset += instruction.size();
    instructions.push(instruction);
  }
  Ok(instructions)
}
