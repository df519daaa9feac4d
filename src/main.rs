use anyhow::{Context, Result};

mod decode;
mod error;
mod instruction;
mod render;
mod schema;

fn main() {
  let args: Vec<String> = std::env::args().collect();
  if args.len() != 2 {
    eprintln!("Usage: dasm-8086 <filename>");
    std::process::exit(2);
  }
  if let Err(err) = run(&args[1]) {
    eprintln!("error: {err:#}");
    std::process::exit(1);
  }
}

fn run(path: &str) -> Result<()> {
  let stream = std::fs::read(path).with_context(|| format!("reading `{path}`"))?;
  let listing = decode::disassemble(&stream).with_context(|| format!("disassembling `{path}`"))?;
  let dest = format!("{path}-out-gen.asm");
  std::fs::write(&dest, listing).with_context(|| format!("writing `{dest}`"))?;
  Ok(())
}
