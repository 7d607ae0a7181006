//! mobweave command-line interface: read one annotated worksheet, write the
//! generated Möbius script to stdout.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use serde::Serialize;

use mobweave_core::{
    Block, CompileError, DirectiveSet, TransformRegistry, compile_document, extract_directives,
    scan_document,
};

#[derive(Parser)]
#[command(
    name = "mobweave",
    version,
    about = "Compile annotated Maple worksheets into Möbius question scripts"
)]
struct Cli {
    /// Annotated Maple source file to compile
    script: PathBuf,

    /// Print the scanned blocks and their directives as JSON instead of compiling
    #[arg(long)]
    dump_blocks: bool,
}

/// One scanned block as shown by `--dump-blocks`.
#[derive(Serialize)]
struct BlockDump<'a> {
    kind: &'static str,
    line: usize,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    directives: Option<DirectiveSet>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap exits with code 2 on its own; the compiler contract is 1
            // for bad usage (help/version output still exits 0)
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            process::exit(code);
        }
    };

    if let Err(err) = run(&cli) {
        eprintln!("error: {}: {}", cli.script.display(), err);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CompileError> {
    let source = std::fs::read_to_string(&cli.script)?;
    let registry = TransformRegistry::standard();
    if cli.dump_blocks {
        dump_blocks(&source, &registry)
    } else {
        let output = compile_document(&source, &registry)?;
        print!("{output}");
        Ok(())
    }
}

/// Scan the document and print blocks plus their directive sets as JSON.
fn dump_blocks(source: &str, registry: &TransformRegistry) -> Result<(), CompileError> {
    let blocks = scan_document(source)?;
    let mut dumps = Vec::with_capacity(blocks.len());
    for block in &blocks {
        dumps.push(match block {
            Block::Prose { text, line } => BlockDump {
                kind: "prose",
                line: *line,
                text,
                directives: None,
            },
            Block::Code { text, line } => BlockDump {
                kind: "code",
                line: *line,
                text,
                directives: Some(extract_directives(text, registry, *line)?),
            },
        });
    }
    let json = serde_json::to_string_pretty(&dumps).unwrap_or_else(|_| "[]".to_string());
    println!("{json}");
    Ok(())
}
