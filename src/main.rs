//! cfrontc — command-line front end.
//!
//! Grounded on the teacher's compiler CLI: `clap::Parser` derive, `PathBuf`
//! arguments, plain `println!`/`eprintln!` status and error output, and
//! `process::exit(1)` on failure rather than unwinding a panic.

use clap::{Parser, Subcommand};
use cfront::config::CompilerConfig;
use cfront::diagnostics::Diagnostics;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "cfrontc")]
#[command(about = "Single-pass C subset compiler emitting textual LLVM IR", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to an LLVM IR (.ll) file.
    Build {
        /// Input C source file.
        input: PathBuf,

        /// Output .ll path. Defaults to the input path with a `.ll` extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// LLVM target triple to emit in the module header.
        #[arg(long)]
        target: Option<String>,

        /// Path to a cfrontc.toml configuration file, merged under any
        /// flags given on the command line.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run lexing, parsing, and semantic analysis only; report diagnostics
    /// without emitting IR.
    Check {
        /// Input C source file.
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Build {
            input,
            output,
            target,
            config,
        } => run_build(input, output.as_deref(), target.as_deref(), config.as_deref()),
        Commands::Check { input } => run_check(input),
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

fn load_config(config_path: Option<&std::path::Path>, target: Option<&str>) -> Result<CompilerConfig, i32> {
    let mut config = match config_path {
        Some(p) => CompilerConfig::from_file(p).map_err(|e| {
            eprintln!("Error: {}", e);
            1
        })?,
        None => CompilerConfig::default(),
    };
    if let Some(triple) = target {
        config = config.with_target_triple(triple);
    }
    Ok(config)
}

fn run_build(
    input: &std::path::Path,
    output: Option<&std::path::Path>,
    target: Option<&str>,
    config_path: Option<&std::path::Path>,
) -> Result<(), i32> {
    let config = load_config(config_path, target)?;
    let src = std::fs::read_to_string(input).map_err(|e| {
        eprintln!("Error: cannot read {}: {}", input.display(), e);
        1
    })?;

    let ir = cfront::compile(&src, input.to_str(), &config).map_err(|e| {
        eprintln!("Error:\n{}", e);
        1
    })?;

    let out_path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| input.with_extension("ll"));
    std::fs::write(&out_path, ir).map_err(|e| {
        eprintln!("Error: cannot write {}: {}", out_path.display(), e);
        1
    })?;

    println!("Compiled {} -> {}", input.display(), out_path.display());
    Ok(())
}

fn run_check(input: &std::path::Path) -> Result<(), i32> {
    let src = std::fs::read_to_string(input).map_err(|e| {
        eprintln!("Error: cannot read {}: {}", input.display(), e);
        1
    })?;

    let tokens = cfront::lexer::Lexer::new(&src).tokenize().map_err(|e| {
        eprintln!("{}:{}", input.display(), e);
        1
    })?;
    let (mut program, tags) = cfront::parser::parse(&tokens).map_err(|e| {
        eprintln!("{}:{}", input.display(), e);
        1
    })?;

    let mut analyzer = cfront::sema::Analyzer::new(tags);
    analyzer.diags = Diagnostics::with_path(input.to_path_buf());
    analyzer.analyze(&mut program);

    if analyzer.diags.has_errors() {
        for line in analyzer.diags.render_lines() {
            eprintln!("{}", line);
        }
        return Err(1);
    }

    println!("{}: no errors", input.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_build_writes_ll_file_next_to_source() {
        use tempfile::tempdir;

        let temp = tempdir().unwrap();
        let source = temp.path().join("test.c");
        std::fs::write(&source, "int main() { return 0; }").unwrap();

        run_build(&source, None, None, None).unwrap();

        let ir = std::fs::read_to_string(temp.path().join("test.ll")).unwrap();
        assert!(ir.contains("define i32 @main()"));
    }

    #[test]
    fn run_build_honors_explicit_output_path() {
        use tempfile::tempdir;

        let temp = tempdir().unwrap();
        let source = temp.path().join("test.c");
        std::fs::write(&source, "int main() { return 0; }").unwrap();
        let output = temp.path().join("out.ll");

        run_build(&source, Some(&output), None, None).unwrap();

        assert!(output.exists());
    }
}
