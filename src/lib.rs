//! A single-pass front end for a C subset, emitting textual LLVM IR.
//!
//! The pipeline is the usual four stages, each its own module: [`lexer`]
//! tokenizes, [`parser`] builds the [`ast`] (also resolving struct/union tags
//! into a [`types::TagRegistry`], since that only needs name lookup), [`sema`]
//! type-checks and annotates the tree in place, and [`codegen`] walks the
//! annotated tree once to produce IR text. [`diagnostics`] carries source
//! locations and renders errors from any stage; [`config`] holds the handful
//! of knobs the `cfrontc` binary exposes.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod constfold;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod sema;
pub mod symtab;
pub mod types;
pub mod value;

use diagnostics::CompileError;

/// Runs the whole pipeline over a source string, returning the generated IR
/// or every diagnostic collected along the way.
pub fn compile(src: &str, path: Option<&str>, config: &config::CompilerConfig) -> Result<String, CompileError> {
    let tokens = lexer::Lexer::new(src).tokenize()?;
    let (mut program, tags) = parser::parse(&tokens)?;

    let mut analyzer = sema::Analyzer::new(tags);
    if let Some(p) = path {
        analyzer.diags = diagnostics::Diagnostics::with_path(std::path::PathBuf::from(p));
    }
    analyzer.analyze(&mut program);
    analyzer.diags.into_result()?;

    Ok(codegen::codegen_program(&program, &analyzer.tags, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_minimal_program_end_to_end() {
        let ir = compile("int main(){return 0;}", None, &config::CompilerConfig::default()).unwrap();
        assert!(ir.contains("define i32 @main()"));
    }

    #[test]
    fn reports_sema_errors_without_panicking() {
        let err = compile("int main(){return y;}", None, &config::CompilerConfig::default());
        assert!(err.is_err());
    }
}
