//! Bundle lowering and minification with oxc.

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::diagnostics::OxcDiagnostic;
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};

/// How the lowered bundle is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// Mangled and compressed, no source map.
    Minified,
    /// Readable output with an inline `data:` source map.
    WithSourceMap,
}

/// Lower `source` to `target` (e.g. `es2015`) and print it.
pub fn transpile(source: &str, path: &Path, target: &str, emit: Emit) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !ret.errors.is_empty() {
        return Err(format_errors(&ret.errors));
    }
    let mut program = ret.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let options = TransformOptions::from_target(target)?;
    let ret = Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if !ret.errors.is_empty() {
        return Err(format_errors(&ret.errors));
    }

    match emit {
        Emit::Minified => {
            let options = MinifierOptions {
                mangle: Some(MangleOptions::default()),
                compress: Some(CompressOptions::smallest()),
            };
            let ret = Minifier::new(options).minify(&allocator, &mut program);
            Ok(Codegen::new()
                .with_options(CodegenOptions {
                    minify: true,
                    comments: CommentOptions::disabled(),
                    ..CodegenOptions::default()
                })
                .with_scoping(ret.scoping)
                .build(&program)
                .code)
        }
        Emit::WithSourceMap => {
            let ret = Codegen::new()
                .with_options(CodegenOptions {
                    source_map_path: Some(path.to_path_buf()),
                    ..CodegenOptions::default()
                })
                .build(&program);
            let mut code = ret.code;
            if let Some(map) = ret.map {
                code.push_str("\n//# sourceMappingURL=");
                code.push_str(&map.to_data_url());
                code.push('\n');
            }
            Ok(code)
        }
    }
}

fn format_errors(errors: &[OxcDiagnostic]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "const greet = (name) => `hi ${name}`;\nmodule.exports = { greet };\n";

    #[test]
    fn test_lowers_to_es2015_baseline() {
        let code = transpile(
            "const x = a ?? b;\nmodule.exports = x;\n",
            Path::new("bundle.js"),
            "es2015",
            Emit::WithSourceMap,
        )
        .unwrap();
        assert!(!code.contains("??"), "{code}");
    }

    #[test]
    fn test_minified_has_no_source_map() {
        let code = transpile(SOURCE, Path::new("bundle.js"), "es2015", Emit::Minified).unwrap();
        assert!(!code.contains("sourceMappingURL"));
        assert!(code.len() < SOURCE.len());
    }

    #[test]
    fn test_source_map_is_inline() {
        let code = transpile(SOURCE, Path::new("bundle.js"), "es2015", Emit::WithSourceMap).unwrap();
        assert!(code.contains("//# sourceMappingURL=data:application/json;"));
    }

    #[test]
    fn test_syntax_error_reported() {
        let err = transpile("var = ;", Path::new("bundle.js"), "es2015", Emit::Minified).unwrap_err();
        assert!(!err.is_empty());
    }
}
