//! Minimal CommonJS bundler.
//!
//! Starting at the entry, every `require('<specifier>')` call is resolved to
//! a file and the file is added to a module table. Modules get ids in
//! discovery order (entry is `0`, then depth-first in `require` order), and
//! the table is wrapped in an IIFE with a tiny `require` runtime.

use std::fs;
use std::path::{Path, PathBuf};

use oxc::allocator::Allocator;
use oxc::ast::ast::CallExpression;
use oxc::ast_visit::{Visit, walk};
use oxc::parser::Parser;
use oxc::span::SourceType;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::compiler::StageError;

/// One module in the table.
#[derive(Debug)]
pub struct Module {
    pub path: PathBuf,
    pub source: String,
    /// Specifier → module id, in `require` order.
    pub deps: Vec<(String, usize)>,
}

/// Resolved module graph rooted at the entry (id `0`).
#[derive(Debug)]
pub struct Bundle {
    pub modules: Vec<Module>,
}

#[derive(Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Specifiers in `require` order, duplicates kept.
///
/// Only real `require('<literal>')` calls count: calls in comments or
/// strings, member calls like `obj.require(..)` and non-literal arguments
/// are ignored. Syntax errors are left to the transpiler; whatever the
/// parser recovered is still scanned.
pub fn find_requires(source: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    let mut collector = RequireCollector::default();
    collector.visit_program(&ret.program);
    collector.specifiers
}

#[derive(Default)]
struct RequireCollector {
    specifiers: Vec<String>,
}

impl<'a> Visit<'a> for RequireCollector {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Some(literal) = call.common_js_require() {
            self.specifiers.push(literal.value.to_string());
        }
        walk::walk_call_expression(self, call);
    }
}

/// Resolve a specifier required from `from`.
///
/// Relative specifiers resolve against the requiring file; bare ones through
/// `node_modules/<package>`.
pub fn resolve(specifier: &str, from: &Path, node_modules: &Path) -> Option<PathBuf> {
    if specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/') {
        let base = from.parent().unwrap_or(Path::new("")).join(specifier);
        return resolve_file(&base);
    }

    let (package, subpath) = split_package(specifier);
    let package_dir = node_modules.join(package);
    if let Some(subpath) = subpath {
        return resolve_file(&package_dir.join(subpath));
    }

    let main = fs::read_to_string(package_dir.join("package.json"))
        .ok()
        .and_then(|content| serde_json::from_str::<PackageManifest>(&content).ok())
        .and_then(|manifest| manifest.main);

    main.and_then(|main| resolve_file(&package_dir.join(main)))
        .or_else(|| resolve_file(&package_dir.join("index.js")))
}

/// `@scope/name/sub` → (`@scope/name`, `sub`), `name/sub` → (`name`, `sub`)
fn split_package(specifier: &str) -> (&str, Option<&str>) {
    let name_parts = if specifier.starts_with('@') { 2 } else { 1 };
    let mut split_at = None;
    for (count, (index, _)) in specifier.match_indices('/').enumerate() {
        if count + 1 == name_parts {
            split_at = Some(index);
            break;
        }
    }

    match split_at {
        Some(index) => (&specifier[..index], Some(&specifier[index + 1..])),
        None => (specifier, None),
    }
}

/// Try `<base>`, `<base>.js`, `<base>.json`, `<base>/index.js`.
fn resolve_file(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }

    for ext in [".js", ".json"] {
        let mut candidate = base.as_os_str().to_os_string();
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let index = base.join("index.js");
    index.is_file().then_some(index)
}

impl Bundle {
    /// Walk the `require` graph from `entry`.
    pub fn collect(entry: &Path, node_modules: &Path) -> Result<Self, StageError> {
        let mut bundle = Self {
            modules: Vec::new(),
        };
        let mut ids: FxHashMap<PathBuf, usize> = FxHashMap::default();
        bundle.visit(entry, node_modules, &mut ids)?;
        Ok(bundle)
    }

    fn visit(
        &mut self,
        path: &Path,
        node_modules: &Path,
        ids: &mut FxHashMap<PathBuf, usize>,
    ) -> Result<usize, StageError> {
        let key = crate::utils::path::normalize_path(path);
        if let Some(&id) = ids.get(&key) {
            return Ok(id);
        }

        let source = fs::read_to_string(path).map_err(|e| StageError::io(path, e))?;
        let source = if path.extension().is_some_and(|ext| ext == "json") {
            format!("module.exports = {};", source.trim())
        } else {
            source
        };

        let id = self.modules.len();
        ids.insert(key, id);
        let specifiers = find_requires(&source);
        self.modules.push(Module {
            path: path.to_path_buf(),
            source,
            deps: Vec::new(),
        });

        for specifier in specifiers {
            if self.modules[id].deps.iter().any(|(s, _)| *s == specifier) {
                continue;
            }
            let resolved = resolve(&specifier, path, node_modules).ok_or_else(|| {
                StageError::Unresolved {
                    specifier: specifier.clone(),
                    from: path.to_path_buf(),
                }
            })?;
            let dep = self.visit(&resolved, node_modules, ids)?;
            self.modules[id].deps.push((specifier, dep));
        }

        Ok(id)
    }

    /// Emit the IIFE exposing the entry exports as `global`.
    pub fn emit(&self, global: &str, root: &Path) -> String {
        let mut out = String::with_capacity(
            self.modules.iter().map(|m| m.source.len() + 128).sum::<usize>() + 512,
        );

        out.push_str("(function (modules, entry) {\n");
        out.push_str("  var cache = {};\n");
        out.push_str("  function load(id) {\n");
        out.push_str("    if (cache[id]) return cache[id].exports;\n");
        out.push_str("    var module = (cache[id] = { exports: {} });\n");
        out.push_str("    var definition = modules[id];\n");
        out.push_str("    definition[0].call(module.exports, function (name) {\n");
        out.push_str("      return load(definition[1][name]);\n");
        out.push_str("    }, module, module.exports);\n");
        out.push_str("    return module.exports;\n");
        out.push_str("  }\n");
        out.push_str("  var exported = load(entry);\n");
        out.push_str("  if (typeof module === \"object\" && module.exports) {\n");
        out.push_str("    module.exports = exported;\n");
        out.push_str("  } else {\n");
        out.push_str("    var root = typeof globalThis !== \"undefined\" ? globalThis\n");
        out.push_str("      : typeof window !== \"undefined\" ? window : this;\n");
        out.push_str(&format!("    root.{global} = exported;\n"));
        out.push_str("  }\n");
        out.push_str("})([\n");

        for module in &self.modules {
            let label = module
                .path
                .strip_prefix(root)
                .unwrap_or(&module.path)
                .to_string_lossy()
                .replace('\\', "/");
            let deps: serde_json::Map<String, serde_json::Value> = module
                .deps
                .iter()
                .map(|(specifier, id)| (specifier.clone(), (*id).into()))
                .collect();
            let deps = serde_json::Value::Object(deps);

            out.push_str(&format!("// {label}\n"));
            out.push_str("[function (require, module, exports) {\n");
            out.push_str(&module.source);
            if !module.source.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&format!("}}, {deps}],\n"));
        }

        out.push_str("], 0);\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_find_requires() {
        let source = r#"
            require('./view_a.js');
            const b = require("./view_b");
            obj.require('./not-me');
            myrequire('./nor-me');
        "#;
        assert_eq!(find_requires(source), vec!["./view_a.js", "./view_b"]);
    }

    #[test]
    fn test_find_requires_skips_comments_and_strings() {
        let source = r#"
            // require('./view_old.js');
            /* require('./view_gone.js'); */
            var s = "require('./in-string')";
            require('./view_live.js');
        "#;
        assert_eq!(find_requires(source), vec!["./view_live.js"]);
    }

    #[test]
    fn test_collect_ignores_commented_require() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("entry.js");
        write(&entry, "// require('./view_old.js');\nrequire('./view_new.js');\n");
        write(&dir.path().join("view_new.js"), "module.exports = 1;\n");

        let bundle = Bundle::collect(&entry, &dir.path().join("node_modules")).unwrap();
        assert_eq!(bundle.modules.len(), 2);
        assert_eq!(bundle.modules[0].deps, vec![("./view_new.js".to_string(), 1)]);
    }

    #[test]
    fn test_split_package() {
        assert_eq!(split_package("jquery"), ("jquery", None));
        assert_eq!(split_package("lodash/fp"), ("lodash", Some("fp")));
        assert_eq!(split_package("@scope/pkg"), ("@scope/pkg", None));
        assert_eq!(split_package("@scope/pkg/sub/x"), ("@scope/pkg", Some("sub/x")));
    }

    #[test]
    fn test_resolve_relative_and_bare() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let nm = root.join("node_modules");
        write(&root.join("js/entry.js"), "");
        write(&root.join("js/util.js"), "");
        write(&root.join("js/widgets/index.js"), "");
        write(&nm.join("dep/package.json"), r#"{"main": "lib/main.js"}"#);
        write(&nm.join("dep/lib/main.js"), "");
        write(&nm.join("plain/index.js"), "");

        let from = root.join("js/entry.js");
        assert_eq!(resolve("./util", &from, &nm), Some(root.join("js/util.js")));
        assert_eq!(resolve("./util.js", &from, &nm), Some(root.join("js/util.js")));
        assert_eq!(
            resolve("./widgets", &from, &nm),
            Some(root.join("js/widgets/index.js"))
        );
        assert_eq!(resolve("dep", &from, &nm), Some(nm.join("dep/lib/main.js")));
        assert_eq!(resolve("plain", &from, &nm), Some(nm.join("plain/index.js")));
        assert_eq!(resolve("./missing", &from, &nm), None);
        assert_eq!(resolve("missing", &from, &nm), None);
    }

    #[test]
    fn test_collect_orders_modules_by_require() {
        let dir = TempDir::new().unwrap();
        let js = dir.path().join("js");
        write(
            &js.join("entry.js"),
            "require('./view_a.js');\nrequire('./view_b.js');\n",
        );
        write(&js.join("view_a.js"), "require('./shared');\n");
        write(&js.join("view_b.js"), "require('./shared');\n");
        write(&js.join("shared.js"), "module.exports = 1;\n");

        let bundle = Bundle::collect(&js.join("entry.js"), &dir.path().join("node_modules")).unwrap();
        let names: Vec<_> = bundle
            .modules
            .iter()
            .map(|m| m.path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["entry.js", "view_a.js", "shared.js", "view_b.js"]);
        assert_eq!(bundle.modules[3].deps, vec![("./shared".to_string(), 2)]);
    }

    #[test]
    fn test_collect_unresolved() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("entry.js");
        write(&entry, "require('./gone');");

        let err = Bundle::collect(&entry, &dir.path().join("node_modules")).unwrap_err();
        assert!(matches!(err, StageError::Unresolved { ref specifier, .. } if specifier == "./gone"));
    }

    #[test]
    fn test_emit_exposes_global() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("js/entry.js");
        write(&entry, "module.exports = { ok: true };");

        let bundle = Bundle::collect(&entry, &dir.path().join("node_modules")).unwrap();
        let code = bundle.emit("nodeModules", dir.path());
        assert!(code.contains("root.nodeModules = exported;"));
        assert!(code.contains("// js/entry.js"));
        assert!(code.contains("module.exports = { ok: true };"));
        assert!(code.trim_end().ends_with("], 0);"));
    }

    #[test]
    fn test_json_module_wrapped() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("entry.js");
        write(&entry, "var data = require('./data');");
        write(&dir.path().join("data.json"), "{\"a\": 1}\n");

        let bundle = Bundle::collect(&entry, &dir.path().join("node_modules")).unwrap();
        assert_eq!(bundle.modules[1].source, "module.exports = {\"a\": 1};");
    }
}
