//! Entry manifests: the aggregate style and script entry files.
//!
//! The manifest is the entry file itself. Each page fragment is one line
//! (`@import "view_<name>.scss";` or `require('./view_<name>.js');`) and
//! lines are only ever appended.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::compiler::script::bundle::find_requires;

/// An `@import` at the start of a line; commented-out lines never match.
static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*@import[ \t]+(?:'([^']+)'|"([^"]+)")"#).unwrap()
});

/// Which aggregate entry a manifest describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Style,
    Script,
}

impl ManifestKind {
    /// Fragment file name for a page.
    pub fn fragment_file(self, page_name: &str) -> String {
        match self {
            Self::Style => format!("view_{page_name}.scss"),
            Self::Script => format!("view_{page_name}.js"),
        }
    }

    /// Reference as it appears inside the entry file.
    pub fn reference(self, page_name: &str) -> String {
        match self {
            Self::Style => self.fragment_file(page_name),
            Self::Script => format!("./{}", self.fragment_file(page_name)),
        }
    }

    /// The line appended for a reference.
    pub fn line(self, reference: &str) -> String {
        match self {
            Self::Style => format!("@import \"{reference}\";"),
            Self::Script => format!("require('{reference}');"),
        }
    }
}

/// Whether an append changed the entry file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    Added,
    AlreadyPresent,
}

/// An entry file holding an ordered list of fragment references.
#[derive(Debug, Clone)]
pub struct EntryManifest {
    path: PathBuf,
    kind: ManifestKind,
}

impl EntryManifest {
    pub fn new(path: impl Into<PathBuf>, kind: ManifestKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ManifestKind {
        self.kind
    }

    /// References in insertion order. A missing entry file is empty.
    pub fn read(&self) -> io::Result<Vec<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        Ok(match self.kind {
            ManifestKind::Style => IMPORT
                .captures_iter(&content)
                .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
                .map(|m| m.as_str().to_string())
                .collect(),
            ManifestKind::Script => find_requires(&content),
        })
    }

    /// Append one reference line at the end; never duplicates.
    ///
    /// Creates the entry file when it does not exist yet.
    pub fn append(&self, reference: &str) -> io::Result<Appended> {
        if self.read()?.iter().any(|existing| existing == reference) {
            return Ok(Appended::AlreadyPresent);
        }

        let needs_newline = fs::read(&self.path)
            .map(|bytes| !bytes.is_empty() && !bytes.ends_with(b"\n"))
            .unwrap_or(false);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if needs_newline {
            file.write_all(b"\n")?;
        }
        writeln!(file, "{}", self.kind.line(reference))?;

        Ok(Appended::Added)
    }
}
