//! Protocol text extraction.
//!
//! Plain text and Markdown are read directly. PDF and Word documents are handed
//! to a converter binary found on PATH, which writes plain text to stdout.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{LabCalError, LabCalResult};

/// Turns a document on disk into plain text.
pub trait TextExtractor {
    fn extract(&self, path: &Path) -> LabCalResult<String>;
}

/// External converter for one document format.
struct Converter {
    binary: &'static str,
    args: &'static [&'static str],
    /// Where the input path goes among `args`.
    input_at: usize,
    install_hint: &'static str,
}

const PDF: Converter = Converter {
    binary: "pdftotext",
    args: &["-layout", "-"],
    input_at: 1,
    install_hint: "install poppler (e.g. `brew install poppler` or `apt install poppler-utils`)",
};

const DOCX: Converter = Converter {
    binary: "pandoc",
    args: &["-t", "plain", "--wrap=none"],
    input_at: 0,
    install_hint: "install pandoc (https://pandoc.org/installing.html)",
};

const DOC: Converter = Converter {
    binary: "antiword",
    args: &[],
    input_at: 0,
    install_hint: "install antiword (e.g. `brew install antiword` or `apt install antiword`)",
};

/// Extractor dispatching on the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandTextExtractor;

impl CommandTextExtractor {
    pub fn new() -> Self {
        CommandTextExtractor
    }

    fn run(&self, converter: &Converter, path: &Path) -> LabCalResult<String> {
        let binary_path: PathBuf = which::which(converter.binary).map_err(|_| {
            LabCalError::Extraction(format!(
                "'{}' not found on PATH; {}",
                converter.binary, converter.install_hint
            ))
        })?;

        let mut args: Vec<&std::ffi::OsStr> =
            converter.args.iter().map(std::ffi::OsStr::new).collect();
        args.insert(converter.input_at, path.as_os_str());

        debug!(binary = %binary_path.display(), path = %path.display(), "running converter");
        let output = Command::new(&binary_path).args(&args).output().map_err(|e| {
            LabCalError::Extraction(format!("Could not run {}: {}", converter.binary, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LabCalError::Extraction(format!(
                "{} failed on {}: {}",
                converter.binary,
                path.display(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextExtractor for CommandTextExtractor {
    fn extract(&self, path: &Path) -> LabCalResult<String> {
        if !path.is_file() {
            return Err(LabCalError::Extraction(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" | "md" => Ok(std::fs::read_to_string(path)?),
            "pdf" => self.run(&PDF, path),
            "docx" => self.run(&DOCX, path),
            "doc" => self.run(&DOC, path),
            "" => Err(LabCalError::UnsupportedFormat("(no extension)".to_string())),
            other => Err(LabCalError::UnsupportedFormat(format!(".{}", other))),
        }
    }
}
