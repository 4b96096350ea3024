//! Command implementations.

use std::io::Read;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use scrivener_core::validate_text;

pub mod analyze;
pub mod detect;
pub mod info;
#[cfg(feature = "mcp")]
pub mod serve;

/// Read a file and validate its size against the configured limit.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    // Preflight: check file size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = metadata.len() as usize;
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    let content = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read {path}"))?;
    Ok(content)
}

/// Resolve command input from an inline argument, a file, or stdin, in that order.
///
/// The result is checked with [`validate_text`], so empty input is an error.
pub fn read_text_input(
    text: Option<String>,
    file: Option<&Utf8PathBuf>,
    max_bytes: Option<usize>,
) -> anyhow::Result<String> {
    let content = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => read_input_file(path, max_bytes)?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    validate_text(&content, max_bytes)?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn inline_text_wins() {
        let text = read_text_input(Some("hello world".into()), None, None).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn reads_file_within_limit() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("note.txt")).unwrap();
        fs::write(&path, "teh cat").unwrap();
        assert_eq!(read_text_input(None, Some(&path), Some(100)).unwrap(), "teh cat");
    }

    #[test]
    fn rejects_oversized_file() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("big.txt")).unwrap();
        fs::write(&path, "x".repeat(64)).unwrap();
        let err = read_input_file(&path, Some(10)).unwrap_err();
        assert!(err.to_string().contains("input too large"));
    }

    #[test]
    fn rejects_blank_text() {
        let err = read_text_input(Some("   ".into()), None, None).unwrap_err();
        assert_eq!(err.to_string(), "text is required");
    }
}
