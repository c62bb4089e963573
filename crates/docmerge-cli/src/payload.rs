use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Where a request body is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    File(PathBuf),
    Stdin,
    Inline(String),
}

impl PayloadSource {
    /// `--with -` and a missing source both mean stdin.
    pub fn from_args(with: Option<PathBuf>, with_string: Option<String>) -> Self {
        match (with, with_string) {
            (_, Some(raw)) => PayloadSource::Inline(raw),
            (Some(path), None) if path.as_os_str() == "-" => PayloadSource::Stdin,
            (Some(path), None) => PayloadSource::File(path),
            (None, None) => PayloadSource::Stdin,
        }
    }
}

pub fn load_payload(source: PayloadSource) -> Result<String> {
    match source {
        PayloadSource::File(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read request file '{}'", path.display())),
        PayloadSource::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read request from stdin")?;
            Ok(buffer)
        }
        PayloadSource::Inline(raw) => Ok(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_source_from_flags() {
        assert_eq!(
            PayloadSource::from_args(Some("-".into()), None),
            PayloadSource::Stdin
        );
        assert_eq!(PayloadSource::from_args(None, None), PayloadSource::Stdin);
        assert_eq!(
            PayloadSource::from_args(Some("req.json".into()), None),
            PayloadSource::File("req.json".into())
        );
        assert_eq!(
            PayloadSource::from_args(None, Some("{}".into())),
            PayloadSource::Inline("{}".into())
        );
    }

    #[test]
    fn inline_payload_is_verbatim() {
        let raw = r#"{"text": "a\"b\\n"}"#;
        assert_eq!(load_payload(PayloadSource::Inline(raw.into())).unwrap(), raw);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_payload(PayloadSource::File("/nonexistent/req.json".into())).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/req.json"));
    }
}
