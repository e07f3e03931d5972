use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendFormat {
    /// Value printed by a compiled Futhark program: one nested array
    /// literal, integers may carry a type suffix.
    Futhark,
    /// Plain text from the C backend: side length on the first line, then
    /// one flattened frame per line.
    C,
}

impl BackendFormat {
    pub const TAGS: [&'static str; 2] = ["futhark", "c"];

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "futhark" => Some(Self::Futhark),
            "c" => Some(Self::C),
            _ => None,
        }
    }
}

/// Problems with how the program was invoked. These are reported as a
/// single line on stderr, everything else gets the full error chain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("output directory must be given as the first argument")]
    MissingOutputDir,
    #[error(
        "the backend format (\"futhark\" or \"c\") must be given as the second argument"
    )]
    MissingFormat,
    #[error("the backend format must be \"futhark\" or \"c\", got {0:?}")]
    InvalidFormat(String),
    #[error("output directory already exists: {}", .0.display())]
    DirectoryExists(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub out_dir: PathBuf,
    pub format: BackendFormat,
}

impl Args {
    /// Validates the positional arguments (program name already stripped).
    /// Nothing is created on disk here.
    pub fn parse(
        mut args: impl Iterator<Item = String>,
    ) -> Result<Self, UsageError> {
        let out_dir = args
            .next()
            .map(PathBuf::from)
            .ok_or(UsageError::MissingOutputDir)?;
        let tag = args.next().ok_or(UsageError::MissingFormat)?;
        let format = BackendFormat::from_tag(&tag)
            .ok_or(UsageError::InvalidFormat(tag))?;

        if out_dir.exists() {
            return Err(UsageError::DirectoryExists(out_dir));
        }

        Ok(Self { out_dir, format })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, UsageError> {
        Args::parse(args.iter().map(|it| it.to_string()))
    }

    #[test]
    fn missing_arguments() {
        assert_eq!(parse(&[]), Err(UsageError::MissingOutputDir));
        assert_eq!(
            parse(&["some/dir/that/does/not/exist"]),
            Err(UsageError::MissingFormat)
        );
    }

    #[test]
    fn format_tags() {
        for tag in BackendFormat::TAGS {
            assert!(BackendFormat::from_tag(tag).is_some());
        }
        assert_eq!(
            parse(&["some/dir/that/does/not/exist", "opencl"]),
            Err(UsageError::InvalidFormat("opencl".to_string()))
        );
    }

    #[test]
    fn existing_directory() {
        let dir = std::env::temp_dir();
        let result = parse(&[dir.to_str().unwrap(), "c"]);
        assert_eq!(result, Err(UsageError::DirectoryExists(dir)));
    }

    #[test]
    fn valid() {
        let args = parse(&["some/dir/that/does/not/exist", "futhark"]).unwrap();
        assert_eq!(args.format, BackendFormat::Futhark);
        assert_eq!(args.out_dir, PathBuf::from("some/dir/that/does/not/exist"));
    }
}
