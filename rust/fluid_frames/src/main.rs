#![warn(missing_debug_implementations)]

use std::{
    env,
    io::{stdin, Read, Write},
    process::ExitCode,
};

use anyhow::Context;
use args::{Args, UsageError};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod frame;
pub mod output;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    run(env::args().skip(1), stdin().lock(), &mut std::io::stderr())
}

/// Parses `args`, dumps `input` and reports any failure to `err_out`.
/// Usage problems are a single `error:` line, everything else gets the
/// full error chain.
pub fn run(
    args: impl Iterator<Item = String>,
    input: impl Read,
    mut err_out: impl Write,
) -> ExitCode {
    let result = Args::parse(args)
        .map_err(anyhow::Error::from)
        .and_then(|args| dump(&args, input));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = match err.downcast_ref::<UsageError>() {
                Some(usage) => writeln!(err_out, "error: {usage}"),
                None => writeln!(err_out, "error: {err:?}"),
            };
            ExitCode::FAILURE
        }
    }
}

pub fn dump(args: &Args, mut input: impl Read) -> anyhow::Result<()> {
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .context("failed to read frames from stdin")?;

    let frames =
        frame::parse(args.format, &text).context("failed to parse frames")?;
    if let Some(first) = frames.first() {
        info!(
            "parsed {} frames of {}x{}",
            frames.len(),
            first.width(),
            first.height()
        );
    } else {
        info!("input holds no frames");
    }

    let written = output::write_frames(&args.out_dir, frames)?;
    info!("wrote {} images to {}", written.len(), args.out_dir.display());

    Ok(())
}

#[cfg(test)]
fn test_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("fluid_frames-{}-{name}", std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_c_input() {
        let dir = test_dir("dump_c_input");
        let args = Args::parse(
            [dir.to_str().unwrap().to_string(), "c".to_string()].into_iter(),
        )
        .unwrap();

        dump(&args, "3\n0 1 2 3 4 5 6 7 8\n8 7 6 5 4 3 2 1 0\n".as_bytes())
            .unwrap();

        let mut names = std::fs::read_dir(&dir)
            .unwrap()
            .map(|it| it.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["fluid_00000000.png", "fluid_00000001.png"]);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn existing_dir_is_left_alone() {
        let dir = test_dir("existing_dir_is_left_alone");
        std::fs::create_dir_all(&dir).unwrap();

        let err = Args::parse(
            [dir.to_str().unwrap().to_string(), "futhark".to_string()]
                .into_iter(),
        )
        .unwrap_err();
        assert_eq!(err, UsageError::DirectoryExists(dir.clone()));
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn invalid_format_creates_nothing() {
        let dir = test_dir("invalid_format_creates_nothing");
        let err = Args::parse(
            [dir.to_str().unwrap().to_string(), "rust".to_string()]
                .into_iter(),
        )
        .unwrap_err();
        assert_eq!(err, UsageError::InvalidFormat("rust".to_string()));
        assert!(!dir.exists());
    }

    fn run_with(args: &[&str], input: &str) -> (ExitCode, String) {
        let mut err_out = vec![];
        let code = run(
            args.iter().map(|it| it.to_string()),
            input.as_bytes(),
            &mut err_out,
        );
        (code, String::from_utf8(err_out).unwrap())
    }

    #[test]
    fn exit_codes() {
        let dir = test_dir("exit_codes");
        let path = dir.to_str().unwrap();

        let (code, message) = run_with(&[], "");
        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(
            message,
            format!("error: {}\n", UsageError::MissingOutputDir)
        );

        let (code, message) = run_with(&[path, "opencl"], "");
        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(message.lines().count(), 1);
        assert!(message.starts_with("error: "));
        assert!(!dir.exists());

        let (code, message) = run_with(&[path, "c"], "1\n42\n");
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(message.is_empty());
        assert!(dir.join("fluid_00000000.png").exists());

        let (code, message) = run_with(&[path, "c"], "1\n42\n");
        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(
            message,
            format!("error: {}\n", UsageError::DirectoryExists(dir.clone()))
        );

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn malformed_input_fails() {
        let dir = test_dir("malformed_input_fails");
        let (code, message) =
            run_with(&[dir.to_str().unwrap(), "c"], "2\n1 2 3\n");
        assert_eq!(code, ExitCode::FAILURE);
        assert!(message.contains("failed to parse frames"));
        assert!(!dir.exists());
    }

    #[test]
    fn malformed_input_is_an_error() {
        let dir = test_dir("malformed_input_is_an_error");
        let args = Args::parse(
            [dir.to_str().unwrap().to_string(), "futhark".to_string()]
                .into_iter(),
        )
        .unwrap();

        let err = dump(&args, "[[[1, 2], [3]]]".as_bytes()).unwrap_err();
        assert!(err.downcast_ref::<frame::ParseError>().is_some());
        assert!(!dir.exists());
    }
}
