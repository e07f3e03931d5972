use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{GrayImage, ImageFormat};
use tracing::debug;

use crate::frame::Frame;

pub const MIN_PAD_WIDTH: usize = 8;

pub fn digits(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |log| log as usize + 1)
}

/// Zero padding used for frame numbers, wide enough that lexicographic
/// order of the file names matches frame order.
pub fn pad_width(frame_count: usize) -> usize {
    MIN_PAD_WIDTH.max(digits(frame_count))
}

pub fn frame_file_name(idx: usize, pad_width: usize) -> String {
    format!("fluid_{idx:0>pad_width$}.png")
}

/// Creates `out_dir` and writes every frame into it, returns the written
/// paths. Stops at the first failure.
pub fn write_frames(
    out_dir: &Path,
    frames: Vec<Frame>,
) -> anyhow::Result<Vec<PathBuf>> {
    if let Some(parent) = out_dir.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create parent of {}", out_dir.display())
        })?;
    }
    // fails if something else created the directory in the meantime
    std::fs::create_dir(out_dir).with_context(|| {
        format!("failed to create output dir {}", out_dir.display())
    })?;

    let pad_width = pad_width(frames.len());
    let mut written = Vec::with_capacity(frames.len());
    for (idx, frame) in frames.into_iter().enumerate() {
        let path = out_dir.join(frame_file_name(idx, pad_width));
        let (width, height) = (frame.width(), frame.height());
        let img = GrayImage::from_raw(width, height, frame.into_pixels())
            .with_context(|| {
                format!("frame {idx} does not fit a {width}x{height} image")
            })?;
        img.save_with_format(&path, ImageFormat::Png)
            .with_context(|| {
                format!("failed to write image {}", path.display())
            })?;
        debug!("wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{args::BackendFormat, frame, test_dir};

    #[test]
    fn padding() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(1000), 4);
        assert_eq!(pad_width(3), 8);
        assert_eq!(pad_width(99_999_999), 8);
        assert_eq!(pad_width(100_000_000), 9);
        assert_eq!(pad_width(1_234_567_890), 10);
    }

    #[test]
    fn names() {
        assert_eq!(frame_file_name(0, 8), "fluid_00000000.png");
        assert_eq!(frame_file_name(42, 8), "fluid_00000042.png");
        assert_eq!(frame_file_name(7, 9), "fluid_000000007.png");
    }

    #[test]
    fn writes_greyscale_png() {
        let dir = test_dir("writes_greyscale_png");
        let frames =
            frame::parse(BackendFormat::C, "2\n0 64 128 255\n1 2 3 4").unwrap();

        let written = write_frames(&dir, frames).unwrap();
        assert_eq!(
            written,
            vec![dir.join("fluid_00000000.png"), dir.join("fluid_00000001.png")]
        );

        let img = image::open(&written[0]).unwrap();
        assert_eq!(img.color(), image::ColorType::L8);
        let img = img.into_luma8();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.into_raw(), vec![0, 64, 128, 255]);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn refuses_existing_dir() {
        let dir = test_dir("refuses_existing_dir");
        std::fs::create_dir_all(&dir).unwrap();
        let frames = frame::parse(BackendFormat::C, "1\n7").unwrap();

        let err = write_frames(&dir, frames).unwrap_err();
        assert_eq!(
            err.downcast_ref::<std::io::Error>().map(|err| err.kind()),
            Some(std::io::ErrorKind::AlreadyExists)
        );
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn creates_missing_parents() {
        let root = test_dir("creates_missing_parents");
        let dir = root.join("nested").join("out");
        let frames = frame::parse(BackendFormat::C, "1\n7").unwrap();

        let written = write_frames(&dir, frames).unwrap();
        assert_eq!(written, vec![dir.join("fluid_00000000.png")]);

        std::fs::remove_dir_all(root).unwrap();
    }
}
