use super::OutputSink;
use anyhow::{Context, Result};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each frame as a numbered PNG into a directory
pub struct PngSequenceOutput {
    dir: PathBuf,
    width: u32,
    height: u32,
    written: u64,
}

impl PngSequenceOutput {
    pub fn new<P: AsRef<Path>>(dir: P, width: u32, height: u32) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        tracing::info!("Writing PNG frames to {}", dir.display());

        Ok(Self {
            dir,
            width,
            height,
            written: 0,
        })
    }

    /// Number of frames written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", index))
    }
}

impl OutputSink for PngSequenceOutput {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let path = self.frame_path(self.written);
        frame
            .save(&path)
            .with_context(|| format!("Failed to write frame to {}", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn frames_are_numbered_sequentially() {
        let dir = std::env::temp_dir().join(format!("camola-png-{}", std::process::id()));
        let mut sink = PngSequenceOutput::new(&dir, 4, 4).unwrap();

        let frame = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        sink.write_frame(&frame).unwrap();
        sink.write_frame(&frame).unwrap();

        assert_eq!(sink.written(), 2);
        let first = image::open(dir.join("frame_000000.png")).unwrap().to_rgb8();
        assert_eq!(first.get_pixel(1, 1), &Rgb([10, 20, 30]));
        assert!(dir.join("frame_000001.png").exists());

        fs::remove_dir_all(&dir).ok();
    }
}
