use super::types::{FramePayload, Landmark};
use super::LandmarkSource;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// One line of a recording.
#[derive(Debug, Deserialize)]
struct RecordedFrame {
    present: bool,
    #[serde(default)]
    frame_width: u32,
    #[serde(default)]
    frame_height: u32,
    #[serde(default)]
    landmarks: Vec<[f32; 3]>,
}

/// Replays detector output recorded as JSON lines
///
/// Each line is either `{"present":false}` or
/// `{"present":true,"frame_width":W,"frame_height":H,"landmarks":[[x,y,z],...]}`.
pub struct ReplaySource {
    lines: Lines<BufReader<File>>,
    line_number: usize,
    width: u32,
    height: u32,
}

impl ReplaySource {
    pub fn open<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Opening landmark recording at {}", path.display());

        let file = File::open(path)
            .with_context(|| format!("Failed to open recording at {}", path.display()))?;

        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_number: 0,
            width,
            height,
        })
    }

    fn parse_line(&mut self, line: &str) -> Result<FramePayload> {
        let frame: RecordedFrame = serde_json::from_str(line)
            .with_context(|| format!("Malformed recording line {}", self.line_number))?;

        if !frame.present {
            return Ok(FramePayload::Absent);
        }

        // Recordings made at a fixed resolution may omit the size per line
        if frame.frame_width > 0 && frame.frame_height > 0 {
            self.width = frame.frame_width;
            self.height = frame.frame_height;
        }

        Ok(FramePayload::Present {
            landmarks: frame
                .landmarks
                .into_iter()
                .map(|[x, y, z]| Landmark::new(x, y, z))
                .collect(),
            frame_width: self.width,
            frame_height: self.height,
        })
    }
}

impl LandmarkSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<FramePayload>> {
        loop {
            let Some(line) = self.lines.next() else {
                tracing::info!("Recording finished after {} lines", self.line_number);
                return Ok(None);
            };
            self.line_number += 1;

            let line = line.context("Failed to read recording")?;
            if line.trim().is_empty() {
                continue;
            }

            return self.parse_line(&line).map(Some);
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_recording(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "camola-avatar-{}-{}.jsonl",
            name,
            std::process::id()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn replays_present_and_absent_lines() {
        let path = write_recording(
            "replay",
            "{\"present\":false}\n\n{\"present\":true,\"frame_width\":320,\"frame_height\":240,\"landmarks\":[[0.5,0.25,-0.1]]}\n",
        );
        let mut source = ReplaySource::open(&path, 640, 480).unwrap();

        assert_eq!(source.next_frame().unwrap(), Some(FramePayload::Absent));
        match source.next_frame().unwrap() {
            Some(FramePayload::Present {
                landmarks,
                frame_width,
                frame_height,
            }) => {
                assert_eq!(landmarks, vec![Landmark::new(0.5, 0.25, -0.1)]);
                assert_eq!((frame_width, frame_height), (320, 240));
            }
            other => panic!("unexpected frame: {:?}", other),
        }
        assert_eq!(source.resolution(), (320, 240));
        assert_eq!(source.next_frame().unwrap(), None);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let path = write_recording("malformed", "{\"present\":false}\nnot json\n");
        let mut source = ReplaySource::open(&path, 640, 480).unwrap();

        source.next_frame().unwrap();
        let err = source.next_frame().unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));

        std::fs::remove_file(path).ok();
    }
}
