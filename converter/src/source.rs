use std::path::Path;

use anyhow::Context;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;

/// One RGB24 frame pulled from ffmpeg.
pub struct RgbFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Iterates the decoded frames of any video ffmpeg can read.
pub struct SourceVideo {
    width: u32,
    height: u32,
    events: Box<dyn Iterator<Item = FfmpegEvent>>,
}

impl SourceVideo {
    pub fn open(input: &Path) -> anyhow::Result<Self> {
        let input = input.to_str().context("input path is not valid UTF-8")?;
        let mut child = FfmpegCommand::new()
            .input(input)
            .rawvideo()
            .spawn()
            .context("failed to spawn ffmpeg — is it installed?")?;
        let mut events = child.iter().context("failed to iterate ffmpeg events")?;

        // Read up to the first frame to learn the dimensions, then replay what we consumed.
        let mut consumed: Vec<FfmpegEvent> = Vec::new();
        let mut size = None;
        for event in &mut events {
            if let FfmpegEvent::OutputFrame(frame) = &event {
                size = Some((frame.width, frame.height));
                consumed.push(event);
                break;
            }
            if let FfmpegEvent::Error(msg) = &event {
                log::warn!("ffmpeg: {msg}");
            }
            consumed.push(event);
        }

        let (width, height) = size
            .filter(|&(w, h)| w > 0 && h > 0)
            .context("could not determine video dimensions")?;

        Ok(Self {
            width,
            height,
            events: Box::new(consumed.into_iter().chain(events)),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Iterator for SourceVideo {
    type Item = RgbFrame;

    fn next(&mut self) -> Option<Self::Item> {
        self.events.find_map(|event| match event {
            FfmpegEvent::OutputFrame(frame) => Some(RgbFrame {
                data: frame.data,
                width: frame.width,
                height: frame.height,
            }),
            _ => None,
        })
    }
}
