mod delta;
mod quantize;
mod resize;
mod source;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cutscene_core::encode::CutsceneWriter;
use cutscene_core::resource::{parse_resource_hash, resource_file_name};

use crate::delta::{compute_delta, FrameDiff};
use crate::quantize::{quantize_rgb332, rgb332_palette};
use crate::resize::FrameResizer;
use crate::source::SourceVideo;

#[derive(Parser)]
#[command(name = "cutscene-convert", about = "Convert a video file to a .csf cutscene")]
struct Cli {
    /// Input video file path
    input: PathBuf,

    /// Resource hash to store the cutscene under, as 8 hex digits
    #[arg(long, value_parser = parse_hash)]
    hash: u32,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Cutscene width in pixels
    #[arg(long, default_value = "120")]
    width: u16,

    /// Cutscene height in pixels
    #[arg(long, default_value = "72")]
    height: u16,

    /// Frames per second
    #[arg(long, default_value = "15")]
    fps: u16,

    /// Keyframe interval (frames between full keyframes)
    #[arg(long, default_value = "30")]
    keyframe_interval: u16,
}

fn parse_hash(s: &str) -> Result<u32, String> {
    parse_resource_hash(s).ok_or_else(|| format!("{s:?} is not 8 hex digits"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    anyhow::ensure!(cli.width > 0 && cli.height > 0, "cutscene size must be positive");
    anyhow::ensure!(cli.fps > 0, "fps must be positive");

    let output_path = cli.output.join(resource_file_name(cli.hash));

    eprintln!("Decoding video: {}", cli.input.display());
    let source = SourceVideo::open(&cli.input)?;
    eprintln!("Source: {}x{} pixels", source.width(), source.height());
    eprintln!("Target: {}x{} pixels, 3-3-2 palette", cli.width, cli.height);

    let mut resizer = FrameResizer::new(cli.width, cli.height);

    let file = File::create(&output_path)
        .with_context(|| format!("failed to create {}", output_path.display()))?;
    let mut writer = CutsceneWriter::new(BufWriter::new(file), cli.width, cli.height, cli.fps, cli.keyframe_interval)?;

    let palette = rgb332_palette();
    let keyframe_interval = cli.keyframe_interval.max(1) as u32;
    let mut prev: Vec<u8> = Vec::new();
    let mut frame_num = 0u32;

    for frame in source {
        let resized = resizer.resize(&frame.data, frame.width, frame.height)?;
        let indices = quantize_rgb332(&resized);

        // The palette never changes, so only the first frame carries it.
        let pal = (frame_num == 0).then_some(&palette);
        let force_keyframe = frame_num % keyframe_interval == 0;
        match compute_delta(&prev, &indices, cli.width, force_keyframe) {
            FrameDiff::Keyframe(ref kf) => writer.write_keyframe(kf, pal)?,
            FrameDiff::Delta(ref d) => writer.write_delta(d, pal)?,
        }

        prev = indices;
        frame_num += 1;

        if frame_num % 100 == 0 {
            eprint!("\rProcessed {frame_num} frames...");
        }
    }

    eprintln!("\rProcessed {frame_num} frames total.");
    log::debug!("{} frames in index", writer.frames_written());

    writer.finish()?;
    eprintln!("Wrote {}", output_path.display());

    Ok(())
}
