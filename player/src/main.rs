mod render;

use std::cell::Cell;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent};
use crossterm::terminal;

use cutscene_core::render::DisplayConfig;
use cutscene_core::resource::{parse_resource_hash, DirectoryResources};
use cutscene_core::{PlaybackListener, PlayerConfig, PlayerId, VideoPlayer, END_OF_PLAYBACK};

use crate::render::TerminalScreen;

/// Fallback tick rate when the container does not say.
const DEFAULT_FPS: f64 = 15.0;

#[derive(Parser)]
#[command(name = "cutscene-play", about = "Play .csf cutscenes in the terminal")]
struct Cli {
    /// Path to a .csf file named after its resource hash, e.g. 0A1B2C3D.csf
    input: PathBuf,

    /// Loop the cutscene until a key is pressed
    #[arg(long = "loop")]
    looping: bool,

    /// Present frames at 2x
    #[arg(long)]
    double: bool,

    /// Draw position as X,Y (default: centered)
    #[arg(long)]
    pos: Option<Pair>,

    /// Screen size in pixels as WxH
    #[arg(long, default_value = "160x96")]
    screen: Pair,
}

/// Two integers separated by `,` or `x`.
#[derive(Clone, Copy, Debug)]
struct Pair(i16, i16);

impl FromStr for Pair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once([',', 'x'])
            .ok_or_else(|| format!("expected two numbers, got {s:?}"))?;
        let a = a.trim().parse().map_err(|e| format!("{a:?}: {e}"))?;
        let b = b.trim().parse().map_err(|e| format!("{b:?}: {e}"))?;
        Ok(Pair(a, b))
    }
}

/// Records the end-of-playback message for the tick loop.
struct EndFlag {
    player: Rc<Cell<Option<PlayerId>>>,
    finished: Rc<Cell<bool>>,
}

impl PlaybackListener for EndFlag {
    fn send_message(&mut self, message: u32, _param: u32, sender: PlayerId) {
        if message == END_OF_PLAYBACK && self.player.get() == Some(sender) {
            log::info!("player {} finished", sender.get());
            self.finished.set(true);
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let stem = cli
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .context("invalid input path")?;
    let file_hash = parse_resource_hash(stem)
        .with_context(|| format!("{stem:?} is not an 8-digit hex resource hash"))?;
    let root = cli
        .input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let Pair(screen_w, screen_h) = cli.screen;
    anyhow::ensure!(screen_w > 0 && screen_h > 0, "screen size must be positive");
    let config = PlayerConfig {
        double_surface: cli.double,
        display: DisplayConfig::for_screen(screen_w, screen_h),
    };

    let sender = Rc::new(Cell::new(None));
    let finished = Rc::new(Cell::new(false));
    let listener = EndFlag {
        player: Rc::clone(&sender),
        finished: Rc::clone(&finished),
    };
    let resources = Rc::new(DirectoryResources::new(root));
    let mut player = VideoPlayer::new(resources, config, Some(Box::new(listener)));
    sender.set(Some(player.id()));

    if let Some(Pair(x, y)) = cli.pos {
        player.set_draw_position(x, y);
    }
    player
        .open(file_hash, cli.looping)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;

    let fps = match player.frame_rate() {
        f if f > 0.0 => f,
        _ => DEFAULT_FPS,
    };

    // Check terminal size
    let (term_cols, term_rows) = terminal::size()?;
    let needed_rows = (screen_h as u16).div_ceil(2);
    if term_cols < screen_w as u16 || term_rows < needed_rows {
        eprintln!(
            "Warning: terminal is {}x{} but the screen needs {}x{}. Resize your terminal for best results.",
            term_cols, term_rows, screen_w, needed_rows
        );
    }

    // Set up panic hook for terminal cleanup
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        cleanup_terminal();
        original_hook(info);
    }));

    // Enter alternate screen, raw mode, hide cursor
    terminal::enable_raw_mode()?;
    let stdout = std::io::stdout();
    let mut stdout = BufWriter::with_capacity(256 * 1024, stdout.lock());
    stdout.write_all(b"\x1b[?1049h")?; // enter alternate screen
    stdout.write_all(b"\x1b[?25l")?; // hide cursor
    stdout.write_all(b"\x1b[48;2;0;0;0m\x1b[2J")?;
    stdout.flush()?;

    let mut screen = TerminalScreen::new(screen_w as u16, screen_h as u16);
    let result = run_playback_loop(
        &mut player,
        &mut screen,
        &mut stdout,
        Duration::from_secs_f64(1.0 / fps),
        &finished,
    );

    player.close();

    // Cleanup
    stdout.write_all(b"\x1b[0m")?; // reset colors
    stdout.write_all(b"\x1b[?25h")?; // show cursor
    stdout.write_all(b"\x1b[?1049l")?; // leave alternate screen
    stdout.flush()?;
    terminal::disable_raw_mode()?;

    result
}

fn run_playback_loop(
    player: &mut VideoPlayer,
    screen: &mut TerminalScreen,
    stdout: &mut impl Write,
    frame_duration: Duration,
    finished: &Cell<bool>,
) -> anyhow::Result<()> {
    let mut render_buf = Vec::with_capacity(256 * 1024);
    let playback_start = Instant::now();
    let mut tick = 0u32;

    while !finished.get() {
        // Check for input (non-blocking)
        if event::poll(Duration::ZERO)? {
            if let Event::Key(KeyEvent { code, .. }) = event::read()? {
                match code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    _ => {}
                }
            }
        }

        player.update(screen)?;

        if player.take_redraw() {
            screen.clear();
            player.draw(screen);
            screen.present(&mut render_buf);
            stdout.write_all(&render_buf)?;
            stdout.flush()?;
        }

        // Sleep until next tick
        tick += 1;
        let next_tick = frame_duration * tick;
        if let Some(sleep_time) = next_tick.checked_sub(playback_start.elapsed()) {
            std::thread::sleep(sleep_time);
        }
    }

    Ok(())
}

fn cleanup_terminal() {
    let _ = std::io::stdout().write_all(b"\x1b[0m\x1b[?25h\x1b[?1049l");
    let _ = std::io::stdout().flush();
    let _ = terminal::disable_raw_mode();
}
