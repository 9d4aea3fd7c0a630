use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{self, Stdout, Write};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use bruin_chase::body::forward_for;
use bruin_chase::geometry::cell_of;
use bruin_chase::layout::{layout_by_name, DEFAULT_LAYOUT};
use bruin_chase::{
    Appearance, DrawPose, GameConfig, GameError, GridBounds, Input, Outcome, Presentation, Session,
    SoundCue,
};

const CELL_W: usize = 2;
const DEFAULT_RENDER_FPS: u64 = 60;
const INPUT_HOLD_MS: u64 = 160;
const LOG_FILE: &str = "bruin.log";

#[derive(Clone, Copy, PartialEq)]
enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    fn from_yaw(yaw: f32) -> Self {
        let f = forward_for(yaw);
        if f.x.abs() > f.y.abs() {
            if f.x > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if f.y > 0.0 {
            Facing::Up
        } else {
            Facing::Down
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player(Facing),
    Fading,
    Chaser,
    Wall,
    Empty,
    Pickup,
}

impl Glyph {
    fn text(self) -> &'static str {
        match self {
            Glyph::Player(Facing::Up) => "▲",
            Glyph::Player(Facing::Down) => "▼",
            Glyph::Player(Facing::Left) => "◀",
            Glyph::Player(Facing::Right) => "▶",
            Glyph::Fading => "💀",
            Glyph::Chaser => "👹",
            Glyph::Wall => "██",
            Glyph::Empty => "  ",
            Glyph::Pickup => "·",
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

const EMPTY: Cell = Cell {
    glyph: Glyph::Empty,
    color: Color::Reset,
};

/// Top-down terminal view. Draw calls fill `frame`; `flush` writes only the
/// cells that changed since the previous flush.
struct TerminalPresenter {
    bounds: GridBounds,
    frame: Vec<Cell>,
    last: Vec<Cell>,
    last_hud: String,
    banner: Option<bool>,
    music: Option<SoundCue>,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl TerminalPresenter {
    fn new() -> Self {
        Self {
            bounds: GridBounds {
                min_x: 0,
                min_y: 0,
                width: 0,
                height: 0,
            },
            frame: Vec::new(),
            last: Vec::new(),
            last_hud: String::new(),
            banner: None,
            music: None,
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }

    fn index(&self, pose: &DrawPose) -> Option<usize> {
        let (x, y) = cell_of(pose.position);
        if !self.bounds.contains(x, y) {
            return None;
        }
        let col = (x - self.bounds.min_x) as usize;
        let row = (self.bounds.max_y() - y) as usize;
        Some(row * self.bounds.width + col)
    }

    fn flush(&mut self, stdout: &mut Stdout, hud: &str) -> io::Result<()> {
        let width = self.bounds.width;
        let height = self.bounds.height;
        let needed_h = (height + 3) as u16;
        let needed_w = (width * CELL_W) as u16;

        stdout.queue(MoveTo(0, 0))?;

        let (term_w, term_h) = terminal::size()?;
        if term_w < needed_w || term_h < needed_h {
            stdout.queue(Clear(ClearType::All))?;
            let msg = format!(
                "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
                needed_w, needed_h, term_w, term_h
            );
            stdout.queue(Print(msg))?;
            stdout.flush()?;
            self.needs_full = true;
            return Ok(());
        }

        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + 1;
        if origin_x != self.origin_x || origin_y != self.origin_y {
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
        }
        if self.needs_full {
            stdout.queue(Clear(ClearType::All))?;
        }

        if self.needs_full || hud != self.last_hud {
            stdout.queue(MoveTo(self.origin_x, self.origin_y - 1))?;
            stdout.queue(SetForegroundColor(Color::White))?;
            stdout.queue(Clear(ClearType::CurrentLine))?;
            stdout.queue(Print(hud))?;
            stdout.queue(ResetColor)?;
            self.last_hud = hud.to_string();
        }

        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let cell = self.frame[idx];
                if self.needs_full || cell != self.last[idx] {
                    self.last[idx] = cell;
                    draw_cell(stdout, (self.origin_x, self.origin_y), x, y, cell)?;
                }
            }
        }

        if let Some(won) = self.banner {
            let (text, color) = if won {
                ("YOU WIN! (press q to quit)", Color::Green)
            } else {
                ("GAME OVER (press q to quit)", Color::Red)
            };
            stdout.queue(MoveTo(self.origin_x, self.origin_y + height as u16))?;
            stdout.queue(SetForegroundColor(color))?;
            stdout.queue(Print(text))?;
            stdout.queue(ResetColor)?;
        }
        self.needs_full = false;

        stdout.flush()?;
        Ok(())
    }
}

impl Presentation for TerminalPresenter {
    fn begin_frame(&mut self, bounds: GridBounds) {
        if bounds != self.bounds {
            self.bounds = bounds;
            self.last = vec![EMPTY; bounds.width * bounds.height];
            self.needs_full = true;
        }
        self.frame.clear();
        self.frame.resize(bounds.width * bounds.height, EMPTY);
    }

    fn draw(&mut self, pose: &DrawPose, appearance: Appearance) {
        let cell = match appearance {
            Appearance::Wall => Cell {
                glyph: Glyph::Wall,
                color: Color::Blue,
            },
            Appearance::Pickup => Cell {
                glyph: Glyph::Pickup,
                color: Color::Yellow,
            },
            Appearance::Chaser { .. } => Cell {
                glyph: Glyph::Chaser,
                color: Color::Red,
            },
            Appearance::Player { opacity } if opacity < 1.0 => Cell {
                glyph: Glyph::Fading,
                color: Color::DarkGrey,
            },
            Appearance::Player { .. } => Cell {
                glyph: Glyph::Player(Facing::from_yaw(pose.yaw)),
                color: Color::Cyan,
            },
            Appearance::Banner { won } => {
                self.banner = Some(won);
                return;
            }
        };
        if let Some(idx) = self.index(pose) {
            self.frame[idx] = cell;
        }
    }

    fn play_sound(&mut self, cue: SoundCue) {
        self.music = Some(cue);
    }

    fn stop_sound(&mut self, cue: SoundCue) {
        if self.music == Some(cue) {
            self.music = None;
        }
    }
}

/// Writes one grid cell, padded to `CELL_W` columns so narrow glyphs do not
/// leave stale characters behind.
fn draw_cell(stdout: &mut Stdout, origin: (u16, u16), x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let text = cell.glyph.text();
    let pad = CELL_W.saturating_sub(text.width());
    stdout
        .queue(MoveTo(origin.0 + (x * CELL_W) as u16, origin.1 + y as u16))?
        .queue(SetForegroundColor(cell.color))?
        .queue(Print(format!("{text}{:pad$}", "")))?
        .queue(ResetColor)?;
    Ok(())
}

struct Settings {
    render_fps: u64,
    layout: &'static [&'static str],
    seed: Option<u64>,
}

fn read_settings() -> Settings {
    let render_fps = std::env::var("BRUIN_FPS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RENDER_FPS);
    let layout = std::env::var("BRUIN_LAYOUT")
        .ok()
        .and_then(|v| layout_by_name(&v))
        .unwrap_or(DEFAULT_LAYOUT);
    let seed = std::env::var("BRUIN_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok());
    Settings {
        render_fps,
        layout,
        seed,
    }
}

/// Logs go to a file because the terminal is in raw mode. Off unless
/// `BRUIN_LOG` holds a filter such as `debug` or `bruin_chase=trace`.
fn init_logging() -> io::Result<()> {
    let Ok(filter) = EnvFilter::try_from_env("BRUIN_LOG") else {
        return Ok(());
    };
    let file = File::create(LOG_FILE)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Raw mode and the alternate screen for as long as it lives. Restores the
/// terminal on drop, including when `run` bails out early.
struct RawTerminal {
    stdout: Stdout,
}

impl RawTerminal {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?.execute(Hide)?;
        Ok(Self { stdout })
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = self.stdout.execute(Show);
        let _ = self.stdout.execute(LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn main() -> Result<(), GameError> {
    init_logging()?;
    let settings = read_settings();
    let config = GameConfig::from_env();
    let mut session = Session::new(settings.layout, config, TerminalPresenter::new())?;

    let mut term = RawTerminal::enter()?;
    run(&mut term.stdout, &mut session, &settings)
}

fn run(
    stdout: &mut Stdout,
    session: &mut Session<TerminalPresenter>,
    settings: &Settings,
) -> Result<(), GameError> {
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    // forward, backward, turn left, turn right
    let mut last_seen: [Option<Instant>; 4] = [None; 4];
    let frame_time = Duration::from_micros(1_000_000 / settings.render_fps.max(1));
    let mut previous = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char('w') | KeyCode::Up => last_seen[0] = Some(Instant::now()),
                        KeyCode::Char('s') | KeyCode::Down => last_seen[1] = Some(Instant::now()),
                        KeyCode::Char('a') | KeyCode::Left => last_seen[2] = Some(Instant::now()),
                        KeyCode::Char('d') | KeyCode::Right => last_seen[3] = Some(Instant::now()),
                        _ => {}
                    },
                    _ => {}
                }
            }
        }

        let elapsed = previous.elapsed().as_secs_f32();
        previous = Instant::now();
        let input = held_input(&last_seen);
        session.step(elapsed, input, &mut rng)?;
        session.draw();

        let hud = hud_line(session);
        session.presenter_mut().flush(stdout, &hud)?;

        let spent = frame_start.elapsed();
        if spent < frame_time {
            thread::sleep(frame_time - spent);
        }
    }
}

fn hud_line(session: &Session<TerminalPresenter>) -> String {
    let maze = session.maze();
    let status = match session.outcome() {
        Outcome::Ongoing => "",
        Outcome::Won => "  YOU WIN",
        Outcome::Lost => "  CAUGHT",
    };
    let music = match session.presenter().music {
        Some(SoundCue::Background) => "♪ theme",
        Some(SoundCue::Death) => "♪ dirge",
        None => "-",
    };
    format!(
        "Pickups: {}/{}  Time: {:.1}s  Music: {}{}  (w/s move, a/d turn, q quit)",
        maze.num_pickups_remaining(),
        maze.total_pickups(),
        session.clock(),
        music,
        status
    )
}

/// Terminals report presses and repeats but no releases, so a key counts as
/// held for a short while after it was last seen. Of two opposing keys the
/// more recent one wins.
fn held_input(last_seen: &[Option<Instant>; 4]) -> Input {
    let now = Instant::now();
    let hold = Duration::from_millis(INPUT_HOLD_MS);
    let fresh = |idx: usize| last_seen[idx].filter(|t| now.duration_since(*t) <= hold);
    let pick = |a: usize, b: usize| match (fresh(a), fresh(b)) {
        (Some(ta), Some(tb)) => (ta >= tb, tb > ta),
        (Some(_), None) => (true, false),
        (None, Some(_)) => (false, true),
        (None, None) => (false, false),
    };
    let (forward, backward) = pick(0, 1);
    let (turn_left, turn_right) = pick(2, 3);
    Input {
        forward,
        backward,
        turn_left,
        turn_right,
    }
}
