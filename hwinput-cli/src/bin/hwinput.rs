//! Standalone CLI tool for sending input events.

use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use hwinput_core::config::{DEFAULT_DRAG_STEP_MS, DEFAULT_KEY_DELAY_MS, DEFAULT_WHEEL_SETTLE_MS};
use hwinput_core::{
    InjectionError, InputPlatform, MouseButton, Pacing, ScreenPoint, Sequencer, WheelDirection,
};

#[derive(Parser)]
#[command(name = "hwinput", about = "Send keyboard/mouse input via Win32 SendInput")]
struct Args {
    /// Log each request and record to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    pacing: PacingArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs)]
struct PacingArgs {
    /// Delay after every chord press and release
    #[arg(long, global = true, default_value_t = DEFAULT_KEY_DELAY_MS)]
    key_delay_ms: u64,
    /// Pause after every wheel event
    #[arg(long, global = true, default_value_t = DEFAULT_WHEEL_SETTLE_MS)]
    wheel_settle_ms: u64,
    /// Pause after every intermediate drag move
    #[arg(long, global = true, default_value_t = DEFAULT_DRAG_STEP_MS)]
    drag_step_ms: u64,
}

impl From<&PacingArgs> for Pacing {
    fn from(args: &PacingArgs) -> Self {
        Pacing {
            key_delay_ms: args.key_delay_ms,
            wheel_settle_ms: args.wheel_settle_ms,
            drag_step_ms: args.drag_step_ms,
        }
    }
}

// Coordinates are virtual-desktop pixels; negative on monitors left of or
// above the primary.
#[derive(Subcommand)]
enum Command {
    /// Press and release a key combination, e.g. "Ctrl+Shift+Esc"
    Chord {
        /// `+`-separated key names
        chord: String,
    },
    /// Send a key sequence, e.g. "^a{DEL}" or "+{TAB 2}"
    Keys {
        /// `+`/`^`/`%` hold Shift/Ctrl/Alt for the next key; `{NAME n}`
        /// taps a named key n times
        keys: String,
    },
    /// Type Unicode text
    Type {
        /// The text to type
        text: String,
        /// Pause every N characters (0 = never)
        #[arg(long, default_value_t = 0)]
        every: usize,
        /// Length of each pause
        #[arg(long, default_value_t = 10)]
        pause_ms: u64,
    },
    /// Click at screen coordinates
    #[command(allow_negative_numbers = true)]
    Click {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
        /// Physical button: left, right, middle, x1, x2 (default: primary)
        #[arg(short, long)]
        button: Option<MouseButton>,
        /// Click twice
        #[arg(short, long)]
        double: bool,
    },
    /// Move cursor to coordinates
    #[command(allow_negative_numbers = true)]
    Move {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },
    /// Turn the mouse wheel at coordinates
    #[command(allow_negative_numbers = true)]
    Scroll {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
        #[arg(value_enum)]
        direction: ScrollDirection,
        /// Wheel notches
        #[arg(short, long, default_value_t = 1)]
        notches: u32,
    },
    /// Drag with the primary button
    #[command(allow_negative_numbers = true)]
    Drag {
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    },
    /// Click the clickable point of a window's UI Automation element
    #[cfg(windows)]
    ClickWindow {
        /// Window handle (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_handle)]
        hwnd: isize,
    },
    /// Report whether a key is currently held down
    KeyState {
        /// Key name, e.g. "shift" or "capslock"
        key: String,
    },
    /// Release any modifier or lock key the OS reports as held
    ReleaseModifiers,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[cfg(windows)]
fn parse_handle(s: &str) -> Result<isize, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        isize::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<isize>().map_err(|e| e.to_string())
    }
}

fn run<P: InputPlatform>(seq: &Sequencer<P>, command: Command) -> Result<(), InjectionError> {
    match command {
        Command::Chord { chord } => {
            seq.send_chord(&chord)?;
            println!("Sent chord {chord}");
        }
        Command::Keys { keys } => {
            let count = seq.send_keys(&keys)?;
            println!("Sent {count} key event(s)");
        }
        Command::Type {
            text,
            every,
            pause_ms,
        } => {
            if every == 0 {
                seq.type_string(&text)?;
            } else {
                seq.type_string_paced(&text, every, std::time::Duration::from_millis(pause_ms))?;
            }
            println!("Typed {} chars", text.chars().count());
        }
        Command::Click {
            x,
            y,
            button,
            double,
        } => {
            let point = ScreenPoint::new(x, y);
            match (button, double) {
                (Some(button), _) => seq.click_button(point, button)?,
                (None, true) => seq.double_click(point)?,
                (None, false) => seq.click(point)?,
            }
            println!("Clicked at {x},{y}");
        }
        Command::Move { x, y } => {
            seq.move_to(ScreenPoint::new(x, y))?;
            println!("Moved cursor to {x},{y}");
        }
        Command::Scroll {
            x,
            y,
            direction,
            notches,
        } => {
            let point = ScreenPoint::new(x, y);
            let horizontal = i32::try_from(notches).unwrap_or(i32::MAX);
            match direction {
                ScrollDirection::Up => seq.scroll(point, WheelDirection::Forward, notches)?,
                ScrollDirection::Down => seq.scroll(point, WheelDirection::Backward, notches)?,
                ScrollDirection::Left => seq.scroll_horizontal(point, -horizontal)?,
                ScrollDirection::Right => seq.scroll_horizontal(point, horizontal)?,
            }
            println!("Scrolled {notches} notch(es) at {x},{y}");
        }
        Command::Drag {
            from_x,
            from_y,
            to_x,
            to_y,
        } => {
            let steps = seq.drag(
                ScreenPoint::new(from_x, from_y),
                ScreenPoint::new(to_x, to_y),
            )?;
            println!("Dragged {from_x},{from_y} -> {to_x},{to_y} ({steps} steps)");
        }
        #[cfg(windows)]
        Command::ClickWindow { hwnd } => {
            let element = hwinput_core::element::UiaElement::from_window(hwnd)?;
            seq.click_element(&element)?;
            println!("Clicked {:?} (0x{hwnd:X})", element.name());
        }
        Command::KeyState { key } => {
            let state = if seq.is_key_down(&key)? { "down" } else { "up" };
            println!("{key}: {state}");
        }
        Command::ReleaseModifiers => {
            let count = seq.release_held_modifiers()?;
            println!("Released {count} key(s)");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let seq = hwinput_core::native_sequencer(Pacing::from(&args.pacing));
    match run(&seq, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
