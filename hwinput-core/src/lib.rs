//! `hwinput_core` -- synthetic keyboard and mouse injection for Windows.
//!
//! Turns logical requests ("press Ctrl+Shift+Home", "click here", "type
//! this") into ordered hardware-level input records and submits them to the
//! OS input queue, stopping at the first rejected record.  It can be
//! consumed by:
//! - `hwinput-ffi` (C ABI DLL for ctypes / other languages)
//! - `hwinput-cli` (standalone CLI and JSON-RPC worker)
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`errors`] | `InjectionError` enum via `thiserror` |
//! | [`keys`] | Key-name table, chord and key-sequence parsing |
//! | [`geometry`] | Pixel -> absolute (0..65535) coordinate normalisation |
//! | [`record`] | Platform-neutral `INPUT` records and their encoder |
//! | [`config`] | Pacing delays, loadable via `serde` |
//! | [`gate`] | Checked submission and key-state queries |
//! | [`sequencer`] | Chords, strings, clicks, scrolls and drags |
//! | [`platform`] | `InputPlatform` trait with Win32 and fake backends |
//! | [`element`] | Clickable points of UI Automation elements |
//! | [`com`] | Per-thread COM apartment and UI Automation client (Windows) |

#[cfg(windows)]
pub mod com;
pub mod config;
pub mod element;
pub mod errors;
pub mod gate;
pub mod geometry;
pub mod keys;
pub mod platform;
pub mod record;
pub mod sequencer;

pub use config::Pacing;
pub use errors::InjectionError;
pub use geometry::{ScreenPoint, VirtualDesktop};
pub use platform::{InputPlatform, NativePlatform};
pub use record::{MouseButton, WheelDirection};
pub use sequencer::Sequencer;

/// A sequencer over the host backend.
pub fn native_sequencer(pacing: Pacing) -> Sequencer<NativePlatform> {
    Sequencer::with_pacing(platform::native(), pacing)
}
