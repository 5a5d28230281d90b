//! Rendering and replay of environment state.
//!
//! Three mutually exclusive modes:
//! - `human` — push every update to a visualization backend, pacing with a
//!   sleep between frames so the run is watchable;
//! - `replay` — the same live path, driven from a saved history instead of a
//!   running episode;
//! - `save` — accumulate frames in memory and flush them to a file on close.
//!
//! The renderer has a two-state lifecycle: it does not exist until the first
//! render call, and from then on the chosen mode is fixed.

pub mod history;
pub mod literal;
pub mod summary;
pub mod vis;

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use history::{HistoryFrame, RenderHistory};
use vis::VisBackend;

/// Timestamp format used in history files and pushed frames.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rendering mode, fixed by the first render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Live view while the agent interacts with the environment.
    Human,
    /// Live view driven from a previously saved history.
    Replay,
    /// Accumulate the history in memory; flush to disk on close.
    Save,
}

impl RenderMode {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Human => "human",
            RenderMode::Replay => "replay",
            RenderMode::Save => "save",
        }
    }

    /// Whether this mode pushes to a live visualization backend.
    pub fn is_live(self) -> bool {
        matches!(self, RenderMode::Human | RenderMode::Replay)
    }
}

impl FromStr for RenderMode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(RenderMode::Human),
            "replay" => Ok(RenderMode::Replay),
            "save" => Ok(RenderMode::Save),
            other => Err(RenderError::UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rendering and history-persistence failures.
#[derive(Debug)]
pub enum RenderError {
    /// The requested rendering mode is not one of human/replay/save.
    UnsupportedMode(String),
    /// Close was called in save mode without a destination path.
    MissingPath,
    /// An operation that needs a running renderer or backend found none.
    NotInitialized,
    /// File or network I/O failed.
    Io(io::Error),
    /// A history file row could not be parsed.
    Parse {
        /// 1-based line number in the file.
        line: u64,
        /// What went wrong on that line.
        message: String,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UnsupportedMode(mode) => {
                write!(f, "unsupported rendering mode \"{mode}\" (expected human, replay, or save)")
            }
            RenderError::MissingPath => {
                write!(f, "no path specified to save the history")
            }
            RenderError::NotInitialized => write!(f, "renderer is not initialized"),
            RenderError::Io(e) => write!(f, "render I/O error: {e}"),
            RenderError::Parse { line, message } => {
                write!(f, "history parse error at line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        RenderError::Io(e)
    }
}

impl From<csv::Error> for RenderError {
    fn from(e: csv::Error) -> Self {
        match e.kind() {
            csv::ErrorKind::Io(_) => {
                if let csv::ErrorKind::Io(io_err) = e.into_kind() {
                    RenderError::Io(io_err)
                } else {
                    unreachable!()
                }
            }
            _ => RenderError::Parse {
                line: e.position().map_or(0, |p| p.line()),
                message: e.to_string(),
            },
        }
    }
}

/// Mode-dispatched rendering state.
///
/// Construct with [`Renderer::start`]; the mode is fixed for the renderer's
/// lifetime. Live modes own a visualization backend; save mode owns the
/// in-memory [`RenderHistory`].
pub struct Renderer {
    mode: RenderMode,
    history: Option<RenderHistory>,
    backend: Option<Box<dyn VisBackend>>,
    address: Option<SocketAddr>,
    updates: usize,
}

impl Renderer {
    /// Initializes rendering in the given mode.
    ///
    /// Live modes start the default visualization backend on `port`; save
    /// mode begins accumulating an in-memory record.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if the backend cannot be brought up.
    pub fn start(
        mode: RenderMode,
        title: &str,
        specs: Vec<Vec<f64>>,
        port: u16,
    ) -> Result<Self, RenderError> {
        let backend = mode.is_live().then(|| vis::default_backend(port));
        Self::start_with(mode, title, specs, backend)
    }

    /// Initializes rendering with an explicit backend (live modes only;
    /// ignored in save mode).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] if a live mode is requested
    /// without a backend, or [`RenderError::Io`] from backend startup.
    pub fn start_with(
        mode: RenderMode,
        title: &str,
        specs: Vec<Vec<f64>>,
        backend: Option<Box<dyn VisBackend>>,
    ) -> Result<Self, RenderError> {
        let mut renderer = Self {
            mode,
            history: None,
            backend: None,
            address: None,
            updates: 0,
        };

        if mode.is_live() {
            let mut backend = backend.ok_or(RenderError::NotInitialized)?;
            renderer.address = backend.start(title, &specs)?;
            renderer.backend = Some(backend);
        } else {
            renderer.history = Some(RenderHistory::new(title, specs));
        }

        Ok(renderer)
    }

    /// The fixed rendering mode.
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Address of the visualization backend, when live and bound.
    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    /// Number of update calls since start.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Processes one frame: push-and-pace in live modes, append in save mode.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] if the live backend is gone.
    pub fn update(&mut self, frame: HistoryFrame, sleep: Duration) -> Result<(), RenderError> {
        self.updates += 1;
        if self.mode.is_live() {
            let backend = self.backend.as_mut().ok_or(RenderError::NotInitialized)?;
            backend.push(&frame)?;
            if !sleep.is_zero() {
                thread::sleep(sleep);
            }
        } else {
            let history = self.history.as_mut().ok_or(RenderError::NotInitialized)?;
            history.push(frame);
        }
        Ok(())
    }

    /// Tears rendering down.
    ///
    /// Live modes stop the backend and return `None`. Save mode requires a
    /// destination `path`, flushes the record there, and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingPath`] in save mode without a path, or
    /// [`RenderError::Io`] if the flush fails.
    pub fn close(mut self, path: Option<&Path>) -> Result<Option<RenderHistory>, RenderError> {
        if self.mode.is_live() {
            if let Some(backend) = self.backend.as_mut() {
                backend.stop();
            }
            return Ok(None);
        }

        let history = self.history.take().ok_or(RenderError::NotInitialized)?;
        let path = path.ok_or(RenderError::MissingPath)?;
        history.save(path)?;
        Ok(Some(history))
    }
}
