//! Shape-vectorizing backend
//!
//! The actual image approximation is done by the external `primitive`
//! program. This module defines the narrow interface the HTTP layer talks to
//! (`Transformer`) and the subprocess implementation (`PrimitiveCli`).

mod cli;

pub use cli::PrimitiveCli;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Shape type used by the tool, encoded as the integer passed to `-m`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Combo,
    Triangle,
    Rect,
    Ellipse,
    Circle,
    RotatedRect,
    Beziers,
    RotatedEllipse,
    Polygon,
}

impl Mode {
    /// Modes offered on the first gallery page
    pub const GALLERY: [Self; 7] = [
        Self::Triangle,
        Self::Rect,
        Self::Ellipse,
        Self::Circle,
        Self::RotatedRect,
        Self::Beziers,
        Self::RotatedEllipse,
    ];

    pub const fn code(self) -> u8 {
        match self {
            Self::Combo => 0,
            Self::Triangle => 1,
            Self::Rect => 2,
            Self::Ellipse => 3,
            Self::Circle => 4,
            Self::RotatedRect => 5,
            Self::Beziers => 6,
            Self::RotatedEllipse => 7,
            Self::Polygon => 8,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Combo),
            1 => Some(Self::Triangle),
            2 => Some(Self::Rect),
            3 => Some(Self::Ellipse),
            4 => Some(Self::Circle),
            5 => Some(Self::RotatedRect),
            6 => Some(Self::Beziers),
            7 => Some(Self::RotatedEllipse),
            8 => Some(Self::Polygon),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Combo => "combo",
            Self::Triangle => "triangle",
            Self::Rect => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Circle => "circle",
            Self::RotatedRect => "rotated rectangle",
            Self::Beziers => "bezier",
            Self::RotatedEllipse => "rotated ellipse",
            Self::Polygon => "polygon",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when a query value is not a known mode integer
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid mode '{0}'")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::from_code)
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}

/// One invocation's knobs: how many shapes, and which shape type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub shapes: u32,
    /// `None` leaves the choice to the tool's own default
    pub mode: Option<Mode>,
}

impl TransformOptions {
    pub const fn new(shapes: u32) -> Self {
        Self { shapes, mode: None }
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {output}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        output: String,
    },

    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("'{0}' produced an empty image")]
    EmptyOutput(String),
}

/// Given input image bytes and options, produce the approximated image bytes
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(
        &self,
        input: &[u8],
        ext: &str,
        options: TransformOptions,
    ) -> Result<Vec<u8>, TransformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_codes_roundtrip() {
        for code in 0..=8u8 {
            let mode = Mode::from_code(code).unwrap();
            assert_eq!(mode.code(), code);
        }
        assert_eq!(Mode::from_code(9), None);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("1".parse::<Mode>(), Ok(Mode::Triangle));
        assert_eq!("8".parse::<Mode>(), Ok(Mode::Polygon));
        assert_eq!(
            "abc".parse::<Mode>(),
            Err(ParseModeError("abc".to_string()))
        );
        assert!("-1".parse::<Mode>().is_err());
        assert!("9".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
    }

    #[test]
    fn test_gallery_modes() {
        assert_eq!(Mode::GALLERY.len(), 7);
        assert!(!Mode::GALLERY.contains(&Mode::Combo));
        assert!(!Mode::GALLERY.contains(&Mode::Polygon));
        assert_eq!(Mode::Beziers.to_string(), "6");
    }

    #[test]
    fn test_options_builder() {
        let opts = TransformOptions::new(50).with_mode(Mode::Circle);
        assert_eq!(opts.shapes, 50);
        assert_eq!(opts.mode, Some(Mode::Circle));
        assert_eq!(TransformOptions::new(10).mode, None);
    }
}
