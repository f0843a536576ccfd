use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::error::{PhasewarpError, PhasewarpResult};

/// Immutable snapshot of the user-facing controls.
///
/// The host owns the widgets; whenever any of them changes it hands a complete new snapshot to
/// [`crate::Session::update_config`]. Missing JSON fields fall back to the defaults below.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Brush diameter in display pixels.
    pub brush_size: f32,
    /// Gray value written by paint strokes (0 = full reverse, 128 = still, 255 = full forward).
    pub gray_value: u8,
    /// Draw the control field translucently over the preview/output.
    pub show_overlay: bool,
    /// Global multiplier applied to every pixel's speed.
    pub speed_scale: f32,
    /// Target capture rate in frames per second.
    pub capture_fps: u32,
    /// Upper bound for the display width in pixels.
    pub max_display_width: u32,
    /// Length of the captured window in seconds.
    pub sample_window_seconds: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            brush_size: 32.0,
            gray_value: 128,
            show_overlay: true,
            speed_scale: 1.0,
            capture_fps: 24,
            max_display_width: 900,
            sample_window_seconds: 10.0,
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(s: &str) -> PhasewarpResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| PhasewarpError::serde(format!("session config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_path(path: &Path) -> PhasewarpResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read session config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> PhasewarpResult<()> {
        if self.capture_fps == 0 {
            return Err(PhasewarpError::validation("capture_fps must be > 0"));
        }
        if !self.speed_scale.is_finite() || self.speed_scale < 0.0 {
            return Err(PhasewarpError::validation(
                "speed_scale must be finite and >= 0",
            ));
        }
        if !self.sample_window_seconds.is_finite() || self.sample_window_seconds <= 0.0 {
            return Err(PhasewarpError::validation(
                "sample_window_seconds must be finite and > 0",
            ));
        }
        if self.max_display_width == 0 {
            return Err(PhasewarpError::validation("max_display_width must be > 0"));
        }
        if !self.brush_size.is_finite() || self.brush_size < 0.0 {
            return Err(PhasewarpError::validation(
                "brush_size must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Number of frame-ring slots a capture session fills: `max(2, floor(window * fps))`.
    pub fn target_len(&self) -> usize {
        let n = (self.sample_window_seconds * f64::from(self.capture_fps)).floor();
        if n.is_finite() && n > 2.0 {
            n as usize
        } else {
            2
        }
    }

    /// Minimum spacing between two captures.
    ///
    /// Truncated to whole nanoseconds: ticks spaced `1 / capture_fps` seconds apart in `f64` may
    /// land 1 ns short of the exact period and must still fire.
    pub fn capture_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000u64 / u64::from(self.capture_fps.max(1)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/settings.rs"]
mod tests;
