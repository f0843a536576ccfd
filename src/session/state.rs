/// Which components run on each tick.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionMode {
    /// Initial and fallback state: the control field may be painted.
    #[default]
    Painting,
    /// Frames are being sampled into the ring.
    Capturing,
    /// The phase engine and compositor produce output every tick.
    Playing,
}

impl SessionMode {
    /// Upper-case name shown by hosts.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Painting => "PAINTING",
            Self::Capturing => "CAPTURING",
            Self::Playing => "PLAYING",
        }
    }

    /// Whether `self -> to` is a legal mode change.
    ///
    /// Playback is only reachable through capture, and every state can fall back to painting.
    pub fn can_transition(self, to: SessionMode) -> bool {
        matches!(
            (self, to),
            (Self::Painting, Self::Capturing)
                | (Self::Capturing, Self::Playing)
                | (Self::Capturing, Self::Painting)
                | (Self::Playing, Self::Painting)
        )
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a mode change happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// The host asked to play.
    PlayRequested,
    /// The host asked to stop.
    StopRequested,
    /// Every ring slot was filled.
    CaptureComplete,
    /// Capture ended with fewer than two frames.
    InsufficientFrames,
    /// A new source replaced the old one.
    SourceLoaded,
    /// Buffers were reallocated after a configuration change.
    Reconfigured,
}

/// One recorded mode change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModeTransition {
    /// Mode before the change.
    pub from: SessionMode,
    /// Mode after the change.
    pub to: SessionMode,
    /// Trigger.
    pub reason: TransitionReason,
}

#[cfg(test)]
#[path = "../../tests/unit/session/state.rs"]
mod tests;
