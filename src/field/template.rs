use std::str::FromStr;

use crate::foundation::error::{PhasewarpError, PhasewarpResult};

/// Built-in control field generators.
///
/// Every template is a pure function of the column; rows are identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TemplateKind {
    /// White on the left fading to black on the right (`"LR"`).
    #[serde(rename = "LR")]
    LeftToRight,
    /// Black on the left rising to white on the right (`"RL"`).
    #[serde(rename = "RL")]
    RightToLeft,
    /// White in the centre column fading to black at both edges (`"CENTER"`).
    #[serde(rename = "CENTER")]
    Center,
}

impl TemplateKind {
    /// Short name used by hosts and the CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeftToRight => "LR",
            Self::RightToLeft => "RL",
            Self::Center => "CENTER",
        }
    }

    /// Gray value for column `x` of a `width`-wide grid.
    pub fn value_at(self, x: u32, width: u32) -> u8 {
        let last = f64::from(width.saturating_sub(1));
        let x = f64::from(x);
        let v = match self {
            Self::LeftToRight => 255.0 * (1.0 - normalized(x, last)),
            Self::RightToLeft => 255.0 * normalized(x, last),
            Self::Center => {
                let cx = last * 0.5;
                let d = if cx > 0.0 { (x - cx).abs() / cx } else { 0.0 };
                255.0 * (1.0 - d)
            }
        };
        v.round().clamp(0.0, 255.0) as u8
    }
}

fn normalized(x: f64, last: f64) -> f64 {
    if last > 0.0 { x / last } else { 0.0 }
}

impl FromStr for TemplateKind {
    type Err = PhasewarpError;

    fn from_str(s: &str) -> PhasewarpResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LR" => Ok(Self::LeftToRight),
            "RL" => Ok(Self::RightToLeft),
            "CENTER" | "CENTRE" => Ok(Self::Center),
            other => Err(PhasewarpError::validation(format!(
                "unknown template '{other}' (expected LR, RL or CENTER)"
            ))),
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/field/template.rs"]
mod tests;
