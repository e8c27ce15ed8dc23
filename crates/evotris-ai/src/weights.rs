use serde::{Deserialize, Serialize};

/// Weights of the four board metrics.
///
/// Positive weights reward a metric, negative weights penalize it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub line: f32,
    pub height: f32,
    pub hole: f32,
    pub bump: f32,
}

impl Default for Weights {
    /// A hand-tuned vector that already plays reasonably well.
    fn default() -> Self {
        Self {
            line: 0.760_666,
            height: -0.510_066,
            hole: -0.356_63,
            bump: -0.184_483,
        }
    }
}

impl Weights {
    pub const LEN: usize = 4;

    #[must_use]
    pub const fn splat(value: f32) -> Self {
        Self {
            line: value,
            height: value,
            hole: value,
            bump: value,
        }
    }

    /// Returns `[line, height, hole, bump]`.
    #[must_use]
    pub const fn to_array(self) -> [f32; Self::LEN] {
        [self.line, self.height, self.hole, self.bump]
    }

    #[must_use]
    pub const fn from_array([line, height, hole, bump]: [f32; Self::LEN]) -> Self {
        Self {
            line,
            height,
            hole,
            bump,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_order() {
        let w = Weights {
            line: 1.0,
            height: 2.0,
            hole: 3.0,
            bump: 4.0,
        };
        assert_eq!(w.to_array().map(f32::to_bits), [1.0_f32, 2.0, 3.0, 4.0].map(f32::to_bits));
        assert_eq!(Weights::from_array(w.to_array()), w);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let w: Weights = serde_json::from_str(r#"{"line": 2.0}"#).unwrap();
        assert!((w.line - 2.0).abs() < f32::EPSILON);
        assert!((w.hole - Weights::default().hole).abs() < f32::EPSILON);
    }
}
