use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Deepest full binary tree accepted. Depth 10 is `2^11 - 1` nodes, about
/// two million repulsion pairs per step.
pub const MAX_SUPPORTED_DEPTH: u32 = 10;

/// Layout parameters, fixed at initialization time.
///
/// Missing JSON keys fall back to [`LayoutConfig::default`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Depth of the full binary tree; leaves live at this depth.
    pub max_depth: u32,
    /// Radius of the sphere the leaves are clamped to.
    pub sphere_radius: f64,
    /// Edge length at which a spring exerts no force.
    pub spring_rest_len: f64,
    /// Hookean spring constant.
    pub spring_strength: f64,
    /// Numerator of the inverse-square node repulsion.
    pub repulsion_strength: f64,
    /// Per-step velocity multiplier, in `(0, 1)`.
    pub damping: f64,
    /// Integration time step.
    pub time_step: f64,
    /// Steps run before the first frame is shown.
    pub warmup_steps: usize,
    /// Per-axis random offset applied to initial internal node positions.
    pub jitter: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_depth: 7, // 128 leaves
            sphere_radius: 200.0,
            spring_rest_len: 40.0,
            spring_strength: 0.01,
            repulsion_strength: 4000.0,
            damping: 0.90,
            time_step: 0.2,
            warmup_steps: 200,
            jitter: 5.0,
        }
    }
}

impl LayoutConfig {
    /// Smaller, wider tree used as a page background.
    pub fn expansion() -> Self {
        Self {
            max_depth: 5,
            sphere_radius: 300.0,
            ..Self::default()
        }
    }

    /// Checks every parameter, returning the first violation found.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(ConfigError::MaxDepth {
                got: self.max_depth,
                max: MAX_SUPPORTED_DEPTH,
            });
        }
        validate_radius(self.sphere_radius)?;
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(ConfigError::Damping(self.damping));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::TimeStep(self.time_step));
        }

        let non_negative = [
            ("spring_rest_len", self.spring_rest_len),
            ("spring_strength", self.spring_strength),
            ("repulsion_strength", self.repulsion_strength),
            ("jitter", self.jitter),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

pub(crate) fn validate_radius(radius: f64) -> std::result::Result<(), ConfigError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::SphereRadius(radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn default_is_valid() {
        assert!(LayoutConfig::default().validate().is_ok());
        assert!(LayoutConfig::expansion().validate().is_ok());
    }

    #[test]
    fn expansion_only_changes_depth_and_radius() {
        let e = LayoutConfig::expansion();
        let d = LayoutConfig::default();
        assert_eq!(e.max_depth, 5);
        assert_eq!(e.sphere_radius, 300.0);
        assert_eq!(e.spring_rest_len, d.spring_rest_len);
        assert_eq!(e.warmup_steps, d.warmup_steps);
    }

    #[test]
    fn rejects_too_deep_trees() {
        let cfg = LayoutConfig {
            max_depth: MAX_SUPPORTED_DEPTH + 1,
            ..LayoutConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::MaxDepth {
                got: MAX_SUPPORTED_DEPTH + 1,
                max: MAX_SUPPORTED_DEPTH
            })
        );
    }

    #[test]
    fn deepest_supported_tree_is_accepted() {
        let cfg = LayoutConfig {
            max_depth: MAX_SUPPORTED_DEPTH,
            ..LayoutConfig::default()
        };
        assert_eq!(cfg.validate(), Ok(()));
        // Full binary tree at the limit stays within the topology limit.
        let nodes = (1usize << (MAX_SUPPORTED_DEPTH + 1)) - 1;
        assert_eq!(nodes, crate::topology::MAX_TOPOLOGY_NODES);
    }

    #[test]
    fn rejects_bad_radius_damping_and_time_step() {
        for r in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let cfg = LayoutConfig {
                sphere_radius: r,
                ..LayoutConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(ConfigError::SphereRadius(_))));
        }

        for d in [0.0, 1.0, 1.5, -0.1] {
            let cfg = LayoutConfig {
                damping: d,
                ..LayoutConfig::default()
            };
            assert_eq!(cfg.validate(), Err(ConfigError::Damping(d)));
        }

        let cfg = LayoutConfig {
            time_step: 0.0,
            ..LayoutConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::TimeStep(0.0)));
    }

    #[test]
    fn rejects_negative_strengths() {
        let cfg = LayoutConfig {
            repulsion_strength: -4000.0,
            ..LayoutConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Negative {
                name: "repulsion_strength",
                value: -4000.0
            })
        );
    }

    #[test]
    fn json_fills_missing_keys_from_default() {
        let cfg = LayoutConfig::from_json_str(r#"{ "max_depth": 3, "damping": 0.5 }"#).unwrap();
        assert_eq!(cfg.max_depth, 3);
        assert_eq!(cfg.damping, 0.5);
        assert_eq!(cfg.sphere_radius, 200.0);
    }

    #[test]
    fn json_is_validated() {
        let err = LayoutConfig::from_json_str(r#"{ "sphere_radius": -2.0 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::SphereRadius(_))));

        let err = LayoutConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = LayoutConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
