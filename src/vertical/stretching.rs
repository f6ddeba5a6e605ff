//! Stretching functions distributing σ levels between bed and surface.
//!
//! - [`Stretching::Uniform`]: equal spacing in σ
//! - [`Stretching::SongHaidvogel`]: surface and/or bottom clustering
//!
//! Both map uniform s ∈ [-1, 0] to stretched C(s) ∈ [-1, 0] with
//! C(-1) = -1 and C(0) = 0.

use serde::{Deserialize, Serialize};

/// Vertical stretching function.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Stretching {
    /// Equal spacing in σ.
    #[default]
    Uniform,
    /// Song & Haidvogel (1994) stretching.
    ///
    /// `theta_s` (0-10) refines near the surface, `theta_b` (0-4) near the bed.
    SongHaidvogel {
        /// Surface stretching parameter.
        theta_s: f64,
        /// Bottom stretching parameter.
        theta_b: f64,
    },
}

impl Stretching {
    /// σ values at `n_levels` level positions, bottom (-1) to surface (0).
    ///
    /// A single level sits at the surface (2-D / depth-averaged grids).
    pub fn levels(&self, n_levels: usize) -> Vec<f64> {
        match n_levels {
            0 => Vec::new(),
            1 => vec![0.0],
            n => (0..n)
                .map(|k| self.apply(-1.0 + k as f64 / (n - 1) as f64))
                .collect(),
        }
    }

    /// C(s) for a uniform s.
    fn apply(&self, s: f64) -> f64 {
        match *self {
            Self::Uniform => s,
            Self::SongHaidvogel { theta_s, theta_b } => {
                let surface = if theta_s > 0.0 {
                    (1.0 - (theta_s * s).cosh()) / (theta_s.cosh() - 1.0)
                } else {
                    s
                };
                let bottom = if theta_b > 0.0 {
                    (theta_b * (s + 1.0)).tanh() / theta_b.tanh() - 1.0
                } else {
                    s
                };
                match (theta_s > 0.0, theta_b > 0.0) {
                    (true, true) => {
                        let ws = theta_s / (theta_s + theta_b);
                        ws * surface + (1.0 - ws) * bottom
                    }
                    (true, false) => surface,
                    (false, true) => bottom,
                    (false, false) => s,
                }
            }
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::SongHaidvogel { .. } => "song_haidvogel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_levels() {
        let levels = Stretching::Uniform.levels(5);
        assert_eq!(levels, vec![-1.0, -0.75, -0.5, -0.25, 0.0]);
    }

    #[test]
    fn test_song_haidvogel_preserves_endpoints() {
        let s = Stretching::SongHaidvogel {
            theta_s: 5.0,
            theta_b: 0.4,
        };
        let levels = s.levels(20);
        assert!((levels[0] + 1.0).abs() < 1e-12);
        assert!(levels[19].abs() < 1e-12);
        for w in levels.windows(2) {
            assert!(w[1] > w[0], "levels must increase: {:?}", w);
        }
    }

    #[test]
    fn test_surface_refinement() {
        let s = Stretching::SongHaidvogel {
            theta_s: 7.0,
            theta_b: 0.0,
        };
        let levels = s.levels(11);
        let top = levels[10] - levels[9];
        let bottom = levels[1] - levels[0];
        assert!(top < bottom, "surface layer {top} should be thinner than bottom {bottom}");
    }

    #[test]
    fn test_single_level_is_surface() {
        assert_eq!(Stretching::Uniform.levels(1), vec![0.0]);
    }
}
