//! Harmonic synthesis of tidal time series.
//!
//! ```text
//! value(t) = Σ_c A_c · f_c · cos(ω_c·t + (V₀ + u)_c − G_c)
//! ```
//!
//! with t in seconds since the simulation start and G the Greenwich
//! phase lag from the atlas.

use super::{ComponentHarmonics, Constituent, NodalCorrection};
use crate::types::BoundaryArray;

/// Contribution of one constituent at time `t` (seconds since start).
#[inline]
pub fn constituent_value(
    constituent: Constituent,
    amplitude: f64,
    phase_deg: f64,
    correction: NodalCorrection,
    t: f64,
) -> f64 {
    amplitude
        * correction.f
        * (constituent.omega() * t + correction.phase_radians() - phase_deg.to_radians()).cos()
}

/// Synthesise a node × 1 × time array at `offsets` (seconds since start).
pub fn synthesize(
    constituents: &[Constituent],
    nodal: &[NodalCorrection],
    harmonics: &ComponentHarmonics,
    offsets: &[f64],
) -> BoundaryArray {
    let n_nodes = harmonics.n_nodes();
    BoundaryArray::from_fn(n_nodes, 1, offsets.len(), |node, _, t| {
        constituents
            .iter()
            .zip(nodal)
            .enumerate()
            .map(|(c, (&constituent, &correction))| {
                constituent_value(
                    constituent,
                    harmonics.amplitude[c][node],
                    harmonics.phase[c][node],
                    correction,
                    offsets[t],
                )
            })
            .sum()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harmonics(amplitude: Vec<Vec<f64>>, phase: Vec<Vec<f64>>) -> ComponentHarmonics {
        ComponentHarmonics { amplitude, phase }
    }

    #[test]
    fn test_unit_m2_at_t0() {
        let h = harmonics(vec![vec![1.0], vec![0.0]], vec![vec![0.0], vec![0.0]]);
        let out = synthesize(
            &[Constituent::M2, Constituent::S2],
            &[NodalCorrection::IDENTITY; 2],
            &h,
            &[0.0],
        );
        assert!((out.get(0, 0, 0).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_phase_lag_delays_peak() {
        // G = 90° puts the maximum a quarter period after t = 0.
        let h = harmonics(vec![vec![2.0]], vec![vec![90.0]]);
        let quarter = Constituent::M2.period() / 4.0;
        let out = synthesize(&[Constituent::M2], &[NodalCorrection::IDENTITY], &h, &[0.0, quarter]);
        assert!(out.get(0, 0, 0).unwrap().abs() < 1e-12);
        assert!((out.get(0, 0, 1).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_nodal_factor_scales_amplitude() {
        let h = harmonics(vec![vec![1.0]], vec![vec![0.0]]);
        let correction = NodalCorrection { f: 1.03, v0_plus_u: 0.0 };
        let out = synthesize(&[Constituent::K1], &[correction], &h, &[0.0]);
        assert!((out.get(0, 0, 0).unwrap() - 1.03).abs() < 1e-12);
    }

    #[test]
    fn test_periodicity() {
        let h = harmonics(vec![vec![0.7]], vec![vec![123.0]]);
        let p = Constituent::O1.period();
        let correction = NodalCorrection { f: 0.9, v0_plus_u: 47.0 };
        let out = synthesize(&[Constituent::O1], &[correction], &h, &[1000.0, 1000.0 + p]);
        assert!((out.get(0, 0, 0).unwrap() - out.get(0, 0, 1).unwrap()).abs() < 1e-9);
    }
}
