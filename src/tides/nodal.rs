//! Nodal corrections and equilibrium arguments.
//!
//! Lunar orbit parameters vary over the 18.61-year nodal cycle, which
//! modulates constituent amplitudes by a factor f and shifts their phase
//! by u. The equilibrium argument V₀ places each constituent's phase at
//! the simulation start. Formulae follow Schureman (1958):
//!
//! ```text
//! cos I  = 0.9136949 − 0.0356926 cos N
//! ν      = asin(0.0897056 sin N / sin I)
//! ξ      = N − 2 atan(0.64412 tan(N/2)) − ν
//! ν′     = atan(sin 2I sin ν / (sin 2I cos ν + 0.3347))
//! 2ν″    = atan(sin²I sin 2ν / (sin²I cos 2ν + 0.0727))
//! ```
//!
//! Mean longitudes are linear in days since 1899-12-31 12:00 UT, which
//! keeps the corrections accurate to a small fraction of a degree over
//! the 20th and 21st centuries.

use chrono::{DateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::Constituent;

/// Whether nodal corrections are applied during synthesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodalPolicy {
    /// Schureman f, u and V₀ at the simulation start.
    #[default]
    Schureman,
    /// f = 1 and V₀ + u = 0 for every constituent.
    Disabled,
}

/// Amplitude factor and phase offset for one constituent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodalCorrection {
    /// Nodal amplitude factor f.
    pub f: f64,
    /// Equilibrium argument plus nodal phase, V₀ + u (degrees, in [0, 360)).
    pub v0_plus_u: f64,
}

impl NodalCorrection {
    /// No correction (f = 1, V₀ + u = 0).
    pub const IDENTITY: Self = Self {
        f: 1.0,
        v0_plus_u: 0.0,
    };

    /// V₀ + u in radians.
    pub fn phase_radians(&self) -> f64 {
        self.v0_plus_u.to_radians()
    }
}

/// Astronomical arguments at an instant (all angles in degrees).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AstronomicalArguments {
    /// Hour angle of the mean sun.
    pub t: f64,
    /// Mean longitude of the moon.
    pub s: f64,
    /// Mean longitude of the sun.
    pub h: f64,
    /// Longitude of lunar perigee.
    pub p: f64,
    /// Longitude of the moon's ascending node.
    pub n: f64,
    /// Obliquity of the lunar orbit to the equator.
    pub i: f64,
    /// Right ascension of the lunar intersection, ν.
    pub nu: f64,
    /// Longitude in the moon's orbit of the lunar intersection, ξ.
    pub xi: f64,
    /// ν′
    pub nu_prime: f64,
    /// 2ν″
    pub two_nu_second: f64,
}

impl AstronomicalArguments {
    /// Arguments at `at`.
    pub fn at(at: DateTime<Utc>) -> Self {
        let epoch = Utc.with_ymd_and_hms(1899, 12, 31, 12, 0, 0).single();
        let days = epoch
            .map(|e| (at - e).num_milliseconds() as f64 / 86_400_000.0)
            .unwrap_or(0.0);
        let hours = at.hour() as f64
            + at.minute() as f64 / 60.0
            + (at.second() as f64 + at.nanosecond() as f64 * 1e-9) / 3600.0;

        let s = wrap(270.434_164 + 13.176_396_526_8 * days);
        let h = wrap(279.696_678 + 0.985_647_335_4 * days);
        let p = wrap(334.329_556 + 0.111_404_080_3 * days);
        let n = wrap(259.183_275 - 0.052_953_922_2 * days);
        let t = wrap(180.0 + 15.0 * hours);

        let n_rad = signed(n).to_radians();
        let i = (0.913_694_9 - 0.035_692_6 * n_rad.cos()).acos();
        let nu = (0.089_705_6 * n_rad.sin() / i.sin()).asin();
        let xi = n_rad - 2.0 * (0.644_12 * (n_rad / 2.0).tan()).atan() - nu;
        let sin_2i = (2.0 * i).sin();
        let nu_prime = (sin_2i * nu.sin()).atan2(sin_2i * nu.cos() + 0.3347);
        let sin2_i = i.sin().powi(2);
        let two_nu_second = (sin2_i * (2.0 * nu).sin()).atan2(sin2_i * (2.0 * nu).cos() + 0.0727);

        Self {
            t,
            s,
            h,
            p,
            n,
            i: i.to_degrees(),
            nu: nu.to_degrees(),
            xi: xi.to_degrees(),
            nu_prime: nu_prime.to_degrees(),
            two_nu_second: two_nu_second.to_degrees(),
        }
    }

    /// Nodal amplitude factor f.
    pub fn nodal_factor(&self, c: Constituent) -> f64 {
        let i = self.i.to_radians();
        let nu = self.nu.to_radians();
        let f_m2 = (i / 2.0).cos().powi(4) / 0.9154;
        match c {
            Constituent::M2 | Constituent::N2 | Constituent::TwoN2 => f_m2,
            Constituent::S2 | Constituent::P1 => 1.0,
            Constituent::K1 => {
                let s2i = (2.0 * i).sin();
                (0.8965 * s2i * s2i + 0.6001 * s2i * nu.cos() + 0.1006).sqrt()
            }
            Constituent::K2 => {
                let si = i.sin();
                (19.0444 * si.powi(4) + 2.7702 * si * si * (2.0 * nu).cos() + 0.0981).sqrt()
            }
            Constituent::O1 | Constituent::Q1 => i.sin() * (i / 2.0).cos().powi(2) / 0.3800,
            Constituent::Mf => i.sin().powi(2) / 0.1578,
            Constituent::Mm => (2.0 / 3.0 - i.sin().powi(2)) / 0.5021,
            Constituent::M4 | Constituent::MN4 => f_m2 * f_m2,
            Constituent::MS4 => f_m2,
        }
    }

    /// Equilibrium argument V₀ (degrees, unwrapped).
    pub fn equilibrium_argument(&self, c: Constituent) -> f64 {
        let Self { t, s, h, p, .. } = *self;
        match c {
            Constituent::M2 => 2.0 * t - 2.0 * s + 2.0 * h,
            Constituent::S2 => 2.0 * t,
            Constituent::N2 => 2.0 * t - 3.0 * s + 2.0 * h + p,
            Constituent::TwoN2 => 2.0 * t - 4.0 * s + 2.0 * h + 2.0 * p,
            Constituent::K2 => 2.0 * t + 2.0 * h,
            Constituent::K1 => t + h - 90.0,
            Constituent::O1 => t - 2.0 * s + h + 90.0,
            Constituent::P1 => t - h + 90.0,
            Constituent::Q1 => t - 3.0 * s + h + p + 90.0,
            Constituent::Mf => 2.0 * s,
            Constituent::Mm => s - p,
            Constituent::M4 => 2.0 * self.equilibrium_argument(Constituent::M2),
            Constituent::MS4 => {
                self.equilibrium_argument(Constituent::M2) + self.equilibrium_argument(Constituent::S2)
            }
            Constituent::MN4 => {
                self.equilibrium_argument(Constituent::M2) + self.equilibrium_argument(Constituent::N2)
            }
        }
    }

    /// Nodal phase correction u (degrees, unwrapped).
    pub fn nodal_phase(&self, c: Constituent) -> f64 {
        let lunar_semidiurnal = 2.0 * self.xi - 2.0 * self.nu;
        match c {
            Constituent::M2 | Constituent::N2 | Constituent::TwoN2 => lunar_semidiurnal,
            Constituent::S2 | Constituent::P1 | Constituent::Mm => 0.0,
            Constituent::K2 => -self.two_nu_second,
            Constituent::K1 => -self.nu_prime,
            Constituent::O1 | Constituent::Q1 => 2.0 * self.xi - self.nu,
            Constituent::Mf => -2.0 * self.xi,
            Constituent::M4 | Constituent::MN4 => 2.0 * lunar_semidiurnal,
            Constituent::MS4 => lunar_semidiurnal,
        }
    }

    /// Combined correction for a constituent.
    pub fn correction(&self, c: Constituent) -> NodalCorrection {
        NodalCorrection {
            f: self.nodal_factor(c),
            v0_plus_u: wrap(self.equilibrium_argument(c) + self.nodal_phase(c)),
        }
    }
}

/// Corrections for `constituents` at `start` under `policy`.
pub fn nodal_corrections(
    constituents: &[Constituent],
    start: DateTime<Utc>,
    policy: NodalPolicy,
) -> Vec<NodalCorrection> {
    match policy {
        NodalPolicy::Disabled => vec![NodalCorrection::IDENTITY; constituents.len()],
        NodalPolicy::Schureman => {
            let args = AstronomicalArguments::at(start);
            constituents.iter().map(|&c| args.correction(c)).collect()
        }
    }
}

fn wrap(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

fn signed(deg: f64) -> f64 {
    let w = wrap(deg);
    if w >= 180.0 {
        w - 360.0
    } else {
        w
    }
}
