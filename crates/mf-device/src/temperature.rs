//! Diurnal temperature curve with Gaussian noise.

use rand_distr::Normal;

use mf_core::{round_dp, DeviceRng};

use crate::params::TemperatureParams;
use crate::{DeviceError, DeviceResult};

/// Cosine day curve peaking at `peak_hour`, sampled with noise.
#[derive(Clone, Debug)]
pub struct TemperatureModel {
    mean:      f64,
    amplitude: f64,
    peak_hour: f64,
    sigma:     f64,
}

impl TemperatureModel {
    pub fn new(params: &TemperatureParams) -> DeviceResult<Self> {
        if !(params.noise_sigma.is_finite() && params.noise_sigma >= 0.0) {
            return Err(DeviceError::InvalidParams(format!(
                "temperature noise sigma {} is not usable",
                params.noise_sigma
            )));
        }
        Ok(Self {
            mean:      (params.min_c + params.max_c) / 2.0,
            amplitude: (params.max_c - params.min_c) / 2.0,
            peak_hour: params.peak_hour,
            sigma:     params.noise_sigma,
        })
    }

    /// Noise-free curve value at `hour` (0.0 ..< 24.0).
    pub fn expected(&self, hour: f64) -> f64 {
        let phase = std::f64::consts::TAU * (hour - self.peak_hour) / 24.0;
        self.mean + self.amplitude * phase.cos()
    }

    /// One reading: curve value plus noise, rounded to two decimals.
    pub fn sample(&self, hour: f64, rng: &mut DeviceRng) -> f64 {
        let expected = self.expected(hour);
        let value = match Normal::new(expected, self.sigma) {
            Ok(dist) => rng.sample(&dist),
            Err(_) => expected,
        };
        round_dp(value, 2)
    }
}
