//! Deterministic per-device RNG wrapper.
//!
//! # Determinism strategy
//!
//! Each device gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (device_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive device IDs uniformly across the seed space.
//! Devices never share RNG state, so worker threads need no coordination to
//! draw speeds, endpoints, or noise, and a run with a fixed `--seed` draws
//! the same sequence per device regardless of thread interleaving.

use rand::distributions::Distribution;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::DeviceId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-device deterministic RNG.
///
/// Owned by the device's worker; `SmallRng` is `Send`, so the whole device
/// moves into its thread.
pub struct DeviceRng(SmallRng);

impl DeviceRng {
    /// Seed deterministically from the run's global seed and a device ID.
    pub fn new(global_seed: u64, device: DeviceId) -> Self {
        let seed = global_seed ^ u64::from(device.0).wrapping_mul(MIXING_CONSTANT);
        DeviceRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` / `rand_distr` types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: Distribution<T>,
    {
        self.0.r#gen()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Draw one value from `dist`.
    #[inline]
    pub fn sample<T, D: Distribution<T>>(&mut self, dist: &D) -> T {
        dist.sample(&mut self.0)
    }
}
