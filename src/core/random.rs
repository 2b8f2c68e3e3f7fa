use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

/// Source of uniform and normal variates for the simulation and for the
/// decorative sample paths. Tests inject [`SeededRng`]; production uses
/// [`EntropyRng`].
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    fn standard_normal(&mut self) -> f64 {
        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
    cached_normal: Option<f64>,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        let state = match splitmix64(seed) {
            0 => 0xA5A5_A5A5_A5A5_A5A5,
            s => s,
        };
        Self {
            state,
            cached_normal: None,
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }
}

impl RandomSource for SeededRng {
    fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        (self.next_u64() >> 11) as f64 / DENOM
    }

    fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.cached_normal.take() {
            return z;
        }

        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;

        self.cached_normal = Some(r * theta.sin());
        r * theta.cos()
    }
}

#[derive(Debug)]
pub struct EntropyRng {
    inner: StdRng,
}

impl EntropyRng {
    pub fn new() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }
}

impl Default for EntropyRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropyRng {
    fn next_f64(&mut self) -> f64 {
        self.inner.r#gen::<f64>()
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
