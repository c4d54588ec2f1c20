use chrono::{DateTime, Timelike, Utc};
use rand::Rng;

/// Approximately normal noise with the given standard deviation
/// (Irwin-Hall sum of twelve uniforms).
pub(crate) fn gaussian(rng: &mut impl Rng, sigma: f64) -> f64 {
    let sum: f64 = (0..12).map(|_| rng.gen::<f64>()).sum();
    (sum - 6.0) * sigma
}

/// Diurnal phase in radians derived from the hour of day. The 0.26 factor
/// gives roughly one full cycle per day.
pub(crate) fn diurnal_phase(now: DateTime<Utc>) -> f64 {
    f64::from(now.hour()) * 0.26
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_noise_stays_within_six_sigma() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            assert!(gaussian(&mut rng, 1.0).abs() <= 6.0);
        }
    }
}
