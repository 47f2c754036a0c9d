//! Offline stand-in used when no Gemini key is configured.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use greencampus_dependencies::rand::rngs::StdRng;
use greencampus_dependencies::rand::{Rng, SeedableRng};

use crate::{MissionIntent, Proof, ProofValidator, ValidatorError, Verdict};

/// Accepts photos without looking at them, either always or with a fixed probability.
pub struct SimulationValidator {
    accept_rate: f64,
    nominal_points: u32,
    delay: Option<Duration>,
    rng: Mutex<StdRng>,
}

impl SimulationValidator {
    /// Accepts every photo and rewards `nominal_points`.
    pub fn always_accept(nominal_points: u32) -> Self {
        Self::stochastic(1.0, nominal_points)
    }

    /// Accepts a photo with probability `accept_rate`, clamped to `0.0..=1.0`.
    pub fn stochastic(accept_rate: f64, nominal_points: u32) -> Self {
        let accept_rate = if accept_rate.is_nan() {
            0.0
        } else {
            accept_rate.clamp(0.0, 1.0)
        };
        Self {
            accept_rate,
            nominal_points,
            delay: None,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Waits before answering, like a remote model would.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn accept_rate(&self) -> f64 {
        self.accept_rate
    }

    fn roll(&self) -> bool {
        if self.accept_rate >= 1.0 {
            return true;
        }
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_bool(self.accept_rate),
            Err(poisoned) => poisoned.into_inner().gen_bool(self.accept_rate),
        }
    }
}

#[async_trait]
impl ProofValidator for SimulationValidator {
    fn name(&self) -> &str {
        "simulation"
    }

    async fn validate(&self, intent: &MissionIntent, _proof: &Proof) -> Result<Verdict, ValidatorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.roll() {
            Ok(Verdict::accept(
                Some(self.nominal_points),
                intent.title.clone(),
                "Photo accepted (simulation mode).",
            ))
        } else {
            Ok(Verdict::reject(
                "Unclear photo",
                "The photo could not be validated, try again.",
            ))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_always_accept_rewards_nominal_points() {
        let validator = SimulationValidator::always_accept(50);
        let proof = Proof::Photo("aGVsbG8=".to_string());
        for _ in 0..20 {
            let verdict = validator.validate(&crate::test::intent(true), &proof).await.unwrap();
            assert!(verdict.accepted);
            assert_eq!(Some(50), verdict.points);
        }
    }

    #[tokio::test]
    async fn test_stochastic_rate_is_reproducible() {
        let proof = Proof::Photo("aGVsbG8=".to_string());
        let mut runs = Vec::new();
        for _ in 0..2 {
            let validator = SimulationValidator::stochastic(0.7, 50).with_seed(7);
            let mut outcomes = Vec::new();
            for _ in 0..200 {
                let verdict = validator.validate(&crate::test::intent(true), &proof).await.unwrap();
                outcomes.push(verdict.accepted);
            }
            runs.push(outcomes);
        }
        assert_eq!(runs[0], runs[1]);
        let accepted = runs[0].iter().filter(|a| **a).count();
        assert!(accepted > 100 && accepted < 180, "accepted {} of 200", accepted);
    }

    #[tokio::test]
    async fn test_zero_rate_rejects() {
        let validator = SimulationValidator::stochastic(-3.0, 50);
        assert_eq!(0.0, validator.accept_rate());
        let verdict = validator
            .validate(&crate::test::intent(true), &Proof::Photo("aGVsbG8=".to_string()))
            .await
            .unwrap();
        assert!(!verdict.accepted);
        assert_eq!(None, verdict.points);
    }
}
