//! Scripted validator for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::{MissionIntent, Proof, ProofValidator, ValidatorError, Verdict};

pub struct MockValidator {
    answer: Result<Verdict, ValidatorError>,
    delay: Option<Duration>,
    call_count: AtomicU32,
}

impl MockValidator {
    pub fn new(answer: Result<Verdict, ValidatorError>) -> Self {
        Self {
            answer,
            delay: None,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn accepting(points: Option<u32>) -> Self {
        Self::new(Ok(Verdict::accept(points, "Plastic bottle", "Accepted by mock")))
    }

    pub fn rejecting() -> Self {
        Self::new(Ok(Verdict::reject("Nothing", "Rejected by mock")))
    }

    pub fn unavailable() -> Self {
        Self::new(Err(ValidatorError::Unavailable("mock offline".to_string())))
    }

    pub fn malformed() -> Self {
        Self::new(Err(ValidatorError::MalformedResponse("mock garbage".to_string())))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times validate was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofValidator for MockValidator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn validate(&self, _intent: &MissionIntent, _proof: &Proof) -> Result<Verdict, ValidatorError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let validator = MockValidator::rejecting();
        let proof = Proof::Photo("aGVsbG8=".to_string());
        assert_eq!(0, validator.call_count());
        let verdict = validator.validate(&crate::test::intent(true), &proof).await.unwrap();
        assert!(!verdict.accepted);
        assert!(MockValidator::malformed()
            .validate(&crate::test::intent(true), &proof)
            .await
            .is_err());
        assert_eq!(1, validator.call_count());
    }
}
