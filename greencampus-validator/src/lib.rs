#[macro_use]
extern crate tracing;

pub mod gemini;
pub mod mock;
pub mod prompt;
pub mod schema;
pub mod simulation;

use async_trait::async_trait;
use greencampus_dependencies::base64::{engine::general_purpose::STANDARD, Engine};
use greencampus_dependencies::sha2::{Digest, Sha256};

pub use gemini::{GeminiConfig, GeminiValidator};
pub use mock::MockValidator;
pub use schema::ResponseSchema;
pub use simulation::SimulationValidator;

/// QR codes printed on CleanSpots carry this prefix.
pub const CLEANSPOT_QR_PREFIX: &str = "cleanspot:";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    #[error("Proof validator unavailable: {0}")]
    Unavailable(String),
    #[error("Proof validator returned a malformed response: {0}")]
    MalformedResponse(String),
}

impl From<greencampus_dependencies::reqwest::Error> for ValidatorError {
    fn from(e: greencampus_dependencies::reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ValidatorError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}

/// What the student submitted as evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proof {
    /// Base64 image, optionally still carrying its `data:image/...;base64,` header.
    Photo(String),
    /// Raw text read from a QR code.
    QrCode(String),
    None,
}

impl Proof {
    /// Base64 payload of a photo with any data URL header removed.
    pub fn photo_data(&self) -> Option<&str> {
        match self {
            Proof::Photo(data) => Some(match data.split_once(',') {
                Some((_, payload)) => payload,
                None => data.as_str(),
            }),
            _ => None,
        }
    }

    /// Short reference stored with the attempt. Photos are stored as a digest, never inline.
    pub fn reference(&self) -> String {
        match self {
            Proof::Photo(_) => {
                let data = self.photo_data().unwrap_or_default();
                let digest = match STANDARD.decode(data) {
                    Ok(bytes) => Sha256::digest(&bytes),
                    Err(_) => Sha256::digest(data.as_bytes()),
                };
                format!("photo:sha256:{}", greencampus_dependencies::hex::encode(digest))
            }
            Proof::QrCode(text) => format!("qr:{}", text),
            Proof::None => "none".to_string(),
        }
    }
}

/// The mission the proof is meant for, used to steer the validator prompt.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MissionIntent {
    pub mission_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub kind: String,
    pub points: u32,
    pub requires_photo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Verdict {
    pub accepted: bool,
    /// Reward reported by the validator. `None` falls back to the catalog points.
    pub points: Option<u32>,
    pub label: String,
    pub message: String,
}

impl Verdict {
    pub fn accept(points: Option<u32>, label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            points,
            label: label.into(),
            message: message.into(),
        }
    }

    pub fn reject(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            points: None,
            label: label.into(),
            message: message.into(),
        }
    }
}

/// A service deciding whether a proof completes a mission.
#[async_trait]
pub trait ProofValidator: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Judges a photo proof. Only called for missions that require a photo.
    async fn validate(&self, intent: &MissionIntent, proof: &Proof) -> Result<Verdict, ValidatorError>;
}

/// Runs the proof through `validator`, short-circuiting the cases that need no image
/// understanding: QR missions are accepted with their catalog points when the code is
/// a CleanSpot code, and photo missions without a photo are rejected.
#[instrument(skip(validator, proof), fields(validator = validator.name(), mission = %intent.mission_id))]
pub async fn validate_proof(
    validator: &dyn ProofValidator,
    intent: &MissionIntent,
    proof: &Proof,
) -> Result<Verdict, ValidatorError> {
    if !intent.requires_photo {
        return Ok(match proof {
            Proof::QrCode(code) if code.starts_with(CLEANSPOT_QR_PREFIX) => Verdict::accept(
                Some(intent.points),
                "CleanSpot",
                "CleanSpot scanned, well done!",
            ),
            Proof::QrCode(code) => {
                debug!("rejecting QR code without CleanSpot prefix: {:?}", code);
                Verdict::reject("Unknown QR code", "This is not a CleanSpot code.")
            }
            _ => Verdict::reject("No QR code", "Scan the CleanSpot QR code to complete this mission."),
        });
    }
    if proof.photo_data().map(str::is_empty).unwrap_or(true) {
        return Ok(Verdict::reject("No photo", "This mission needs a photo as proof."));
    }
    validator.validate(intent, proof).await
}
