//! Response schemas understood from the image model.
//!
//! [`ResponseSchema::Canonical`] is the only schema new deployments should use. The
//! bottle hunter schema is kept so that old prompts still parse, it is never guessed:
//! the configured schema decides how an answer is read.

use serde::{Deserialize, Serialize};

use crate::prompt::{RewardTier, BOTTLE_HUNTER_REWARD};
use crate::{MissionIntent, ValidatorError, Verdict};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSchema {
    /// `{accepted, points, label, message}` scored by the game master reward table.
    #[default]
    #[serde(alias = "game-master")]
    Canonical,
    /// Deprecated `{mission_success, xp_reward, detected_item, message}` with a fixed reward.
    #[serde(alias = "bottle_hunter")]
    BottleHunter,
}

impl std::str::FromStr for ResponseSchema {
    type Err = ValidatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "canonical" | "game-master" => Self::Canonical,
            "bottle-hunter" | "bottle_hunter" => Self::BottleHunter,
            v => {
                return Err(ValidatorError::MalformedResponse(format!(
                    "unknown response schema {:?}",
                    v
                )))
            }
        })
    }
}

#[derive(Deserialize, Debug)]
struct CanonicalVerdict {
    accepted: bool,
    #[serde(default)]
    points: Option<u32>,
    #[serde(default)]
    label: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Debug)]
struct BottleHunterVerdict {
    mission_success: bool,
    #[serde(default)]
    xp_reward: Option<u32>,
    #[serde(default)]
    detected_item: String,
    #[serde(default)]
    message: String,
}

impl ResponseSchema {
    pub fn system_prompt(&self, intent: &MissionIntent) -> String {
        match self {
            ResponseSchema::Canonical => crate::prompt::game_master_prompt(intent),
            ResponseSchema::BottleHunter => crate::prompt::bottle_hunter_prompt(),
        }
    }

    /// Reads the model answer into a verdict. Markdown code fences around the JSON are tolerated.
    pub fn parse(&self, text: &str) -> Result<Verdict, ValidatorError> {
        let text = strip_code_fence(text);
        match self {
            ResponseSchema::Canonical => {
                let v: CanonicalVerdict = serde_json::from_str(text)?;
                if !v.accepted {
                    return Ok(Verdict::reject(v.label, v.message));
                }
                let points = v.points.map(|p| {
                    if p > RewardTier::max_points() {
                        warn!("capping validator reward of {} XP to {}", p, RewardTier::max_points());
                    }
                    p.min(RewardTier::max_points())
                });
                Ok(Verdict::accept(points, v.label, v.message))
            }
            ResponseSchema::BottleHunter => {
                let v: BottleHunterVerdict = serde_json::from_str(text)?;
                if !v.mission_success {
                    return Ok(Verdict::reject(v.detected_item, v.message));
                }
                Ok(Verdict::accept(
                    Some(v.xp_reward.filter(|p| *p > 0).unwrap_or(BOTTLE_HUNTER_REWARD)),
                    v.detected_item,
                    v.message,
                ))
            }
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    pub fn test_canonical_answers() {
        let schema = ResponseSchema::Canonical;
        let verdict = schema
            .parse(r#"{"accepted": true, "points": 20, "label": "Soda can", "message": "Nice!"}"#)
            .unwrap();
        assert_eq!(Verdict::accept(Some(20), "Soda can", "Nice!"), verdict);

        let verdict = schema
            .parse("```json\n{\"accepted\": false, \"points\": 0, \"label\": \"Nothing\", \"message\": \"Too blurry\"}\n```")
            .unwrap();
        assert!(!verdict.accepted);
        assert_eq!(None, verdict.points);

        let verdict = schema.parse(r#"{"accepted": true, "points": 5000}"#).unwrap();
        assert_eq!(Some(200), verdict.points);

        let verdict = schema.parse(r#"{"accepted": true}"#).unwrap();
        assert_eq!(None, verdict.points);
    }

    #[test]
    pub fn test_malformed_answers() {
        let schema = ResponseSchema::Canonical;
        for text in [
            "I think this is a bottle",
            r#"{"points": 20}"#,
            r#"{"accepted": true, "points": -5}"#,
            r#"{"mission_success": true, "xp_reward": 50}"#,
        ] {
            assert!(
                matches!(schema.parse(text), Err(ValidatorError::MalformedResponse(_))),
                "{} must not parse",
                text
            );
        }
    }

    #[test]
    pub fn test_bottle_hunter_is_read_only_when_configured() {
        let schema = ResponseSchema::BottleHunter;
        let verdict = schema
            .parse(r#"{"mission_success": true, "detected_item": "Evian bottle", "xp_reward": 0, "message": "Bravo"}"#)
            .unwrap();
        assert_eq!(Verdict::accept(Some(50), "Evian bottle", "Bravo"), verdict);

        let verdict = schema
            .parse(r#"{"mission_success": false, "detected_item": "Coke can", "xp_reward": 0, "message": "That is metal"}"#)
            .unwrap();
        assert!(!verdict.accepted);

        assert!(schema.parse(r#"{"accepted": true, "points": 20}"#).is_err());
        assert_eq!(ResponseSchema::BottleHunter, "bottle-hunter".parse().unwrap());
    }
}
