//! Instructions sent to the image model.

use crate::MissionIntent;

/// Reward table of the game master prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RewardTier {
    SmallLitter,
    CanOrBottle,
    LargeItem,
    FullTrashBag,
    CleanedZone,
}

impl RewardTier {
    pub const ALL: [RewardTier; 5] = [
        RewardTier::SmallLitter,
        RewardTier::CanOrBottle,
        RewardTier::LargeItem,
        RewardTier::FullTrashBag,
        RewardTier::CleanedZone,
    ];

    pub fn points(&self) -> u32 {
        match self {
            RewardTier::SmallLitter => 10,
            RewardTier::CanOrBottle => 20,
            RewardTier::LargeItem => 50,
            RewardTier::FullTrashBag => 100,
            RewardTier::CleanedZone => 200,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            RewardTier::SmallLitter => "a cigarette butt or other small litter",
            RewardTier::CanOrBottle => "a can or a bottle",
            RewardTier::LargeItem => "a large item or a box",
            RewardTier::FullTrashBag => "a full trash bag",
            RewardTier::CleanedZone => "a fully cleaned zone",
        }
    }

    /// Highest reward any single photo can earn.
    pub fn max_points() -> u32 {
        RewardTier::CleanedZone.points()
    }
}

/// Fixed reward of the deprecated single-mission prompt.
pub const BOTTLE_HUNTER_REWARD: u32 = 50;

/// System prompt of the canonical schema: a game master scoring any clean-up photo
/// against the reward table, with the mission at hand as context.
pub fn game_master_prompt(intent: &MissionIntent) -> String {
    let table = RewardTier::ALL
        .iter()
        .map(|tier| format!("- {}: {} XP", tier.describe(), tier.points()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"You are the game master of GreenCampus, a campus sustainability game.
Judge whether the photo proves the mission below and score it.

MISSION ({category}): {title}
{description}

REWARD TABLE:
{table}

RULES:
1. Reject blurry photos, photos showing nothing relevant and photos unrelated to the mission.
2. On success pick the single best matching line of the reward table.
3. Never invent items that are not visible.

ANSWER WITH JSON ONLY:
{{
  "accepted": boolean,
  "points": number,   // from the reward table if accepted, 0 otherwise
  "label": string,    // the item you detected, e.g. "Plastic bottle" or "Nothing"
  "message": string   // short feedback for the student
}}"#,
        category = intent.category,
        title = intent.title,
        description = intent.description,
        table = table,
    )
}

/// System prompt of the deprecated "bottle hunter" schema.
pub fn bottle_hunter_prompt() -> String {
    format!(
        r#"SINGLE MISSION MODE: PLASTIC BOTTLE HUNTER.

You validate photos for GreenCampus. Check the photo for a PLASTIC BOTTLE (water, soda, flask).

STRICT RULES:
1. Plastic bottle visible -> success.
2. Can (metal) -> failure, reason: "That is metal, look for plastic".
3. Glass bottle -> failure, reason: "That is glass, careful!".
4. Cardboard or paper -> failure, reason: "This is not a plastic bottle".
5. Nothing or blurry -> failure.

ANSWER WITH JSON ONLY:
{{
  "mission_success": boolean,
  "detected_item": string,
  "xp_reward": number,   // {reward} on success, 0 otherwise
  "message": string
}}"#,
        reward = BOTTLE_HUNTER_REWARD
    )
}

/// The user turn sent alongside the photo.
pub fn user_instruction(intent: &MissionIntent) -> String {
    format!("Analyse this photo submitted for the mission \"{}\".", intent.title)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    pub fn test_game_master_prompt_lists_reward_table() {
        let prompt = game_master_prompt(&crate::test::intent(true));
        assert!(prompt.contains("Recycle a plastic bottle"));
        for tier in RewardTier::ALL {
            assert!(prompt.contains(&format!("{}: {} XP", tier.describe(), tier.points())));
        }
        assert_eq!(200, RewardTier::max_points());
    }
}
