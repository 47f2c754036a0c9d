//! Reference data loaded at startup: the mission catalog and a demo roster.

use greencampus_dependencies::chrono::Utc;

use crate::{Client, Mission, ModelError, User};

fn mission(
    id: &str,
    category: &str,
    title: &str,
    description: &str,
    kind: &str,
    points: i64,
    requires_photo: bool,
    cooldown_hours: i64,
) -> Mission {
    Mission {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        kind: kind.to_string(),
        points,
        requires_photo,
        cooldown_hours,
        streak_enabled: None,
    }
}

pub fn missions() -> Vec<Mission> {
    let mut plastic_free = mission(
        "m6",
        "Challenge",
        "No plastic bottle today",
        "Show that you carry a reusable bottle.",
        "challenge",
        15,
        true,
        24,
    );
    plastic_free.streak_enabled = Some(true);
    vec![
        mission("m1", "Sorting", "Recycle a plastic bottle", "Drop it in the PLASTIC bin.", "trash", 10, true, 2),
        mission("m2", "Sorting", "Sort paper", "Recycle paper in the PAPER bin.", "trash", 8, true, 1),
        mission("m3", "Sorting", "Sort glass", "Recycle a glass bottle (GLASS).", "trash", 18, true, 24),
        mission("m4", "CleanSpot", "Scan a CleanSpot", "Scan the CleanSpot QR code on campus.", "qr", 20, false, 0),
        mission("m5", "CleanSpot", "Express clean-up", "Pick up 3 pieces of litter around a CleanSpot.", "environment", 30, true, 2),
        plastic_free,
        mission("m7", "Challenge", "Help a classmate sort", "Teach someone how to sort correctly.", "social", 20, true, 24),
        mission("m8", "Zero Waste", "Use a reusable bag", "No plastic bag today.", "eco_action", 10, true, 24),
        mission("m9", "Zero Waste", "Pick up litter in the yard", "A single piece makes a difference.", "environment", 12, true, 2),
        mission("m10", "Zero Waste", "No Plastic Week, day 1", "No single-use plastic for the whole day.", "weekly_event", 20, true, 24),
        mission("m11", "Challenge", "Bonus: collect 3 kinds of waste", "Plastic, paper and glass.", "environment", 30, true, 24),
        mission("m12", "Eco Actions", "Give an object a second life", "Show that you repair or reuse something.", "upcycling", 25, true, 24),
        mission("m13", "Eco Actions", "Switch off unused lights", "Photograph a tidy room with the lights off.", "eco_action", 10, true, 2),
        mission("m14", "Eco Actions", "Use a reusable cup", "Show your cup instead of a disposable one.", "eco_action", 12, true, 2),
    ]
}

fn demo_user(id: &str, firstname: &str, lastname: &str, campus: &str, xp: i64, badges: &[&str]) -> User {
    let now = Utc::now().naive_utc();
    User {
        id: id.to_string(),
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        campus: campus.to_string(),
        avatar: format!("/avatars/{}.png", firstname.to_ascii_lowercase()),
        level: crate::level_for_xp(xp),
        xp,
        badges: badges.iter().map(|b| b.to_string()).collect(),
        created_at: now,
        updated_at: now,
    }
}

pub fn users() -> Vec<User> {
    vec![
        demo_user("u1", "Alice", "Green", "Eugenia Paris", 245, &["ecostarter"]),
        demo_user("u2", "Lucas", "Recyc", "Eugenia Paris", 90, &[]),
        demo_user("u3", "Maya", "Leaf", "Lyon Campus", 560, &["ecostarter", "cleanmaster"]),
        demo_user("u4", "Tom", "ZeroWaste", "Campus Nord", 310, &["ecostarter"]),
        demo_user("u5", "Nina", "BottleFree", "Campus Ouest", 70, &[]),
        demo_user("u6", "Oceane", "GlassQueen", "Campus Ouest", 220, &["ecostarter"]),
        demo_user("u7", "Leo", "TriMaster", "Eugenia Paris", 600, &["tri_master"]),
        demo_user("u8", "Emma", "EcoStar", "Lyon Campus", 410, &["eco_hero"]),
        demo_user("u9", "Marco", "VirtuGreen", "Campus Nord", 320, &[]),
        demo_user("u10", "Sarah", "EcoQueen", "Campus Nord", 75, &[]),
        demo_user("u11", "Yanis", "EcoGeek", "Campus Ouest", 500, &["ecostarter"]),
        demo_user("u12", "Clara", "WasteLess", "Lyon Campus", 55, &[]),
    ]
}

/// Clears the catalog and loads the built-in missions.
#[instrument(skip(client))]
pub async fn seed_missions(client: &Client) -> Result<usize, ModelError> {
    let missions = missions();
    client.replace_catalog(&missions).await?;
    info!("Seeded {} missions", missions.len());
    Ok(missions.len())
}

/// Inserts or overwrites the demo users.
#[instrument(skip(client))]
pub async fn seed_users(client: &Client) -> Result<usize, ModelError> {
    let users = users();
    let mut tx = client.begin().await?;
    for user in &users {
        user.upsert(&mut tx).await?;
    }
    tx.commit().await?;
    info!("Seeded {} demo users", users.len());
    Ok(users.len())
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_reseeding_is_stable() -> Result<(), ModelError> {
        let client = Client::in_memory().await?;
        seed_missions(&client).await?;
        seed_users(&client).await?;
        seed_missions(&client).await?;
        seed_users(&client).await?;

        let mut conn = client.db().await?;
        assert_eq!(14, Mission::get_all(&mut conn).await?.len());
        let users = User::get_all(&mut conn, None).await?;
        assert_eq!(12, users.len());
        assert_eq!("u1", users[0].id);
        for user in &users {
            assert_eq!(crate::level_for_xp(user.xp), user.level);
        }
        let maya = User::get_id(&mut conn, "u3").await?.expect("demo user");
        assert_eq!(vec!["ecostarter".to_string(), "cleanmaster".to_string()], maya.badges);
        Ok(())
    }
}
