use greencampus_core::error::GreenCampusResult;
use greencampus_core::leaderboard::{campus_leaderboard, leaderboard};
use greencampus_models::Client;

use super::LeaderboardCli;

pub async fn users(client: &Client, args: &LeaderboardCli) -> GreenCampusResult<()> {
    let entries = leaderboard(client, args.campus.as_deref()).await?;
    if entries.is_empty() {
        println!("No users yet");
    }
    for entry in entries.iter().take(args.limit) {
        println!(
            "{:>3}. {:<24} {:<16} {:>6} XP  level {}",
            entry.rank, entry.displayname, entry.campus, entry.xp, entry.level
        );
    }
    Ok(())
}

pub async fn campuses(client: &Client) -> GreenCampusResult<()> {
    for entry in campus_leaderboard(client).await? {
        println!(
            "{:>3}. {:<24} {:>7} XP  {} students",
            entry.rank, entry.campus, entry.xp, entry.members
        );
    }
    Ok(())
}
