use greencampus_core::error::GreenCampusResult;
use greencampus_models::{seed, Client};

use super::SeedCli;

pub async fn seed(client: &Client, args: &SeedCli) -> GreenCampusResult<()> {
    let missions = seed::seed_missions(client).await?;
    println!("Loaded {} missions", missions);
    if !args.missions_only {
        let users = seed::seed_users(client).await?;
        println!("Loaded {} demo users", users);
    }
    Ok(())
}
