use greencampus_core::badges::refresh_all;
use greencampus_core::error::GreenCampusResult;
use greencampus_models::Client;

pub async fn refresh_badges(client: &Client) -> GreenCampusResult<()> {
    let granted = refresh_all(client).await?;
    info!("granted badges to {} users", granted.len());
    for (user_id, badges) in &granted {
        println!("{}: {}", user_id, badges.join(", "));
    }
    Ok(())
}
