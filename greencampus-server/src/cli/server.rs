use greencampus_core::config::Configuration;
use greencampus_core::error::{GreenCampusError, GreenCampusResult};
use greencampus_core::package_full;
use greencampus_core::state::GreenCampusState;
use greencampus_dependencies::axum;

pub async fn server_start(config: Configuration) -> GreenCampusResult<()> {
    info!("Starting {} with config {:?}", package_full(), config);
    let listen_on = config.listen_on;
    let state = GreenCampusState::new(config).await?;
    debug!("Configuring application server");
    let router = crate::api::router(state);

    info!("Listening on http://{}", listen_on);
    let server = axum::Server::bind(&listen_on).serve(router.into_make_service());
    if let Err(e) = server.await {
        error!("server error exit: {:?}", e);
        return Err(GreenCampusError::Other(e.to_string()));
    }
    warn!("server exited cleanly but unexpectedly");
    Ok(())
}
