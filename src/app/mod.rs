use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{
    config::{AppConfig, ConfigError},
    issuer::{IssuerSettings, VoucherIssuer},
    Result,
};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    /// Builds the issuer and binds the listener.
    ///
    /// Missing vendor settings do not prevent startup. Requests are answered with a
    /// configuration error until the settings are provided.
    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let issuer = match IssuerSettings::from_config(&config) {
            Ok(settings) => Ok(VoucherIssuer::from_settings(settings)?),
            Err(er) => {
                error!("{:<20} - {er}", "Issuing disabled:");
                Err(er)
            }
        };
        let app_state = AppState::new(issuer);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }
}

pub struct InternalState {
    pub issuer: core::result::Result<VoucherIssuer, ConfigError>,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(issuer: core::result::Result<VoucherIssuer, ConfigError>) -> Self {
        AppState(Arc::new(InternalState { issuer }))
    }
}
