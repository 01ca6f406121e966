use anyhow::{bail, Result};
use retro_core::config::WarnLevel;
use retro_server::state::AppState;
use std::path::Path;

pub fn run(config_path: &Path, port: Option<u16>) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    let warnings = config.validate();
    for w in &warnings {
        match w.level {
            WarnLevel::Error => tracing::error!("config: {}", w.message),
            WarnLevel::Warning => tracing::warn!("config: {}", w.message),
        }
    }
    if let Some(w) = warnings.iter().find(|w| w.level == WarnLevel::Error) {
        bail!("refusing to serve with an invalid config: {}", w.message);
    }

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let app = AppState::open(config, config_path)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let actual = listener.local_addr()?;
        println!("retro server → http://{actual}");

        tokio::select! {
            res = retro_server::serve_on(app, listener) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}
