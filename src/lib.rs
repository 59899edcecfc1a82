pub mod auth;
pub mod io_struct;
pub mod middleware;
pub mod proxy_state;
pub mod server;
pub mod validator;

use proxy_state::{ProxyConfig, ProxyState};
use server::startup;
use tokio::signal;

/// Build the shared state and serve until the listener fails or Ctrl+C.
pub fn run(config: ProxyConfig) -> anyhow::Result<()> {
    let proxy_state = ProxyState::new(config)?;

    actix_web::rt::System::new().block_on(async move {
        tokio::select! {
            res = startup(proxy_state) => res.map_err(anyhow::Error::from),
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down");
                Ok(())
            }
        }
    })
}
