use tokio::net::TcpListener;
use tracing::info;
use crate::http::connection::Connection;
use crate::config::Config;

/// Binds `cfg.listen_addr` and serves connections until accepting fails.
///
/// Each accepted socket is handled on its own task; the loop never waits
/// for a handler to finish. An accept error ends the loop and is returned.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("Listening on {}, serving {}", cfg.listen_addr, cfg.root.display());

    serve(listener, cfg).await
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, cfg: &Config) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let root = cfg.root.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, root);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {:#}", peer, e);
            }
        });
    }
}
