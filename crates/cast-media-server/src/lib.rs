//! HTTP/1.1 byte-range server for local files registered for Cast playback.
//! Binds IPv4-only, advertises its first non-loopback LAN address, and
//! serves `GET` requests for previously [`MediaServer::register`]ed paths
//! with `Range` support so a receiver can seek and buffer directly.

mod error;
mod mime;
mod net;
mod request;
mod response;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use md5::{Digest, Md5};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use url::Url;

pub use error::Error;
pub use mime::for_extension as mime_for_extension;

/// Upper bound on concurrent in-flight file-serving workers. A receiver
/// typically opens a handful of probe/seek connections per track; this
/// leaves generous headroom without letting a misbehaving client exhaust
/// file descriptors.
const MAX_CONCURRENT_WORKERS: usize = 32;

/// Default listen port, matching spec configuration defaults.
pub const DEFAULT_PORT: u16 = 8010;

type Registry = Arc<RwLock<BTreeMap<String, PathBuf>>>;

/// A running instance of the range server. Dropping it does not stop the
/// listener; call [`MediaServer::stop`] explicitly to tear it down
/// deterministically.
pub struct MediaServer {
    base: Url,
    registry: Registry,
    shutdown: CancellationToken,
}

impl MediaServer {
    /// The base URL (`http://<lan-ip>:<port>/`) registered URLs are built
    /// from.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Binds to `0.0.0.0:port` (IPv4-only; port 0 picks an ephemeral port)
    /// and starts accepting connections in the background. `bind_address`,
    /// if given, overrides LAN-address autodetection for the URL advertised
    /// to the receiver - useful when the host has more than one interface
    /// and autodetection picks the wrong one.
    pub async fn start(port: u16, bind_address: Option<std::net::Ipv4Addr>) -> Result<Self, Error> {
        let addr = std::net::SocketAddr::from((std::net::Ipv4Addr::UNSPECIFIED, port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| Error::Bind(addr, err))?;
        let actual_port = listener.local_addr().map_err(|err| Error::Bind(addr, err))?.port();

        let lan_ip = net::lan_ipv4(bind_address);
        let base = Url::parse(&format!("http://{lan_ip}:{actual_port}/")).map_err(|_| Error::BaseUrl)?;
        tracing::info!(%base, "media server listening");

        let registry: Registry = Arc::new(RwLock::new(BTreeMap::new()));
        let shutdown = CancellationToken::new();
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_WORKERS));

        tokio::spawn(accept_loop(
            listener,
            registry.clone(),
            semaphore,
            shutdown.clone(),
        ));

        Ok(Self {
            base,
            registry,
            shutdown,
        })
    }

    /// Stops accepting new connections and clears the registration map. Any
    /// bodies already streaming are allowed to finish; the accept loop is
    /// what actually exits, dropping the listener.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        self.registry.write().await.clear();
        tracing::info!("media server stopped");
    }

    /// Registers `local_path` for serving, returning the absolute URL the
    /// receiver should fetch. The path component is derived from the MD5 of
    /// the absolute path so repeated registrations of the same file are
    /// idempotent.
    pub async fn register(&self, local_path: &Path) -> Url {
        let absolute = local_path
            .canonicalize()
            .unwrap_or_else(|_| local_path.to_path_buf());
        let file_id = file_id(&absolute);
        let extension = absolute
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");
        let url_path = format!("/media/{file_id}.{extension}");

        self.registry
            .write()
            .await
            .insert(url_path.clone(), absolute.clone());

        let url = self.base.join(&url_path).expect("url_path is a valid relative url");
        tracing::info!(path = %absolute.display(), %url, "registered media file");
        url
    }
}

fn file_id(absolute_path: &Path) -> String {
    let mut hasher = Md5::new();
    hasher.update(absolute_path.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..16].to_owned()
}

async fn accept_loop(
    listener: TcpListener,
    registry: Registry,
    semaphore: Arc<Semaphore>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("media server accept loop exiting");
                return;
            }
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                let registry = registry.clone();
                let permit = semaphore.clone();
                tokio::spawn(async move {
                    let _permit = permit.acquire_owned().await;
                    if let Err(err) = handle_connection(socket, registry).await {
                        tracing::debug!(%peer, error = %err, "connection ended with error");
                    }
                });
            }
        }
    }
}

async fn handle_connection(mut socket: TcpStream, registry: Registry) -> std::io::Result<()> {
    let (mut reader, mut writer) = socket.split();
    let request = match request::parse(&mut reader).await? {
        Some(request) => request,
        None => return Ok(()),
    };

    if request.method != "GET" {
        response::not_found(&mut writer).await?;
        return Ok(());
    }

    let local_path = registry.read().await.get(&request.path).cloned();
    let Some(local_path) = local_path else {
        tracing::debug!(path = %request.path, "requested path not registered");
        response::not_found(&mut writer).await?;
        return Ok(());
    };

    let mut file = match tokio::fs::File::open(&local_path).await {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!(path = %local_path.display(), error = %err, "failed to open registered file");
            response::not_found(&mut writer).await?;
            return Ok(());
        }
    };
    let size = file.metadata().await?.len();
    let extension = local_path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    let mime = mime::for_extension(extension);

    response::serve_file(&mut writer, &mut file, size, mime, request.range).await
}
