use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;
use tokio_native_tls::{native_tls, TlsStream};
use tokio_util::codec::Framed;

use crate::codec::CastMessageCodec;
use crate::Error;

pub type CastFramed = Framed<TlsStream<TcpStream>, CastMessageCodec>;

/// Opens the TCP connection, performs the TLS handshake, and wraps the
/// stream in the length-prefixed Cast message codec. Cast receivers present
/// a self-signed certificate, so hostname and certificate verification are
/// both disabled here - the transport trusts whatever answered on the
/// advertised address, consistent with every Cast sender implementation.
///
/// `timeout` bounds only this function; the 10 second connect deadline the
/// session machine enforces around the full CONNECT/RECEIVER_STATUS
/// handshake is a separate, higher-level timeout owned by the caller.
pub async fn connect(addr: SocketAddr, timeout: Duration) -> Result<CastFramed, Error> {
    time::timeout(timeout, connect_inner(addr))
        .await
        .map_err(|_| Error::ConnectTimeout(addr))?
}

async fn connect_inner(addr: SocketAddr) -> Result<CastFramed, Error> {
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_hostnames(true)
        .danger_accept_invalid_certs(true)
        .build()?;
    let connector = tokio_native_tls::TlsConnector::from(connector);

    tracing::info!(%addr, "opening tls connection to cast device");
    let socket = TcpStream::connect(addr).await?;
    let socket = connector.connect(&addr.ip().to_string(), socket).await?;
    tracing::info!(%addr, "tls connection established");

    Ok(Framed::new(socket, CastMessageCodec::default()))
}
