//! A byte stream that is either plain TCP or TLS.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use super::SinkError;
use crate::error::RtmpError;

/// A connected outbound stream, plain or TLS.
pub enum MaybeTlsStream {
    /// A plain TCP stream.
    Plain(TcpStream),
    /// A TLS stream over TCP.
    Tls(Box<TlsStream<TcpStream>>),
}

impl MaybeTlsStream {
    /// Wrap the TCP stream in TLS, verifying against the platform's native
    /// root certificates.
    pub(super) async fn connect_tls(host: &str, stream: TcpStream) -> Result<Self, RtmpError> {
        let mut roots = RootCertStore::empty();

        let native_certs = rustls_native_certs::load_native_certs();
        for error in &native_certs.errors {
            tracing::warn!(error = %error, "failed to load a native root certificate");
        }
        for cert in native_certs.certs {
            // Individual unparsable certificates are skipped.
            let _ = roots.add(cert);
        }

        let config = ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();

        let server_name =
            ServerName::try_from(host.to_string()).map_err(|_| SinkError::InvalidServerName(host.to_string()))?;

        let connector = TlsConnector::from(Arc::new(config));
        let stream = connector.connect(server_name, stream).await?;

        Ok(Self::Tls(Box::new(stream)))
    }
}

impl AsyncRead for MaybeTlsStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeTlsStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}
