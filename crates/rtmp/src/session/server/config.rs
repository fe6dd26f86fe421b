//! Server configuration.
//!
//! The TCP/TLS accept loop itself lives outside this crate; sessions are
//! generic over the byte stream. These records name the contract an external
//! listener honors and build the TLS acceptor for it.

use std::sync::Arc;
use std::time::Duration;

use serde_derive::Deserialize;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::pki_types::pem::PemObject;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::server::WebPkiClientVerifier;
use tokio_rustls::rustls::{RootCertStore, ServerConfig as RustlsServerConfig};

/// Errors that can occur while building the TLS acceptor.
#[derive(Debug, thiserror::Error)]
pub enum TlsConfigError {
    /// Failed to load a PEM file.
    #[error("pem: {0}")]
    Pem(#[from] tokio_rustls::rustls::pki_types::pem::Error),
    /// rustls rejected the configuration.
    #[error("rustls: {0}")]
    Rustls(#[from] tokio_rustls::rustls::Error),
    /// The client certificate verifier could not be built.
    #[error("client verifier: {0}")]
    ClientVerifier(#[from] tokio_rustls::rustls::server::VerifierBuilderError),
    /// Client verification was requested without a CA certificate file.
    #[error("verify_peer requires a cacertfile")]
    MissingCaCertFile,
}

/// Whether to request and verify client certificates during the TLS
/// handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SslVerify {
    /// Do not request a client certificate.
    #[default]
    VerifyNone,
    /// Request and verify the client certificate against `cacertfile`.
    VerifyPeer,
}

/// TLS options for an RTMPS listener.
///
/// The listen-time fields (`certfile`, `keyfile`, `cacertfile`, `password`,
/// `versions`) describe the identity the listener presents; the
/// handshake-time fields (`verify`, `fail_if_no_peer_cert`) describe how
/// each accepted connection is negotiated. Both sets are evaluated once,
/// when [`acceptor`](SslOptions::acceptor) is called.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SslOptions {
    /// Path to the PEM certificate chain file.
    pub certfile: String,
    /// Path to the PEM private key file.
    pub keyfile: String,
    /// Path to the PEM CA certificate file used to verify client
    /// certificates.
    #[serde(default)]
    pub cacertfile: Option<String>,
    /// Password for an encrypted private key.
    ///
    /// Encrypted keys are not supported by the TLS backend; set this only to
    /// document the deployment, the key must be decrypted on disk.
    #[serde(default)]
    pub password: Option<String>,
    /// TLS protocol versions to offer, e.g. `["tlsv1.2", "tlsv1.3"]`.
    /// Offers both when empty.
    #[serde(default)]
    pub versions: Vec<String>,
    /// Whether to request and verify client certificates.
    #[serde(default)]
    pub verify: SslVerify,
    /// Reject clients that do not present a certificate when `verify` is
    /// [`SslVerify::VerifyPeer`].
    #[serde(default)]
    pub fail_if_no_peer_cert: bool,
}

impl SslOptions {
    /// Build a [`TlsAcceptor`] from these options.
    pub fn acceptor(&self) -> Result<TlsAcceptor, TlsConfigError> {
        if self.password.is_some() {
            tracing::warn!("encrypted private keys are not supported, the password option is ignored");
        }

        if self.verify == SslVerify::VerifyPeer && self.cacertfile.is_none() {
            return Err(TlsConfigError::MissingCaCertFile);
        }

        let certs = CertificateDer::pem_file_iter(&self.certfile)?.collect::<Result<Vec<_>, _>>()?;
        let key = PrivateKeyDer::from_pem_file(&self.keyfile)?;

        let versions = self.protocol_versions();
        let builder = RustlsServerConfig::builder_with_protocol_versions(&versions);

        let config = match self.verify {
            SslVerify::VerifyNone => builder.with_no_client_auth().with_single_cert(certs, key)?,
            SslVerify::VerifyPeer => {
                let cacertfile = self.cacertfile.as_ref().expect("checked above");

                let mut roots = RootCertStore::empty();
                for cert in CertificateDer::pem_file_iter(cacertfile)? {
                    roots.add(cert?)?;
                }

                let mut verifier = WebPkiClientVerifier::builder(Arc::new(roots));
                if !self.fail_if_no_peer_cert {
                    verifier = verifier.allow_unauthenticated();
                }

                builder
                    .with_client_cert_verifier(verifier.build()?)
                    .with_single_cert(certs, key)?
            }
        };

        Ok(TlsAcceptor::from(Arc::new(config)))
    }

    fn protocol_versions(&self) -> Vec<&'static tokio_rustls::rustls::SupportedProtocolVersion> {
        if self.versions.is_empty() {
            return vec![&tokio_rustls::rustls::version::TLS12, &tokio_rustls::rustls::version::TLS13];
        }

        self.versions
            .iter()
            .filter_map(|version| match version.as_str() {
                "tlsv1.2" => Some(&tokio_rustls::rustls::version::TLS12),
                "tlsv1.3" => Some(&tokio_rustls::rustls::version::TLS13),
                other => {
                    tracing::warn!(version = %other, "unsupported tls version, skipping");
                    None
                }
            })
            .collect()
    }
}

/// Configuration an RTMP listener hands to its sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// The port to listen on.
    pub port: u16,
    /// Whether the listener speaks TLS (rtmps).
    #[serde(default)]
    pub use_ssl: bool,
    /// TLS options; required when `use_ssl` is set.
    #[serde(default)]
    pub ssl_options: Option<SslOptions>,
    /// Bounds the time between accepting a publish command and the first
    /// demand for data.
    #[serde(default = "default_client_timeout", with = "duration_millis")]
    pub client_timeout: Duration,
    /// An optional name for the server, used in logs.
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 1935,
            use_ssl: false,
            ssl_options: None,
            client_timeout: default_client_timeout(),
            name: None,
        }
    }
}

fn default_client_timeout() -> Duration {
    Duration::from_secs(5)
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
