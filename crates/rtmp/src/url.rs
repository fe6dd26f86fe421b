//! RTMP URL parsing.
//!
//! URLs have the shape `rtmp://host:port/app/stream_key` or
//! `rtmps://host:port/app/stream_key`. The port defaults to 1935 for rtmp
//! and 443 for rtmps; an absent stream key is treated as the empty string
//! (whether that is acceptable is up to the stream validator).

/// Errors that can occur while parsing an RTMP URL.
#[derive(Debug, thiserror::Error)]
pub enum RtmpUrlError {
    /// The URL does not start with `rtmp://` or `rtmps://`.
    #[error("invalid scheme, expected rtmp:// or rtmps://")]
    InvalidScheme,
    /// The URL has no host.
    #[error("missing host")]
    MissingHost,
    /// The port is not a number in range.
    #[error("invalid port: {0}")]
    InvalidPort(String),
    /// The URL path carries no app segment.
    #[error("missing app")]
    MissingApp,
}

/// A parsed RTMP URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtmpUrl {
    /// Whether the scheme selects TLS (`rtmps`).
    pub use_tls: bool,
    /// The host to connect to.
    pub host: String,
    /// The port to connect to.
    pub port: u16,
    /// The app name (first path segment).
    pub app: String,
    /// The stream key (rest of the path); empty if absent.
    pub stream_key: String,
}

impl RtmpUrl {
    /// Parse an RTMP URL.
    pub fn parse(url: &str) -> Result<Self, RtmpUrlError> {
        let (use_tls, rest) = if let Some(rest) = url.strip_prefix("rtmp://") {
            (false, rest)
        } else if let Some(rest) = url.strip_prefix("rtmps://") {
            (true, rest)
        } else {
            return Err(RtmpUrlError::InvalidScheme);
        };

        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, path),
            None => (rest, ""),
        };

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| RtmpUrlError::InvalidPort(port.to_string()))?;
                (host, port)
            }
            None => (authority, if use_tls { 443 } else { 1935 }),
        };

        if host.is_empty() {
            return Err(RtmpUrlError::MissingHost);
        }

        let (app, stream_key) = match path.split_once('/') {
            Some((app, stream_key)) => (app, stream_key),
            None => (path, ""),
        };

        if app.is_empty() {
            return Err(RtmpUrlError::MissingApp);
        }

        Ok(Self {
            use_tls,
            host: host.to_string(),
            port,
            app: app.to_string(),
            stream_key: stream_key.to_string(),
        })
    }

    /// The tcUrl to send in the connect command.
    pub fn tc_url(&self) -> String {
        let scheme = if self.use_tls { "rtmps" } else { "rtmp" };
        format!("{}://{}:{}/{}", scheme, self.host, self.port, self.app)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn parse_full_url() {
        let url = RtmpUrl::parse("rtmp://localhost:1936/live/stream-key").unwrap();

        assert!(!url.use_tls);
        assert_eq!(url.host, "localhost");
        assert_eq!(url.port, 1936);
        assert_eq!(url.app, "live");
        assert_eq!(url.stream_key, "stream-key");
        assert_eq!(url.tc_url(), "rtmp://localhost:1936/live");
    }

    #[test]
    fn default_ports() {
        assert_eq!(RtmpUrl::parse("rtmp://example.com/live/key").unwrap().port, 1935);
        assert_eq!(RtmpUrl::parse("rtmps://example.com/live/key").unwrap().port, 443);
    }

    #[test]
    fn rtmps_selects_tls() {
        assert!(RtmpUrl::parse("rtmps://example.com/live/key").unwrap().use_tls);
    }

    #[test]
    fn stream_key_may_be_absent() {
        let url = RtmpUrl::parse("rtmp://example.com/live").unwrap();
        assert_eq!(url.app, "live");
        assert_eq!(url.stream_key, "");
    }

    #[test]
    fn stream_key_may_contain_slashes() {
        let url = RtmpUrl::parse("rtmp://example.com/live/a/b").unwrap();
        assert_eq!(url.app, "live");
        assert_eq!(url.stream_key, "a/b");
    }

    #[test]
    fn invalid_urls() {
        assert!(matches!(RtmpUrl::parse("http://example.com/live"), Err(RtmpUrlError::InvalidScheme)));
        assert!(matches!(RtmpUrl::parse("rtmp:///live/key"), Err(RtmpUrlError::MissingHost)));
        assert!(matches!(RtmpUrl::parse("rtmp://example.com"), Err(RtmpUrlError::MissingApp)));
        assert!(matches!(
            RtmpUrl::parse("rtmp://example.com:notaport/live"),
            Err(RtmpUrlError::InvalidPort(_))
        ));
    }
}
