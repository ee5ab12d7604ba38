//! `ws://` and `wss://` URL parsing for the connecting side.

use std::io;

use url::Url;

use crate::stream::ConnectionInfo;
use crate::ws::Error;

/// Parses a websocket url into connection info, the request path (with any
/// query string) and a secure flag. Default ports are 80 for `ws` and 443
/// for `wss`.
pub fn parse_url(url: &str) -> Result<(ConnectionInfo, String, bool), Error> {
    let url = Url::parse(url)?;
    let connection_info = ConnectionInfo::try_from(url.clone())?;
    let endpoint = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    let secure = match url.scheme() {
        "ws" => false,
        "wss" => true,
        scheme => Err(io::Error::other(format!("unrecognised url scheme: {scheme}")))?,
    };
    Ok((connection_info, endpoint, secure))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_plain_url_with_default_port() {
        let (info, endpoint, secure) = parse_url("ws://example.com/stream").unwrap();
        assert_eq!(ConnectionInfo::new("example.com", 80), info);
        assert_eq!("/stream", endpoint);
        assert!(!secure);
    }

    #[test]
    fn should_parse_secure_url_with_default_port() {
        let (info, endpoint, secure) = parse_url("wss://example.com").unwrap();
        assert_eq!(ConnectionInfo::new("example.com", 443), info);
        assert_eq!("/", endpoint);
        assert!(secure);
    }

    #[test]
    fn should_parse_explicit_port_and_query() {
        let (info, endpoint, secure) = parse_url("ws://example.com:9001/stream?channel=7").unwrap();
        assert_eq!(ConnectionInfo::new("example.com", 9001), info);
        assert_eq!("/stream?channel=7", endpoint);
        assert!(!secure);
    }

    #[test]
    fn should_reject_unknown_scheme() {
        assert!(parse_url("http://example.com").is_err());
    }
}
