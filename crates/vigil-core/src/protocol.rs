//! Wire Protocol Messages
//!
//! The four datagram kinds exchanged between the coordinator and agents.
//! Every message is textual: a tag terminated by a single colon followed by
//! the payload, except `SYSINFO_REQUEST` which is a bare literal with no
//! payload. Messages are decoded once at the receive boundary into a closed
//! variant type; everything downstream matches on the variant.

use thiserror::Error;

/// Largest datagram either role will send or accept.
pub const MAX_DATAGRAM: usize = 1024;

const DISCOVER_TAG: &str = "DISCOVER:";
const RESPONSE_TAG: &str = "RESPONSE:";
const SYSINFO_REQUEST_LITERAL: &str = "SYSINFO_REQUEST";
const SYSINFO_TAG: &str = "SYSINFO:";

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Liveness probe multicast by the coordinator. The token is echoed
    /// back verbatim and never interpreted.
    Discover { token: String },
    /// Agent reply to a probe, proving reachability.
    Response { token: String },
    /// Unicast pull request for an agent's descriptive metadata.
    SysinfoRequest,
    /// Agent metadata reply; replaces whatever the coordinator stored.
    Sysinfo { text: String },
}

/// Failure to decode an incoming datagram.
///
/// Callers drop these silently; stray traffic on the port is expected and
/// must not pollute the logs as errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("datagram is not valid utf-8")]
    NotUtf8,
    #[error("unrecognized message tag: {preview:?}")]
    UnknownTag { preview: String },
}

impl Message {
    /// Encode to wire bytes: tag plus payload, no delimiter beyond the colon.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Discover { token } => format!("{DISCOVER_TAG}{token}").into_bytes(),
            Message::Response { token } => format!("{RESPONSE_TAG}{token}").into_bytes(),
            Message::SysinfoRequest => SYSINFO_REQUEST_LITERAL.as_bytes().to_vec(),
            Message::Sysinfo { text } => format!("{SYSINFO_TAG}{text}").into_bytes(),
        }
    }

    /// Decode a received datagram.
    ///
    /// Tag matching is prefix-exact: the colon is part of the tag, so
    /// `RESPONSEX:foo` does not decode as a `Response`.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(raw).map_err(|_| DecodeError::NotUtf8)?;

        if let Some(token) = text.strip_prefix(DISCOVER_TAG) {
            return Ok(Message::Discover {
                token: token.to_string(),
            });
        }
        if let Some(token) = text.strip_prefix(RESPONSE_TAG) {
            return Ok(Message::Response {
                token: token.to_string(),
            });
        }
        if text == SYSINFO_REQUEST_LITERAL {
            return Ok(Message::SysinfoRequest);
        }
        if let Some(info) = text.strip_prefix(SYSINFO_TAG) {
            return Ok(Message::Sysinfo {
                text: info.to_string(),
            });
        }

        Err(DecodeError::UnknownTag {
            preview: text.chars().take(24).collect(),
        })
    }

    /// Tag name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Discover { .. } => "DISCOVER",
            Message::Response { .. } => "RESPONSE",
            Message::SysinfoRequest => "SYSINFO_REQUEST",
            Message::Sysinfo { .. } => "SYSINFO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_discover() {
        assert_eq!(
            Message::decode(b"DISCOVER:1000").unwrap(),
            Message::Discover {
                token: "1000".to_string()
            }
        );
    }

    #[test]
    fn test_decode_response() {
        assert_eq!(
            Message::decode(b"RESPONSE:1000").unwrap(),
            Message::Response {
                token: "1000".to_string()
            }
        );
    }

    #[test]
    fn test_decode_sysinfo_request() {
        assert_eq!(
            Message::decode(b"SYSINFO_REQUEST").unwrap(),
            Message::SysinfoRequest
        );
    }

    #[test]
    fn test_decode_sysinfo_keeps_colons_in_payload() {
        assert_eq!(
            Message::decode(b"SYSINFO:Hostname: box1").unwrap(),
            Message::Sysinfo {
                text: "Hostname: box1".to_string()
            }
        );
    }

    #[test]
    fn test_empty_token_is_valid() {
        assert_eq!(
            Message::decode(b"DISCOVER:").unwrap(),
            Message::Discover {
                token: String::new()
            }
        );
    }

    #[test]
    fn test_prefix_match_is_exact() {
        assert!(matches!(
            Message::decode(b"RESPONSEX:foo"),
            Err(DecodeError::UnknownTag { .. })
        ));
        assert!(matches!(
            Message::decode(b"RESPONSE"),
            Err(DecodeError::UnknownTag { .. })
        ));
        assert!(matches!(
            Message::decode(b"SYSINFO_REQUESTX"),
            Err(DecodeError::UnknownTag { .. })
        ));
    }

    #[test]
    fn test_non_utf8_rejected() {
        assert!(matches!(
            Message::decode(&[0xff, 0xfe, 0x00]),
            Err(DecodeError::NotUtf8)
        ));
    }

    #[test]
    fn test_encode_forms() {
        let probe = Message::Discover {
            token: "1000".to_string(),
        };
        assert_eq!(probe.encode(), b"DISCOVER:1000".to_vec());
        assert_eq!(Message::SysinfoRequest.encode(), b"SYSINFO_REQUEST".to_vec());
    }

    #[test]
    fn test_unknown_tag_preview_is_bounded() {
        let long = format!("NOISE:{}", "x".repeat(200));
        match Message::decode(long.as_bytes()) {
            Err(DecodeError::UnknownTag { preview }) => assert!(preview.len() <= 24),
            other => panic!("expected UnknownTag, got {other:?}"),
        }
    }
}
