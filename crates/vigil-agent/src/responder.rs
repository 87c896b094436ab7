//! Reactive Message Handler
//!
//! Answers discovery probes, remembers who probed us, and answers metadata
//! pulls toward that remembered coordinator.

use std::net::SocketAddr;

use tracing::{debug, info, trace};
use vigil_core::Message;

/// The agent's entire state: its descriptor and the last known coordinator.
#[derive(Debug)]
pub struct Responder {
    /// Payload for SYSINFO replies.
    descriptor: String,
    /// Address of the last coordinator that probed us. Metadata requests
    /// arrive unicast, so the reply must target this address rather than
    /// the multicast group.
    coordinator: Option<SocketAddr>,
}

impl Responder {
    pub fn new(descriptor: String) -> Self {
        Self {
            descriptor,
            coordinator: None,
        }
    }

    /// React to one decoded message.
    ///
    /// Pure with respect to I/O: the only side effect is updating the
    /// remembered coordinator, and the reply (if any) is returned together
    /// with its destination for the caller to send.
    pub fn handle(&mut self, message: Message, from: SocketAddr) -> Option<(Message, SocketAddr)> {
        let kind = message.kind();
        match message {
            Message::Discover { token } => {
                if self.coordinator != Some(from) {
                    info!(coordinator = %from, "Coordinator address updated");
                }
                self.coordinator = Some(from);
                trace!(coordinator = %from, token = %token, "Answering discovery probe");
                Some((Message::Response { token }, from))
            }
            Message::SysinfoRequest => match self.coordinator {
                Some(dest) => Some((
                    Message::Sysinfo {
                        text: self.descriptor.clone(),
                    },
                    dest,
                )),
                None => {
                    debug!(from = %from, "Metadata request before any probe, no coordinator to answer");
                    None
                }
            },
            Message::Response { .. } | Message::Sysinfo { .. } => {
                trace!(from = %from, kind = kind, "Ignoring message not addressed to this role");
                None
            }
        }
    }

    pub fn coordinator(&self) -> Option<SocketAddr> {
        self.coordinator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    fn responder() -> Responder {
        Responder::new("Hostname: box1".to_string())
    }

    #[test]
    fn test_probe_is_echoed_and_coordinator_remembered() {
        let mut responder = responder();
        let coordinator = addr("10.0.0.1:12345");

        let reply = responder.handle(
            Message::Discover {
                token: "1000".to_string(),
            },
            coordinator,
        );

        assert_eq!(
            reply,
            Some((
                Message::Response {
                    token: "1000".to_string()
                },
                coordinator
            ))
        );
        assert_eq!(responder.coordinator(), Some(coordinator));
    }

    #[test]
    fn test_metadata_request_before_any_probe_is_unanswerable() {
        let mut responder = responder();

        let reply = responder.handle(Message::SysinfoRequest, addr("10.0.0.1:12345"));

        assert_eq!(reply, None);
        assert_eq!(responder.coordinator(), None);
    }

    #[test]
    fn test_metadata_goes_to_the_remembered_coordinator() {
        let mut responder = responder();
        let coordinator = addr("10.0.0.1:12345");
        responder.handle(
            Message::Discover {
                token: "1".to_string(),
            },
            coordinator,
        );

        let reply = responder.handle(Message::SysinfoRequest, coordinator);

        assert_eq!(
            reply,
            Some((
                Message::Sysinfo {
                    text: "Hostname: box1".to_string()
                },
                coordinator
            ))
        );
    }

    #[test]
    fn test_newer_probe_overwrites_the_remembered_coordinator() {
        let mut responder = responder();
        let first = addr("10.0.0.1:12345");
        let second = addr("10.0.0.2:12345");

        responder.handle(
            Message::Discover {
                token: "1".to_string(),
            },
            first,
        );
        responder.handle(
            Message::Discover {
                token: "2".to_string(),
            },
            second,
        );

        let reply = responder.handle(Message::SysinfoRequest, second);
        assert_eq!(reply.map(|(_, dest)| dest), Some(second));
    }

    #[test]
    fn test_coordinator_bound_messages_are_ignored() {
        let mut responder = responder();
        let src = addr("10.0.0.1:12345");

        assert_eq!(
            responder.handle(
                Message::Response {
                    token: "1".to_string()
                },
                src
            ),
            None
        );
        assert_eq!(
            responder.handle(
                Message::Sysinfo {
                    text: "x".to_string()
                },
                src
            ),
            None
        );
        assert_eq!(responder.coordinator(), None);
    }
}
