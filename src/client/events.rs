//! Lifecycle events emitted by the network client.

use std::fmt;

/// Client lifecycle events. Consumed for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    /// Connected to the upstream broker. Argument: `{ "upstream": .. }`.
    Connected,
    Booted,
    Shutdown,
    /// Argument: `{ "executionEngine": .. }`.
    EngineOffline,
    /// Argument: `{ "executionEngine": .. }`.
    EngineRegistered,
    /// Argument: `{ "executionEngine": .. }`.
    EngineDeregistered,
    /// Arguments: `(error, { "topic": .., "event": .. })`.
    TopicSubscribe,
    /// Arguments: `(error, { "topic": .., "event": .. })`.
    TopicUnsubscribe,
}

impl ClientEvent {
    /// Every lifecycle event.
    pub const ALL: [ClientEvent; 8] = [
        ClientEvent::Connected,
        ClientEvent::Booted,
        ClientEvent::Shutdown,
        ClientEvent::EngineOffline,
        ClientEvent::EngineRegistered,
        ClientEvent::EngineDeregistered,
        ClientEvent::TopicSubscribe,
        ClientEvent::TopicUnsubscribe,
    ];

    /// Event name on the client's event surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientEvent::Connected => "AIXP_CLIENT_CONNECTED",
            ClientEvent::Booted => "AIXP_CLIENT_BOOTED",
            ClientEvent::Shutdown => "AIXP_CLIENT_SHUTDOWN",
            ClientEvent::EngineOffline => "AIXP_ENGINE_OFFLINE",
            ClientEvent::EngineRegistered => "AIXP_ENGINE_REGISTERED",
            ClientEvent::EngineDeregistered => "AIXP_ENGINE_DEREGISTERED",
            ClientEvent::TopicSubscribe => "AIXP_CLIENT_SYS_TOPIC_SUBSCRIBE",
            ClientEvent::TopicUnsubscribe => "AIXP_CLIENT_SYS_TOPIC_UNSUBSCRIBE",
        }
    }

    /// Look up an event by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for event in ClientEvent::ALL {
            assert_eq!(ClientEvent::from_name(event.as_str()), Some(event));
        }
        assert_eq!(ClientEvent::from_name("ENGINE_STATUS"), None);
    }
}
