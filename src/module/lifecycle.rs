//! Diagnostic logging for client lifecycle events.

use std::sync::Arc;

use serde_json::Value;

use crate::client::{ClientEvent, NetworkClient};

/// Log every lifecycle event `client` emits.
pub(crate) fn attach_lifecycle_logging(client: &dyn NetworkClient) {
    client.on(
        ClientEvent::Connected.as_str(),
        Arc::new(|args: &[Value]| {
            tracing::info!(
                "Successfully connected to upstream: {}",
                field(args.first(), "upstream")
            );
        }),
    );

    client.on(
        ClientEvent::Booted.as_str(),
        Arc::new(|_: &[Value]| tracing::info!("AiXpand Network client successfully booted.")),
    );

    client.on(
        ClientEvent::Shutdown.as_str(),
        Arc::new(|_: &[Value]| tracing::info!("AiXpand Network client successfully shutdown.")),
    );

    client.on(
        ClientEvent::EngineOffline.as_str(),
        Arc::new(|args: &[Value]| {
            tracing::warn!(
                "Execution Engine OFFLINE: {}",
                field(args.first(), "executionEngine")
            );
        }),
    );

    client.on(
        ClientEvent::EngineRegistered.as_str(),
        Arc::new(|args: &[Value]| {
            tracing::info!(
                "Successfully REGISTERED new Execution Engine: {}",
                field(args.first(), "executionEngine")
            );
        }),
    );

    client.on(
        ClientEvent::EngineDeregistered.as_str(),
        Arc::new(|args: &[Value]| {
            tracing::info!(
                "Successfully DEREGISTERED Execution Engine: {}",
                field(args.first(), "executionEngine")
            );
        }),
    );

    client.on(
        ClientEvent::TopicSubscribe.as_str(),
        Arc::new(|args: &[Value]| {
            if let Some(err) = reported_error(args) {
                tracing::error!(error = %err, "{}", error_message(err));
                return;
            }
            let data = args.get(1);
            tracing::info!(
                "Successfully subscribed to network topic \"{}\" for \"{}\" network events.",
                field(data, "topic"),
                field(data, "event")
            );
        }),
    );

    client.on(
        ClientEvent::TopicUnsubscribe.as_str(),
        Arc::new(|args: &[Value]| {
            if let Some(err) = reported_error(args) {
                tracing::error!(error = %err, "{}", error_message(err));
                return;
            }
            let data = args.get(1);
            tracing::info!(
                "Successfully unsubscribed from network topic \"{}\" for \"{}\" network events.",
                field(data, "topic"),
                field(data, "event")
            );
        }),
    );
}

/// The error argument of a `(error, data)` emission, if it reports one.
fn reported_error(args: &[Value]) -> Option<&Value> {
    args.first().filter(|err| !err.is_null())
}

fn error_message(err: &Value) -> String {
    match err.get("message").and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None => err.to_string(),
    }
}

/// Display text of `value[key]`; strings unquoted, missing as `unknown`.
fn field(value: Option<&Value>, key: &str) -> String {
    match value.and_then(|v| v.get(key)) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LocalClient;
    use serde_json::json;

    #[test]
    fn test_attaches_every_lifecycle_event() {
        let client = LocalClient::default();
        attach_lifecycle_logging(&client);

        for event in ClientEvent::ALL {
            assert_eq!(client.listener_count(event.as_str()), 1, "{event}");
        }
    }

    #[test]
    fn test_field() {
        let data = json!({"topic": "t/1", "seq": 3});

        assert_eq!(field(Some(&data), "topic"), "t/1");
        assert_eq!(field(Some(&data), "seq"), "3");
        assert_eq!(field(Some(&data), "event"), "unknown");
        assert_eq!(field(None, "topic"), "unknown");
    }

    #[test]
    fn test_reported_error() {
        assert!(reported_error(&[Value::Null, json!({})]).is_none());
        assert!(reported_error(&[]).is_none());

        let args = [json!({"message": "denied"}), Value::Null];
        let err = reported_error(&args).unwrap();
        assert_eq!(error_message(err), "denied");
        assert_eq!(error_message(&json!("plain")), "\"plain\"");
    }

    #[test]
    fn test_listeners_tolerate_malformed_arguments() {
        let client = LocalClient::default();
        attach_lifecycle_logging(&client);

        for event in ClientEvent::ALL {
            client.emit_event(event, vec![]);
            client.emit_event(event, vec![json!(1), json!("x")]);
        }
    }
}
