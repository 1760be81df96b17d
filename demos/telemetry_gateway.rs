//! Telemetry gateway demo.
//!
//! Boots an in-process client, binds one gateway and one client consumer,
//! then replays a few engine events through it.
//!
//! ```text
//! RUST_LOG=debug cargo run --example telemetry_gateway
//! ```

use std::sync::Arc;
use std::time::Duration;

use aixpand_gateway::client::{ClientEvent, LocalClient, NetworkClient};
use aixpand_gateway::component::ComponentRegistry;
use aixpand_gateway::metadata::{Declaration, ParamRole};
use aixpand_gateway::module::{AsyncModuleOptions, ClientOptions, GatewayModule};
use aixpand_gateway::router::Arguments;
use aixpand_gateway::{ClientSlot, Component, Result};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct EngineStatus {
    node: String,
    cpu: f64,
}

struct TelemetryGateway;

impl TelemetryGateway {
    fn on_status(&self, args: Arguments) {
        match args.decode::<EngineStatus>(0) {
            Ok(Some(status)) => tracing::info!(
                node = %status.node,
                cpu = status.cpu,
                context = ?args.get(1),
                "Engine status"
            ),
            Ok(None) => tracing::warn!("Engine status without payload"),
            Err(e) => tracing::warn!(error = %e, "Malformed engine status"),
        }
    }

    fn on_heartbeat(&self, args: Arguments) {
        tracing::info!(message = ?args.get(0), "Heartbeat");
    }

    fn on_offline(&self, args: Arguments) {
        tracing::warn!(engine = ?args.get(0), "Engine went offline");
    }
}

impl Component for TelemetryGateway {
    fn declare(decl: &mut Declaration<'_, Self>) {
        decl.gateway();
        decl.method("on_status", Self::on_status)
            .payload("ENGINE_STATUS")
            .params(&[ParamRole::Payload, ParamRole::Context]);
        decl.method("on_heartbeat", Self::on_heartbeat)
            .stream("HEARTBEAT");
        decl.method("on_offline", Self::on_offline)
            .client_event(ClientEvent::EngineOffline.as_str());
    }
}

struct CommandPublisher {
    client: ClientSlot,
}

impl Component for CommandPublisher {
    fn declare(decl: &mut Declaration<'_, Self>) {
        decl.client_property("client", |p: &Self| &p.client);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let local = Arc::new(LocalClient::default());
    let shared = local.clone();
    let options = AsyncModuleOptions::use_factory(
        || async {
            ClientOptions::from_toml_str(
                r#"
                fleet = ["edge-1"]

                [upstream]
                url = "mqtt://broker.local:1883"
                "#,
            )
        },
        move |_: &ClientOptions| -> Result<Arc<dyn NetworkClient>> { Ok(shared.clone()) },
    )
    .name("telemetry");

    let publisher = Arc::new(CommandPublisher {
        client: ClientSlot::new(),
    });
    let components = ComponentRegistry::new()
        .with(Arc::new(TelemetryGateway))
        .with(publisher.clone());

    let module = GatewayModule::register_async(options, components).await?;
    if let Some(summary) = module.on_application_bootstrap()? {
        tracing::info!(?summary, "Gateways bound");
    }
    tracing::info!(bound = publisher.client.is_bound(), "Command publisher ready");

    local.emit(
        "ENGINE_STATUS",
        vec![
            json!({"engine": "edge-1"}),
            json!(null),
            json!({"node": "edge-1", "cpu": 12.5}),
        ],
    );
    for seq in 0..3 {
        local.publish("HEARTBEAT", json!({ "seq": seq }));
    }
    local.emit_event(ClientEvent::EngineOffline, vec![json!("edge-1")]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    module.on_application_shutdown().await;
    Ok(())
}
