//! Module boundary - client construction, the binding pass and shutdown.
//!
//! The [`GatewayModule`] owns the single client of one configured name:
//! 1. Resolve options (static, or from an async options factory)
//! 2. Construct the client through a [`ClientConnector`]
//! 3. Attach lifecycle logging and boot the client
//! 4. On bootstrap, run the discovery-and-binding pass once
//! 5. On shutdown, ask the client to shut down once
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aixpand_gateway::client::{LocalClient, NetworkClient};
//! use aixpand_gateway::component::ComponentRegistry;
//! use aixpand_gateway::module::{ClientOptions, GatewayModule};
//! use aixpand_gateway::Result;
//!
//! let connector = |options: &ClientOptions| -> Result<Arc<dyn NetworkClient>> {
//!     Ok(Arc::new(LocalClient::new(options.clone())))
//! };
//!
//! let module = GatewayModule::register(
//!     ClientOptions::default(),
//!     &connector,
//!     ComponentRegistry::new(),
//! )?;
//! assert_eq!(module.name(), "default");
//! # Ok::<(), aixpand_gateway::GatewayError>(())
//! ```

mod lifecycle;
mod options;

pub use options::{ClientOptions, UpstreamOptions};

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::client::{BoxFuture, NetworkClient};
use crate::component::ComponentRegistry;
use crate::error::Result;
use crate::service::{BindingSummary, GatewayService};
use lifecycle::attach_lifecycle_logging;

/// Name of the client when none is configured.
pub const DEFAULT_CLIENT_NAME: &str = "default";

/// Constructs a client from options. The module boots what it returns.
pub trait ClientConnector: Send + Sync {
    /// Build an unbooted client.
    fn connect(&self, options: &ClientOptions) -> Result<Arc<dyn NetworkClient>>;
}

impl<F> ClientConnector for F
where
    F: Fn(&ClientOptions) -> Result<Arc<dyn NetworkClient>> + Send + Sync,
{
    fn connect(&self, options: &ClientOptions) -> Result<Arc<dyn NetworkClient>> {
        self(options)
    }
}

/// Produces options asynchronously, given the configured client name.
pub trait OptionsFactory: Send + Sync {
    fn create_options<'a>(&'a self, name: Option<&'a str>) -> BoxFuture<'a, Result<ClientOptions>>;
}

type OptionsFn = Box<dyn Fn() -> BoxFuture<'static, Result<ClientOptions>> + Send + Sync>;

type ClientFactoryFn =
    Box<dyn Fn(ClientOptions) -> BoxFuture<'static, Result<Arc<dyn NetworkClient>>> + Send + Sync>;

enum OptionsSource {
    Factory(OptionsFn),
    Provider(Arc<dyn OptionsFactory>),
}

enum ClientSource {
    Connector(Arc<dyn ClientConnector>),
    /// Returns a ready client; the module neither boots it nor attaches
    /// lifecycle logging.
    Factory(ClientFactoryFn),
}

/// Options for [`GatewayModule::register_async`].
pub struct AsyncModuleOptions {
    name: Option<String>,
    options: OptionsSource,
    client: ClientSource,
}

impl AsyncModuleOptions {
    /// Resolve options by awaiting `factory`.
    pub fn use_factory<F, Fut, C>(factory: F, connector: C) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ClientOptions>> + Send + 'static,
        C: ClientConnector + 'static,
    {
        let factory: OptionsFn =
            Box::new(move || -> BoxFuture<'static, Result<ClientOptions>> { Box::pin(factory()) });
        Self {
            name: None,
            options: OptionsSource::Factory(factory),
            client: ClientSource::Connector(Arc::new(connector)),
        }
    }

    /// Resolve options from `provider`, passing it the configured name.
    pub fn use_provider<C>(provider: Arc<dyn OptionsFactory>, connector: C) -> Self
    where
        C: ClientConnector + 'static,
    {
        Self {
            name: None,
            options: OptionsSource::Provider(provider),
            client: ClientSource::Connector(Arc::new(connector)),
        }
    }

    /// Override the client name produced by the options source.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build the client with `factory` instead of the connector. The
    /// factory is responsible for booting the client.
    pub fn client_factory<F, Fut>(mut self, factory: F) -> Self
    where
        F: Fn(ClientOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn NetworkClient>>> + Send + 'static,
    {
        let factory: ClientFactoryFn = Box::new(
            move |options| -> BoxFuture<'static, Result<Arc<dyn NetworkClient>>> {
                Box::pin(factory(options))
            },
        );
        self.client = ClientSource::Factory(factory);
        self
    }
}

/// Owns the client and drives the gateway lifecycle.
pub struct GatewayModule {
    name: String,
    client: Arc<dyn NetworkClient>,
    service: GatewayService,
    shut_down: AtomicBool,
}

impl GatewayModule {
    /// Construct and boot the client from static options.
    pub fn register<C>(
        options: ClientOptions,
        connector: &C,
        components: ComponentRegistry,
    ) -> Result<Self>
    where
        C: ClientConnector + ?Sized,
    {
        let client = Self::create_client(&options, connector)?;
        Ok(Self::assemble(options.name, client, components))
    }

    /// Resolve options asynchronously, then construct the client. Any
    /// failure is returned and the module is not created.
    pub async fn register_async(
        options: AsyncModuleOptions,
        components: ComponentRegistry,
    ) -> Result<Self> {
        let AsyncModuleOptions {
            name,
            options,
            client,
        } = options;

        let mut resolved = match options {
            OptionsSource::Factory(factory) => factory().await?,
            OptionsSource::Provider(provider) => provider.create_options(name.as_deref()).await?,
        };
        if let Some(name) = name {
            resolved.name = name;
        }

        let client = match client {
            ClientSource::Connector(connector) => {
                Self::create_client(&resolved, connector.as_ref())?
            }
            ClientSource::Factory(factory) => {
                resolved.validate()?;
                factory(resolved.clone()).await?
            }
        };

        Ok(Self::assemble(resolved.name, client, components))
    }

    fn create_client<C>(options: &ClientOptions, connector: &C) -> Result<Arc<dyn NetworkClient>>
    where
        C: ClientConnector + ?Sized,
    {
        options.validate()?;
        let client = connector.connect(options)?;
        attach_lifecycle_logging(client.as_ref());
        client.boot()?;
        Ok(client)
    }

    fn assemble(name: String, client: Arc<dyn NetworkClient>, components: ComponentRegistry) -> Self {
        let service = GatewayService::new(client.clone(), Arc::new(components));
        Self {
            name,
            client,
            service,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Configured client name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The client singleton.
    pub fn client(&self) -> &Arc<dyn NetworkClient> {
        &self.client
    }

    /// The binding service.
    pub fn service(&self) -> &GatewayService {
        &self.service
    }

    /// Run the discovery-and-binding pass. The host is ready once this
    /// returns `Ok`.
    pub fn on_application_bootstrap(&self) -> Result<Option<BindingSummary>> {
        self.service.subscribe()
    }

    /// Shut the client down. Runs at most once; a failure is logged and
    /// not returned.
    pub async fn on_application_shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            tracing::debug!(client = %self.name, "Client shutdown already requested");
            return;
        }

        if let Err(e) = self.client.shutdown().await {
            tracing::error!(client = %self.name, "{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientEvent, LocalClient};
    use crate::error::GatewayError;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn shared(client: Arc<LocalClient>) -> impl ClientConnector {
        move |_: &ClientOptions| -> Result<Arc<dyn NetworkClient>> { Ok(client.clone()) }
    }

    struct NamedOptions;

    impl OptionsFactory for NamedOptions {
        fn create_options<'a>(
            &'a self,
            name: Option<&'a str>,
        ) -> BoxFuture<'a, Result<ClientOptions>> {
            Box::pin(async move {
                let upstream = format!("mqtt://{}.local:1883", name.unwrap_or("anonymous"));
                let mut options = ClientOptions::default();
                options.upstream.url = upstream;
                Ok(options)
            })
        }
    }

    #[test]
    fn test_register_boots_client() {
        let client = Arc::new(LocalClient::default());
        let module = GatewayModule::register(
            ClientOptions::default().with_name("edge"),
            &shared(client.clone()),
            ComponentRegistry::new(),
        )
        .unwrap();

        assert_eq!(module.name(), "edge");
        assert_eq!(client.boot_count(), 1);
        assert_eq!(client.listener_count(ClientEvent::Booted.as_str()), 1);
        assert_eq!(client.listener_count(ClientEvent::TopicSubscribe.as_str()), 1);
    }

    #[test]
    fn test_register_rejects_invalid_options() {
        let calls = AtomicUsize::new(0);
        let connector = |_: &ClientOptions| -> Result<Arc<dyn NetworkClient>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(LocalClient::default()))
        };

        let result = GatewayModule::register(
            ClientOptions::default().with_name(""),
            &connector,
            ComponentRegistry::new(),
        );

        assert!(matches!(result, Err(GatewayError::InvalidConfig(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_register_fails_when_boot_fails() {
        let client = Arc::new(LocalClient::default());
        client.boot().unwrap();

        let result = GatewayModule::register(
            ClientOptions::default(),
            &shared(client),
            ComponentRegistry::new(),
        );
        assert!(matches!(result, Err(GatewayError::Client(_))));
    }

    #[tokio::test]
    async fn test_register_async_factory_with_name_override() {
        let client = Arc::new(LocalClient::default());
        let options = AsyncModuleOptions::use_factory(
            || async { Ok(ClientOptions::default().with_name("from-factory")) },
            shared(client.clone()),
        )
        .name("override");

        let module = GatewayModule::register_async(options, ComponentRegistry::new())
            .await
            .unwrap();

        assert_eq!(module.name(), "override");
        assert_eq!(client.boot_count(), 1);
    }

    #[tokio::test]
    async fn test_register_async_provider_receives_name() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let record = seen.clone();
        let connector = move |options: &ClientOptions| -> Result<Arc<dyn NetworkClient>> {
            *record.lock() = Some(options.upstream.url.clone());
            Ok(Arc::new(LocalClient::new(options.clone())))
        };

        let options =
            AsyncModuleOptions::use_provider(Arc::new(NamedOptions), connector).name("edge");
        let module = GatewayModule::register_async(options, ComponentRegistry::new())
            .await
            .unwrap();

        assert_eq!(module.name(), "edge");
        assert_eq!(seen.lock().as_deref(), Some("mqtt://edge.local:1883"));
    }

    #[tokio::test]
    async fn test_options_factory_failure_is_fatal() {
        let client = Arc::new(LocalClient::default());
        let options = AsyncModuleOptions::use_factory(
            || async { Err(GatewayError::OptionsFactory("vault sealed".into())) },
            shared(client.clone()),
        );

        let result = GatewayModule::register_async(options, ComponentRegistry::new()).await;

        assert!(matches!(result, Err(GatewayError::OptionsFactory(_))));
        assert_eq!(client.boot_count(), 0);
    }

    #[tokio::test]
    async fn test_client_factory_owns_boot() {
        let client = Arc::new(LocalClient::default());
        let produced = client.clone();
        let options = AsyncModuleOptions::use_factory(
            || async { Ok(ClientOptions::default()) },
            shared(client.clone()),
        )
        .client_factory(move |_options| {
            let client = produced.clone();
            async move { Ok(client as Arc<dyn NetworkClient>) }
        });

        let module = GatewayModule::register_async(options, ComponentRegistry::new())
            .await
            .unwrap();

        assert_eq!(client.boot_count(), 0);
        assert_eq!(client.listener_count(ClientEvent::Booted.as_str()), 0);
        assert_eq!(module.name(), DEFAULT_CLIENT_NAME);
    }

    #[tokio::test]
    async fn test_shutdown_failure_swallowed_and_called_once() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let client = Arc::new(LocalClient::default().with_shutdown_failure("broker gone"));
        let module = GatewayModule::register(
            ClientOptions::default(),
            &shared(client.clone()),
            ComponentRegistry::new(),
        )
        .unwrap();

        module.on_application_shutdown().await;
        module.on_application_shutdown().await;

        assert_eq!(client.shutdown_count(), 1);
        let output = String::from_utf8_lossy(&logs.0.lock()).into_owned();
        let failures: Vec<_> = output
            .lines()
            .filter(|line| line.contains("broker gone"))
            .collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("ERROR"));
    }

    #[tokio::test]
    async fn test_bootstrap_runs_pass_once() {
        let client = Arc::new(LocalClient::default());
        let module = GatewayModule::register(
            ClientOptions::default(),
            &shared(client),
            ComponentRegistry::new(),
        )
        .unwrap();

        assert_eq!(
            module.on_application_bootstrap().unwrap(),
            Some(BindingSummary::default())
        );
        assert_eq!(module.on_application_bootstrap().unwrap(), None);
    }
}
