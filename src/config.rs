//! Library configuration and the shared relay context.
//!
//! The context replaces the original design's process-wide registry with an
//! explicitly constructed object: build it once at startup, share it by
//! `Arc` with every component that needs it. Lifecycle is single writer at
//! startup, many readers afterwards; reconfiguration means building a fresh
//! context, which replaces the old state wholesale.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{RelayError, RelayResult};
use crate::orm::{OrmConnection, OrmFactory};
use crate::schema::factory::DynamicObjectFactory;
use crate::schema::objects::ObjectDescription;
use crate::schema::shared::{SharedObjects, connection_args_object, page_info_object};
use crate::schema::sink::SchemaSink;

/// Configuration input for [`RelayContext::configure`].
///
/// Exactly one of [`objects`](Self::objects) (pre-built shared types) or
/// default generation driven by [`microservice_name`](Self::microservice_name)
/// is active per configuration.
#[derive(Clone, Default)]
pub struct RelayConfig {
    orm: Option<OrmFactory>,
    objects: Option<SharedObjects>,
    microservice_name: Option<String>,
    page_info_base: Option<ObjectDescription>,
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the ORM connection factory. Required.
    pub fn orm<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn OrmConnection> + Send + Sync + 'static,
    {
        self.orm = Some(Arc::new(factory));
        self
    }

    /// Supply pre-built shared pagination objects instead of generating
    /// defaults. Their declaration into the sink is the caller's business.
    pub fn objects(mut self, objects: SharedObjects) -> Self {
        self.objects = Some(objects);
        self
    }

    /// Name used to prefix generated shared objects, so several services can
    /// coexist in one composed schema without colliding.
    pub fn microservice_name(mut self, name: impl Into<String>) -> Self {
        self.microservice_name = Some(name.into());
        self
    }

    /// Base type the generated `PageInfo` extends.
    pub fn page_info_base(mut self, base: ObjectDescription) -> Self {
        self.page_info_base = Some(base);
        self
    }
}

/// Shared state read by every other component: the ORM factory, the schema
/// sink, the shared pagination objects and the connection-object cache.
pub struct RelayContext {
    orm: OrmFactory,
    sink: Arc<dyn SchemaSink>,
    prefix: String,
    page_info_base: Option<ObjectDescription>,
    shared: RwLock<Option<SharedObjects>>,
    factory: DynamicObjectFactory,
}

impl std::fmt::Debug for RelayContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayContext")
            .field("prefix", &self.prefix)
            .field("page_info_base", &self.page_info_base)
            .finish_non_exhaustive()
    }
}

impl RelayContext {
    /// Validate `config` and build the context.
    ///
    /// Fails fast with [`RelayError::Configuration`] when no ORM factory was
    /// supplied; nothing is declared into the sink in that case.
    pub fn configure(
        config: RelayConfig,
        sink: Arc<dyn SchemaSink>,
    ) -> RelayResult<Arc<Self>> {
        let Some(orm) = config.orm else {
            return Err(RelayError::Configuration(
                "an ORM connection factory is required".to_string(),
            ));
        };

        let prefix = capitalize(config.microservice_name.as_deref().unwrap_or(""));
        let context = Self {
            orm,
            sink,
            prefix,
            page_info_base: config.page_info_base,
            shared: RwLock::new(None),
            factory: DynamicObjectFactory::new(),
        };

        if let Some(objects) = config.objects {
            *context.shared.write() = Some(objects);
        } else {
            context.generate_defaults(true);
        }

        tracing::info!(prefix = %context.prefix, "relay context configured");
        Ok(Arc::new(context))
    }

    /// Generate the shared `PageInfo`/`ConnectionArguments` objects and
    /// declare them into the sink.
    ///
    /// A no-op when they already exist, unless `force` is set, so the shared
    /// objects are never declared twice by accident.
    pub fn generate_defaults(&self, force: bool) {
        let mut shared = self.shared.write();
        if shared.is_some() && !force {
            return;
        }

        let objects = SharedObjects {
            page_info: page_info_object(&self.prefix, self.page_info_base.as_ref()),
            connection_args: connection_args_object(&self.prefix),
        };
        self.sink.declare_type(&objects.page_info);
        self.sink.declare_type(&objects.connection_args);
        *shared = Some(objects);
    }

    /// Instantiate one ORM connection from the registered factory.
    pub fn orm_connection(&self) -> Arc<dyn OrmConnection> {
        (self.orm)()
    }

    /// The shared pagination objects of this configuration.
    pub fn shared_objects(&self) -> RelayResult<SharedObjects> {
        self.shared.read().clone().ok_or_else(|| {
            RelayError::Configuration(
                "shared pagination objects have not been generated".to_string(),
            )
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn sink(&self) -> &dyn SchemaSink {
        self.sink.as_ref()
    }

    pub fn factory(&self) -> &DynamicObjectFactory {
        &self.factory
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
