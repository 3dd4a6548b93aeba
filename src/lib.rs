//! Auto-generated Relay connections for GraphQL-style schemas.
//!
//! Given entity metadata and an abstract ORM capability, this crate
//! synthesizes the Relay connection pattern — `Edge`/`Connection` schema
//! objects, the shared `PageInfo`/`ConnectionArguments` pair — and installs
//! cursor-paginated resolvers for declared fields, with stable total
//! ordering and opaque key-tuple cursors.
//!
//! The pieces compose in two explicit phases:
//!
//! 1. Configure a [`RelayContext`] with an ORM factory and a schema sink,
//!    then declare relayed connections on a [`RelaySchemaBuilder`].
//! 2. Call [`RelaySchemaBuilder::finalize`] once everything is declared:
//!    schema objects are synthesized (at most once per derived name),
//!    declared into the sink, and runtime resolvers are installed into the
//!    returned [`ResolverRegistry`].
//!
//! ```rust,ignore
//! let sink = DynamicSchemaBuilder::new();
//! let context = RelayContext::configure(
//!     RelayConfig::new().orm(move || orm.clone()).microservice_name("billing"),
//!     sink.clone(),
//! )?;
//!
//! let registry = RelaySchemaBuilder::new(context)
//!     .relayed_connection::<User, Film>(
//!         "films",
//!         RelayedConnectionOptions::new().order("year", OrderDirection::Asc),
//!     )
//!     .finalize()?;
//! ```
//!
//! Schema emission, the concrete ORM driver and transport are all
//! collaborators behind traits; the `graphql` module ships an
//! `async_graphql::dynamic` sink for a working end-to-end schema, and
//! `testing` an in-memory ORM.

pub mod config;
pub mod cursor;
pub mod engine;
pub mod entity;
pub mod error;
pub mod graphql;
pub mod orm;
pub mod pagination;
pub mod schema;
pub mod testing;

pub use auto_relay_macros::RelayEntity;

pub use config::{RelayConfig, RelayContext};
pub use cursor::{decode_cursor, encode_cursor};
pub use engine::{ConnectionResolver, RelayedConnectionOptions, RelayedField};
pub use entity::{EntityMeta, FieldDef, FieldKind, RelayEntity};
pub use error::{RelayError, RelayResult};
pub use graphql::DynamicSchemaBuilder;
pub use orm::{
    CursorRange, FetchedRow, OrderClause, OrderDirection, OrmConnection, OrmFactory, PageRequest,
};
pub use pagination::{Connection, ConnectionArgs, Edge, PageInfo, Paging, PagingDirection};
pub use schema::builder::{RelaySchemaBuilder, ResolverRegistry};
pub use schema::factory::{ConnectionObjects, DynamicObjectFactory};
pub use schema::objects::{FieldDescription, FieldType, ObjectDescription, ObjectKind};
pub use schema::shared::{SharedObjects, connection_args_object, page_info_object};
pub use schema::sink::{FieldDeclaration, RecordingSink, SchemaSink};
pub use testing::MemoryOrm;
