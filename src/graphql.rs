//! Executable-schema adapter over `async_graphql::dynamic`.
//!
//! [`DynamicSchemaBuilder`] is a [`SchemaSink`]: the relay context and the
//! two-phase binder declare their type descriptions and field bindings into
//! it. Registering entity object types and query-root fields is the caller's
//! half of the schema. `build` then renders everything into an executable
//! dynamic schema whose connection fields parse Relay arguments and delegate
//! to the installed resolver registry.
//!
//! Nodes flow through resolution as `serde_json::Value` rows; connection,
//! edge and page-info values are the crate's runtime structs, downcast back
//! out of the field-value payload at each level.

use std::sync::Arc;

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, InputValue, Object, ResolverContext, Schema,
    TypeRef,
};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value as Json;

use crate::entity::{EntityMeta, FieldKind};
use crate::error::{RelayError, RelayResult};
use crate::pagination::{Connection, ConnectionArgs, Edge, PageInfo};
use crate::schema::builder::ResolverRegistry;
use crate::schema::objects::{FieldDescription, FieldType, ObjectDescription, ObjectKind};
use crate::schema::sink::{FieldDeclaration, SchemaSink};

/// Resolver producing a root object instance, given the optional `id`
/// argument.
pub type RootResolver =
    Arc<dyn Fn(Option<String>) -> BoxFuture<'static, Option<Json>> + Send + Sync>;

struct RootField {
    name: String,
    type_name: String,
    resolver: RootResolver,
}

/// Collects declarations and entity registrations, then builds an
/// executable schema.
#[derive(Default)]
pub struct DynamicSchemaBuilder {
    types: Mutex<Vec<ObjectDescription>>,
    field_declarations: Mutex<Vec<FieldDeclaration>>,
    entities: Mutex<Vec<EntityMeta>>,
    roots: Mutex<Vec<RootField>>,
}

impl SchemaSink for DynamicSchemaBuilder {
    fn declare_type(&self, object: &ObjectDescription) {
        self.types.lock().push(object.clone());
    }

    fn declare_field(&self, field: &FieldDeclaration) {
        self.field_declarations.lock().push(field.clone());
    }
}

impl DynamicSchemaBuilder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register an entity as a plain object type resolving its scalar
    /// fields from the node's row value.
    pub fn register_entity(&self, meta: EntityMeta) {
        self.entities.lock().push(meta);
    }

    /// Add a nullable root query field returning `entity`, resolved by
    /// `resolver` (which receives the optional `id` argument).
    pub fn root_field<F>(&self, name: impl Into<String>, entity: &EntityMeta, resolver: F)
    where
        F: Fn(Option<String>) -> BoxFuture<'static, Option<Json>> + Send + Sync + 'static,
    {
        self.roots.lock().push(RootField {
            name: name.into(),
            type_name: entity.type_name.to_string(),
            resolver: Arc::new(resolver),
        });
    }

    /// Render every registration and declaration into an executable schema.
    pub fn build(&self, resolvers: Arc<ResolverRegistry>) -> RelayResult<Schema> {
        let declarations = self.field_declarations.lock().clone();
        let mut schema = Schema::build("Query", None, None);

        for meta in self.entities.lock().iter() {
            let mut object = Object::new(meta.type_name);
            for def in meta.fields {
                object = object.field(entity_scalar_field(def.name, def.kind, def.nullable));
            }
            for declaration in declarations.iter().filter(|d| d.owner == meta.type_name) {
                object = object.field(connection_field(declaration, Arc::clone(&resolvers)));
            }
            schema = schema.register(object);
        }

        for description in self.types.lock().iter() {
            schema = match description.kind {
                ObjectKind::Input => schema.register(input_object(description)),
                ObjectKind::Output => schema.register(declared_object(description)),
            };
        }

        let mut query = Object::new("Query");
        for root in self.roots.lock().iter() {
            query = query.field(root_query_field(root));
        }
        schema = schema.register(query);

        schema
            .finish()
            .map_err(|e| RelayError::Configuration(e.to_string()))
    }
}

fn scalar_type_ref(kind: FieldKind, nullable: bool) -> TypeRef {
    let name = match kind {
        FieldKind::Id => TypeRef::ID,
        FieldKind::String => TypeRef::STRING,
        FieldKind::Int => TypeRef::INT,
        FieldKind::Float => TypeRef::FLOAT,
        FieldKind::Boolean => TypeRef::BOOLEAN,
    };
    if nullable {
        TypeRef::named(name)
    } else {
        TypeRef::named_nn(name)
    }
}

fn field_type_ref(ty: &FieldType, nullable: bool) -> TypeRef {
    match ty {
        FieldType::List(of) => {
            let inner = of.type_name();
            if nullable {
                TypeRef::named_nn_list(inner)
            } else {
                TypeRef::named_nn_list_nn(inner)
            }
        }
        other => {
            let name = other.type_name();
            if nullable {
                TypeRef::named(name)
            } else {
                TypeRef::named_nn(name)
            }
        }
    }
}

/// Convert a JSON scalar into a field value; null and missing become None.
fn json_scalar(value: &Json) -> Option<FieldValue<'static>> {
    match value {
        Json::Null => None,
        Json::Bool(b) => Some(FieldValue::value(*b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(FieldValue::value(i))
            } else {
                n.as_f64().map(FieldValue::value)
            }
        }
        Json::String(s) => Some(FieldValue::value(s.clone())),
        other => Some(FieldValue::value(other.to_string())),
    }
}

fn entity_scalar_field(name: &'static str, kind: FieldKind, nullable: bool) -> Field {
    Field::new(name, scalar_type_ref(kind, nullable), move |ctx| {
        FieldFuture::new(async move {
            let row = ctx.parent_value.try_downcast_ref::<Json>()?;
            Ok(json_scalar(row.get(name).unwrap_or(&Json::Null)))
        })
    })
}

fn connection_args(ctx: &ResolverContext) -> async_graphql::Result<ConnectionArgs> {
    Ok(ConnectionArgs {
        first: ctx.args.get("first").map(|v| v.i64()).transpose()?,
        after: ctx
            .args
            .get("after")
            .map(|v| v.string().map(str::to_string))
            .transpose()?,
        last: ctx.args.get("last").map(|v| v.i64()).transpose()?,
        before: ctx
            .args
            .get("before")
            .map(|v| v.string().map(str::to_string))
            .transpose()?,
    })
}

fn connection_field(declaration: &FieldDeclaration, resolvers: Arc<ResolverRegistry>) -> Field {
    let key = declaration.resolver.clone();
    Field::new(
        declaration.field_name.clone(),
        TypeRef::named_nn(declaration.return_type.clone()),
        move |ctx| {
            let key = key.clone();
            let resolvers = Arc::clone(&resolvers);
            FieldFuture::new(async move {
                let parent = ctx.parent_value.try_downcast_ref::<Json>()?.clone();
                let args = connection_args(&ctx)?;
                let connection = resolvers
                    .resolve(&key, parent, args)
                    .await
                    .map_err(|e| async_graphql::Error::new(e.to_string()))?;
                Ok(Some(FieldValue::owned_any(connection)))
            })
        },
    )
    .argument(InputValue::new("first", TypeRef::named(TypeRef::INT)))
    .argument(InputValue::new("after", TypeRef::named(TypeRef::STRING)))
    .argument(InputValue::new("last", TypeRef::named(TypeRef::INT)))
    .argument(InputValue::new("before", TypeRef::named(TypeRef::STRING)))
}

fn input_object(description: &ObjectDescription) -> InputObject {
    let mut object = InputObject::new(description.name.clone());
    for field in &description.fields {
        object = object.field(InputValue::new(
            field.name.clone(),
            field_type_ref(&field.ty, field.nullable),
        ));
    }
    object
}

fn declared_object(description: &ObjectDescription) -> Object {
    let is_connection = description.has_field("edges") && description.has_field("pageInfo");
    let is_edge = description.has_field("node") && description.has_field("cursor");

    let mut object = Object::new(description.name.clone());
    for field in &description.fields {
        object = object.field(declared_field(field, is_connection, is_edge));
    }
    object
}

fn declared_field(field: &FieldDescription, in_connection: bool, in_edge: bool) -> Field {
    let name = field.name.clone();
    let type_ref = field_type_ref(&field.ty, field.nullable);
    Field::new(field.name.clone(), type_ref, move |ctx| {
        let name = name.clone();
        FieldFuture::new(async move {
            if in_connection {
                let connection = ctx.parent_value.try_downcast_ref::<Connection>()?;
                return Ok(match name.as_str() {
                    "edges" => Some(FieldValue::list(
                        connection
                            .edges
                            .iter()
                            .cloned()
                            .map(FieldValue::owned_any),
                    )),
                    "pageInfo" => Some(FieldValue::owned_any(connection.page_info.clone())),
                    _ => None,
                });
            }

            if in_edge {
                let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
                return Ok(match name.as_str() {
                    "node" => Some(FieldValue::owned_any(edge.node.clone())),
                    "cursor" => Some(FieldValue::value(edge.cursor.clone())),
                    // Pass-through attribute of the join record.
                    other => edge
                        .through
                        .as_ref()
                        .and_then(|through| through.get(other))
                        .and_then(json_scalar),
                });
            }

            let page_info = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
            Ok(match name.as_str() {
                "hasNextPage" => Some(FieldValue::value(page_info.has_next_page)),
                "hasPreviousPage" => Some(FieldValue::value(page_info.has_previous_page)),
                "startCursor" => page_info.start_cursor.clone().map(FieldValue::value),
                "endCursor" => page_info.end_cursor.clone().map(FieldValue::value),
                // Fields inherited from a custom base type have no value on
                // the runtime struct; they resolve to null under this sink.
                _ => None,
            })
        })
    })
}

fn root_query_field(root: &RootField) -> Field {
    let resolver = Arc::clone(&root.resolver);
    Field::new(
        root.name.clone(),
        TypeRef::named(root.type_name.clone()),
        move |ctx| {
            let resolver = Arc::clone(&resolver);
            FieldFuture::new(async move {
                let id = ctx
                    .args
                    .get("id")
                    .map(|v| v.string().map(str::to_string))
                    .transpose()?;
                Ok(resolver(id).await.map(FieldValue::owned_any))
            })
        },
    )
    .argument(InputValue::new("id", TypeRef::named(TypeRef::ID)))
}
