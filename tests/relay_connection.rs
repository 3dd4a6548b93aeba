//! End-to-end: declare relayed connections, finalize, build the dynamic
//! GraphQL schema and page through it with real queries.

use std::sync::Arc;

use async_graphql::Request;
use auto_relay::{
    ConnectionArgs, DynamicSchemaBuilder, EntityMeta, MemoryOrm, OrderDirection, OrmConnection,
    RelayConfig, RelayContext, RelayEntity, RelaySchemaBuilder, RelayedConnectionOptions,
    SchemaSink,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[derive(RelayEntity)]
#[allow(dead_code)]
struct User {
    id: String,
    name: String,
}

#[derive(RelayEntity)]
#[allow(dead_code)]
struct Film {
    id: String,
    title: String,
    year: i64,
}

#[derive(RelayEntity)]
#[allow(dead_code)]
struct Group {
    id: String,
    name: String,
}

#[derive(RelayEntity)]
#[allow(dead_code)]
struct Membership {
    id: String,
    #[relay(name = "joinedAt")]
    joined_at: String,
}

fn seeded_orm() -> MemoryOrm {
    let mut orm = MemoryOrm::new();
    orm.insert("User", json!({"id": "u1", "name": "Ada"}));
    orm.insert("Film", json!({"id": "f1", "title": "Alien", "year": 1979}));
    orm.insert("Film", json!({"id": "f2", "title": "Aliens", "year": 1986}));
    orm.insert("Film", json!({"id": "f3", "title": "Alien 3", "year": 1992}));
    for film in ["f1", "f2", "f3"] {
        orm.link("User", "u1", "Film", film);
    }
    orm.insert("Group", json!({"id": "g1", "name": "Crew"}));
    orm.link_through(
        "User",
        "u1",
        "Group",
        "g1",
        json!({"id": "m1", "joinedAt": "2122-06-12"}),
    );
    orm
}

fn build_schema(config: RelayConfig) -> async_graphql::dynamic::Schema {
    let sink = DynamicSchemaBuilder::new();
    let context =
        RelayContext::configure(config, Arc::clone(&sink) as Arc<dyn SchemaSink>).unwrap();

    let registry = RelaySchemaBuilder::new(context)
        .relayed_connection::<User, Film>(
            "films",
            RelayedConnectionOptions::new().order("year", OrderDirection::Asc),
        )
        .relayed_connection_through::<User, Group, Membership>(
            "groups",
            RelayedConnectionOptions::new(),
        )
        .finalize()
        .unwrap();

    sink.register_entity(EntityMeta::of::<User>());
    sink.register_entity(EntityMeta::of::<Film>());
    sink.register_entity(EntityMeta::of::<Group>());
    sink.root_field("user", &EntityMeta::of::<User>(), |_id| {
        Box::pin(async move { Some(json!({"id": "u1", "name": "Ada"})) })
    });

    sink.build(Arc::new(registry)).unwrap()
}

fn default_schema() -> async_graphql::dynamic::Schema {
    let orm = Arc::new(seeded_orm());
    build_schema(
        RelayConfig::new().orm(move || Arc::clone(&orm) as Arc<dyn OrmConnection>),
    )
}

async fn execute(schema: &async_graphql::dynamic::Schema, query: &str) -> Value {
    let response = schema
        .execute(Request::new(query))
        .await
        .into_result()
        .unwrap();
    serde_json::to_value(response.data).unwrap()
}

#[tokio::test]
async fn test_forward_pagination_through_graphql() {
    let schema = default_schema();

    let page_one = execute(
        &schema,
        r#"
        query {
            user {
                name
                films(first: 2) {
                    edges { node { title year } cursor }
                    pageInfo { hasNextPage hasPreviousPage endCursor }
                }
            }
        }
        "#,
    )
    .await;

    assert_eq!(page_one["user"]["name"], json!("Ada"));
    let films = &page_one["user"]["films"];
    assert_eq!(
        films["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["node"]["title"].clone())
            .collect::<Vec<_>>(),
        [json!("Alien"), json!("Aliens")]
    );
    assert_eq!(films["pageInfo"]["hasNextPage"], json!(true));
    assert_eq!(films["pageInfo"]["hasPreviousPage"], json!(false));

    let end_cursor = films["pageInfo"]["endCursor"].as_str().unwrap();
    let page_two = execute(
        &schema,
        &format!(
            r#"
            query {{
                user {{
                    films(first: 2, after: "{end_cursor}") {{
                        edges {{ node {{ title }} }}
                        pageInfo {{ hasNextPage hasPreviousPage }}
                    }}
                }}
            }}
            "#
        ),
    )
    .await;

    let films = &page_two["user"]["films"];
    assert_eq!(
        films["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["node"]["title"].clone())
            .collect::<Vec<_>>(),
        [json!("Alien 3")]
    );
    assert_eq!(films["pageInfo"]["hasNextPage"], json!(false));
    assert_eq!(films["pageInfo"]["hasPreviousPage"], json!(true));
}

#[tokio::test]
async fn test_through_attributes_are_queryable_on_the_edge() {
    let schema = default_schema();

    let data = execute(
        &schema,
        r#"
        query {
            user {
                groups(first: 5) {
                    edges { node { name } joinedAt cursor }
                    pageInfo { hasNextPage }
                }
            }
        }
        "#,
    )
    .await;

    let edges = data["user"]["groups"]["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["node"]["name"], json!("Crew"));
    assert_eq!(edges[0]["joinedAt"], json!("2122-06-12"));
    assert_eq!(data["user"]["groups"]["pageInfo"]["hasNextPage"], json!(false));
}

#[tokio::test]
async fn test_first_and_last_surface_as_a_single_field_error() {
    let schema = default_schema();

    let errors = schema
        .execute(Request::new(
            "query { user { films(first: 1, last: 1) { pageInfo { hasNextPage } } } }",
        ))
        .await
        .into_result()
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("mutually exclusive"));
}

#[tokio::test]
async fn test_microservice_prefix_lands_in_the_schema() {
    let orm = Arc::new(seeded_orm());
    let schema = build_schema(
        RelayConfig::new()
            .orm(move || Arc::clone(&orm) as Arc<dyn OrmConnection>)
            .microservice_name("billing"),
    );

    let sdl = schema.sdl();
    assert!(sdl.contains("type BillingPageInfo"));
    assert!(sdl.contains("input BillingConnectionArguments"));
    assert!(sdl.contains("type UserFilmsConnection"));
    assert!(sdl.contains("type UserFilmsEdge"));

    // The prefixed schema still answers queries.
    let data = execute(
        &schema,
        "query { user { films(first: 1) { edges { node { title } } } } }",
    )
    .await;
    assert_eq!(
        data["user"]["films"]["edges"][0]["node"]["title"],
        json!("Alien")
    );
}

#[tokio::test]
async fn test_derive_metadata_feeds_the_registry_directly() {
    // The registry works without any GraphQL layer on top.
    let orm = Arc::new(seeded_orm());
    let sink = DynamicSchemaBuilder::new();
    let context = RelayContext::configure(
        RelayConfig::new().orm(move || Arc::clone(&orm) as Arc<dyn OrmConnection>),
        sink as Arc<dyn SchemaSink>,
    )
    .unwrap();

    let registry = RelaySchemaBuilder::new(context)
        .relayed_connection::<User, Film>(
            "films",
            RelayedConnectionOptions::new().order("year", OrderDirection::Desc),
        )
        .finalize()
        .unwrap();

    let connection = registry
        .resolve(
            "User.films",
            json!({"id": "u1"}),
            ConnectionArgs {
                first: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(connection.edges[0].node["title"], json!("Alien 3"));
    assert_eq!(Film::TYPE_NAME, "Film");
    assert_eq!(Film::PRIMARY_KEY, "id");
    assert_eq!(Membership::fields().len(), 2);
    assert_eq!(Membership::fields()[1].name, "joinedAt");
}
