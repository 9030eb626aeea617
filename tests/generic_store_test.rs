//! Integration tests for the generic mapper
//!
//! Each test creates uniquely named relations and drops them afterwards.
//! `DATABASE_URL` must point at a server the tests may create relations in.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use pg_generic::prelude::*;
use pg_generic::store_object::query_builder::QueryDefaults;
use serde_json::{Value, json};

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct Dog {
    id: i64,
    name: String,
    species: Option<String>,
    tags: Option<Vec<Value>>,
    born: Option<DateTime<Utc>>,
    walked: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct NamedDog {
    id: i64,
    name: String,
}

struct Fixture {
    db: PgGeneric,
    dog: String,
    owner: String,
    view: String,
}

impl Fixture {
    fn dogs(&self) -> GenericStore<Dog> {
        self.db.table::<Dog>(&self.dog).expect("dog table is introspected")
    }

    async fn seed(&self, names: &[&str]) -> anyhow::Result<Vec<Dog>> {
        let rows = names
            .iter()
            .map(|name| Values::new().set("name", *name).set("species", "mutt"))
            .collect();
        Ok(self.dogs().generate_many(rows).await?)
    }

    async fn teardown(self) -> anyhow::Result<()> {
        let pool = self.db.pool();
        sqlx::query(&format!("DROP VIEW IF EXISTS \"{}\"", self.view))
            .execute(pool)
            .await?;
        sqlx::query(&format!("DROP TABLE IF EXISTS \"{}\" CASCADE", self.owner))
            .execute(pool)
            .await?;
        sqlx::query(&format!("DROP TABLE IF EXISTS \"{}\" CASCADE", self.dog))
            .execute(pool)
            .await?;
        Ok(())
    }
}

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests")
}

async fn setup() -> anyhow::Result<Fixture> {
    let database_url = database_url();
    let pool = PgPool::connect(&database_url).await?;

    let suffix = Uuid::new_v4().simple().to_string();
    let dog = format!("dog_{}", &suffix[..12]);
    let owner = format!("owner_{}", &suffix[..12]);
    let view = format!("dogs_named_{}", &suffix[..12]);

    sqlx::query(&format!(
        "CREATE TABLE \"{dog}\" (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            species TEXT DEFAULT 'unknown',
            tags JSONB[],
            born TIMESTAMPTZ,
            walked TIMESTAMPTZ
        )"
    ))
    .execute(&pool)
    .await?;
    sqlx::query(&format!(
        "CREATE TABLE \"{owner}\" (
            id SERIAL PRIMARY KEY,
            dog_id BIGINT NOT NULL REFERENCES \"{dog}\"(id)
        )"
    ))
    .execute(&pool)
    .await?;
    sqlx::query(&format!(
        "CREATE VIEW \"{view}\" AS SELECT id, name FROM \"{dog}\""
    ))
    .execute(&pool)
    .await?;

    let config = AppConfig::with_database(DatabaseConfig::from_url(&database_url));
    let db = PgGeneric::from_pool(pool, &config).await?;

    Ok(Fixture {
        db,
        dog,
        owner,
        view,
    })
}

// ========================================
// list / count / from
// ========================================

#[tokio::test]
async fn test_list_pages_and_totals() -> anyhow::Result<()> {
    let fx = setup().await?;
    fx.seed(&["prairie", "ozzy", "juniper"]).await?;
    let dogs = fx.dogs();

    let page = dogs.list(ListQuery::new()).await?;
    assert_eq!(page.total, 3);
    let names: Vec<_> = page.items.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["prairie", "ozzy", "juniper"]);

    let page = dogs.list(ListQuery::new().limit(2).page(1)).await?;
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "juniper");

    let page = dogs
        .list(ListQuery::new().sort("name").order(SortOrder::Desc))
        .await?;
    let names: Vec<_> = page.items.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["prairie", "ozzy", "juniper"]);

    // Past the end and zero-size pages still report every match
    let page = dogs.list(ListQuery::new().limit(2).page(5)).await?;
    assert_eq!(page.total, 3);
    assert!(page.items.is_empty());

    let page = dogs.list(ListQuery::new().limit(0)).await?;
    assert_eq!(page.total, 3);
    assert!(page.items.is_empty());

    let empty = dogs
        .list(ListQuery::new().filter(QueryFilter::eq("name", "nobody")))
        .await?;
    assert_eq!(empty.total, 0);
    assert!(empty.items.is_empty());

    fx.teardown().await
}

#[tokio::test]
async fn test_count_and_from() -> anyhow::Result<()> {
    let fx = setup().await?;
    let seeded = fx.seed(&["prairie", "ozzy"]).await?;
    let dogs = fx.dogs();

    assert_eq!(dogs.count(ListQuery::new()).await?, 2);
    assert_eq!(
        dogs.count(ListQuery::new().filter(QueryFilter::ilike("name", "PRA%")))
            .await?,
        1
    );

    let dog = dogs.from(seeded[1].id).await?;
    assert_eq!(dog, seeded[1]);

    let dog = dogs.from(Selector::column("name", "prairie")).await?;
    assert_eq!(dog.id, seeded[0].id);

    let err = dogs.from(-1i64).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(err.status(), 404);

    let err = dogs.from(Selector::column("colour", "brown")).await.unwrap_err();
    assert!(matches!(err, StoreError::SchemaMissing(_)));

    fx.teardown().await
}

// ========================================
// generate
// ========================================

#[tokio::test]
async fn test_generate_defaults_and_conflicts() -> anyhow::Result<()> {
    let fx = setup().await?;
    let dogs = fx.dogs();

    let dog = dogs.generate(Values::new().set("name", "prairie")).await?;
    assert_eq!(dog.species.as_deref(), Some("unknown"));
    assert!(dog.tags.is_none());

    let err = dogs
        .generate(Values::new().set("name", "prairie"))
        .await
        .unwrap_err();
    match &err {
        StoreError::AlreadyExists { detail, .. } => assert!(detail.contains("prairie")),
        other => panic!("expected AlreadyExists, got {:?}", other),
    }
    assert!(err.is_client_error());

    let many = dogs
        .generate_many(vec![
            Values::new().set("name", "ozzy"),
            Values::new().set("name", "juniper").set("species", "hound"),
        ])
        .await?;
    assert_eq!(many.len(), 2);
    assert_eq!(many[0].species.as_deref(), Some("unknown"));
    assert_eq!(many[1].species.as_deref(), Some("hound"));

    assert!(dogs.generate_many(vec![]).await?.is_empty());

    fx.teardown().await
}

#[tokio::test]
async fn test_upsert() -> anyhow::Result<()> {
    let fx = setup().await?;
    let dogs = fx.dogs();
    let original = dogs
        .generate(Values::new().set("name", "prairie").set("species", "mutt"))
        .await?;

    let updated = dogs
        .generate_with(
            Values::new().set("name", "prairie").set("species", "hound"),
            Upsert::do_update().on(&["name"]),
        )
        .await?;
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.species.as_deref(), Some("hound"));

    let err = dogs
        .generate_with(
            Values::new().set("name", "prairie"),
            Upsert::do_nothing().on(&["name"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));

    assert_eq!(dogs.count(ListQuery::new()).await?, 1);

    fx.teardown().await
}

#[tokio::test]
async fn test_json_array_round_trip() -> anyhow::Result<()> {
    let fx = setup().await?;
    let dogs = fx.dogs();

    let tags = json!([{"kind": "vaccinated", "year": 2023}, "friendly", 3, null]);
    let dog = dogs
        .generate(Values::new().set("name", "prairie").set("tags", tags.clone()))
        .await?;
    assert_eq!(dog.tags, serde_json::from_value(tags)?);

    let err = dogs
        .generate(Values::new().set("name", "ozzy").set("tags", json!({"not": "an array"})))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidValue { .. }));

    fx.teardown().await
}

// ========================================
// commit
// ========================================

#[tokio::test]
async fn test_commit() -> anyhow::Result<()> {
    let fx = setup().await?;
    let seeded = fx.seed(&["prairie", "ozzy"]).await?;
    let dogs = fx.dogs();
    let id = seeded[0].id;

    let renamed = dogs
        .commit(id, Values::new().set("name", "juniper").set("species", SqlValue::Null))
        .await?;
    assert_eq!(renamed.name, "juniper");
    assert_eq!(renamed.species, None);

    // Epoch milliseconds for a timestamp column
    let born = dogs
        .commit(id, Values::new().set("born", 1_577_836_800_000i64))
        .await?;
    assert_eq!(born.born.map(|b| b.timestamp()), Some(1_577_836_800));

    // Raw SQL value
    let fragment = SqlFragment::raw("now() - CAST($1 AS interval)", ["1 day"])?;
    let walked = dogs
        .commit(id, Values::new().set("walked", SqlValue::raw(fragment)))
        .await?;
    let walked_at = walked.walked.expect("walked is set");
    assert!(walked_at < Utc::now() - chrono::Duration::hours(23));

    // An empty patch reads the current row
    let unchanged = dogs.commit(id, Values::new()).await?;
    assert_eq!(unchanged, walked);

    let err = dogs
        .commit(-1i64, Values::new().set("name", "ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = dogs.commit(-1i64, Values::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = dogs
        .commit(id, Values::new().set("name", "ozzy"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));

    let by_predicate = dogs
        .commit(
            QueryFilter::eq("name", "ozzy"),
            Values::new().set("species", "hound"),
        )
        .await?;
    assert_eq!(by_predicate.id, seeded[1].id);

    fx.teardown().await
}

// ========================================
// delete / clear
// ========================================

#[tokio::test]
async fn test_delete_and_clear() -> anyhow::Result<()> {
    let fx = setup().await?;
    let seeded = fx.seed(&["prairie", "ozzy", "juniper"]).await?;
    let dogs = fx.dogs();

    assert_eq!(dogs.delete(seeded[0].id).await?, 1);
    let err = dogs.from(seeded[0].id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let owners = fx.db.table::<Row>(&fx.owner)?;
    owners
        .generate(Values::new().set("dog_id", seeded[1].id))
        .await?;

    let err = dogs.delete(seeded[1].id).await.unwrap_err();
    assert!(matches!(err, StoreError::StillInUse { .. }));
    assert_eq!(err.status(), 400);

    let err = dogs.clear().await.unwrap_err();
    assert!(matches!(err, StoreError::StillInUse { .. }));

    assert_eq!(owners.clear().await?, 1);
    assert_eq!(dogs.clear().await?, 2);
    assert_eq!(dogs.count(ListQuery::new()).await?, 0);

    fx.teardown().await
}

// ========================================
// stream / iterate
// ========================================

#[tokio::test]
async fn test_stream_events() -> anyhow::Result<()> {
    let fx = setup().await?;
    fx.seed(&["prairie", "ozzy", "juniper"]).await?;
    let dogs = fx.dogs();

    let mut stream = dogs.stream(ListQuery::new().limit(1))?;
    assert!(matches!(stream.recv().await, Some(StreamEvent::Count(3))));
    let mut names = Vec::new();
    while let Some(event) = stream.recv().await {
        match event {
            StreamEvent::Data(dog) => names.push(dog.name),
            StreamEvent::End => break,
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(names, vec!["prairie", "ozzy", "juniper"]);
    assert!(stream.recv().await.is_none());

    let mut empty = dogs.stream(ListQuery::new().filter(QueryFilter::eq("name", "nobody")))?;
    assert!(matches!(empty.recv().await, Some(StreamEvent::Count(0))));
    assert!(matches!(empty.recv().await, Some(StreamEvent::End)));

    fx.teardown().await
}

#[tokio::test]
async fn test_iterate_pages_through_everything() -> anyhow::Result<()> {
    let fx = setup().await?;
    fx.seed(&["a", "b", "c", "d", "e"]).await?;
    let dogs = fx.dogs().with_defaults(QueryDefaults {
        iterate_page_size: 2,
        ..QueryDefaults::default()
    });

    let mut iter = dogs.iterate(ListQuery::new());
    let mut names = Vec::new();
    while let Some(dog) = iter.next().await? {
        names.push(dog.name);
    }
    assert_eq!(names, vec!["a", "b", "c", "d", "e"]);

    let collected: Vec<Dog> = dogs
        .iterate(ListQuery::new().sort("name").order(SortOrder::Desc))
        .into_stream()
        .try_collect()
        .await?;
    assert_eq!(collected.first().map(|d| d.name.as_str()), Some("e"));
    assert_eq!(collected.len(), 5);

    fx.teardown().await
}

// ========================================
// views and untyped rows
// ========================================

#[tokio::test]
async fn test_view_requires_key_column() -> anyhow::Result<()> {
    let fx = setup().await?;
    let seeded = fx.seed(&["prairie", "ozzy"]).await?;

    assert!(matches!(
        fx.db.table::<NamedDog>(&fx.view),
        Err(StoreError::SchemaMissing(_))
    ));

    let view = fx.db.view::<NamedDog>(&fx.view)?;
    let page = view.list(ListQuery::new()).await?;
    assert_eq!(page.total, 2);

    let err = view.from(seeded[0].id).await.unwrap_err();
    assert!(matches!(err, StoreError::SchemaMissing(_)));

    let view = view.with_key_column("id")?;
    let dog = view.from(seeded[0].id).await?;
    assert_eq!(dog.id, seeded[0].id);
    assert_eq!(dog.name, "prairie");

    fx.teardown().await
}

#[tokio::test]
async fn test_untyped_rows() -> anyhow::Result<()> {
    let fx = setup().await?;
    fx.seed(&["prairie"]).await?;

    let rows = fx.db.table::<Row>(&fx.dog)?;
    let page = rows.list(ListQuery::new()).await?;
    assert_eq!(page.items[0]["name"], json!("prairie"));
    assert_eq!(page.items[0]["tags"], Value::Null);

    fx.teardown().await
}

#[tokio::test]
async fn test_geometry_from_geojson() -> anyhow::Result<()> {
    let fx = setup().await?;
    let pool = fx.db.pool().clone();
    let postgis: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM pg_extension WHERE extname = 'postgis'")
        .fetch_optional(&pool)
        .await?;
    if postgis.is_none() {
        return fx.teardown().await;
    }

    let park = format!("{}_park", fx.dog);
    sqlx::query(&format!(
        "CREATE TABLE \"{park}\" (id SERIAL PRIMARY KEY, area GEOMETRY(Point, 4326))"
    ))
    .execute(&pool)
    .await?;
    fx.db.refresh_schema().await?;

    let parks = fx.db.table::<Row>(&park)?;
    let row = parks
        .generate(Values::new().set(
            "area",
            json!({"type": "Point", "coordinates": [1.0, 2.0], "crs": {"type": "name", "properties": {"name": "EPSG:4326"}}}),
        ))
        .await?;
    assert!(row.get("area").is_some_and(|area| !area.is_null()));

    sqlx::query(&format!("DROP TABLE IF EXISTS \"{park}\""))
        .execute(&pool)
        .await?;
    fx.teardown().await
}

// ========================================
// user-defined types
// ========================================

#[tokio::test]
async fn test_enum_outside_search_path() -> anyhow::Result<()> {
    let database_url = database_url();
    let pool = PgPool::connect(&database_url).await?;
    let namespace = format!("app_{}", &Uuid::new_v4().simple().to_string()[..12]);

    for statement in [
        format!("CREATE SCHEMA \"{namespace}\""),
        format!("CREATE TYPE \"{namespace}\".mood AS ENUM ('happy', 'sleepy')"),
        format!(
            "CREATE TABLE \"{namespace}\".pet (
                id SERIAL PRIMARY KEY,
                mood \"{namespace}\".mood NOT NULL,
                moods \"{namespace}\".mood[]
            )"
        ),
    ] {
        sqlx::query(&statement).execute(&pool).await?;
    }

    let mut config = AppConfig::with_database(DatabaseConfig::from_url(&database_url));
    config.schema.namespace = namespace.clone();
    let db = PgGeneric::from_pool(pool.clone(), &config).await?;
    let pets = db.table::<Row>("pet")?;

    let result = async {
        let pet = pets
            .generate(
                Values::new()
                    .set("mood", "happy")
                    .set("moods", json!(["happy", "sleepy"])),
            )
            .await?;
        assert_eq!(pet["mood"], json!("happy"));
        assert_eq!(pet["moods"], json!(["happy", "sleepy"]));

        let id = pet["id"].as_i64().unwrap_or_default();
        let pet = pets.commit(id, Values::new().set("mood", "sleepy")).await?;
        assert_eq!(pet["mood"], json!("sleepy"));

        let found = pets
            .count(ListQuery::new().filter(QueryFilter::eq("mood", "sleepy")))
            .await?;
        assert_eq!(found, 1);
        anyhow::Ok(())
    }
    .await;

    sqlx::query(&format!("DROP SCHEMA IF EXISTS \"{namespace}\" CASCADE"))
        .execute(&pool)
        .await?;
    result
}
