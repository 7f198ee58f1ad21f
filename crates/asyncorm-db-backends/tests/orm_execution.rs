//! Integration tests for the ORM execution pipeline against a live
//! PostgreSQL server.
//!
//! These tests only run when `ASYNCORM_TEST_DATABASE_URL` points at a
//! disposable database, e.g. `postgres://postgres@localhost/asyncorm_test`.
//! Without it every test returns early.

#![cfg(feature = "postgres")]

use std::sync::{Arc, LazyLock};

use asyncorm_core::{OrmError, OrmResult};
use asyncorm_db::fields::{FieldDef, FieldType};
use asyncorm_db::model::{Model, ModelMeta};
use asyncorm_db::query::{Filters, M2mFilter, Manager};
use asyncorm_db::{DatabaseGateway, DbExecutor, ModelRegistry, Value};
use asyncorm_db_backends::PostgresBackend;

// ── Test model definitions ────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
struct Shelf {
    id: Option<i64>,
    label: String,
}

impl Model for Shelf {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new(
                "Shelf",
                vec![FieldDef::new("label", FieldType::CharField).max_length(50)],
            )
            .table("it_shelf")
        });
        &META
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![("id", self.id.into()), ("label", self.label.as_str().into())]
    }

    fn set_field(&mut self, field: &str, value: Value) -> OrmResult<()> {
        match field {
            "id" => self.id = value.as_int(),
            "label" => self.label = value.as_str().unwrap_or_default().to_string(),
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Volume {
    id: Option<i64>,
    name: String,
    content: String,
    pages: Option<i64>,
    shelves: Vec<i64>,
}

impl Model for Volume {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new(
                "Volume",
                vec![
                    FieldDef::new("name", FieldType::CharField).max_length(50),
                    FieldDef::new("content", FieldType::CharField).max_length(255),
                    FieldDef::new("pages", FieldType::IntegerField).nullable(),
                    FieldDef::new(
                        "shelves",
                        FieldType::ManyToMany {
                            to: "it_shelf".into(),
                            to_column: "id".into(),
                            through: Some("it_volume_shelf".into()),
                        },
                    ),
                ],
            )
            .table("it_volume")
            .ordering(&["-id"])
            .unique_together(&["name", "content"])
        });
        &META
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.as_str().into()),
            ("content", self.content.as_str().into()),
            ("pages", self.pages.into()),
        ]
    }

    fn m2m_values(&self) -> Vec<(&'static str, Value)> {
        vec![(
            "shelves",
            Value::List(self.shelves.iter().copied().map(Value::Int).collect()),
        )]
    }

    fn set_field(&mut self, field: &str, value: Value) -> OrmResult<()> {
        match field {
            "id" => self.id = value.as_int(),
            "name" => self.name = value.as_str().unwrap_or_default().to_string(),
            "content" => self.content = value.as_str().unwrap_or_default().to_string(),
            "pages" => self.pages = value.as_int(),
            _ => {}
        }
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Connects and recreates the test tables, or returns `None` when no test
/// database is configured.
async fn setup() -> Option<Arc<DatabaseGateway>> {
    let url = std::env::var("ASYNCORM_TEST_DATABASE_URL").ok()?;
    let backend = PostgresBackend::from_url(&url, 2).expect("valid test database url");
    backend.ensure_connected().await.expect("test database reachable");

    let executor: Arc<dyn DbExecutor> = Arc::new(backend);
    let gateway = Arc::new(DatabaseGateway::new(executor));
    gateway
        .executor()
        .fetch_in_transaction("DROP TABLE IF EXISTS it_volume_shelf, it_volume, it_shelf", &[])
        .await
        .expect("drop test tables");

    let mut registry = ModelRegistry::new();
    registry.register::<Shelf>().unwrap();
    registry.register::<Volume>().unwrap();
    gateway
        .request_batch(&registry.creation_statements())
        .await
        .expect("create test tables");
    Some(gateway)
}

// ── Tests ─────────────────────────────────────────────────────────────
//
// The tests share tables, so they run as one sequence.

#[tokio::test]
async fn test_live_round_trip() {
    let Some(gateway) = setup().await else {
        return;
    };
    let volumes: Manager<Volume> = Manager::new(Arc::clone(&gateway));
    let shelves: Manager<Shelf> = Manager::new(Arc::clone(&gateway));

    // Insert assigns primary keys.
    let mut first = Shelf {
        label: "fiction".into(),
        ..Shelf::default()
    };
    let mut second = Shelf {
        label: "classics".into(),
        ..Shelf::default()
    };
    shelves.save(&mut first).await.unwrap();
    shelves.save(&mut second).await.unwrap();
    let (first_id, second_id) = (first.id.unwrap(), second.id.unwrap());

    let mut dune = Volume {
        name: "Dune".into(),
        content: "paperback".into(),
        pages: Some(412),
        shelves: vec![first_id, second_id],
        ..Volume::default()
    };
    volumes.save(&mut dune).await.unwrap();
    let dune_id = dune.id.expect("primary key assigned");

    let mut emma = Volume {
        name: "Emma".into(),
        content: "hard cover".into(),
        pages: Some(200),
        ..Volume::default()
    };
    volumes.save(&mut emma).await.unwrap();
    assert_eq!(volumes.count().await.unwrap(), 2);

    // Ordering and range filters.
    let ordered = volumes.filter(Filters::new().range("pages", 100, 500)).await.unwrap();
    let names: Vec<&str> = ordered.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Emma", "Dune"]);

    let excluded = volumes.exclude(Filters::new().with("name", "Emma")).await.unwrap();
    assert_eq!(excluded.len(), 1);
    assert_eq!(excluded[0].id, Some(dune_id));

    // Update keeps the primary key. Relations are not saved again.
    dune.pages = Some(500);
    dune.shelves.clear();
    volumes.save(&mut dune).await.unwrap();
    assert_eq!(dune.id, Some(dune_id));
    let fetched = volumes.get(Filters::new().with("id", dune_id)).await.unwrap();
    assert_eq!(fetched.pages, Some(500));

    // Many-to-many rows, one per related id.
    let related = shelves
        .filter_m2m(M2mFilter::from_field(Volume::meta(), "shelves", dune_id).unwrap())
        .await
        .unwrap();
    assert_eq!(related.len(), 2);
    let ids = shelves
        .m2m("it_volume_shelf", "it_volume", "it_shelf", dune_id)
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);

    // Unique together violation surfaces as a model error.
    let mut duplicate = Volume {
        name: "Dune".into(),
        content: "paperback".into(),
        ..Volume::default()
    };
    let err = volumes.save(&mut duplicate).await.unwrap_err();
    assert!(matches!(err, OrmError::ModelError(_)));

    // get with several matches.
    let err = volumes.get(Filters::new().with("pages__gt", 1)).await.unwrap_err();
    assert!(err.is_multiple());

    // Deleting a volume that still has shelves drops its junction rows.
    volumes.delete(&dune).await.unwrap();
    let orphans = shelves
        .m2m("it_volume_shelf", "it_volume", "it_shelf", dune_id)
        .await
        .unwrap();
    assert!(orphans.is_empty());
    let err = volumes.get(Filters::new().with("id", dune_id)).await.unwrap_err();
    assert!(err.is_not_found());

    gateway.executor().close().await.unwrap();
}
