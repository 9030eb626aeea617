//! JSON-Schema files on disk
//!
//! Layout for every relation `dog` with columns `id` and `name`:
//!
//! ```text
//! <dir>/dog.json        relation schema, properties are {"$ref": "./dog/<column>.json"}
//! <dir>/dog/id.json     column schema
//! <dir>/dog/name.json
//! ```
//!
//! Existing column files are merged: keys that are no longer generated are
//! kept, regenerated keys are overwritten. Column files for columns that no
//! longer exist are removed.

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use store_object::SchemaCatalog;
use tokio::fs;

use crate::errors::PgGenericError;

pub async fn write_schemas(dir: &Path, catalog: &SchemaCatalog) -> Result<(), PgGenericError> {
    create_dir(dir).await?;

    let persistable = catalog.to_persistable();
    for kind in ["tables", "views"] {
        let Some(relations) = persistable.get(kind).and_then(Value::as_object) else {
            continue;
        };
        for (name, schema) in relations {
            write_relation(dir, name, schema.clone()).await?;
        }
    }
    Ok(())
}

async fn write_relation(dir: &Path, name: &str, mut schema: Value) -> Result<(), PgGenericError> {
    let relation_dir = dir.join(file_stem(name)?);
    create_dir(&relation_dir).await?;

    let properties = match schema.get_mut("properties").and_then(Value::as_object_mut) {
        Some(properties) => std::mem::take(properties),
        None => Map::new(),
    };

    prune(&relation_dir, &properties).await?;

    let mut refs = Map::new();
    for (column, column_schema) in properties {
        let file = relation_dir.join(format!("{}.json", file_stem(&column)?.display()));
        let merged = match read_object(&file).await? {
            Some(mut existing) => {
                if let Value::Object(generated) = column_schema {
                    existing.extend(generated);
                }
                Value::Object(existing)
            }
            None => column_schema,
        };
        write_json(&file, &merged).await?;

        refs.insert(
            column.clone(),
            serde_json::json!({ "$ref": format!("./{}/{}.json", name, column) }),
        );
    }

    if let Some(object) = schema.as_object_mut() {
        object.insert("properties".to_string(), Value::Object(refs));
    }
    write_json(&dir.join(format!("{}.json", file_stem(name)?.display())), &schema).await
}

/// Remove `<column>.json` files whose column is gone
async fn prune(relation_dir: &Path, properties: &Map<String, Value>) -> Result<(), PgGenericError> {
    let mut entries = fs::read_dir(relation_dir)
        .await
        .map_err(|e| write_error(relation_dir, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| write_error(relation_dir, e))?
    {
        let path = entry.path();
        let stale = path.extension().is_some_and(|ext| ext == "json")
            && path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| !properties.contains_key(stem));
        if stale {
            fs::remove_file(&path)
                .await
                .map_err(|e| write_error(&path, e))?;
        }
    }
    Ok(())
}

async fn read_object(file: &Path) -> Result<Option<Map<String, Value>>, PgGenericError> {
    let content = match fs::read_to_string(file).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(write_error(file, e)),
    };

    match serde_json::from_str(&content) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Ok(None),
        Err(source) => Err(PgGenericError::SchemaParse {
            path: file.display().to_string(),
            source,
        }),
    }
}

async fn write_json(file: &Path, value: &Value) -> Result<(), PgGenericError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| PgGenericError::SchemaParse {
            path: file.display().to_string(),
            source,
        })?;

    fs::write(file, buffer).await.map_err(|e| write_error(file, e))
}

async fn create_dir(dir: &Path) -> Result<(), PgGenericError> {
    fs::create_dir_all(dir).await.map_err(|e| write_error(dir, e))
}

/// Relation and column names become file names; reject ones that would escape `dir`
fn file_stem(name: &str) -> Result<PathBuf, PgGenericError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(PgGenericError::SchemaWrite {
            path: name.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "name cannot be used as a file name",
            ),
        });
    }
    Ok(PathBuf::from(name))
}

fn write_error(path: &Path, source: std::io::Error) -> PgGenericError {
    PgGenericError::SchemaWrite {
        path: path.display().to_string(),
        source,
    }
}
