//! Characteristic-type dictionaries and face assignments
//!
//! Dictionary rows are shared by every face and contended for by concurrent
//! card tasks. Creation is find-then-insert; a concurrent insert of the same
//! name loses on the unique constraint and surfaces as
//! [`ImportError::TransientConflict`](crate::error::ImportError::TransientConflict).

use crate::error::ImportResult;
use crate::models::CharacteristicKind;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tracing::debug;

/// A dictionary entry assigned to a face
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedType {
    pub type_id: i64,
    pub name: String,
}

pub async fn find_characteristic_type(
    conn: &mut SqliteConnection,
    kind: CharacteristicKind,
    name: &str,
) -> ImportResult<Option<i64>> {
    let sql = format!("SELECT id FROM {} WHERE name = ?", kind.dictionary_table());
    let id = sqlx::query_scalar(&sql)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id)
}

/// Dictionary id for `name`, inserting the row on first use
///
/// Returns `(id, created)`.
pub async fn find_or_create_characteristic_type(
    conn: &mut SqliteConnection,
    kind: CharacteristicKind,
    name: &str,
) -> ImportResult<(i64, bool)> {
    if let Some(id) = find_characteristic_type(conn, kind, name).await? {
        return Ok((id, false));
    }

    let sql = format!("INSERT INTO {} (name) VALUES (?)", kind.dictionary_table());
    let result = sqlx::query(&sql).bind(name).execute(&mut *conn).await?;
    let id = result.last_insert_rowid();

    debug!(kind = %kind, name, id, "Created dictionary entry");
    Ok((id, true))
}

/// Dictionary entries of `kind` currently assigned to a face
pub async fn find_assigned_types(
    conn: &mut SqliteConnection,
    kind: CharacteristicKind,
    face_id: i64,
) -> ImportResult<Vec<AssignedType>> {
    let sql = format!(
        r#"
        SELECT t.id, t.name
        FROM {assignments} a
        JOIN {dictionary} t ON t.id = a.type_id
        WHERE a.face_id = ?
        ORDER BY t.id
        "#,
        assignments = kind.assignment_table(),
        dictionary = kind.dictionary_table(),
    );

    let rows = sqlx::query(&sql).bind(face_id).fetch_all(&mut *conn).await?;

    Ok(rows
        .iter()
        .map(|row| AssignedType {
            type_id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}

/// Assign a dictionary entry to a face; assigning twice is a no-op
///
/// Returns whether a row was inserted.
pub async fn assign_type_to_face(
    conn: &mut SqliteConnection,
    kind: CharacteristicKind,
    face_id: i64,
    type_id: i64,
) -> ImportResult<bool> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} (face_id, type_id) VALUES (?, ?)",
        kind.assignment_table()
    );
    let result = sqlx::query(&sql)
        .bind(face_id)
        .bind(type_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove the given assignments from a face; returns the number removed
pub async fn unassign_types_from_face(
    conn: &mut SqliteConnection,
    kind: CharacteristicKind,
    face_id: i64,
    type_ids: &[i64],
) -> ImportResult<u64> {
    if type_ids.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "DELETE FROM {} WHERE face_id = ",
        kind.assignment_table()
    ));
    builder.push_bind(face_id).push(" AND type_id IN (");
    let mut separated = builder.separated(", ");
    for type_id in type_ids {
        separated.push_bind(*type_id);
    }
    separated.push_unseparated(")");

    let result = builder.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
