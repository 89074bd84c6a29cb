use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::models::tag::{Group, Tag};
use crate::utils::time::now_rfc3339;

use super::Store;

/// Record counts for the stats endpoint
#[derive(Debug, Serialize)]
pub struct DbStats {
    pub proxies: i64,
    pub profiles: i64,
    pub tags: i64,
    pub groups: i64,
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}

/// Get-or-create by name, shared with proxy and profile attachment.
/// Takes the connection so callers inside a transaction can reuse it.
pub(crate) fn get_or_create_tag(conn: &Connection, name: &str) -> anyhow::Result<Tag> {
    if let Some(tag) = conn
        .query_row(
            "SELECT * FROM tags WHERE name = ?1",
            params![name],
            tag_from_row,
        )
        .optional()?
    {
        return Ok(tag);
    }

    let now = now_rfc3339();
    conn.execute(
        "INSERT INTO tags (name, created_at) VALUES (?1, ?2)",
        params![name, now],
    )
    .with_context(|| format!("failed to create tag {name}"))?;

    Ok(Tag {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        created_at: now,
    })
}

impl Store {
    pub fn list_tags(&self) -> anyhow::Result<Vec<Tag>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], tag_from_row)?
            .collect::<Result<_, _>>()?;
        Ok(tags)
    }

    pub fn create_tag(&self, name: &str) -> anyhow::Result<Tag> {
        get_or_create_tag(&self.conn(), name)
    }

    pub fn list_groups(&self) -> anyhow::Result<Vec<Group>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM groups ORDER BY group_name")?;
        let groups = stmt
            .query_map([], |row| {
                Ok(Group {
                    id: row.get("id")?,
                    group_name: row.get("group_name")?,
                    created_at: row.get("created_at")?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(groups)
    }

    /// Idempotent by name, returns the existing group when present
    pub fn create_group(&self, name: &str) -> anyhow::Result<Group> {
        let conn = self.conn();

        if let Some(id) = conn
            .query_row(
                "SELECT id FROM groups WHERE group_name = ?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
        {
            return conn
                .query_row(
                    "SELECT * FROM groups WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(Group {
                            id: row.get("id")?,
                            group_name: row.get("group_name")?,
                            created_at: row.get("created_at")?,
                        })
                    },
                )
                .context("group lookup failed");
        }

        let now = now_rfc3339();
        conn.execute(
            "INSERT INTO groups (group_name, created_at) VALUES (?1, ?2)",
            params![name, now],
        )
        .with_context(|| format!("failed to create group {name}"))?;

        Ok(Group {
            id: conn.last_insert_rowid(),
            group_name: name.to_string(),
            created_at: now,
        })
    }

    /// Proxies and profiles are scoped to the owner; tags and groups
    /// are global.
    pub fn db_stats(&self, owner_id: i64) -> anyhow::Result<DbStats> {
        let conn = self.conn();
        let count_owned = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE owner_id = ?1"),
                params![owner_id],
                |row| row.get(0),
            )
        };
        let count_all = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
        };

        Ok(DbStats {
            proxies: count_owned("proxies")?,
            profiles: count_owned("profiles")?,
            tags: count_all("tags")?,
            groups: count_all("groups")?,
        })
    }
}
