use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::profile::{Profile, ProfileCreate, ProfileUpdate};
use crate::models::tag::{Group, Tag};
use crate::utils::time::now_rfc3339;

use super::tags::get_or_create_tag;
use super::Store;

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get("id")?,
        name: row.get("name")?,
        platform: row.get("platform")?,
        note: row.get("note")?,
        proxy: row.get("proxy")?,
        status: row.get("status")?,
        shared_on_cloud: row.get("shared_on_cloud")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        last_started_at: row.get("last_started_at")?,
        groups: Vec::new(),
        tags: Vec::new(),
    })
}

fn load_profile_relations(conn: &Connection, profile: &mut Profile) -> anyhow::Result<()> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.group_name, g.created_at FROM groups g
         JOIN profile_groups pg ON pg.group_id = g.id
         WHERE pg.profile_id = ?1 ORDER BY g.group_name",
    )?;
    profile.groups = stmt
        .query_map(params![profile.id], |row| {
            Ok(Group {
                id: row.get(0)?,
                group_name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.created_at FROM tags t
         JOIN profile_tags pt ON pt.tag_id = t.id
         WHERE pt.profile_id = ?1 ORDER BY t.name",
    )?;
    profile.tags = stmt
        .query_map(params![profile.id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<Result<_, _>>()?;

    Ok(())
}

fn get_or_create_group(conn: &Connection, name: &str) -> anyhow::Result<i64> {
    if let Some(id) = conn
        .query_row(
            "SELECT id FROM groups WHERE group_name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?
    {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO groups (group_name, created_at) VALUES (?1, ?2)",
        params![name, now_rfc3339()],
    )
    .with_context(|| format!("failed to create group {name}"))?;
    Ok(conn.last_insert_rowid())
}

fn replace_profile_groups(conn: &Connection, profile_id: i64, names: &[String]) -> anyhow::Result<()> {
    conn.execute(
        "DELETE FROM profile_groups WHERE profile_id = ?1",
        params![profile_id],
    )?;
    for name in names {
        let group_id = get_or_create_group(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO profile_groups (profile_id, group_id) VALUES (?1, ?2)",
            params![profile_id, group_id],
        )?;
    }
    Ok(())
}

fn replace_profile_tags(conn: &Connection, profile_id: i64, names: &[String]) -> anyhow::Result<()> {
    conn.execute(
        "DELETE FROM profile_tags WHERE profile_id = ?1",
        params![profile_id],
    )?;
    for name in names {
        let tag = get_or_create_tag(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO profile_tags (profile_id, tag_id) VALUES (?1, ?2)",
            params![profile_id, tag.id],
        )?;
    }
    Ok(())
}

impl Store {
    pub fn list_profiles(&self, owner_id: i64) -> anyhow::Result<Vec<Profile>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT * FROM profiles WHERE owner_id = ?1 ORDER BY id")?;
        let mut profiles: Vec<Profile> = stmt
            .query_map(params![owner_id], profile_from_row)?
            .collect::<Result<_, _>>()?;
        drop(stmt);
        for profile in &mut profiles {
            load_profile_relations(&conn, profile)?;
        }
        Ok(profiles)
    }

    pub fn create_profile(&self, owner_id: i64, input: &ProfileCreate) -> anyhow::Result<Profile> {
        let now = now_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO profiles (name, platform, note, proxy, created_at, updated_at, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6)",
            params![input.name, input.platform, input.note, input.proxy, now, owner_id],
        )
        .context("failed to insert profile")?;
        let profile_id = conn.last_insert_rowid();

        replace_profile_groups(&conn, profile_id, &input.groups)?;
        replace_profile_tags(&conn, profile_id, &input.tags)?;

        let mut profile = conn.query_row(
            "SELECT * FROM profiles WHERE id = ?1",
            params![profile_id],
            profile_from_row,
        )?;
        load_profile_relations(&conn, &mut profile)?;
        Ok(profile)
    }

    pub fn find_profile(&self, owner_id: i64, profile_id: i64) -> anyhow::Result<Option<Profile>> {
        let conn = self.conn();
        let profile = conn
            .query_row(
                "SELECT * FROM profiles WHERE id = ?1 AND owner_id = ?2",
                params![profile_id, owner_id],
                profile_from_row,
            )
            .optional()?;
        match profile {
            Some(mut p) => {
                load_profile_relations(&conn, &mut p)?;
                Ok(Some(p))
            }
            None => Ok(None),
        }
    }

    /// Partial update. None fields keep their current value; sent
    /// group/tag lists fully replace the attachments.
    pub fn update_profile(
        &self,
        owner_id: i64,
        profile_id: i64,
        input: &ProfileUpdate,
    ) -> anyhow::Result<Option<Profile>> {
        let conn = self.conn();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM profiles WHERE id = ?1 AND owner_id = ?2",
                params![profile_id, owner_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }

        conn.execute(
            "UPDATE profiles SET
                 name = COALESCE(?1, name),
                 platform = COALESCE(?2, platform),
                 note = COALESCE(?3, note),
                 proxy = COALESCE(?4, proxy),
                 status = COALESCE(?5, status),
                 shared_on_cloud = COALESCE(?6, shared_on_cloud),
                 updated_at = ?7
             WHERE id = ?8",
            params![
                input.name,
                input.platform,
                input.note,
                input.proxy,
                input.status,
                input.shared_on_cloud,
                now_rfc3339(),
                profile_id
            ],
        )?;

        if let Some(groups) = &input.groups {
            replace_profile_groups(&conn, profile_id, groups)?;
        }
        if let Some(tags) = &input.tags {
            replace_profile_tags(&conn, profile_id, tags)?;
        }

        let mut profile = conn.query_row(
            "SELECT * FROM profiles WHERE id = ?1",
            params![profile_id],
            profile_from_row,
        )?;
        load_profile_relations(&conn, &mut profile)?;
        Ok(Some(profile))
    }
}
