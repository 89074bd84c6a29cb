use anyhow::Context;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::models::proxy::{Proxy, ProxyInput};
use crate::models::tag::Tag;
use crate::utils::time::now_rfc3339;

use super::tags::get_or_create_tag;
use super::Store;

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    25
}

/// Filter and pagination options for the proxy listing
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Default for ProxyQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            tag: None,
            search: None,
            status: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProxyPage {
    pub proxies: Vec<Proxy>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
    pub tags: Vec<String>,
}

/// Result of one connectivity probe, applied back to the record
#[derive(Debug)]
pub struct TestOutcome {
    pub live: bool,
    pub response_time_ms: Option<f64>,
    pub public_ip: Option<String>,
}

fn proxy_from_row(row: &Row<'_>) -> rusqlite::Result<Proxy> {
    Ok(Proxy {
        id: row.get("id")?,
        name: row.get("name")?,
        host: row.get("host")?,
        port: row.get("port")?,
        username: row.get("username")?,
        password: row.get("password")?,
        scheme: row.get("type")?,
        status: row.get("status")?,
        response_time: row.get("response_time")?,
        public_ip: row.get("public_ip")?,
        location: row.get("location")?,
        fail_count: row.get("fail_count")?,
        last_tested: row.get("last_tested")?,
        last_used_at: row.get("last_used_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tags: Vec::new(),
    })
}

fn load_proxy_tags(conn: &Connection, proxy_id: i64) -> anyhow::Result<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.created_at FROM tags t
         JOIN proxy_tags pt ON pt.tag_id = t.id
         WHERE pt.proxy_id = ?1 ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map(params![proxy_id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<Result<_, _>>()?;
    Ok(tags)
}

fn replace_proxy_tags(conn: &Connection, proxy_id: i64, names: &[String]) -> anyhow::Result<()> {
    conn.execute("DELETE FROM proxy_tags WHERE proxy_id = ?1", params![proxy_id])?;
    for name in names {
        let tag = get_or_create_tag(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO proxy_tags (proxy_id, tag_id) VALUES (?1, ?2)",
            params![proxy_id, tag.id],
        )?;
    }
    Ok(())
}

fn id_placeholders(count: usize) -> String {
    (0..count)
        .map(|i| format!("?{}", i + 2))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Store {
    pub fn add_proxy(&self, owner_id: i64, input: &ProxyInput) -> anyhow::Result<Proxy> {
        let now = now_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO proxies (name, host, port, username, password, type, created_at, updated_at, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8)",
            params![
                input.display_name(),
                input.host.trim(),
                input.port,
                input.username.trim(),
                input.password.trim(),
                input.scheme,
                now,
                owner_id
            ],
        )
        .context("failed to insert proxy")?;
        let proxy_id = conn.last_insert_rowid();

        if let Some(tags) = &input.tags {
            replace_proxy_tags(&conn, proxy_id, tags)?;
        }

        let mut proxy = conn.query_row(
            "SELECT * FROM proxies WHERE id = ?1",
            params![proxy_id],
            proxy_from_row,
        )?;
        proxy.tags = load_proxy_tags(&conn, proxy_id)?;
        Ok(proxy)
    }

    /// Returns None when the proxy does not exist or belongs to someone
    /// else.
    pub fn update_proxy(
        &self,
        owner_id: i64,
        proxy_id: i64,
        input: &ProxyInput,
    ) -> anyhow::Result<Option<Proxy>> {
        let conn = self.conn();
        let updated = conn.execute(
            "UPDATE proxies SET name = ?1, host = ?2, port = ?3, username = ?4,
                 password = ?5, type = ?6, updated_at = ?7
             WHERE id = ?8 AND owner_id = ?9",
            params![
                input.display_name(),
                input.host.trim(),
                input.port,
                input.username.trim(),
                input.password.trim(),
                input.scheme,
                now_rfc3339(),
                proxy_id,
                owner_id
            ],
        )?;
        if updated == 0 {
            return Ok(None);
        }

        if let Some(tags) = &input.tags {
            replace_proxy_tags(&conn, proxy_id, tags)?;
        }

        let mut proxy = conn.query_row(
            "SELECT * FROM proxies WHERE id = ?1",
            params![proxy_id],
            proxy_from_row,
        )?;
        proxy.tags = load_proxy_tags(&conn, proxy_id)?;
        Ok(Some(proxy))
    }

    pub fn delete_proxies(&self, owner_id: i64, ids: &[i64]) -> anyhow::Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "DELETE FROM proxies WHERE owner_id = ?1 AND id IN ({})",
            id_placeholders(ids.len())
        );
        let deleted = self.conn().execute(
            &sql,
            params_from_iter(std::iter::once(owner_id).chain(ids.iter().copied())),
        )?;
        Ok(deleted)
    }

    pub fn get_proxies_by_ids(&self, owner_id: i64, ids: &[i64]) -> anyhow::Result<Vec<Proxy>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn();
        let sql = format!(
            "SELECT * FROM proxies WHERE owner_id = ?1 AND id IN ({}) ORDER BY id",
            id_placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut proxies: Vec<Proxy> = stmt
            .query_map(
                params_from_iter(std::iter::once(owner_id).chain(ids.iter().copied())),
                proxy_from_row,
            )?
            .collect::<Result<_, _>>()?;
        for proxy in &mut proxies {
            proxy.tags = load_proxy_tags(&conn, proxy.id)?;
        }
        Ok(proxies)
    }

    pub fn list_proxies(&self, owner_id: i64, query: &ProxyQuery) -> anyhow::Result<ProxyPage> {
        let conn = self.conn();

        let mut clauses = vec!["p.owner_id = ?".to_string()];
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_id)];

        if let Some(tag) = query.tag.as_deref().filter(|t| *t != "All Tags") {
            clauses.push(
                "p.id IN (SELECT pt.proxy_id FROM proxy_tags pt
                          JOIN tags t ON t.id = pt.tag_id WHERE t.name = ?)"
                    .to_string(),
            );
            args.push(Box::new(tag.to_string()));
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            clauses.push(
                "(lower(p.name) LIKE ? OR lower(p.host) LIKE ? OR lower(p.username) LIKE ?)"
                    .to_string(),
            );
            for _ in 0..3 {
                args.push(Box::new(pattern.clone()));
            }
        }

        if let Some(status) = query.status.as_deref().filter(|s| *s != "all") {
            clauses.push("p.status = ?".to_string());
            args.push(Box::new(status.to_string()));
        }

        let where_clause = clauses.join(" AND ");
        let arg_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a.as_ref()).collect();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM proxies p WHERE {where_clause}"),
            arg_refs.as_slice(),
            |row| row.get(0),
        )?;

        let page = query.page.max(1);
        let limit = query.limit.max(1);
        let offset = (page as i64 - 1) * limit as i64;

        let mut stmt = conn.prepare(&format!(
            "SELECT p.* FROM proxies p WHERE {where_clause} ORDER BY p.id LIMIT {limit} OFFSET {offset}"
        ))?;
        let mut proxies: Vec<Proxy> = stmt
            .query_map(arg_refs.as_slice(), proxy_from_row)?
            .collect::<Result<_, _>>()?;
        drop(stmt);
        for proxy in &mut proxies {
            proxy.tags = load_proxy_tags(&conn, proxy.id)?;
        }

        // Distinct tag names across all of this user's proxies, for the
        // filter dropdown.
        let mut tag_stmt = conn.prepare(
            "SELECT DISTINCT t.name FROM tags t
             JOIN proxy_tags pt ON pt.tag_id = t.id
             JOIN proxies p ON p.id = pt.proxy_id
             WHERE p.owner_id = ?1 ORDER BY t.name",
        )?;
        let tags = tag_stmt
            .query_map(params![owner_id], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        Ok(ProxyPage {
            proxies,
            total,
            page,
            limit,
            total_pages: (total + limit as i64 - 1) / limit as i64,
            tags,
        })
    }

    /// Apply a probe result. A live probe resets the failure streak,
    /// a dead one extends it.
    pub fn record_test_result(&self, proxy_id: i64, outcome: &TestOutcome) -> anyhow::Result<()> {
        let now = now_rfc3339();
        if outcome.live {
            self.conn().execute(
                "UPDATE proxies SET status = 'live', response_time = ?1, public_ip = ?2,
                     fail_count = 0, last_tested = ?3, updated_at = ?3
                 WHERE id = ?4",
                params![outcome.response_time_ms, outcome.public_ip, now, proxy_id],
            )?;
        } else {
            self.conn().execute(
                "UPDATE proxies SET status = 'dead', fail_count = fail_count + 1,
                     last_tested = ?1, updated_at = ?1
                 WHERE id = ?2",
                params![now, proxy_id],
            )?;
        }
        Ok(())
    }

    pub fn find_proxy(&self, owner_id: i64, proxy_id: i64) -> anyhow::Result<Option<Proxy>> {
        let conn = self.conn();
        let proxy = conn
            .query_row(
                "SELECT * FROM proxies WHERE id = ?1 AND owner_id = ?2",
                params![proxy_id, owner_id],
                proxy_from_row,
            )
            .optional()?;
        match proxy {
            Some(mut p) => {
                p.tags = load_proxy_tags(&conn, p.id)?;
                Ok(Some(p))
            }
            None => Ok(None),
        }
    }
}
