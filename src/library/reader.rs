//! SQLite reader for zotero.sqlite
//!
//! Opens the live Zotero database read-only and materializes the snapshot
//! types. All queries exclude trashed rows via `deletedItems`. Malformed
//! position payloads and timestamps degrade to `None` instead of failing a
//! load.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use super::types::{AnnotationKind, Attachment, Creator, Item, LibraryKind, RawAnnotation};

/// SQL datetime format used by the items table
const SQL_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Item types that are children of a reference item, never syncable roots
const CHILD_TYPES: [&str; 3] = ["attachment", "annotation", "note"];

/// Read-only handle to a Zotero library database
pub struct ZoteroLibrary {
    pool: SqlitePool,
}

impl ZoteroLibrary {
    /// Open the database at `path` without taking write locks
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool; used by tests
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve any item key to the key of its owning top-level item
    ///
    /// Annotation keys climb to their attachment and on to its parent;
    /// attachment keys climb to their parent. A standalone attachment is its
    /// own root. Returns `None` for unknown or trashed keys.
    pub async fn top_level_key(&self, key: &str) -> Result<Option<String>> {
        let Some(row) = self.item_row(key).await? else {
            return Ok(None);
        };

        let root_id = match row.type_name.as_str() {
            "annotation" => {
                let Some(attachment_id) = self.annotation_parent(row.item_id).await? else {
                    return Ok(None);
                };
                self.attachment_parent(attachment_id)
                    .await?
                    .unwrap_or(attachment_id)
            }
            "attachment" => self
                .attachment_parent(row.item_id)
                .await?
                .unwrap_or(row.item_id),
            _ => row.item_id,
        };

        self.item_key(root_id).await
    }

    /// Load a top-level item with creators, fields and annotated attachments
    ///
    /// Returns `None` for unknown keys and for keys that name a child item;
    /// resolve those through [`Self::top_level_key`] first.
    pub async fn item(&self, key: &str) -> Result<Option<Item>> {
        let Some(row) = self.item_row(key).await? else {
            return Ok(None);
        };
        if CHILD_TYPES.contains(&row.type_name.as_str()) {
            return Ok(None);
        }

        let title = self
            .field(row.item_id, "title")
            .await?
            .unwrap_or_else(|| "Untitled".to_string());
        let url = self.field(row.item_id, "url").await?;
        let doi = self.field(row.item_id, "DOI").await?;
        let date = self.field(row.item_id, "date").await?;
        let creators = self.creators(row.item_id).await?;
        let attachments = self.attachments(row.item_id).await?;

        let library = match row.library_type.as_str() {
            "user" => LibraryKind::User,
            _ => LibraryKind::Group,
        };

        Ok(Some(Item {
            key: row.key,
            title,
            url,
            doi,
            date,
            creators,
            library,
            attachments,
        }))
    }

    /// Resolve a key of any kind and load its top-level item
    pub async fn resolve_item(&self, key: &str) -> Result<Option<Item>> {
        match self.top_level_key(key).await? {
            Some(top_key) => self.item(&top_key).await,
            None => Ok(None),
        }
    }

    /// Keys of every non-trashed top-level item, in database order
    pub async fn top_level_item_keys(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT i.key
            FROM items i
            JOIN itemTypes it ON it.itemTypeID = i.itemTypeID
            WHERE it.typeName NOT IN ('attachment', 'annotation', 'note')
              AND i.itemID NOT IN (SELECT itemID FROM deletedItems)
            ORDER BY i.itemID
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    /// Top-level keys of items (or their children) modified after `since`
    ///
    /// Feeds the watch loop: a changed annotation or attachment reports its
    /// owning reference item, deduplicated in first-seen order.
    pub async fn modified_since(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT i.key
            FROM items i
            WHERE i.dateModified > ?
              AND i.itemID NOT IN (SELECT itemID FROM deletedItems)
            ORDER BY i.dateModified
            "#,
        )
        .bind(since.format(SQL_DATETIME).to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut keys = Vec::new();
        for (key,) in rows {
            if let Some(top) = self.top_level_key(&key).await? {
                if !keys.contains(&top) {
                    keys.push(top);
                }
            }
        }
        Ok(keys)
    }

    async fn item_row(&self, key: &str) -> Result<Option<ItemRow>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT i.itemID AS item_id, i.key, it.typeName AS type_name,
                   l.type AS library_type
            FROM items i
            JOIN itemTypes it ON it.itemTypeID = i.itemTypeID
            JOIN libraries l ON l.libraryID = i.libraryID
            WHERE i.key = ?
              AND i.itemID NOT IN (SELECT itemID FROM deletedItems)
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn item_key(&self, item_id: i64) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT key FROM items WHERE itemID = ?")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(key,)| key))
    }

    async fn attachment_parent(&self, item_id: i64) -> Result<Option<i64>> {
        let row: Option<(Option<i64>,)> =
            sqlx::query_as("SELECT parentItemID FROM itemAttachments WHERE itemID = ?")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(parent,)| parent))
    }

    async fn annotation_parent(&self, item_id: i64) -> Result<Option<i64>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT parentItemID FROM itemAnnotations WHERE itemID = ?")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(parent,)| parent))
    }

    /// Field value from the itemData triple store
    async fn field(&self, item_id: i64, name: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT idv.value
            FROM itemData d
            JOIN fields f ON f.fieldID = d.fieldID
            JOIN itemDataValues idv ON idv.valueID = d.valueID
            WHERE d.itemID = ? AND f.fieldName = ?
            "#,
        )
        .bind(item_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(value,)| value).filter(|v| !v.is_empty()))
    }

    async fn creators(&self, item_id: i64) -> Result<Vec<Creator>> {
        let rows: Vec<(Option<String>, Option<String>)> = sqlx::query_as(
            r#"
            SELECT c.firstName, c.lastName
            FROM itemCreators ic
            JOIN creators c ON c.creatorID = ic.creatorID
            WHERE ic.itemID = ?
            ORDER BY ic.orderIndex
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(first, last)| Creator {
                first_name: first.unwrap_or_default(),
                last_name: last.unwrap_or_default(),
            })
            .collect())
    }

    async fn attachments(&self, parent_id: i64) -> Result<Vec<Attachment>> {
        let rows = sqlx::query_as::<_, AttachmentRow>(
            r#"
            SELECT i.itemID AS item_id, i.key, ia.contentType AS content_type
            FROM itemAttachments ia
            JOIN items i ON i.itemID = ia.itemID
            WHERE ia.parentItemID = ?
              AND i.itemID NOT IN (SELECT itemID FROM deletedItems)
            ORDER BY i.itemID
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        let mut attachments = Vec::with_capacity(rows.len());
        for row in rows {
            let title = self.field(row.item_id, "title").await?;
            let url = self.field(row.item_id, "url").await?;
            let annotations = self.annotations(row.item_id, &row.key).await?;

            attachments.push(Attachment {
                key: row.key,
                title,
                url,
                content_type: row.content_type,
                annotations,
            });
        }
        Ok(attachments)
    }

    async fn annotations(&self, attachment_id: i64, attachment_key: &str) -> Result<Vec<RawAnnotation>> {
        let rows = sqlx::query_as::<_, AnnotationRow>(
            r#"
            SELECT i.itemID AS item_id, i.key, an.type AS kind, an.text, an.comment,
                   an.color, an.pageLabel AS page_label, an.sortIndex AS sort_index,
                   an.position, i.dateAdded AS date_added, i.dateModified AS date_modified
            FROM itemAnnotations an
            JOIN items i ON i.itemID = an.itemID
            WHERE an.parentItemID = ?
              AND i.itemID NOT IN (SELECT itemID FROM deletedItems)
            ORDER BY an.sortIndex
            "#,
        )
        .bind(attachment_id)
        .fetch_all(&self.pool)
        .await?;

        let mut annotations = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(kind) = annotation_kind(row.kind) else {
                tracing::debug!("Skipping annotation {} with unknown type {}", row.key, row.kind);
                continue;
            };

            let tags = self.tags(row.item_id).await?;

            annotations.push(RawAnnotation {
                key: row.key,
                parent_key: attachment_key.to_string(),
                kind,
                text: row.text.filter(|t| !t.is_empty()),
                comment: row.comment.filter(|c| !c.is_empty()),
                color: row.color.filter(|c| !c.is_empty()),
                page_label: row.page_label.filter(|p| !p.is_empty()),
                sort_index: row.sort_index.filter(|s| !s.is_empty()),
                page_index: row.position.as_deref().and_then(parse_page_index),
                date_added: row.date_added.as_deref().and_then(parse_sql_datetime),
                date_modified: row.date_modified.as_deref().and_then(parse_sql_datetime),
                tags,
            });
        }
        Ok(annotations)
    }

    async fn tags(&self, item_id: i64) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT t.name
            FROM itemTags itg
            JOIN tags t ON t.tagID = itg.tagID
            WHERE itg.itemID = ?
            ORDER BY t.name
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

/// Annotation type codes as stored in itemAnnotations.type
fn annotation_kind(code: i64) -> Option<AnnotationKind> {
    match code {
        1 => Some(AnnotationKind::Highlight),
        2 => Some(AnnotationKind::Note),
        3 => Some(AnnotationKind::Image),
        4 => Some(AnnotationKind::Ink),
        5 => Some(AnnotationKind::Underline),
        // Free-floating text annotations behave like notes downstream
        6 => Some(AnnotationKind::Note),
        _ => None,
    }
}

/// Pull the zero-based page index out of the JSON position payload
fn parse_page_index(position: &str) -> Option<u32> {
    let value: serde_json::Value = serde_json::from_str(position).ok()?;
    value.get("pageIndex")?.as_u64().map(|idx| idx as u32)
}

fn parse_sql_datetime(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, SQL_DATETIME)
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    item_id: i64,
    key: String,
    type_name: String,
    library_type: String,
}

#[derive(sqlx::FromRow)]
struct AttachmentRow {
    item_id: i64,
    key: String,
    content_type: Option<String>,
}

#[derive(sqlx::FromRow)]
struct AnnotationRow {
    item_id: i64,
    key: String,
    kind: i64,
    text: Option<String>,
    comment: Option<String>,
    color: Option<String>,
    page_label: Option<String>,
    sort_index: Option<String>,
    position: Option<String>,
    date_added: Option<String>,
    date_modified: Option<String>,
}
