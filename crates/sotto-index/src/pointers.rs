//! Typed pointer operations on the index.
//!
//! `list_conversation` is the only read path.  Its ordering -- `created_at`
//! ascending, insertion order as the tie-break -- is load-bearing: it is
//! the only ordering signal the join step has, since vault documents carry
//! no timestamp of their own.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use sotto_shared::protocol::MessagePointer;
use sotto_shared::types::{ContainerId, DocumentId, UserId};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Append one pointer.  Returns `true` if a row was inserted, `false`
    /// if an identical pointer (same container + document) already existed.
    ///
    /// The index itself never retries; retry policy belongs to the caller,
    /// and the natural-key uniqueness is what makes that retry safe.
    pub fn append_pointer(&self, pointer: &MessagePointer) -> Result<bool> {
        let affected = self.conn().execute(
            "INSERT OR IGNORE INTO pointers
                 (created_at, from_user_id, to_user_id, container_id, document_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                pointer.created_at.to_rfc3339(),
                pointer.from_user_id.as_str(),
                pointer.to_user_id.as_str(),
                pointer.container_id.to_string(),
                pointer.document_id.to_string(),
            ],
        )?;
        Ok(affected > 0)
    }

    /// All pointers between `user_a` and `user_b`, in either direction,
    /// ordered ascending by creation time with insertion order breaking
    /// ties.
    pub fn list_conversation(
        &self,
        user_a: &UserId,
        user_b: &UserId,
    ) -> Result<Vec<MessagePointer>> {
        let mut stmt = self.conn().prepare(
            "SELECT created_at, from_user_id, to_user_id, container_id, document_id
             FROM pointers
             WHERE (from_user_id = ?1 AND to_user_id = ?2)
                OR (from_user_id = ?2 AND to_user_id = ?1)
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![user_a.as_str(), user_b.as_str()], row_to_pointer)?;

        let mut pointers = Vec::new();
        for row in rows {
            pointers.push(row?);
        }
        Ok(pointers)
    }
}

fn row_to_pointer(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessagePointer> {
    let created_at_str: String = row.get(0)?;
    let from_user_id: String = row.get(1)?;
    let to_user_id: String = row.get(2)?;
    let container_id_str: String = row.get(3)?;
    let document_id_str: String = row.get(4)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let container_id = Uuid::parse_str(&container_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let document_id = Uuid::parse_str(&document_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(MessagePointer {
        created_at,
        from_user_id: UserId::new(from_user_id),
        to_user_id: UserId::new(to_user_id),
        container_id: ContainerId(container_id),
        document_id: DocumentId(document_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_test_db(dir: &tempfile::TempDir) -> Database {
        Database::open_at(&dir.path().join("test.db")).unwrap()
    }

    fn pointer(from: &str, to: &str, at: DateTime<Utc>) -> MessagePointer {
        MessagePointer {
            created_at: at,
            from_user_id: UserId::new(from),
            to_user_id: UserId::new(to),
            container_id: ContainerId(Uuid::new_v4()),
            document_id: DocumentId::new(),
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn append_then_list_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        let p = pointer("alice", "bob", at(0));
        assert!(db.append_pointer(&p).unwrap());

        let listed = db
            .list_conversation(&UserId::new("alice"), &UserId::new("bob"))
            .unwrap();
        assert_eq!(listed, vec![p]);
    }

    #[test]
    fn list_is_direction_agnostic() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        db.append_pointer(&pointer("alice", "bob", at(0))).unwrap();
        db.append_pointer(&pointer("bob", "alice", at(1))).unwrap();

        let from_alice = db
            .list_conversation(&UserId::new("alice"), &UserId::new("bob"))
            .unwrap();
        let from_bob = db
            .list_conversation(&UserId::new("bob"), &UserId::new("alice"))
            .unwrap();

        assert_eq!(from_alice.len(), 2);
        assert_eq!(from_alice, from_bob);
    }

    #[test]
    fn listing_is_ordered_by_created_at_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        // Inserted out of order on purpose.
        let later = pointer("alice", "bob", at(10));
        let earlier = pointer("bob", "alice", at(5));
        db.append_pointer(&later).unwrap();
        db.append_pointer(&earlier).unwrap();

        let listed = db
            .list_conversation(&UserId::new("alice"), &UserId::new("bob"))
            .unwrap();
        assert_eq!(listed, vec![earlier, later]);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        let first = pointer("alice", "bob", at(0));
        let second = pointer("alice", "bob", at(0));
        let third = pointer("bob", "alice", at(0));
        for p in [&first, &second, &third] {
            db.append_pointer(p).unwrap();
        }

        let listed = db
            .list_conversation(&UserId::new("alice"), &UserId::new("bob"))
            .unwrap();
        assert_eq!(listed, vec![first, second, third]);
    }

    #[test]
    fn re_appending_the_same_pointer_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        let p = pointer("alice", "bob", at(0));
        assert!(db.append_pointer(&p).unwrap());
        assert!(!db.append_pointer(&p).unwrap());

        let listed = db
            .list_conversation(&UserId::new("alice"), &UserId::new("bob"))
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn disjoint_pairs_do_not_leak_into_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        db.append_pointer(&pointer("alice", "bob", at(0))).unwrap();
        db.append_pointer(&pointer("carol", "dave", at(0))).unwrap();

        let listed = db
            .list_conversation(&UserId::new("alice"), &UserId::new("bob"))
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].from_user_id, UserId::new("alice"));
    }
}
