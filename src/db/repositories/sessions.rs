use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_mode, to_i64},
};
use crate::models::{Session, SessionMode};

/// Completed sessions kept per mode; older ones are pruned on write.
pub const MAX_SESSIONS_PER_MODE: usize = 30;

fn row_to_session(row: &Row) -> Result<Session> {
    let payload: String = row.get("payload")?;
    let start_date: String = row.get("start_date")?;
    let mode: String = row.get("mode")?;

    let mut session: Session =
        serde_json::from_str(&payload).context("failed to decode session payload")?;
    // Indexed columns are authoritative.
    session.start_date = parse_datetime(&start_date, "start_date")?;
    session.mode = parse_mode(&mode)?;
    Ok(session)
}

pub(crate) fn upsert_session_blocking(conn: &mut Connection, session: &Session) -> Result<()> {
    let payload = serde_json::to_string(session).context("failed to encode session")?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO sessions (id, start_date, end_date, mode, payload, sample_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             start_date = excluded.start_date,
             end_date = excluded.end_date,
             mode = excluded.mode,
             payload = excluded.payload,
             sample_count = excluded.sample_count",
        params![
            session.id.to_string(),
            format_datetime(&session.start_date),
            session.end_date.as_ref().map(format_datetime),
            session.mode.as_str(),
            payload,
            to_i64(session.samples.len())?,
        ],
    )
    .with_context(|| format!("failed to upsert session {}", session.id))?;

    tx.execute(
        "DELETE FROM sessions
         WHERE mode = ?1
           AND id NOT IN (
               SELECT id FROM sessions
               WHERE mode = ?1
               ORDER BY start_date DESC
               LIMIT ?2
           )",
        params![session.mode.as_str(), to_i64(MAX_SESSIONS_PER_MODE)?],
    )
    .context("failed to prune old sessions")?;

    tx.commit().context("failed to commit session upsert")?;
    Ok(())
}

impl Database {
    pub async fn upsert_session(&self, session: &Session) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| upsert_session_blocking(conn, &record))
            .await
    }

    /// Newest first, optionally restricted to one mode.
    pub async fn list_sessions(&self, mode: Option<SessionMode>) -> Result<Vec<Session>> {
        self.execute(move |conn| {
            let mut sessions = Vec::new();
            match mode {
                Some(mode) => {
                    let mut stmt = conn.prepare(
                        "SELECT start_date, mode, payload FROM sessions
                         WHERE mode = ?1
                         ORDER BY start_date DESC",
                    )?;
                    let mut rows = stmt.query(params![mode.as_str()])?;
                    while let Some(row) = rows.next()? {
                        sessions.push(row_to_session(row)?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT start_date, mode, payload FROM sessions
                         ORDER BY start_date DESC",
                    )?;
                    let mut rows = stmt.query([])?;
                    while let Some(row) = rows.next()? {
                        sessions.push(row_to_session(row)?);
                    }
                }
            }
            Ok(sessions)
        })
        .await
    }

    pub async fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT start_date, mode, payload FROM sessions WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![id.to_string()])?;
            let session = match rows.next()? {
                Some(row) => Some(row_to_session(row)?),
                None => None,
            };
            Ok(session)
        })
        .await
    }

    /// Returns whether a row was removed.
    pub async fn delete_session(&self, id: Uuid) -> Result<bool> {
        self.execute(move |conn| {
            let removed = conn
                .execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])
                .with_context(|| format!("failed to delete session {id}"))?;
            Ok(removed > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn completed(mode: SessionMode, minutes_ago: i64) -> Session {
        let start = Utc::now() - Duration::minutes(minutes_ago);
        let mut session = Session::begin(mode, start);
        session.samples = vec![
            Sample::new(start, 0.0, 100.1, 150.0),
            Sample::new(start + Duration::seconds(5), 2.0, 100.08, 152.0),
        ];
        session.finalize(start + Duration::seconds(10));
        session
    }

    fn open(dir: &TempDir) -> Database {
        Database::new(dir.path().join("howhigh.sqlite")).unwrap()
    }

    #[tokio::test]
    async fn upsert_then_list_newest_first() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        let older = completed(SessionMode::Altimeter, 30);
        let newer = completed(SessionMode::Altimeter, 5);
        db.upsert_session(&older).await.unwrap();
        db.upsert_session(&newer).await.unwrap();

        let sessions = db.list_sessions(None).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, newer.id);
        assert_eq!(sessions[1].samples.len(), 2);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_row() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        let mut session = completed(SessionMode::Barometer, 1);
        db.upsert_session(&session).await.unwrap();
        session.note = Some("summit".into());
        db.upsert_session(&session).await.unwrap();

        let stored = db.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(stored.note.as_deref(), Some("summit"));
        assert_eq!(db.list_sessions(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mode_filter_and_delete() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        let alt = completed(SessionMode::Altimeter, 3);
        let baro = completed(SessionMode::Barometer, 2);
        db.upsert_session(&alt).await.unwrap();
        db.upsert_session(&baro).await.unwrap();

        let barometer = db.list_sessions(Some(SessionMode::Barometer)).await.unwrap();
        assert_eq!(barometer.len(), 1);
        assert_eq!(barometer[0].id, baro.id);

        assert!(db.delete_session(alt.id).await.unwrap());
        assert!(!db.delete_session(alt.id).await.unwrap());
        assert!(db.get_session(alt.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn retention_is_per_mode() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        let kept_barometer = completed(SessionMode::Barometer, 500);
        db.upsert_session(&kept_barometer).await.unwrap();

        for minutes_ago in (0..35).rev() {
            db.upsert_session(&completed(SessionMode::Altimeter, minutes_ago))
                .await
                .unwrap();
        }

        let altimeter = db.list_sessions(Some(SessionMode::Altimeter)).await.unwrap();
        assert_eq!(altimeter.len(), MAX_SESSIONS_PER_MODE);
        assert!(db.get_session(kept_barometer.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        let session = completed(SessionMode::Altimeter, 1);
        {
            let db = open(&dir);
            db.upsert_session(&session).await.unwrap();
        }
        let db = open(&dir);
        let stored = db.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(stored, session);
    }
}
