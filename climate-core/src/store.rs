//! SQLite storage for cities the user pinned.
//!
//! `(name, state)` is unique: saving a city that is already there leaves the
//! stored row alone. The connection sits behind a mutex so the existence
//! check and the insert happen as one step, and the table carries a UNIQUE
//! constraint as well.

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{error::Result, model::SavedCity};

/// Result of [`SavedCityStore::save`].
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Inserted(SavedCity),
    AlreadySaved(SavedCity),
}

impl SaveOutcome {
    pub fn city(&self) -> &SavedCity {
        match self {
            Self::Inserted(city) | Self::AlreadySaved(city) => city,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

pub struct SavedCityStore {
    conn: Mutex<Connection>,
    updates: watch::Sender<Vec<SavedCity>>,
}

impl SavedCityStore {
    /// Open or create the database at `path`. The parent directory must exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        let initial = list_cities(&conn)?;
        let (updates, _) = watch::channel(initial);
        Ok(Self { conn: Mutex::new(conn), updates })
    }

    /// All saved cities, ascending by name.
    pub fn list(&self) -> Result<Vec<SavedCity>> {
        let conn = self.conn.lock();
        list_cities(&conn)
    }

    /// Receiver that always holds the latest sorted list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<SavedCity>> {
        self.updates.subscribe()
    }

    pub fn exists(&self, name: &str, state: &str) -> Result<Option<SavedCity>> {
        let conn = self.conn.lock();
        find_city(&conn, name, state)
    }

    /// Insert the city unless `(name, state)` is already saved.
    pub fn save(
        &self,
        name: &str,
        state: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<SaveOutcome> {
        let conn = self.conn.lock();

        if let Some(existing) = find_city(&conn, name, state)? {
            debug!(name, state, "city already saved");
            return Ok(SaveOutcome::AlreadySaved(existing));
        }

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO saved_cities (name, state, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, state, latitude, longitude],
        )?;

        if inserted == 0 {
            // Another process got there between our check and the insert.
            return match find_city(&conn, name, state)? {
                Some(existing) => Ok(SaveOutcome::AlreadySaved(existing)),
                None => Err(rusqlite::Error::QueryReturnedNoRows.into()),
            };
        }

        let city = SavedCity {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            state: state.to_string(),
            latitude,
            longitude,
        };
        info!(id = city.id, name, state, "saved city");

        self.publish(&conn)?;
        Ok(SaveOutcome::Inserted(city))
    }

    /// Remove `city` by id. Returns whether a row was removed.
    pub fn delete(&self, city: &SavedCity) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM saved_cities WHERE id = ?1", params![city.id])?;
        self.after_delete(&conn, removed)
    }

    pub fn delete_by_key(&self, name: &str, state: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM saved_cities WHERE name = ?1 AND state = ?2",
            params![name, state],
        )?;
        self.after_delete(&conn, removed)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM saved_cities", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn after_delete(&self, conn: &Connection, removed: usize) -> Result<bool> {
        if removed == 0 {
            return Ok(false);
        }
        info!(removed, "deleted saved city");
        self.publish(conn)?;
        Ok(true)
    }

    fn publish(&self, conn: &Connection) -> Result<()> {
        let cities = list_cities(conn)?;
        self.updates.send_replace(cities);
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS saved_cities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            state TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            UNIQUE (name, state)
        );

        CREATE INDEX IF NOT EXISTS idx_saved_cities_name ON saved_cities(name);
        "#,
    )?;
    Ok(())
}

fn row_to_city(row: &rusqlite::Row) -> rusqlite::Result<SavedCity> {
    Ok(SavedCity {
        id: row.get(0)?,
        name: row.get(1)?,
        state: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
    })
}

fn list_cities(conn: &Connection) -> Result<Vec<SavedCity>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, state, latitude, longitude FROM saved_cities
         ORDER BY name ASC, state ASC",
    )?;
    let cities = stmt.query_map([], row_to_city)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cities)
}

fn find_city(conn: &Connection, name: &str, state: &str) -> Result<Option<SavedCity>> {
    let city = conn
        .query_row(
            "SELECT id, name, state, latitude, longitude FROM saved_cities
             WHERE name = ?1 AND state = ?2",
            params![name, state],
            row_to_city,
        )
        .optional()?;
    Ok(city)
}
