use crate::models::LibraryItem;
use crate::preferences::PreferenceStore;
use chrono::Utc;
use eyre::Result;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

// Re-use the get_app_data_prefix from config.rs
use crate::config::get_app_data_prefix;

/// SQLite-backed storage for preferences and the reading library.
pub struct State {
    conn: Connection,
}

impl State {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        Self::open(&prefix.join("states.db"))
    }

    pub fn open(filepath: &Path) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = filepath.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(filepath)?;
        Self::init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_db(&conn)?;
        Ok(Self { conn })
    }

    fn init_db(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS library (
                novel TEXT NOT NULL,
                source TEXT NOT NULL,
                last_read DATETIME NOT NULL,
                PRIMARY KEY (novel, source)
            );
            ",
        )?;
        Ok(())
    }

    pub fn get_from_history(&self) -> Result<Vec<LibraryItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT last_read, novel, source FROM library ORDER BY last_read DESC")?;

        let library_items_iter = stmt.query_map([], |row| {
            Ok(LibraryItem {
                last_read: row.get(0)?,
                novel: row.get(1)?,
                source: row.get(2)?,
            })
        })?;

        let mut library_items = Vec::new();
        for item_result in library_items_iter {
            library_items.push(item_result?);
        }

        Ok(library_items)
    }

    pub fn update_library(&self, novel: &str, source: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO library (novel, source, last_read) VALUES (?, ?, ?)",
            params![novel, source, Utc::now()],
        )?;
        Ok(())
    }

    pub fn delete_from_library(&self, novel: &str, source: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM library WHERE novel=? AND source=?",
            params![novel, source],
        )?;
        Ok(())
    }
}

impl PreferenceStore for State {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key=?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO preferences (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Novel, Theme};
    use crate::preferences::{self, Preferences, Setting};
    use tempfile::TempDir;

    fn setup_test_state() -> (State, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test_states.db");
        let state = State::open(&db_path).unwrap();
        (state, temp_dir)
    }

    #[test]
    fn test_preferences_round_trip() {
        let (mut state, _temp_dir) = setup_test_state();
        assert_eq!(state.get("fontSize").unwrap(), None);

        state.set("fontSize", "20").unwrap();
        state.set("fontSize", "22").unwrap();
        assert_eq!(state.get("fontSize").unwrap().as_deref(), Some("22"));
    }

    #[test]
    fn test_preferences_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("states.db");
        let novel = Novel::new("demo");

        {
            let mut state = State::open(&db_path).unwrap();
            let mut prefs = Preferences::default();
            prefs.apply_setting(&mut state, Setting::Theme, "dark").unwrap();
            preferences::remember_chapter(&mut state, &novel, 4).unwrap();
        }

        let state = State::open(&db_path).unwrap();
        assert_eq!(Preferences::load(&state).unwrap().theme, Theme::Dark);
        assert_eq!(preferences::last_chapter(&state, &novel).unwrap(), 4);
    }

    #[test]
    fn test_library_history_order() {
        let state = State::in_memory().unwrap();
        state.update_library("first-novel", "/srv/novels").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        state.update_library("second-novel", "/srv/novels").unwrap();

        let history = state.get_from_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].novel, "second-novel");
        assert_eq!(history[1].novel, "first-novel");
        assert_eq!(history[0].source, "/srv/novels");
    }

    #[test]
    fn test_library_update_replaces_entry() {
        let state = State::in_memory().unwrap();
        state.update_library("demo", "/srv").unwrap();
        state.update_library("demo", "/srv").unwrap();
        assert_eq!(state.get_from_history().unwrap().len(), 1);

        state.delete_from_library("demo", "/srv").unwrap();
        assert!(state.get_from_history().unwrap().is_empty());
    }
}
