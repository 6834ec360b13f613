//! SQLite persistence for the installed-mod registry

mod schema;

pub use schema::*;

use crate::model::Model;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Database wrapper with thread-safe access
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;
        Self::with_connection(conn)
    }

    /// Open a throwaway in-memory registry
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            -- Installed mods
            CREATE TABLE IF NOT EXISTS mods (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                position INTEGER NOT NULL DEFAULT 0,
                installed_at TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                priority INTEGER,
                hidden INTEGER NOT NULL DEFAULT 0,
                files TEXT NOT NULL DEFAULT '[]',
                dlcs TEXT NOT NULL DEFAULT '[]',
                menus TEXT NOT NULL DEFAULT '[]',
                xmlkeys TEXT NOT NULL DEFAULT '[]',
                inputsettings TEXT NOT NULL DEFAULT '[]',
                usersettings TEXT NOT NULL DEFAULT '[]',
                applied_input_keys TEXT NOT NULL DEFAULT '[]',
                readmes TEXT NOT NULL DEFAULT '[]',
                applied_xml_keys TEXT NOT NULL DEFAULT '[]'
            );

            CREATE INDEX IF NOT EXISTS idx_mods_position ON mods(position);
            "#,
        )?;

        // Registries written before input.xml additions were tracked
        let has_xml_keys_column: bool = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info('mods') WHERE name='applied_xml_keys'",
            [],
            |row| row.get(0),
        )?;

        if !has_xml_keys_column {
            conn.execute(
                "ALTER TABLE mods ADD COLUMN applied_xml_keys TEXT NOT NULL DEFAULT '[]'",
                [],
            )?;
            tracing::info!("Added column 'applied_xml_keys' to mods table");
        }

        Ok(())
    }

    // ========== Registry Operations ==========

    /// Get every registry row in install order
    pub fn get_mods(&self) -> Result<Vec<ModRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, position, installed_at, enabled, priority, hidden,
                   files, dlcs, menus, xmlkeys, inputsettings, usersettings,
                   applied_input_keys, readmes, applied_xml_keys
            FROM mods ORDER BY position ASC, id ASC
            "#,
        )?;

        let mods = stmt
            .query_map([], |row| ModRecord::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(mods)
    }

    /// Load the registry
    pub fn load_model(&self) -> Result<Model> {
        let mods = self
            .get_mods()?
            .iter()
            .map(ModRecord::to_mod)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("Loaded {} registry entries", mods.len());
        Ok(Model::from_mods(mods))
    }

    /// Replace the stored registry with `model` in a single transaction
    pub fn save_model(&self, model: &Model) -> Result<()> {
        let records = model
            .all()
            .enumerate()
            .map(|(position, m)| ModRecord::from_mod(m, position as i64))
            .collect::<Result<Vec<_>>>()?;

        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM mods", [])?;

        let mut stmt = tx.prepare(
            r#"
            INSERT INTO mods (name, position, installed_at, enabled, priority, hidden,
                              files, dlcs, menus, xmlkeys, inputsettings, usersettings,
                              applied_input_keys, readmes, applied_xml_keys)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )?;

        for r in &records {
            stmt.execute(params![
                r.name,
                r.position,
                r.installed_at,
                r.enabled as i32,
                r.priority,
                r.hidden as i32,
                r.files_json,
                r.dlcs_json,
                r.menus_json,
                r.xmlkeys_json,
                r.inputsettings_json,
                r.usersettings_json,
                r.applied_input_keys_json,
                r.readmes_json,
                r.applied_xml_keys_json,
            ])?;
        }

        drop(stmt);
        tx.commit().context("Failed to save mod registry")?;
        tracing::debug!("Saved {} registry entries", records.len());
        Ok(())
    }
}
