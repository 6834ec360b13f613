//! Database record types

use crate::mods::{InputBinding, Mod, UserSetting};
use anyhow::{Context, Result};
use rusqlite::Row;
use std::collections::BTreeSet;

/// Registry row for one installed mod
///
/// Collections are stored as JSON text columns.
#[derive(Debug, Clone)]
pub struct ModRecord {
    pub id: Option<i64>,
    pub name: String,
    pub position: i64,
    pub installed_at: String,
    pub enabled: bool,
    pub priority: Option<i32>,
    pub hidden: bool,
    pub files_json: String,
    pub dlcs_json: String,
    pub menus_json: String,
    pub xmlkeys_json: String,
    pub inputsettings_json: String,
    pub usersettings_json: String,
    pub applied_input_keys_json: String,
    pub readmes_json: String,
    pub applied_xml_keys_json: String,
}

impl ModRecord {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            position: row.get(2)?,
            installed_at: row.get(3)?,
            enabled: row.get::<_, i32>(4)? != 0,
            priority: row.get(5)?,
            hidden: row.get::<_, i32>(6)? != 0,
            files_json: row.get(7)?,
            dlcs_json: row.get(8)?,
            menus_json: row.get(9)?,
            xmlkeys_json: row.get(10)?,
            inputsettings_json: row.get(11)?,
            usersettings_json: row.get(12)?,
            applied_input_keys_json: row.get(13)?,
            readmes_json: row.get(14)?,
            applied_xml_keys_json: row.get(15)?,
        })
    }

    pub fn from_mod(m: &Mod, position: i64) -> Result<Self> {
        Ok(Self {
            id: None,
            name: m.name.clone(),
            position,
            installed_at: m.date.clone(),
            enabled: m.enabled,
            priority: m.priority,
            hidden: m.hidden,
            files_json: serde_json::to_string(&m.files)?,
            dlcs_json: serde_json::to_string(&m.dlcs)?,
            menus_json: serde_json::to_string(&m.menus)?,
            xmlkeys_json: serde_json::to_string(&m.xmlkeys)?,
            inputsettings_json: serde_json::to_string(&m.inputsettings)?,
            usersettings_json: serde_json::to_string(&m.usersettings)?,
            applied_input_keys_json: serde_json::to_string(&m.applied_input_keys)?,
            readmes_json: serde_json::to_string(&m.readmes)?,
            applied_xml_keys_json: serde_json::to_string(&m.applied_xml_keys)?,
        })
    }

    pub fn to_mod(&self) -> Result<Mod> {
        let context = || format!("Corrupt registry entry '{}'", self.name);
        Ok(Mod {
            name: self.name.clone(),
            date: self.installed_at.clone(),
            enabled: self.enabled,
            priority: self.priority,
            hidden: self.hidden,
            files: serde_json::from_str::<BTreeSet<String>>(&self.files_json)
                .with_context(context)?,
            dlcs: serde_json::from_str::<BTreeSet<String>>(&self.dlcs_json)
                .with_context(context)?,
            menus: serde_json::from_str::<BTreeSet<String>>(&self.menus_json)
                .with_context(context)?,
            xmlkeys: serde_json::from_str(&self.xmlkeys_json).with_context(context)?,
            applied_xml_keys: serde_json::from_str(&self.applied_xml_keys_json)
                .with_context(context)?,
            inputsettings: serde_json::from_str::<Vec<InputBinding>>(&self.inputsettings_json)
                .with_context(context)?,
            usersettings: serde_json::from_str::<Vec<UserSetting>>(&self.usersettings_json)
                .with_context(context)?,
            applied_input_keys: serde_json::from_str(&self.applied_input_keys_json)
                .with_context(context)?,
            readmes: serde_json::from_str(&self.readmes_json).with_context(context)?,
        })
    }
}
