//! In-memory registry of installed mods

use crate::mods::Mod;

/// Outcome of [`Model::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Ordered collection of installed mods
///
/// Never holds two entries with the same `(name, files)` identity.
#[derive(Debug, Clone, Default)]
pub struct Model {
    mods: Vec<Mod>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from stored entries, dropping identity duplicates
    pub fn from_mods(mods: impl IntoIterator<Item = Mod>) -> Self {
        let mut model = Self::new();
        for m in mods {
            model.upsert(m);
        }
        model
    }

    pub fn all(&self) -> impl Iterator<Item = &Mod> {
        self.mods.iter()
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Mod> {
        self.mods.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Mod> {
        self.mods.iter().find(|m| m.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Mod> {
        self.mods.iter_mut().find(|m| m.name == name)
    }

    /// Add a mod under its name, replacing an entry that carries the same name
    pub fn add(&mut self, m: Mod) {
        match self.mods.iter_mut().find(|existing| existing.name == m.name) {
            Some(existing) => *existing = m,
            None => self.mods.push(m),
        }
    }

    /// Remove the entry with this name
    pub fn remove(&mut self, name: &str) -> Option<Mod> {
        let index = self.mods.iter().position(|m| m.name == name)?;
        Some(self.mods.remove(index))
    }

    /// Refresh an identical-identity entry or add a new one
    pub fn upsert(&mut self, m: Mod) -> Upsert {
        match self.mods.iter_mut().find(|existing| existing.same_identity(&m)) {
            Some(existing) => {
                existing.refresh_from(&m);
                Upsert::Updated
            }
            None => {
                self.add(m);
                Upsert::Inserted
            }
        }
    }
}
