//! Parsing and editing of the game's ini-style settings files and
//! input.xml `<Var>` lines

use super::{InputBinding, UserSetting};
use quick_xml::events::Event;
use quick_xml::Reader;

/// A `[Section]` with its lines in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub lines: Vec<String>,
}

/// Order-preserving ini document (input.settings, user.settings, mods.settings)
///
/// Lines before the first section header are kept in `preamble`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsDocument {
    pub preamble: Vec<String>,
    pub sections: Vec<Section>,
}

impl SettingsDocument {
    pub fn parse(text: &str) -> Self {
        let mut doc = SettingsDocument::default();
        for raw in text.lines() {
            let line = raw.trim_end_matches('\r');
            if let Some(name) = section_header(line) {
                doc.sections.push(Section {
                    name: name.to_string(),
                    lines: Vec::new(),
                });
                continue;
            }
            match doc.sections.last_mut() {
                Some(section) => section.lines.push(line.to_string()),
                None => doc.preamble.push(line.to_string()),
            }
        }
        doc
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    fn section_mut_or_insert(&mut self, name: &str) -> &mut Section {
        let index = match self.sections.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(Section {
                    name: name.to_string(),
                    lines: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    /// Whether a section holds this exact line (whitespace-insensitive at the ends)
    pub fn contains_line(&self, section: &str, line: &str) -> bool {
        self.section(section)
            .map(|s| s.lines.iter().any(|l| l.trim() == line.trim()))
            .unwrap_or(false)
    }

    /// Append a line to a section, creating the section at the end if needed
    pub fn push_line(&mut self, section: &str, line: &str) {
        let section = self.section_mut_or_insert(section);
        // keep the blank separator line last
        let at = section
            .lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map(|i| i + 1)
            .unwrap_or(0);
        section.lines.insert(at, line.trim().to_string());
    }

    /// Remove every occurrence of a line; returns how many were removed
    pub fn remove_line(&mut self, section: &str, line: &str) -> usize {
        let Some(section) = self.sections.iter_mut().find(|s| s.name == section) else {
            return 0;
        };
        let before = section.lines.len();
        section.lines.retain(|l| l.trim() != line.trim());
        before - section.lines.len()
    }

    /// Value of `key` in `section`
    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .lines
            .iter()
            .filter_map(|l| split_key_value(l))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Set `key=value`, replacing an existing assignment or appending one
    pub fn set_value(&mut self, section: &str, key: &str, value: &str) {
        let entry = format!("{}={}", key, value);
        let target = self.section_mut_or_insert(section);
        match target
            .lines
            .iter()
            .position(|l| split_key_value(l).map(|(k, _)| k == key).unwrap_or(false))
        {
            Some(index) => target.lines[index] = entry,
            None => self.push_line(section, &entry),
        }
    }

    /// Remove `key` from `section`; returns true when something was removed
    pub fn remove_key(&mut self, section: &str, key: &str) -> bool {
        let Some(section) = self.sections.iter_mut().find(|s| s.name == section) else {
            return false;
        };
        let before = section.lines.len();
        section
            .lines
            .retain(|l| split_key_value(l).map(|(k, _)| k != key).unwrap_or(true));
        before != section.lines.len()
    }

    /// Remove a whole section; returns true when it existed
    pub fn remove_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != name);
        before != self.sections.len()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.preamble {
            out.push_str(line);
            out.push('\n');
        }
        for section in &self.sections {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for line in &section.lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

fn section_header(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.len() > 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        Some(&trimmed[1..trimmed.len() - 1])
    } else {
        None
    }
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.starts_with(';') || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    Some((key.trim(), value.trim()))
}

/// Input bindings from an input.settings style fragment
pub fn parse_input_bindings(text: &str) -> Vec<InputBinding> {
    let doc = SettingsDocument::parse(text);
    doc.sections
        .iter()
        .flat_map(|section| {
            section
                .lines
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty() && !l.starts_with(';'))
                .map(move |l| InputBinding {
                    context: section.name.clone(),
                    line: l.to_string(),
                })
        })
        .collect()
}

/// Whether a text fragment looks like input.settings content
pub fn looks_like_input_settings(text: &str) -> bool {
    parse_input_bindings(text)
        .iter()
        .any(|b| b.line.starts_with("IK_") && b.line.contains("Action="))
}

/// Key/value overrides from a user.settings style fragment
pub fn parse_user_settings(text: &str) -> Vec<UserSetting> {
    let doc = SettingsDocument::parse(text);
    doc.sections
        .iter()
        .flat_map(|section| {
            section.lines.iter().filter_map(move |l| {
                split_key_value(l).map(|(key, value)| UserSetting {
                    section: section.name.clone(),
                    key: key.to_string(),
                    value: value.to_string(),
                })
            })
        })
        .collect()
}

/// `<Var .../>` lines found in a text or xml fragment
pub fn parse_xml_keys(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim())
        .filter(|l| l.starts_with("<Var ") || l.starts_with("<Var\t"))
        .map(|l| l.to_string())
        .collect()
}

/// The `id` attribute of a `<Var>` element line
pub fn var_id(line: &str) -> Result<Option<String>, String> {
    let mut reader = Reader::from_str(line);
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Var" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"id" {
                        let value = attr.unescape_value().map_err(|e| e.to_string())?;
                        return Ok(Some(value.into_owned()));
                    }
                }
                return Ok(None);
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}
