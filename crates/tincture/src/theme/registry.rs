//! Registry of compiled themes.
//!
//! Each record remembers where its rule sits in the owned style sheet. The
//! registry keeps those positions consistent: removing a record shifts every
//! later record down by one, mirroring what deleting a rule from the middle
//! of a sheet does to the rules after it.
//!
//! Rule positions double as registration order, so iteration is ordered by
//! them and no separate ordering needs to be kept.

use std::collections::HashMap;

use super::variables::ThemeVariables;

/// One registered theme.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeRecord {
    /// Theme name, also the value of the theme attribute when active.
    pub name: String,
    /// Variables as registered, before base variables are merged in.
    pub data: ThemeVariables,
    /// Position of the compiled rule in the owned style sheet.
    pub rule_index: usize,
}

/// Mapping from theme name to its record.
#[derive(Debug, Clone, Default)]
pub struct ThemeRegistry {
    records: HashMap<String, ThemeRecord>,
}

impl ThemeRegistry {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Adds a record, replacing any record with the same name.
    pub fn insert(&mut self, record: ThemeRecord) {
        self.records.insert(record.name.clone(), record);
    }

    /// Removes a record and closes the gap its rule leaves behind.
    pub fn remove(&mut self, name: &str) -> Option<ThemeRecord> {
        let removed = self.records.remove(name)?;
        for record in self.records.values_mut() {
            if record.rule_index > removed.rule_index {
                record.rule_index -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, name: &str) -> Option<&ThemeRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Records in rule order.
    pub fn ordered(&self) -> Vec<&ThemeRecord> {
        let mut records: Vec<&ThemeRecord> = self.records.values().collect();
        records.sort_by_key(|record| record.rule_index);
        records
    }

    /// Theme names in rule order.
    pub fn names(&self) -> Vec<String> {
        self.ordered()
            .into_iter()
            .map(|record| record.name.clone())
            .collect()
    }

    /// Renumbers rules `0..len` keeping the current order.
    ///
    /// Used after the whole sheet is rebuilt from scratch.
    pub fn renumber(&mut self) {
        let names = self.names();
        for (index, name) in names.iter().enumerate() {
            if let Some(record) = self.records.get_mut(name) {
                record.rule_index = index;
            }
        }
    }
}
