//! Field-level diff between a persisted entity and its incoming version
//!
//! A changeset is never persisted. It decides whether an update is needed and
//! renders a readable diff for debug logging.

use std::collections::BTreeMap;
use std::fmt;

/// One changed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub from: String,
    pub to: String,
}

/// Changed fields keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    changes: BTreeMap<&'static str, FieldChange>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `field` if `from` and `to` differ
    pub fn compare<T>(&mut self, field: &'static str, from: &T, to: &T) -> &mut Self
    where
        T: PartialEq + fmt::Debug + ?Sized,
    {
        if from != to {
            self.changes.insert(
                field,
                FieldChange {
                    from: format!("{:?}", from),
                    to: format!("{:?}", to),
                },
            );
        }
        self
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.get(field)
    }

    /// Changed field names in alphabetical order
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changes.keys().copied()
    }
}

impl fmt::Display for Changeset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, change) in &self.changes {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {} -> {}", field, change.from, change.to)?;
        }
        Ok(())
    }
}
