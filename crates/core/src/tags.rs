//! Tag naming rules and tag-set diffing.

use std::collections::HashSet;

use crate::slug::parameterize;
use crate::types::DbId;
use crate::validation::FieldErrors;

/// Maximum tag name length in characters.
pub const TAG_NAME_MAX_CHARS: usize = 50;

/// Listing order for tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagSort {
    #[default]
    Popular,
    Alphabetical,
}

impl TagSort {
    /// Parse a `sort` query value, defaulting to [`TagSort::Popular`].
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("alphabetical") => Self::Alphabetical,
            _ => Self::Popular,
        }
    }

    pub fn order_by(self) -> &'static str {
        match self {
            Self::Popular => "usage_count DESC, name",
            Self::Alphabetical => "name",
        }
    }
}

/// Trim a user-supplied tag name. Case is preserved for display; uniqueness
/// is enforced case-insensitively by the store.
pub fn clean_tag_name(name: &str) -> String {
    name.trim().to_string()
}

/// Validate a cleaned tag name and derive its slug.
pub fn tag_slug(name: &str) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    if name.is_empty() {
        errors.add("name", "can't be blank");
    } else if name.chars().count() > TAG_NAME_MAX_CHARS {
        errors.add(
            "name",
            format!("is too long (maximum is {TAG_NAME_MAX_CHARS} characters)"),
        );
    }

    let slug = parameterize(name);
    if slug.is_empty() && errors.is_empty() {
        errors.add("slug", "can't be blank");
    }

    if errors.is_empty() {
        Ok(slug)
    } else {
        Err(errors)
    }
}

/// The associations to create and destroy to move from `current` to `desired`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSetChange {
    pub to_add: Vec<DbId>,
    pub to_remove: Vec<DbId>,
}

impl TagSetChange {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the difference between the current and desired tag sets.
///
/// Duplicates in `desired` are ignored; output preserves input order.
pub fn diff_tag_sets(current: &[DbId], desired: &[DbId]) -> TagSetChange {
    let current_set: HashSet<DbId> = current.iter().copied().collect();
    let desired_set: HashSet<DbId> = desired.iter().copied().collect();

    let mut seen = HashSet::new();
    let to_add = desired
        .iter()
        .copied()
        .filter(|id| !current_set.contains(id) && seen.insert(*id))
        .collect();
    let to_remove = current
        .iter()
        .copied()
        .filter(|id| !desired_set.contains(id))
        .collect();

    TagSetChange { to_add, to_remove }
}

/// Remove duplicate ids, keeping first occurrences.
pub fn dedup_ids(ids: &[DbId]) -> Vec<DbId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
