//! Prompt enums, field limits, and versioning rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Field limits
// ---------------------------------------------------------------------------

/// Longest accepted title, in characters. Request DTOs carry the rest of
/// the limits as `validator` attributes.
pub const TITLE_MAX_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

pub const VISIBILITY_PRIVATE: &str = "private";
pub const VISIBILITY_PUBLIC: &str = "public";
pub const VISIBILITY_TEAM: &str = "team";

/// Who may see a prompt.
///
/// `Team` has no membership model behind it: any signed-in user sees team
/// prompts in listings, but only the owner or an admin may open one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
    Team,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => VISIBILITY_PRIVATE,
            Self::Public => VISIBILITY_PUBLIC,
            Self::Team => VISIBILITY_TEAM,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            VISIBILITY_PRIVATE => Ok(Self::Private),
            VISIBILITY_PUBLIC => Ok(Self::Public),
            VISIBILITY_TEAM => Ok(Self::Team),
            other => Err(CoreError::Validation(format!(
                "Invalid visibility '{other}'. Must be one of: \
                 {VISIBILITY_PRIVATE}, {VISIBILITY_PUBLIC}, {VISIBILITY_TEAM}"
            ))),
        }
    }
}

impl TryFrom<String> for Visibility {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// AI provider
// ---------------------------------------------------------------------------

pub const AI_PROVIDER_BOTH: &str = "both";
pub const AI_PROVIDER_OPENAI: &str = "openai";
pub const AI_PROVIDER_ANTHROPIC: &str = "anthropic";

/// Which model family a prompt targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Both,
    Openai,
    Anthropic,
}

impl AiProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Both => AI_PROVIDER_BOTH,
            Self::Openai => AI_PROVIDER_OPENAI,
            Self::Anthropic => AI_PROVIDER_ANTHROPIC,
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            AI_PROVIDER_BOTH => Ok(Self::Both),
            AI_PROVIDER_OPENAI => Ok(Self::Openai),
            AI_PROVIDER_ANTHROPIC => Ok(Self::Anthropic),
            other => Err(CoreError::Validation(format!(
                "Invalid ai_provider '{other}'. Must be one of: \
                 {AI_PROVIDER_BOTH}, {AI_PROVIDER_OPENAI}, {AI_PROVIDER_ANTHROPIC}"
            ))),
        }
    }
}

impl TryFrom<String> for AiProvider {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Sort order
// ---------------------------------------------------------------------------

/// Listing order for prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptSort {
    /// Newest first.
    #[default]
    Recent,
    /// Most used first, ties broken by likes.
    Popular,
}

impl PromptSort {
    /// Parse a `sort` query value. Unknown or missing values fall back to
    /// [`PromptSort::Recent`].
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("popular") => Self::Popular,
            _ => Self::Recent,
        }
    }

    /// SQL `ORDER BY` body for this sort, against the `p` alias.
    pub fn order_by(self) -> &'static str {
        match self {
            Self::Recent => "p.created_at DESC, p.id DESC",
            Self::Popular => "p.usage_count DESC, p.like_count DESC, p.id DESC",
        }
    }
}

// ---------------------------------------------------------------------------
// Versioning rules
// ---------------------------------------------------------------------------

/// Change description recorded when an edit does not supply one.
pub const DEFAULT_CHANGE_DESCRIPTION: &str = "Updated prompt content";

/// Whether an update carrying `incoming` content must produce a version.
///
/// Only a present value that differs from the stored content counts.
pub fn content_changed(current: &str, incoming: Option<&str>) -> bool {
    matches!(incoming, Some(new) if new != current)
}

/// Change description recorded when content is restored from a version.
pub fn restore_change_description(version_number: i32) -> String {
    format!("Restored from version {version_number}")
}

/// Suffix appended to the title of a duplicated prompt.
pub const DUPLICATE_TITLE_SUFFIX: &str = " (copy)";

/// Title for a copy of a prompt titled `title`, kept within the title limit.
pub fn duplicate_title(title: &str) -> String {
    let budget = TITLE_MAX_CHARS - DUPLICATE_TITLE_SUFFIX.chars().count();
    let base: String = title.chars().take(budget).collect();
    format!("{}{DUPLICATE_TITLE_SUFFIX}", base.trim_end())
}
