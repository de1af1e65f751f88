//! Atomic group operations and scan types shared by all backends.

use super::error::{Result, StoreError};

/// A single step of an atomic group.
///
/// Groups are submitted as a list to [`KvBackend::atomic`](super::KvBackend::atomic).
/// Conditional steps (`SetIfAbsent`, `SetIfPresent`, `Delete`) reject the whole
/// group when their condition does not hold; nothing in the group is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// Unconditional write.
    Set { key: String, value: Vec<u8> },
    /// Write only if `key` is absent.
    SetIfAbsent { key: String, value: Vec<u8> },
    /// Write only if `key` is present.
    SetIfPresent { key: String, value: Vec<u8> },
    /// Remove `key`, which must be present.
    Delete { key: String },
    /// Add `member` to the set named `set`.
    AddToSet { set: String, member: String },
    /// Remove `member` from the set named `set`.
    RemoveFromSet { set: String, member: String },
}

impl StoreOp {
    pub fn set_if_absent(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self::SetIfAbsent {
            key: key.into(),
            value,
        }
    }

    pub fn set_if_present(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self::SetIfPresent {
            key: key.into(),
            value,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    pub fn add_to_set(set: impl Into<String>, member: impl Into<String>) -> Self {
        Self::AddToSet {
            set: set.into(),
            member: member.into(),
        }
    }

    pub fn remove_from_set(set: impl Into<String>, member: impl Into<String>) -> Self {
        Self::RemoveFromSet {
            set: set.into(),
            member: member.into(),
        }
    }

    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::SetIfAbsent { .. } => "set_if_absent",
            Self::SetIfPresent { .. } => "set_if_present",
            Self::Delete { .. } => "delete",
            Self::AddToSet { .. } => "add_to_set",
            Self::RemoveFromSet { .. } => "remove_from_set",
        }
    }
}

/// Why a conditional step rejected its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The key already exists.
    KeyExists(String),
    /// The key does not exist.
    KeyMissing(String),
}

/// Outcome of an atomic group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Commit {
    /// Every step was applied.
    Applied,
    /// Step `step` (zero-based) rejected the group; no step was applied.
    Discarded { step: usize, rejection: Rejection },
}

impl Commit {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// One page of a set scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Members matching the scan pattern.
    pub members: Vec<String>,
    /// Resumption token for the next scan; `0` once the set is exhausted.
    pub cursor: u64,
}

/// Compiled scan filter.
///
/// `*` is special-cased so the common match-all scan never touches the glob
/// engine.
#[derive(Debug, Clone)]
pub(crate) enum MemberFilter {
    All,
    Glob(glob::Pattern),
}

impl MemberFilter {
    pub(crate) fn compile(pattern: &str) -> Result<Self> {
        if pattern == "*" {
            return Ok(Self::All);
        }
        glob::Pattern::new(pattern)
            .map(Self::Glob)
            .map_err(|e| StoreError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.msg.to_string(),
            })
    }

    pub(crate) fn matches(&self, member: &str) -> bool {
        match self {
            Self::All => true,
            Self::Glob(pattern) => pattern.matches(member),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_all_filter() {
        let filter = MemberFilter::compile("*").unwrap();
        assert!(filter.matches("order:1"));
        assert!(filter.matches(""));
    }

    #[test]
    fn test_glob_filter() {
        let filter = MemberFilter::compile("order:1*").unwrap();
        assert!(filter.matches("order:1"));
        assert!(filter.matches("order:123"));
        assert!(!filter.matches("order:2"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = MemberFilter::compile("order:[").unwrap_err();
        assert!(matches!(err, StoreError::InvalidPattern { .. }));
    }

    #[test]
    fn test_op_names() {
        assert_eq!(StoreOp::delete("k").name(), "delete");
        assert_eq!(StoreOp::add_to_set("s", "m").name(), "add_to_set");
    }
}
