//! Bitemporal article versioning.
//!
//! Every article version carries a half-open validity interval
//! `[valid_from, valid_until)`. An open upper bound (`None`) marks the
//! current version. At most one version per article may be open, and the
//! intervals of one article never overlap (`uq_article_versions_open`,
//! `ex_article_versions_no_overlap`).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// ValidityPeriod
// ---------------------------------------------------------------------------

/// Half-open interval `[valid_from, valid_until)` over real-world time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityPeriod {
    pub valid_from: Timestamp,
    pub valid_until: Option<Timestamp>,
}

impl ValidityPeriod {
    /// Build a period, rejecting empty or inverted intervals.
    pub fn new(valid_from: Timestamp, valid_until: Option<Timestamp>) -> Result<Self, CoreError> {
        if let Some(until) = valid_until {
            if until <= valid_from {
                return Err(CoreError::Validation(format!(
                    "valid_until ({until}) must be after valid_from ({valid_from})"
                )));
            }
        }
        Ok(Self {
            valid_from,
            valid_until,
        })
    }

    /// An open-ended period starting at `valid_from`.
    pub fn open(valid_from: Timestamp) -> Self {
        Self {
            valid_from,
            valid_until: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.valid_until.is_none()
    }

    /// Whether `at` falls inside `[valid_from, valid_until)`.
    pub fn contains(&self, at: Timestamp) -> bool {
        self.valid_from <= at && self.valid_until.is_none_or(|until| at < until)
    }

    /// Whether two half-open periods share at least one instant.
    ///
    /// Touching periods (`a.valid_until == b.valid_from`) do not overlap.
    pub fn overlaps(&self, other: &ValidityPeriod) -> bool {
        let self_starts_before_other_ends = other.valid_until.is_none_or(|end| self.valid_from < end);
        let other_starts_before_self_ends = self.valid_until.is_none_or(|end| other.valid_from < end);
        self_starts_before_other_ends && other_starts_before_self_ends
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Anything that carries a validity period.
pub trait Versioned {
    fn validity(&self) -> ValidityPeriod;
}

impl Versioned for ValidityPeriod {
    fn validity(&self) -> ValidityPeriod {
        *self
    }
}

/// Return the version whose interval contains `at`.
///
/// Intervals are not supposed to overlap. If they do, the version with the
/// latest `valid_from` wins, which matches the `ORDER BY valid_from DESC
/// LIMIT 1` used by the SQL resolver.
pub fn resolve_active<V: Versioned>(versions: &[V], at: Timestamp) -> Option<&V> {
    versions
        .iter()
        .filter(|v| v.validity().contains(at))
        .max_by_key(|v| v.validity().valid_from)
}

/// Return the open (current) version, if any.
pub fn find_open<V: Versioned>(versions: &[V]) -> Option<&V> {
    versions.iter().find(|v| v.validity().is_open())
}

/// Check that a set of periods satisfies the store invariants: at most one
/// open period and no pairwise overlap.
pub fn check_history(periods: &[ValidityPeriod]) -> Result<(), CoreError> {
    let open = periods.iter().filter(|p| p.is_open()).count();
    if open > 1 {
        return Err(CoreError::Conflict(format!(
            "{open} open versions found; at most one version may be current"
        )));
    }

    let mut sorted: Vec<&ValidityPeriod> = periods.iter().collect();
    sorted.sort_by_key(|p| p.valid_from);
    for pair in sorted.windows(2) {
        if pair[0].overlaps(pair[1]) {
            return Err(CoreError::Conflict(format!(
                "Version starting {} overlaps version starting {}",
                pair[0].valid_from, pair[1].valid_from
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Edit planning
// ---------------------------------------------------------------------------

/// How a content save is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    /// Close the current version and open a new one (history preserved).
    #[default]
    NewVersion,
    /// Overwrite the current version's content (no history).
    InPlace,
}

/// Outcome of planning a `new_version` save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupersedePlan {
    /// Instant at which the current open version is closed, if one exists.
    pub close_current_at: Option<Timestamp>,
    /// Period of the version to insert.
    pub new_period: ValidityPeriod,
}

/// Plan a `new_version` save effective from `effective_from`.
///
/// `history` is every existing version period of the article. The current
/// open version (if any) is closed at `effective_from`, which must be
/// strictly after its start. The resulting history must pass
/// [`check_history`].
pub fn plan_new_version(
    history: &[ValidityPeriod],
    effective_from: Timestamp,
) -> Result<SupersedePlan, CoreError> {
    let current = find_open(history);

    if let Some(current) = current {
        if effective_from <= current.valid_from {
            return Err(CoreError::Validation(format!(
                "New version must start after the current version ({}); got {effective_from}",
                current.valid_from
            )));
        }
    }

    let new_period = ValidityPeriod::open(effective_from);
    let after: Vec<ValidityPeriod> = history
        .iter()
        .map(|p| match p.valid_until {
            None => ValidityPeriod {
                valid_from: p.valid_from,
                valid_until: Some(effective_from),
            },
            Some(_) => *p,
        })
        .chain(std::iter::once(new_period))
        .collect();
    check_history(&after)?;

    Ok(SupersedePlan {
        close_current_at: current.map(|_| effective_from),
        new_period,
    })
}

/// Validate closing the open version at `at` (repeal or supersede).
pub fn plan_close(current: &ValidityPeriod, at: Timestamp) -> Result<ValidityPeriod, CoreError> {
    if !current.is_open() {
        return Err(CoreError::Conflict("Version is already closed".into()));
    }
    ValidityPeriod::new(current.valid_from, Some(at))
}

/// An in-place edit may only target the current (open) version.
pub fn ensure_editable_in_place(period: &ValidityPeriod) -> Result<(), CoreError> {
    if !period.is_open() {
        return Err(CoreError::Conflict(
            "Only the current version can be edited in place".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
