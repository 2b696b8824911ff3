//! Activity log records
//!
//! An [`ActivityItem`] is one immutable app/site usage record. The
//! [`ActivityLog`] helpers compute the same totals a parent sees on the
//! activity screen, locally and deterministically.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of an app or site
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActivityCategory {
    Education,
    Entertainment,
    Social,
    Game,
    Utility,
}

impl ActivityCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Education => "Education",
            Self::Entertainment => "Entertainment",
            Self::Social => "Social",
            Self::Game => "Game",
            Self::Utility => "Utility",
        }
    }
}

impl std::fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One usage record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: String,
    /// Application or site name
    pub app: String,
    /// Minutes spent
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    /// Local start time
    pub timestamp: NaiveDateTime,
    pub category: ActivityCategory,
    /// Marked for parental attention
    pub flagged: bool,
}

impl ActivityItem {
    pub fn new(
        id: impl Into<String>,
        app: impl Into<String>,
        duration_minutes: u32,
        timestamp: NaiveDateTime,
        category: ActivityCategory,
        flagged: bool,
    ) -> Self {
        Self {
            id: id.into(),
            app: app.into(),
            duration_minutes,
            timestamp,
            category,
            flagged,
        }
    }
}

/// Read-only view over an ordered slice of activity records
#[derive(Debug, Clone, Copy)]
pub struct ActivityLog<'a> {
    items: &'a [ActivityItem],
}

impl<'a> ActivityLog<'a> {
    pub fn new(items: &'a [ActivityItem]) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &'a [ActivityItem] {
        self.items
    }

    /// Total minutes across all records, saturating at `u32::MAX`
    pub fn total_minutes(&self) -> u32 {
        self.items
            .iter()
            .map(|i| i.duration_minutes)
            .fold(0u32, u32::saturating_add)
    }

    /// Minutes per category, categories with no usage omitted
    pub fn minutes_by_category(&self) -> BTreeMap<ActivityCategory, u32> {
        let mut totals = BTreeMap::new();
        for item in self.items {
            let total = totals.entry(item.category).or_insert(0u32);
            *total = total.saturating_add(item.duration_minutes);
        }
        totals
    }

    /// Category with the most minutes; ties go to the earlier category
    pub fn dominant_category(&self) -> Option<ActivityCategory> {
        self.minutes_by_category()
            .into_iter()
            .fold(None, |best: Option<(ActivityCategory, u32)>, (cat, mins)| match best {
                Some((_, best_mins)) if best_mins >= mins => best,
                _ => Some((cat, mins)),
            })
            .map(|(cat, _)| cat)
    }

    /// Records flagged for attention, in log order
    pub fn flagged(&self) -> Vec<&'a ActivityItem> {
        self.items.iter().filter(|i| i.flagged).collect()
    }
}
