//! Child profiles and restricted content categories
//!
//! A profile never stores an age. Age is derived from the date of birth
//! against a reference date every time it is needed.

use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::policy::{age_from_dob, PolicyAdvisor, PolicyRecommendation};
use crate::{GuardianError, GuardianResult};

/// Content category that can be restricted for a child
///
/// The universe is closed: these six labels are the only restrictable categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentCategory {
    #[serde(rename = "Social Media")]
    SocialMedia,
    #[serde(rename = "Games")]
    Games,
    #[serde(rename = "Adult Content")]
    AdultContent,
    #[serde(rename = "Violence")]
    Violence,
    #[serde(rename = "Gambling")]
    Gambling,
    #[serde(rename = "Shopping")]
    Shopping,
}

impl ContentCategory {
    /// Every restrictable category, in display order
    pub const ALL: [ContentCategory; 6] = [
        Self::SocialMedia,
        Self::Games,
        Self::AdultContent,
        Self::Violence,
        Self::Gambling,
        Self::Shopping,
    ];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::SocialMedia => "Social Media",
            Self::Games => "Games",
            Self::AdultContent => "Adult Content",
            Self::Violence => "Violence",
            Self::Gambling => "Gambling",
            Self::Shopping => "Shopping",
        }
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ContentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown content category: {}", s))
    }
}

/// Set of restricted categories
///
/// Backed by a `BTreeSet`, so duplicates are impossible and iteration order
/// is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySet(BTreeSet<ContentCategory>);

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: ContentCategory) -> bool {
        self.0.insert(category)
    }

    pub fn remove(&mut self, category: ContentCategory) -> bool {
        self.0.remove(&category)
    }

    /// Add the category if absent, remove it if present.
    ///
    /// Returns `true` when the category is restricted after the call.
    pub fn toggle(&mut self, category: ContentCategory) -> bool {
        if self.0.remove(&category) {
            false
        } else {
            self.0.insert(category);
            true
        }
    }

    pub fn contains(&self, category: ContentCategory) -> bool {
        self.0.contains(&category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ContentCategory> + '_ {
        self.0.iter().copied()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.iter().map(|c| c.label()).collect()
    }
}

impl FromIterator<ContentCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = ContentCategory>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[ContentCategory; N]> for CategorySet {
    fn from(categories: [ContentCategory; N]) -> Self {
        categories.into_iter().collect()
    }
}

/// A child's profile and screen-time settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProfile {
    /// Unique profile identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Date of birth
    pub date_of_birth: NaiveDate,
    /// Daily screen-time budget in minutes
    pub daily_limit_minutes: u32,
    /// Local bedtime
    pub bedtime: NaiveTime,
    /// Categories blocked for this child
    pub restricted_categories: CategorySet,
}

impl ChildProfile {
    /// Create a profile with settings recommended for the child's current age
    pub fn new(name: impl Into<String>, date_of_birth: NaiveDate) -> Self {
        Self::new_on(name, date_of_birth, Local::now().date_naive())
    }

    /// Create a profile with settings recommended for the child's age on `today`
    pub fn new_on(name: impl Into<String>, date_of_birth: NaiveDate, today: NaiveDate) -> Self {
        let rec = PolicyAdvisor::recommend(age_from_dob(date_of_birth, today));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            date_of_birth,
            daily_limit_minutes: rec.daily_limit_minutes,
            bedtime: rec.bedtime,
            restricted_categories: rec.restricted_categories,
        }
    }

    /// Placeholder profile born on 1 January ten years before `today`
    pub fn with_default_birthday(name: impl Into<String>, today: NaiveDate) -> Self {
        // Jan 1 exists in every year, so this only fails at the edge of chrono's range.
        let dob = NaiveDate::from_ymd_opt(today.year() - 10, 1, 1).unwrap_or(today);
        Self::new_on(name, dob, today)
    }

    /// Age in whole years as of today
    pub fn age(&self) -> u32 {
        self.age_on(Local::now().date_naive())
    }

    /// Age in whole years as of `today`
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        age_from_dob(self.date_of_birth, today)
    }

    /// Recommendation for the child's age as of `today`
    pub fn recommendation_on(&self, today: NaiveDate) -> PolicyRecommendation {
        PolicyAdvisor::recommend(self.age_on(today))
    }

    /// Overwrite budget, bedtime, and categories with a recommendation
    pub fn apply_recommendation(&mut self, rec: &PolicyRecommendation) {
        self.daily_limit_minutes = rec.daily_limit_minutes;
        self.bedtime = rec.bedtime;
        self.restricted_categories = rec.restricted_categories.clone();
    }

    /// Toggle a restricted category; returns whether it is now restricted
    pub fn toggle_category(&mut self, category: ContentCategory) -> bool {
        self.restricted_categories.toggle(category)
    }
}

/// In-memory, ordered collection of child profiles
///
/// Nothing here is persisted; the roster lives as long as its owner.
#[derive(Debug, Clone, Default)]
pub struct ProfileRoster {
    profiles: Vec<ChildProfile>,
}

impl ProfileRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile; ids must be unique within the roster
    pub fn add(&mut self, profile: ChildProfile) -> GuardianResult<()> {
        if self.get(&profile.id).is_some() {
            return Err(GuardianError::validation(format!(
                "Profile already exists: {}",
                profile.id
            )));
        }
        self.profiles.push(profile);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ChildProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChildProfile> {
        self.profiles.iter_mut().find(|p| p.id == id)
    }

    /// Apply an in-place edit to the profile with the given id
    pub fn update<F>(&mut self, id: &str, edit: F) -> GuardianResult<()>
    where
        F: FnOnce(&mut ChildProfile),
    {
        let profile = self
            .get_mut(id)
            .ok_or_else(|| GuardianError::validation(format!("Profile not found: {}", id)))?;
        edit(profile);
        Ok(())
    }

    /// Remove and return the profile with the given id
    pub fn remove(&mut self, id: &str) -> Option<ChildProfile> {
        let idx = self.profiles.iter().position(|p| p.id == id)?;
        Some(self.profiles.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChildProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
