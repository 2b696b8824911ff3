//! Age-based policy recommendations
//!
//! Maps a child's age to a screen-time budget, bedtime, and restricted
//! category bundle. Brackets are closed and ordered; the first match wins:
//! - under 6: Preschool Safety Mode
//! - 6 to 12: School-Age Balanced Mode
//! - 13 and up: Teen Trust Mode

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::profile::{CategorySet, ContentCategory};

/// Age bracket a recommendation is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    /// Under 6
    Preschool,
    /// 6 through 12
    SchoolAge,
    /// 13 and older
    Teen,
}

impl AgeBracket {
    /// Lowest age of the school-age bracket
    pub const SCHOOL_AGE_FROM: u32 = 6;
    /// Lowest age of the teen bracket
    pub const TEEN_FROM: u32 = 13;

    pub fn for_age(age: u32) -> Self {
        if age < Self::SCHOOL_AGE_FROM {
            Self::Preschool
        } else if age < Self::TEEN_FROM {
            Self::SchoolAge
        } else {
            Self::Teen
        }
    }
}

impl std::fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preschool => write!(f, "preschool"),
            Self::SchoolAge => write!(f, "school-age"),
            Self::Teen => write!(f, "teen"),
        }
    }
}

/// Recommended settings for an age bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecommendation {
    /// Bracket this bundle was chosen from
    pub bracket: AgeBracket,
    /// Short mode name, e.g. "Teen Trust Mode"
    pub label: String,
    /// Daily screen-time budget in minutes
    pub daily_limit_minutes: u32,
    /// Recommended local bedtime
    pub bedtime: NaiveTime,
    /// Categories to restrict
    pub restricted_categories: CategorySet,
    /// Human-readable rationale
    pub rationale: String,
}

/// Stateless policy advisor
pub struct PolicyAdvisor;

impl PolicyAdvisor {
    /// Recommend a policy bundle for a child of the given age
    pub fn recommend(age: u32) -> PolicyRecommendation {
        use ContentCategory::*;

        match AgeBracket::for_age(age) {
            AgeBracket::Preschool => PolicyRecommendation {
                bracket: AgeBracket::Preschool,
                label: "Preschool Safety Mode".to_string(),
                daily_limit_minutes: 60,
                bedtime: hm(19, 30),
                restricted_categories: CategorySet::from([
                    SocialMedia,
                    Games,
                    AdultContent,
                    Violence,
                    Gambling,
                    Shopping,
                ]),
                rationale: "Strict restrictions recommended. No social media or unmoderated games."
                    .to_string(),
            },
            AgeBracket::SchoolAge => PolicyRecommendation {
                bracket: AgeBracket::SchoolAge,
                label: "School-Age Balanced Mode".to_string(),
                daily_limit_minutes: 120,
                bedtime: hm(21, 0),
                restricted_categories: CategorySet::from([
                    AdultContent,
                    Violence,
                    Gambling,
                    SocialMedia,
                ]),
                rationale: "Moderate limits. Social media restricted by default.".to_string(),
            },
            AgeBracket::Teen => PolicyRecommendation {
                bracket: AgeBracket::Teen,
                label: "Teen Trust Mode".to_string(),
                daily_limit_minutes: 240,
                bedtime: hm(22, 30),
                restricted_categories: CategorySet::from([AdultContent, Gambling]),
                rationale: "More freedom, focusing on filtering adult content and gambling."
                    .to_string(),
            },
        }
    }

    /// Recommend a policy bundle from a date of birth as of `today`
    pub fn recommend_for_dob(date_of_birth: NaiveDate, today: NaiveDate) -> PolicyRecommendation {
        Self::recommend(age_from_dob(date_of_birth, today))
    }
}

/// Age in whole years on `today`, clamped at 0
///
/// One year is subtracted when the birthday has not yet come round this
/// year. A 29 February birthday counts as reached on 1 March in common years.
pub fn age_from_dob(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age.max(0) as u32
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    // Only called with constant, valid clock times.
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bracket_boundaries() {
        assert_eq!(PolicyAdvisor::recommend(0).bracket, AgeBracket::Preschool);
        assert_eq!(PolicyAdvisor::recommend(5).bracket, AgeBracket::Preschool);
        assert_eq!(PolicyAdvisor::recommend(6).bracket, AgeBracket::SchoolAge);
        assert_eq!(PolicyAdvisor::recommend(12).bracket, AgeBracket::SchoolAge);
        assert_eq!(PolicyAdvisor::recommend(13).bracket, AgeBracket::Teen);
        assert_eq!(PolicyAdvisor::recommend(u32::MAX).bracket, AgeBracket::Teen);
    }

    #[test]
    fn test_preschool_bundle() {
        let rec = PolicyAdvisor::recommend(4);
        assert_eq!(rec.label, "Preschool Safety Mode");
        assert_eq!(rec.daily_limit_minutes, 60);
        assert_eq!(rec.bedtime, hm(19, 30));
        assert_eq!(rec.restricted_categories.len(), 6);
    }

    #[test]
    fn test_school_age_bundle() {
        let rec = PolicyAdvisor::recommend(9);
        assert_eq!(rec.daily_limit_minutes, 120);
        assert_eq!(rec.bedtime, hm(21, 0));
        assert_eq!(
            rec.restricted_categories.labels(),
            vec!["Social Media", "Adult Content", "Violence", "Gambling"]
        );
    }

    #[test]
    fn test_teen_bundle() {
        let rec = PolicyAdvisor::recommend(16);
        assert_eq!(rec.label, "Teen Trust Mode");
        assert_eq!(rec.daily_limit_minutes, 240);
        assert_eq!(rec.bedtime, hm(22, 30));
        assert!(rec.restricted_categories.contains(ContentCategory::AdultContent));
        assert!(rec.restricted_categories.contains(ContentCategory::Gambling));
        assert_eq!(rec.restricted_categories.len(), 2);
    }

    #[test]
    fn test_age_exact_anniversary() {
        let today = date(2024, 10, 19);
        assert_eq!(age_from_dob(date(2011, 10, 19), today), 13);
        assert_eq!(age_from_dob(date(2011, 10, 20), today), 12);
    }

    #[test]
    fn test_age_month_not_reached() {
        let today = date(2024, 3, 1);
        assert_eq!(age_from_dob(date(2014, 4, 1), today), 9);
        assert_eq!(age_from_dob(date(2014, 2, 28), today), 10);
    }

    #[test]
    fn test_age_future_dob_clamps_to_zero() {
        assert_eq!(age_from_dob(date(2030, 1, 1), date(2024, 1, 1)), 0);
    }

    #[test]
    fn test_leap_day_birthday() {
        assert_eq!(age_from_dob(date(2012, 2, 29), date(2025, 2, 28)), 12);
        assert_eq!(age_from_dob(date(2012, 2, 29), date(2025, 3, 1)), 13);
    }

    #[test]
    fn test_recommend_for_dob() {
        let rec = PolicyAdvisor::recommend_for_dob(date(2011, 10, 20), date(2024, 10, 19));
        assert_eq!(rec.bracket, AgeBracket::SchoolAge);
    }
}
