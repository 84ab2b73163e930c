//! Cooking preferences stored on the user's profile.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::status::SkillLevel;

/// Dietary tags offered to the user.
pub const DIETARY_OPTIONS: &[&str] = &[
    "vegetarian",
    "vegan",
    "gluten-free",
    "dairy-free",
    "keto",
    "paleo",
];

/// Equipment tags offered to the user.
pub const EQUIPMENT_OPTIONS: &[&str] = &[
    "oven",
    "stovetop",
    "microwave",
    "blender",
    "food processor",
    "slow cooker",
    "pressure cooker",
];

/// Cuisine tags offered to the user.
pub const CUISINE_OPTIONS: &[&str] = &[
    "italian",
    "mexican",
    "chinese",
    "japanese",
    "indian",
    "mediterranean",
    "american",
];

/// Every tag the profile form offers, by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreferenceOptions {
    pub dietary: &'static [&'static str],
    pub equipment: &'static [&'static str],
    pub cuisines: &'static [&'static str],
}

impl PreferenceOptions {
    pub const ALL: Self = Self {
        dietary: DIETARY_OPTIONS,
        equipment: EQUIPMENT_OPTIONS,
        cuisines: CUISINE_OPTIONS,
    };
}

/// Per-day cooking time budget, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePreferences {
    pub weekday: u32,
    pub weekend: u32,
}

impl TimePreferences {
    /// Upper bound accepted for either budget.
    pub const MAX_MINUTES: u32 = 180;

    /// Read a stored JSON value, falling back to the defaults unless both
    /// budgets are present and numeric.
    #[must_use]
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        value
            .and_then(|v| serde_json::from_value::<Self>(v.clone()).ok())
            .map_or_else(Self::default, Self::clamped)
    }

    /// Budget that applies on the given day.
    #[must_use]
    pub const fn budget_for(&self, day: Weekday) -> u32 {
        match day {
            Weekday::Sat | Weekday::Sun => self.weekend,
            _ => self.weekday,
        }
    }

    /// Clamp both budgets to `0..=MAX_MINUTES`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            weekday: self.weekday.min(Self::MAX_MINUTES),
            weekend: self.weekend.min(Self::MAX_MINUTES),
        }
    }
}

impl Default for TimePreferences {
    fn default() -> Self {
        Self {
            weekday: 30,
            weekend: 60,
        }
    }
}

/// A user's cooking preferences.
///
/// Saved wholesale: the profile row is replaced by whatever the user submits,
/// after [`Preferences::normalized`] has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub skill_level: Option<SkillLevel>,
    #[serde(default)]
    pub dietary: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub time: TimePreferences,
}

impl Preferences {
    /// Trim tags, drop blanks and duplicates (first occurrence wins), and
    /// clamp the time budgets.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            skill_level: self.skill_level,
            dietary: unique_tags(self.dietary),
            equipment: unique_tags(self.equipment),
            cuisines: unique_tags(self.cuisines),
            time: self.time.clamped(),
        }
    }

    /// Skill level used when building a generation prompt.
    #[must_use]
    pub fn effective_skill_level(&self) -> SkillLevel {
        self.skill_level.unwrap_or_default()
    }
}

fn unique_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_owned());
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_normalized_dedupes_and_trims() {
        let prefs = Preferences {
            dietary: vec![
                "vegan".into(),
                " vegan ".into(),
                String::new(),
                "keto".into(),
            ],
            ..Preferences::default()
        }
        .normalized();
        assert_eq!(prefs.dietary, vec!["vegan".to_string(), "keto".to_string()]);
    }

    #[test]
    fn test_time_from_json_requires_both_numbers() {
        let t = TimePreferences::from_json(Some(&json!({"weekday": 20, "weekend": 90})));
        assert_eq!(t, TimePreferences { weekday: 20, weekend: 90 });

        let t = TimePreferences::from_json(Some(&json!({"weekday": 20})));
        assert_eq!(t, TimePreferences::default());

        let t = TimePreferences::from_json(Some(&json!({"weekday": "soon", "weekend": 5})));
        assert_eq!(t, TimePreferences::default());

        assert_eq!(TimePreferences::from_json(None), TimePreferences::default());
    }

    #[test]
    fn test_time_from_json_clamps() {
        let t = TimePreferences::from_json(Some(&json!({"weekday": 500, "weekend": 10})));
        assert_eq!(t.weekday, TimePreferences::MAX_MINUTES);
        assert_eq!(t.weekend, 10);
    }

    #[test]
    fn test_budget_for_weekend() {
        let t = TimePreferences::default();
        assert_eq!(t.budget_for(Weekday::Mon), 30);
        assert_eq!(t.budget_for(Weekday::Sun), 60);
    }

    #[test]
    fn test_options_serialize_by_category() {
        let value = serde_json::to_value(PreferenceOptions::ALL).unwrap();
        assert_eq!(value["dietary"][0], "vegetarian");
        assert_eq!(value["equipment"].as_array().unwrap().len(), EQUIPMENT_OPTIONS.len());
        assert_eq!(value["cuisines"][6], "american");
    }

    #[test]
    fn test_default_skill_is_intermediate() {
        assert_eq!(
            Preferences::default().effective_skill_level(),
            SkillLevel::Intermediate
        );
    }
}
