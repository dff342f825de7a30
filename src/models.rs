use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};

pub const MAX_READING: u8 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub off_days: Vec<Weekday>,
}

impl Profile {
    pub fn is_off_day(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        self.off_days.contains(&date.weekday())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symptom {
    pub id: String,
    pub name: String,
    pub higher_is_better: bool,
    pub weight: f64,
}

impl Symptom {
    /// Maps a raw value onto the "higher is healthier" scale.
    pub fn normalize(&self, value: u8) -> f64 {
        if self.higher_is_better {
            f64::from(value)
        } else {
            f64::from(MAX_READING - value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedReading {
    pub symptom_id: String,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Day {
    pub date: NaiveDate,
    /// Keyed by symptom id. A missing key means "not reported".
    pub readings: BTreeMap<String, TrackedReading>,
}

impl Day {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            readings: BTreeMap::new(),
        }
    }

    pub fn reading(&self, symptom_id: &str) -> Option<u8> {
        self.readings.get(symptom_id).map(|reading| reading.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedAction {
    pub name: String,
    pub min_score: f64,
    pub max_score: f64,
}

impl SuggestedAction {
    pub fn applies_to(&self, score: f64) -> bool {
        score >= self.min_score && score <= self.max_score
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub profile: Profile,
    pub symptoms: Vec<Symptom>,
    pub actions: Vec<SuggestedAction>,
    pub days: BTreeMap<NaiveDate, Day>,
}

impl Dataset {
    pub fn symptom(&self, id: &str) -> Option<&Symptom> {
        self.symptoms.iter().find(|symptom| symptom.id == id)
    }

    /// Catalog in display order.
    pub fn symptoms_by_name(&self) -> Vec<&Symptom> {
        let mut symptoms: Vec<&Symptom> = self.symptoms.iter().collect();
        symptoms.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        symptoms
    }

    pub fn day(&self, date: NaiveDate) -> Option<&Day> {
        self.days.get(&date)
    }

    pub fn put_day(&mut self, day: Day) {
        self.days.insert(day.date, day);
    }

    pub fn actions_for(&self, score: f64) -> Vec<&SuggestedAction> {
        self.actions
            .iter()
            .filter(|action| action.applies_to(score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symptom(id: &str, name: &str, higher_is_better: bool) -> Symptom {
        Symptom {
            id: id.to_string(),
            name: name.to_string(),
            higher_is_better,
            weight: 1.0,
        }
    }

    #[test]
    fn normalize_flips_lower_is_better() {
        assert_eq!(symptom("pain", "Pain", false).normalize(3), 7.0);
        assert_eq!(symptom("mood", "Mood", true).normalize(3), 3.0);
    }

    #[test]
    fn catalog_sorts_by_name() {
        let dataset = Dataset {
            profile: Profile {
                name: "Sam".to_string(),
                off_days: vec![Weekday::Sat],
            },
            symptoms: vec![
                symptom("sleep", "Sleep", false),
                symptom("anx", "Anxiety", false),
                symptom("mood", "Mood", true),
            ],
            actions: Vec::new(),
            days: BTreeMap::new(),
        };

        let names: Vec<&str> = dataset
            .symptoms_by_name()
            .iter()
            .map(|symptom| symptom.name.as_str())
            .collect();
        assert_eq!(names, vec!["Anxiety", "Mood", "Sleep"]);
        assert_eq!(dataset.symptom("mood").map(|s| s.name.as_str()), Some("Mood"));
        assert!(dataset.symptom("missing").is_none());
    }

    #[test]
    fn action_ranges_are_inclusive() {
        let action = SuggestedAction {
            name: "Take a walk".to_string(),
            min_score: 4.0,
            max_score: 6.5,
        };
        assert!(action.applies_to(4.0));
        assert!(action.applies_to(6.5));
        assert!(!action.applies_to(6.6));
        assert!(!action.applies_to(3.9));
    }

    #[test]
    fn off_days_match_weekday() {
        let profile = Profile {
            name: "Sam".to_string(),
            off_days: vec![Weekday::Sun],
        };
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert!(profile.is_off_day(sunday));
        assert!(!profile.is_off_day(monday));
    }
}
