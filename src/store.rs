use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AppPaths;
use crate::error::{Result, TrackerError};
use crate::models::{
    Dataset, Day, Profile, SuggestedAction, Symptom, TrackedReading, MAX_READING,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetFile {
    name: String,
    #[serde(default)]
    off_days: Vec<Weekday>,
    symptoms: Vec<SymptomRecord>,
    #[serde(default)]
    actions: Vec<ActionRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    days: Vec<DayRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymptomRecord {
    id: String,
    name: String,
    #[serde(default)]
    higher_is_better: bool,
    #[serde(default = "default_weight")]
    weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionRecord {
    name: String,
    min_score: f64,
    max_score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct DayRecord {
    date: NaiveDate,
    #[serde(default)]
    readings: Vec<ReadingRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadingRecord {
    symptom_id: String,
    value: i64,
}

/// Parses and validates a dataset document.
pub fn parse_dataset(text: &str) -> Result<Dataset> {
    let file: DatasetFile =
        serde_json::from_str(text).map_err(|err| TrackerError::Schema(err.to_string()))?;
    validate(file)
}

pub fn render_dataset(dataset: &Dataset) -> Result<String> {
    let file = DatasetFile {
        name: dataset.profile.name.clone(),
        off_days: dataset.profile.off_days.clone(),
        symptoms: dataset
            .symptoms
            .iter()
            .map(|symptom| SymptomRecord {
                id: symptom.id.clone(),
                name: symptom.name.clone(),
                higher_is_better: symptom.higher_is_better,
                weight: symptom.weight,
            })
            .collect(),
        actions: dataset
            .actions
            .iter()
            .map(|action| ActionRecord {
                name: action.name.clone(),
                min_score: action.min_score,
                max_score: action.max_score,
            })
            .collect(),
        days: dataset
            .days
            .values()
            .map(|day| DayRecord {
                date: day.date,
                readings: day
                    .readings
                    .values()
                    .map(|reading| ReadingRecord {
                        symptom_id: reading.symptom_id.clone(),
                        value: i64::from(reading.value),
                    })
                    .collect(),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&file).map_err(|err| TrackerError::Schema(err.to_string()))
}

fn validate(file: DatasetFile) -> Result<Dataset> {
    let mut seen = HashSet::new();
    let mut symptoms = Vec::with_capacity(file.symptoms.len());
    for record in file.symptoms {
        if !(record.weight > 0.0 && record.weight <= 1.0) {
            return Err(TrackerError::Validation(format!(
                "symptom '{}' has weight {}; weights must be in (0, 1]",
                record.id, record.weight
            )));
        }
        if !seen.insert(record.id.clone()) {
            return Err(TrackerError::Validation(format!(
                "symptom id '{}' appears more than once",
                record.id
            )));
        }
        symptoms.push(Symptom {
            id: record.id,
            name: record.name,
            higher_is_better: record.higher_is_better,
            weight: record.weight,
        });
    }

    let mut actions = Vec::with_capacity(file.actions.len());
    for record in file.actions {
        if record.min_score > record.max_score {
            return Err(TrackerError::Validation(format!(
                "action '{}' has minScore {} above maxScore {}",
                record.name, record.min_score, record.max_score
            )));
        }
        actions.push(SuggestedAction {
            name: record.name,
            min_score: record.min_score,
            max_score: record.max_score,
        });
    }

    let mut days = BTreeMap::new();
    for record in file.days {
        let mut day = Day::new(record.date);
        for reading in record.readings {
            let value = u8::try_from(reading.value)
                .ok()
                .filter(|value| *value <= MAX_READING)
                .ok_or_else(|| {
                    TrackerError::Validation(format!(
                        "reading for '{}' on {} has value {}; values must be 0-{}",
                        reading.symptom_id, record.date, reading.value, MAX_READING
                    ))
                })?;
            if day.readings.contains_key(&reading.symptom_id) {
                return Err(TrackerError::Validation(format!(
                    "symptom '{}' is recorded twice on {}",
                    reading.symptom_id, record.date
                )));
            }
            day.readings.insert(
                reading.symptom_id.clone(),
                TrackedReading {
                    symptom_id: reading.symptom_id,
                    value,
                },
            );
        }
        if days.insert(record.date, day).is_some() {
            return Err(TrackerError::Validation(format!(
                "date {} appears more than once",
                record.date
            )));
        }
    }

    Ok(Dataset {
        profile: Profile {
            name: file.name,
            off_days: file.off_days,
        },
        symptoms,
        actions,
        days,
    })
}

/// Writes to a sibling temp file and renames it over the target, so a crash
/// leaves either the old or the new contents.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|err| TrackerError::io(parent, err))?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, bytes).map_err(|err| TrackerError::io(&tmp_path, err))?;
    fs::rename(&tmp_path, path).map_err(|err| TrackerError::io(path, err))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Dataset> {
        let text = fs::read_to_string(&self.path).map_err(|err| TrackerError::io(&self.path, err))?;
        let dataset = parse_dataset(&text)?;
        info!(
            path = %self.path.display(),
            symptoms = dataset.symptoms.len(),
            days = dataset.days.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn save(&self, dataset: &Dataset) -> Result<()> {
        let text = render_dataset(dataset)?;
        write_atomic(&self.path, text.as_bytes())?;
        debug!(path = %self.path.display(), days = dataset.days.len(), "dataset saved");
        Ok(())
    }
}

/// One markdown file per calendar date.
#[derive(Debug, Clone)]
pub struct NoteStore {
    dir: PathBuf,
}

impl NoteStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn note_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.md", date.format("%Y-%m-%d")))
    }

    /// Returns the note text, creating an empty note on first access.
    pub fn read_note(&self, date: NaiveDate) -> Result<String> {
        let path = self.note_path(date);
        if !path.exists() {
            write_atomic(&path, b"")?;
            return Ok(String::new());
        }
        fs::read_to_string(&path).map_err(|err| TrackerError::io(&path, err))
    }

    pub fn write_note(&self, date: NaiveDate, text: &str) -> Result<()> {
        let path = self.note_path(date);
        write_atomic(&path, text.as_bytes())?;
        debug!(path = %path.display(), bytes = text.len(), "note saved");
        Ok(())
    }
}

pub fn starter_dataset() -> Dataset {
    let symptom = |id: &str, name: &str, higher_is_better: bool, weight: f64| Symptom {
        id: id.to_string(),
        name: name.to_string(),
        higher_is_better,
        weight,
    };
    let action = |name: &str, min_score: f64, max_score: f64| SuggestedAction {
        name: name.to_string(),
        min_score,
        max_score,
    };

    Dataset {
        profile: Profile {
            name: "Friend".to_string(),
            off_days: vec![Weekday::Sat, Weekday::Sun],
        },
        symptoms: vec![
            symptom("sleep", "Sleep problems", false, 1.0),
            symptom("pain", "Pain", false, 0.8),
            symptom("fatigue", "Fatigue", false, 0.6),
            symptom("mood", "Mood", true, 0.5),
        ],
        actions: vec![
            action("Rest and check in with your doctor", 0.0, 3.9),
            action("Take a short walk", 4.0, 6.9),
            action("Keep doing what you're doing", 7.0, 10.0),
        ],
        days: BTreeMap::new(),
    }
}

/// Creates the data and notes directories and a starter data file. Existing
/// files are left alone.
pub fn bootstrap(paths: &AppPaths) -> Result<bool> {
    fs::create_dir_all(&paths.notes_dir).map_err(|err| TrackerError::io(&paths.notes_dir, err))?;
    if paths.data_file.exists() {
        return Ok(false);
    }
    Store::new(&paths.data_file).save(&starter_dataset())?;
    info!(path = %paths.data_file.display(), "created starter data file");
    Ok(true)
}
