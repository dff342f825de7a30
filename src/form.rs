use chrono::NaiveDate;

use crate::error::{Result, TrackerError};
use crate::models::{Dataset, Day, TrackedReading, MAX_READING};

/// Text shown for a field with no answer.
pub const NO_ANSWER: &str = "-";

const NO_ANSWER_ALIASES: [&str; 5] = ["", "-", "n/a", "none", "skip"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub symptom_id: String,
    pub label: String,
    /// The user's current selection as typed.
    pub input: String,
}

impl FormField {
    /// `None` is "no answer"; zero is a real reading.
    pub fn selection(&self) -> Result<Option<u8>> {
        decode_selection(&self.input).ok_or_else(|| TrackerError::FormValidation {
            symptom: self.label.clone(),
            value: self.input.clone(),
        })
    }
}

pub fn decode_selection(input: &str) -> Option<Option<u8>> {
    let input = input.trim();
    if NO_ANSWER_ALIASES
        .iter()
        .any(|alias| input.eq_ignore_ascii_case(alias))
    {
        return Some(None);
    }
    match input.parse::<u8>() {
        Ok(value) if value <= MAX_READING => Some(Some(value)),
        _ => None,
    }
}

pub fn encode_selection(selection: Option<u8>) -> String {
    match selection {
        Some(value) => value.to_string(),
        None => NO_ANSWER.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyForm {
    pub date: NaiveDate,
    /// Detached copy of the stored day; the dataset is untouched until submit.
    pub draft: Day,
    pub fields: Vec<FormField>,
}

impl SurveyForm {
    pub fn set_field(&mut self, index: usize, input: &str) -> bool {
        match self.fields.get_mut(index) {
            Some(field) => {
                field.input = input.trim().to_string();
                true
            }
            None => false,
        }
    }

    pub fn field(&self, symptom_id: &str) -> Option<&FormField> {
        self.fields
            .iter()
            .find(|field| field.symptom_id == symptom_id)
    }

    pub fn set_symptom(&mut self, symptom_id: &str, input: &str) -> bool {
        match self
            .fields
            .iter()
            .position(|field| field.symptom_id == symptom_id)
        {
            Some(index) => self.set_field(index, input),
            None => false,
        }
    }

    /// Applies every field to a copy of the draft. Fails as a whole on the
    /// first field that does not decode.
    pub fn reconcile(&self) -> Result<Day> {
        let mut readings = self.draft.readings.clone();
        for field in &self.fields {
            match field.selection()? {
                None => {
                    readings.remove(&field.symptom_id);
                }
                Some(value) => {
                    readings
                        .entry(field.symptom_id.clone())
                        .and_modify(|reading| reading.value = value)
                        .or_insert_with(|| TrackedReading {
                            symptom_id: field.symptom_id.clone(),
                            value,
                        });
                }
            }
        }

        Ok(Day {
            date: self.date,
            readings,
        })
    }
}

pub fn build_form(dataset: &Dataset, date: NaiveDate) -> SurveyForm {
    let draft = dataset
        .day(date)
        .cloned()
        .unwrap_or_else(|| Day::new(date));

    let fields = dataset
        .symptoms_by_name()
        .into_iter()
        .map(|symptom| FormField {
            symptom_id: symptom.id.clone(),
            label: symptom.name.clone(),
            input: encode_selection(draft.reading(&symptom.id)),
        })
        .collect();

    SurveyForm {
        date,
        draft,
        fields,
    }
}

/// Reconciles the form and commits the resulting day into the dataset.
/// Persisting is left to the caller.
pub fn submit(dataset: &mut Dataset, form: &SurveyForm) -> Result<Day> {
    let day = form.reconcile()?;
    dataset.put_day(day.clone());
    Ok(day)
}
