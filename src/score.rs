use crate::error::{Result, TrackerError};
use crate::models::{Day, Symptom};

/// Weighted, polarity-normalized average of a day's readings, rounded to one
/// decimal place. Weights need not sum to one.
pub fn compute_day_score(day: &Day, catalog: &[Symptom]) -> Result<f64> {
    if day.readings.is_empty() {
        return Err(TrackerError::NoData(day.date));
    }

    let mut total = 0.0;
    let mut weight_sum = 0.0;

    // BTreeMap iteration keeps the summation order fixed by symptom id.
    for reading in day.readings.values() {
        let symptom = catalog
            .iter()
            .find(|symptom| symptom.id == reading.symptom_id)
            .ok_or_else(|| TrackerError::UnknownSymptom(reading.symptom_id.clone()))?;

        total += symptom.normalize(reading.value) * symptom.weight;
        weight_sum += symptom.weight;
    }

    Ok(round_tenths(total / weight_sum))
}

/// Midpoints round to the even tenth, so 7.25 shows as 7.2.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
