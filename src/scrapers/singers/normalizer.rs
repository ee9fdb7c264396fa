use crate::constants::{
    month_code, ACTIVE_YEARS_FIELD, ACTIVITY_PERIOD_FIELD, BIRTH_FIELD, BIRTH_NAME_FIELD,
    DEATH_FIELD, FREE_TEXT_FIELDS, FRENCH_MONTHS, GENRE_FIELD, INSTRUMENTS_FIELD, LABELS_FIELD,
    NAME_FIELD, NATIONALITY_FIELD, PRIMARY_ACTIVITY_FIELD, PROJECTED_FIELDS,
};
use crate::error::{Result, ScraperError};
use crate::observability::metrics;
use crate::types::{CleanRecord, DateParts, RawRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

static YEAR_RE: Lazy<Regex> = Lazy::new(|| regex(r"[12]\d{3}"));
static DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    regex(&format!(r"(\d{{1,2}})\s*({})", FRENCH_MONTHS.join("|")))
});
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| regex(r"\s{2,}"));
static SPACE_COMMA_RE: Lazy<Regex> = Lazy::new(|| regex(r"\s,"));

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern is a valid regex")
}

/// Selects the fixed raw columns of every record. Columns a record lacks stay
/// absent. Input where no record carries a `name` cannot be identified at all
/// and is an error; single nameless records are left to `clean_records`.
pub fn project(records: &[RawRecord]) -> Result<Vec<RawRecord>> {
    if !records.is_empty() && !records.iter().any(|r| r.contains(NAME_FIELD)) {
        return Err(ScraperError::MissingField(format!(
            "{} (absent from all {} raw records)",
            NAME_FIELD,
            records.len()
        )));
    }
    Ok(records
        .iter()
        .map(|record| {
            PROJECTED_FIELDS
                .iter()
                .filter_map(|field| record.get(field).map(|value| (*field, value)))
                .collect()
        })
        .collect())
}

/// Known name (raw name cut at the first `(`) and legal name (birth name,
/// defaulting to the known name).
pub fn derive_identity(record: &RawRecord) -> Result<(String, String)> {
    let raw_name = record
        .name()
        .ok_or_else(|| ScraperError::MissingField(NAME_FIELD.to_string()))?;
    let known_name = raw_name
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    if known_name.is_empty() {
        return Err(ScraperError::DataIntegrity(format!(
            "name '{}' yields an empty known name",
            raw_name
        )));
    }
    let legal_name = record
        .get(BIRTH_NAME_FIELD)
        .map(str::to_string)
        .unwrap_or_else(|| known_name.clone());
    Ok((known_name, legal_name))
}

/// Finds year, month and day in free text such as "né le 3 juillet 1975".
/// Unmatched parts stay `None`; never fails.
pub fn split_date(text: &str) -> DateParts {
    let year = YEAR_RE.find(text).map(|m| m.as_str().to_string());
    let (day, month) = match DAY_MONTH_RE.captures(text) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().to_string()),
            caps.get(2).and_then(|m| month_code(m.as_str())),
        ),
        None => (None, None),
    };
    DateParts { year, month, day }
}

/// ASCII transliteration, lowercase, collapsed whitespace, no space before
/// commas, trimmed ends.
pub fn normalize_strings(value: &str) -> String {
    let folded = deunicode::deunicode(value).to_lowercase();
    let collapsed = MULTI_SPACE_RE.replace_all(&folded, " ");
    SPACE_COMMA_RE
        .replace_all(&collapsed, ",")
        .trim()
        .to_string()
}

/// Normalizes the listed fields in place; absent fields stay absent
pub fn normalize_fields(record: &mut RawRecord, fields: &[&str]) {
    for field in fields {
        if let Some(value) = record.get(field) {
            let normalized = normalize_strings(value);
            record.insert(*field, normalized);
        }
    }
}

/// Turns raw records into output rows, keeping their order. A record whose
/// name is missing or yields no known name is skipped with a warning.
#[instrument(skip(records), fields(count = records.len()))]
pub fn clean_records(records: &[RawRecord]) -> Result<Vec<CleanRecord>> {
    let projected = project(records)?;
    let mut rows = Vec::with_capacity(projected.len());
    for (idx, mut record) in projected.into_iter().enumerate() {
        normalize_fields(&mut record, &FREE_TEXT_FIELDS);
        match to_clean_record(&record) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!("Skipping raw record #{}: {}", idx, e);
                metrics::clean::row_skipped();
            }
        }
    }
    debug!("Cleaned {} of {} records", rows.len(), records.len());
    Ok(rows)
}

fn to_clean_record(record: &RawRecord) -> Result<CleanRecord> {
    let (known_name, legal_name) = derive_identity(record)?;
    let birth = record.get(BIRTH_FIELD).map(split_date).unwrap_or_default();
    let death = record.get(DEATH_FIELD).map(split_date).unwrap_or_default();
    for parts in [&birth, &death] {
        if parts.year.is_some() {
            metrics::clean::date_parsed(parts.iso_date().is_some());
        }
    }
    let text = |field: &str| record.get(field).map(str::to_string);

    Ok(CleanRecord {
        known_name,
        legal_name,
        birth_date: birth.iso_date(),
        birth_year: birth.numeric_year(),
        death_date: death.iso_date(),
        death_year: death.numeric_year(),
        primary_activity: text(PRIMARY_ACTIVITY_FIELD),
        musical_genre: text(GENRE_FIELD),
        nationality: text(NATIONALITY_FIELD),
        instruments: text(INSTRUMENTS_FIELD),
        active_years: text(ACTIVE_YEARS_FIELD),
        labels: text(LABELS_FIELD),
        activity_period: text(ACTIVITY_PERIOD_FIELD),
    })
}
