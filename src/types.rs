use crate::constants::NAME_FIELD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One performer as scraped: free-text labels mapped to free-text values.
///
/// Labels come verbatim from the source markup, so the key set differs from
/// record to record. Values read back from the intermediate store may be
/// `null`; accessors treat those as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, Option<String>>,
}

impl RawRecord {
    /// A record holding only the performer's name
    pub fn new(name: impl Into<String>) -> Self {
        let mut record = Self::default();
        record.insert(NAME_FIELD, name);
        record
    }

    pub fn name(&self) -> Option<&str> {
        self.get(NAME_FIELD)
    }

    /// Value for `label`, or `None` when the label is missing or null
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields.get(label).and_then(|v| v.as_deref())
    }

    /// Whether the label is present at all, null or not
    pub fn contains(&self, label: &str) -> bool {
        self.fields.contains_key(label)
    }

    /// Sets `label`, replacing any previous value
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(label.into(), Some(value.into()));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::default();
        for (label, value) in iter {
            record.insert(label, value);
        }
        record
    }
}

/// Absolute URL of the next index page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageReference(String);

impl PageReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Date components found in free text such as "né le 3 juillet 1975 à Paris"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateParts {
    /// Four digits starting with 1 or 2
    pub year: Option<String>,
    /// Zero-padded month code, `01` to `12`
    pub month: Option<String>,
    /// One or two digits, kept as written
    pub day: Option<String>,
}

impl DateParts {
    /// `{year}-{month}-{day}`, only when all three parts were found
    pub fn iso_date(&self) -> Option<String> {
        match (&self.year, &self.month, &self.day) {
            (Some(year), Some(month), Some(day)) => Some(format!("{}-{}-{}", year, month, day)),
            _ => None,
        }
    }

    pub fn numeric_year(&self) -> Option<f64> {
        self.year.as_deref().and_then(|y| y.parse::<f64>().ok())
    }
}

/// One row of the output table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    #[serde(rename = "Nom connu")]
    pub known_name: String,
    #[serde(rename = "Nom de naissance")]
    pub legal_name: String,
    #[serde(rename = "Date de Naissance")]
    pub birth_date: Option<String>,
    #[serde(rename = "Année de Naissance")]
    pub birth_year: Option<f64>,
    #[serde(rename = "Date de Décès")]
    pub death_date: Option<String>,
    #[serde(rename = "Année de Décès")]
    pub death_year: Option<f64>,
    #[serde(rename = "Activité principale")]
    pub primary_activity: Option<String>,
    #[serde(rename = "Genre musical")]
    pub musical_genre: Option<String>,
    #[serde(rename = "Nationalité")]
    pub nationality: Option<String>,
    #[serde(rename = "Instruments")]
    pub instruments: Option<String>,
    #[serde(rename = "Années actives")]
    pub active_years: Option<String>,
    #[serde(rename = "Labels")]
    pub labels: Option<String>,
    #[serde(rename = "Période d'activité")]
    pub activity_period: Option<String>,
}
