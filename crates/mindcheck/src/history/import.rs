use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use crate::auth::UserId;
use crate::screening::{classify, RiskTier, ScreeningId, ScreeningResult, SubjectProfile};

#[derive(Debug, thiserror::Error)]
pub enum HistoryImportError {
    #[error("failed to read screening export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid screening CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: unknown risk level '{value}'")]
    UnknownTier { line: u64, value: String },
    #[error("line {line}: score {score} does not classify as '{recorded}'")]
    InconsistentTier {
        line: u64,
        score: u32,
        recorded: String,
    },
    #[error("line {line}: unreadable timestamp '{value}'")]
    InvalidTimestamp { line: u64, value: String },
}

/// Loads exported screening results (one row per result) for offline reporting.
pub struct ScreeningHistoryImporter;

impl ScreeningHistoryImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ScreeningResult>, HistoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ScreeningResult>, HistoryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut record = csv::StringRecord::new();
        let mut results = Vec::new();

        while csv_reader.read_record(&mut record)? {
            let row: ExportRow = record.deserialize(Some(&headers))?;
            // Line the record starts on; quoted fields may span several.
            let line = record.position().map_or(0, |position| position.line());
            results.push(row.into_result(line)?);
        }

        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct ExportRow {
    id: String,
    owner_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    owner_name: Option<String>,
    score: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    result: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    age: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    gender: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
}

impl ExportRow {
    fn into_result(self, line: u64) -> Result<ScreeningResult, HistoryImportError> {
        let derived = classify(self.score);
        let tier = match self.result {
            None => derived,
            Some(recorded) => {
                let parsed = RiskTier::parse(&recorded).ok_or_else(|| {
                    HistoryImportError::UnknownTier {
                        line,
                        value: recorded.clone(),
                    }
                })?;
                if parsed != derived {
                    return Err(HistoryImportError::InconsistentTier {
                        line,
                        score: self.score,
                        recorded,
                    });
                }
                parsed
            }
        };

        let created_at = match self.created_at {
            None => None,
            Some(raw) => Some(
                parse_timestamp(&raw)
                    .ok_or(HistoryImportError::InvalidTimestamp { line, value: raw })?,
            ),
        };

        Ok(ScreeningResult {
            id: ScreeningId(self.id),
            owner_id: UserId(self.owner_id),
            owner_name: self.owner_name,
            score: self.score,
            tier,
            subject: SubjectProfile {
                // Free-text ages that do not fit are dropped rather than failing the import.
                age: self.age.and_then(|age| age.parse().ok()),
                gender: self.gender,
            },
            created_at,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
