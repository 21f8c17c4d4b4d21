//! Record validation
//!
//! Turns the raw rows of one inbound file into a [`ValidatedBatch`]. Each data
//! row runs through a fixed sequence of checks and the first failing check
//! decides the row's rejection. Rows are independent of each other.
//!
//! Check order per row:
//!
//! 1. `eventDatetime` present
//! 2. `eventDatetime` matches [`DATE_TIME_FORMAT`]
//! 3. `eventAction` present
//! 4. `eventAction` is 1 to 20 characters
//! 5. `callRef` present
//! 6. `callRef` is a base-10 i64
//! 7. empty `eventValue` becomes `"0.00"`
//! 8. `eventValue` is a float
//! 9. `eventCurrencyCode` present when the value is above zero
//!
//! Validation is pure: no logging and no I/O happen here.

use callevent_common::types::{
    CallEvent, COL_CALL_REF, COL_EVENT_ACTION, COL_EVENT_CURRENCY_CODE, COL_EVENT_DATETIME,
    COL_EVENT_VALUE, DATE_TIME_FORMAT, DEFAULT_EVENT_VALUE, MAX_EVENT_ACTION_LEN,
};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DATE_TIME_LEN: usize = 19;

/// Why a single row was not accepted
///
/// The display text is the operator-facing message and is matched by
/// downstream log tooling, so keep it stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("requires 'eventDatetime' value")]
    MissingEventDatetime,

    #[error("date format must be yyyy-mm-dd hh:mm:ss")]
    InvalidEventDatetime,

    #[error("requires 'eventAction' value")]
    MissingEventAction,

    #[error("requires 'eventAction' to be between 1 - 20 in length")]
    EventActionLength,

    #[error("requires 'callRef' value")]
    MissingCallRef,

    #[error("requires 'callRef' to be a valid integer")]
    InvalidCallRef,

    #[error("requires 'eventValue' to be a valid float")]
    InvalidEventValue,

    #[error("requires 'eventCurrencyCode' if event value is more than 0.0")]
    MissingCurrencyCode,
}

/// A rejected row, located by file and 1-based data row index
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("File: '{}'. Record: '{record}' {reason}", .file.display())]
pub struct RecordError {
    pub file: PathBuf,
    pub record: usize,
    pub reason: Rejection,
}

/// Outcome of validating one inbound file
///
/// Built once per file by [`validate`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBatch {
    file: PathBuf,
    accepted: Vec<CallEvent>,
    rejected: Vec<RecordError>,
    number_of_records: usize,
}

impl ValidatedBatch {
    /// Accepted events in file order
    pub fn accepted(&self) -> &[CallEvent] {
        &self.accepted
    }

    /// Rejected rows in file order
    pub fn rejected(&self) -> &[RecordError] {
        &self.rejected
    }

    /// Rendered rejection messages, one per rejected row
    pub fn error_messages(&self) -> Vec<String> {
        self.rejected.iter().map(ToString::to_string).collect()
    }

    /// Path of the file this batch was read from
    pub fn source(&self) -> &Path {
        &self.file
    }

    /// Base name of the source file, empty if the path has none
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Data rows considered, header excluded
    pub fn number_of_records(&self) -> usize {
        self.number_of_records
    }

    /// True when nothing is left to store
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Validate a raw table whose first row is a header
///
/// The header is dropped unconditionally; an empty table yields an empty
/// batch. Rows shorter than five columns are read as if the missing trailing
/// fields were empty.
pub fn validate<R>(raw_rows: &[R], source: impl Into<PathBuf>) -> ValidatedBatch
where
    R: AsRef<[String]>,
{
    let file = source.into();
    let data = raw_rows.get(1..).unwrap_or_default();

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for (index, row) in data.iter().enumerate() {
        match validate_row(row.as_ref()) {
            Ok(event) => accepted.push(event),
            Err(reason) => rejected.push(RecordError {
                file: file.clone(),
                record: index + 1,
                reason,
            }),
        }
    }

    ValidatedBatch {
        file,
        accepted,
        rejected,
        number_of_records: data.len(),
    }
}

/// Run every check against a single data row
pub fn validate_row(row: &[String]) -> Result<CallEvent, Rejection> {
    let event_datetime = check_event_datetime(field(row, COL_EVENT_DATETIME))?;
    let event_action = check_event_action(field(row, COL_EVENT_ACTION))?;
    let call_ref = check_call_ref(field(row, COL_CALL_REF))?;

    let event_value = default_event_value(field(row, COL_EVENT_VALUE));
    let amount = check_event_value(event_value)?;

    let event_currency_code = field(row, COL_EVENT_CURRENCY_CODE);
    check_currency_code(event_currency_code, amount)?;

    Ok(CallEvent {
        event_datetime,
        event_action: event_action.to_string(),
        call_ref: call_ref.to_string(),
        event_value: event_value.to_string(),
        event_currency_code: event_currency_code.to_string(),
    })
}

fn field(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn check_event_datetime(value: &str) -> Result<NaiveDateTime, Rejection> {
    if value.is_empty() {
        return Err(Rejection::MissingEventDatetime);
    }

    // chrono accepts short fields, signed years and any run of whitespace
    if !has_date_time_shape(value) {
        return Err(Rejection::InvalidEventDatetime);
    }

    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .map_err(|_| Rejection::InvalidEventDatetime)
}

/// Exactly `dddd-dd-dd dd:dd:dd`
fn has_date_time_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == DATE_TIME_LEN
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            10 => *b == b' ',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}

fn check_event_action(value: &str) -> Result<&str, Rejection> {
    if value.is_empty() {
        return Err(Rejection::MissingEventAction);
    }

    let length = value.chars().count();
    if length == 0 || length > MAX_EVENT_ACTION_LEN {
        return Err(Rejection::EventActionLength);
    }

    Ok(value)
}

fn check_call_ref(value: &str) -> Result<&str, Rejection> {
    if value.is_empty() {
        return Err(Rejection::MissingCallRef);
    }

    value
        .parse::<i64>()
        .map(|_| value)
        .map_err(|_| Rejection::InvalidCallRef)
}

fn default_event_value(value: &str) -> &str {
    if value.is_empty() {
        DEFAULT_EVENT_VALUE
    } else {
        value
    }
}

fn check_event_value(value: &str) -> Result<f64, Rejection> {
    value.parse::<f64>().map_err(|_| Rejection::InvalidEventValue)
}

fn check_currency_code(value: &str, amount: f64) -> Result<(), Rejection> {
    if value.is_empty() && amount > 0.0 {
        return Err(Rejection::MissingCurrencyCode);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use callevent_common::types::HEADER;

    const SOURCE: &str = "path/to/file";

    fn table(rows: &[&[&str]]) -> Vec<Vec<String>> {
        std::iter::once(HEADER.as_slice())
            .chain(rows.iter().copied())
            .map(|row| row.iter().map(|field| field.to_string()).collect())
            .collect()
    }

    fn single_error(rows: &[&[&str]]) -> String {
        let batch = validate(&table(rows), SOURCE);
        assert!(batch.accepted().is_empty());
        assert_eq!(batch.rejected().len(), 1);
        batch.error_messages().remove(0)
    }

    #[test]
    fn test_missing_event_datetime() {
        let message = single_error(&[&[""]]);
        assert!(message.contains("requires 'eventDatetime' value"));
    }

    #[test]
    fn test_invalid_date_format() {
        let message = single_error(&[&["2012-01-02 12-01-30"]]);
        assert!(message.contains("date format must be yyyy-mm-dd hh:mm:ss"));
    }

    #[test]
    fn test_date_fields_must_be_fixed_width() {
        for value in [
            "2018-1-2 1:2:3",
            "2018-02-01 1:02:03",
            "2018-02-0110:27:36",
            "18-02-01 10:27:36",
            "02018-02-01 10:27:36",
            "+2018-02-01 10:27:36",
            " 2018-02-01 10:27:36",
            "2018-02-01 10:27:36 ",
            "2018-02-01  10:27:36",
            "2018-02-01T10:27:36",
            "2018/02/01 10:27:36",
            "２018-02-01 10:27:36",
        ] {
            let row: Vec<String> = [value, "sale", "4536", "1.00", "GBP"]
                .iter()
                .map(|field| field.to_string())
                .collect();
            assert_eq!(
                validate_row(&row),
                Err(Rejection::InvalidEventDatetime),
                "{:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_well_formed_date_with_impossible_values_is_rejected() {
        let message = single_error(&[&["2018-32-01 10:27:36", "sale", "1", "1", "GBP"]]);
        assert!(message.contains("date format must be"));

        let message = single_error(&[&["2018-01-13 10:27:36", "sale", "1", "1", "GBP"]]);
        assert!(message.contains("date format must be"));
    }

    #[test]
    fn test_day_precedes_month_in_enforced_pattern() {
        let batch = validate(
            &table(&[
                &["2018-25-01 10:27:36", "sale", "4536", "1.00", "GBP"],
                &["2018-01-25 10:27:36", "sale", "4537", "1.00", "GBP"],
            ]),
            SOURCE,
        );

        assert_eq!(batch.accepted().len(), 1);
        assert_eq!(
            batch.accepted()[0].event_datetime.to_string(),
            "2018-01-25 10:27:36"
        );
        assert_eq!(batch.rejected()[0].record, 2);
        assert_eq!(batch.rejected()[0].reason, Rejection::InvalidEventDatetime);
    }

    #[test]
    fn test_missing_event_action() {
        let message = single_error(&[&["2012-01-02 12:01:30", ""]]);
        assert!(message.contains("requires 'eventAction' value"));
    }

    #[test]
    fn test_event_action_longer_than_20_characters() {
        let message = single_error(&[&["2012-01-02 12:01:30", "abcdefghijklmnopqrstu"]]);
        assert!(message.contains("requires 'eventAction' to be between 1 - 20 in length"));
    }

    #[test]
    fn test_event_action_length_counts_characters() {
        let batch = validate(
            &table(&[
                &["2012-01-02 12:01:30", "abcdefghijklmnopqrst", "1", "0", ""],
                &["2012-01-02 12:01:30", "éééééééééééééééééééé", "2", "0", ""],
            ]),
            SOURCE,
        );
        assert_eq!(batch.accepted().len(), 2);
    }

    #[test]
    fn test_missing_call_ref() {
        let message = single_error(&[&["2012-01-02 12:01:30", "sale", ""]]);
        assert!(message.contains("requires 'callRef' value"));
    }

    #[test]
    fn test_call_ref_must_be_an_integer() {
        let message = single_error(&[&["2012-01-02 12:01:30", "sale", "notAnInt"]]);
        assert!(message.contains("requires 'callRef' to be a valid integer"));

        let message = single_error(&[&["2012-01-02 12:01:30", "sale", "9223372036854775808"]]);
        assert!(message.contains("requires 'callRef' to be a valid integer"));
    }

    #[test]
    fn test_event_value_must_be_a_float() {
        let message = single_error(&[&["2012-01-02 12:01:30", "sale", "1234", "2.1a"]]);
        assert!(message.contains("requires 'eventValue' to be a valid float"));
    }

    #[test]
    fn test_currency_required_for_positive_value() {
        let message = single_error(&[&["2012-01-02 12:01:30", "sale", "1234", "1.0", ""]]);
        assert!(message.contains("requires 'eventCurrencyCode' if event value is more than 0.0"));
    }

    #[test]
    fn test_currency_optional_for_zero_or_negative_value() {
        let batch = validate(
            &table(&[
                &["2012-01-02 12:01:30", "sale", "1234", "0.0", ""],
                &["2012-01-02 12:01:30", "refund", "1235", "-3.50", ""],
            ]),
            SOURCE,
        );

        assert!(batch.rejected().is_empty());
        assert_eq!(batch.accepted().len(), 2);
    }

    #[test]
    fn test_empty_event_value_defaults_to_zero() {
        let batch = validate(
            &table(&[&["2012-01-02 12:01:30", "sale", "1234", "", "GBP"]]),
            SOURCE,
        );

        assert_eq!(batch.accepted().len(), 1);
        assert_eq!(batch.accepted()[0].event_value, "0.00");
    }

    #[test]
    fn test_empty_value_and_currency_is_accepted() {
        let batch = validate(&table(&[&["2012-01-02 12:01:30", "lead", "1234"]]), SOURCE);

        assert_eq!(batch.accepted().len(), 1);
        assert_eq!(batch.accepted()[0].event_value, "0.00");
        assert_eq!(batch.accepted()[0].currency_code(), None);
    }

    #[test]
    fn test_first_failing_check_wins() {
        let batch = validate(&table(&[&["", "", "notAnInt", "x", ""]]), SOURCE);
        assert_eq!(batch.rejected()[0].reason, Rejection::MissingEventDatetime);
    }

    #[test]
    fn test_error_message_names_file_and_record() {
        let batch = validate(
            &table(&[
                &["2018-02-01 10:27:36", "sale", "4536", "111.00", "GBP"],
                &["2018-02-01 10:27:36", "sale", "", "111.00", "GBP"],
            ]),
            "inbound/calls.csv",
        );

        assert_eq!(
            batch.error_messages(),
            vec!["File: 'inbound/calls.csv'. Record: '2' requires 'callRef' value".to_string()]
        );
    }

    #[test]
    fn test_accepted_fields_are_preserved() {
        let batch = validate(
            &table(&[&["2018-02-01 11:28:54", "sale", "6257", "240.49", "GBP"]]),
            SOURCE,
        );

        let event = &batch.accepted()[0];
        assert_eq!(event.formatted_datetime(), "2018-02-01 11:28:54");
        assert_eq!(event.event_action, "sale");
        assert_eq!(event.call_ref, "6257");
        assert_eq!(event.event_value, "240.49");
        assert_eq!(event.event_currency_code, "GBP");
    }

    #[test]
    fn test_counts_always_add_up() {
        let rows: &[&[&str]] = &[
            &["2018-02-01 10:27:36", "sale", "4536", "111.00", "GBP"],
            &[""],
            &["2018-02-01 10:27:36", "sale", "x"],
            &["2018-02-01 10:27:36", "lead", "5328", "0", ""],
            &["2018-13-13 10:27:36", "sale", "1", "1", "GBP"],
            &["2018-02-01 10:27:36", "sale", "1", "5", ""],
        ];
        let batch = validate(&table(rows), SOURCE);

        assert_eq!(batch.number_of_records(), rows.len());
        assert_eq!(
            batch.accepted().len() + batch.rejected().len(),
            batch.number_of_records()
        );
        let records: Vec<usize> = batch.rejected().iter().map(|e| e.record).collect();
        assert_eq!(records, vec![2, 3, 5, 6]);
    }

    #[test]
    fn test_empty_and_header_only_tables() {
        let empty: Vec<Vec<String>> = Vec::new();
        let batch = validate(&empty, SOURCE);
        assert_eq!(batch.number_of_records(), 0);
        assert!(batch.is_empty());

        let batch = validate(&table(&[]), SOURCE);
        assert_eq!(batch.number_of_records(), 0);
        assert!(batch.rejected().is_empty());
    }

    #[test]
    fn test_file_name_is_the_base_name() {
        let empty: Vec<Vec<String>> = Vec::new();
        assert_eq!(validate(&empty, "path/to/file.txt").file_name(), "file.txt");
        assert_eq!(validate(&empty, "").file_name(), "");
    }
}
