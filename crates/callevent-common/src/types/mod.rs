//! Call event record model
//!
//! Inbound files carry five positional columns. A row that passes validation
//! becomes a [`CallEvent`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp pattern enforced on `eventDatetime`.
///
/// Day precedes month. Existing producers emit this layout, so it is kept even
/// though operators usually describe the column as `yyyy-mm-dd hh:mm:ss`.
pub const DATE_TIME_FORMAT: &str = "%Y-%d-%m %H:%M:%S";

pub const COL_EVENT_DATETIME: usize = 0;
pub const COL_EVENT_ACTION: usize = 1;
pub const COL_CALL_REF: usize = 2;
pub const COL_EVENT_VALUE: usize = 3;
pub const COL_EVENT_CURRENCY_CODE: usize = 4;

/// Number of positional columns in an inbound file.
pub const COLUMN_COUNT: usize = 5;

/// Header row written by producers. Informational only; the first row of a
/// file is discarded whatever it contains.
pub const HEADER: [&str; COLUMN_COUNT] = [
    "eventDatetime",
    "eventAction",
    "callRef",
    "eventValue",
    "eventCurrencyCode",
];

/// Maximum length of `eventAction`, in characters.
pub const MAX_EVENT_ACTION_LEN: usize = 20;

/// Replacement for an empty `eventValue`.
pub const DEFAULT_EVENT_VALUE: &str = "0.00";

/// A single accepted call event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEvent {
    /// When the event happened
    pub event_datetime: NaiveDateTime,

    /// Event action, 1 to 20 characters
    pub event_action: String,

    /// Call reference; validated as an i64 but kept as text
    pub call_ref: String,

    /// Event value as text, `"0.00"` when the source column was empty
    pub event_value: String,

    /// Currency code, may be empty when the value is not positive
    pub event_currency_code: String,
}

impl CallEvent {
    /// Currency code, `None` when the column was empty
    pub fn currency_code(&self) -> Option<&str> {
        if self.event_currency_code.is_empty() {
            None
        } else {
            Some(&self.event_currency_code)
        }
    }

    /// Timestamp rendered back into the inbound layout
    pub fn formatted_datetime(&self) -> String {
        self.event_datetime.format(DATE_TIME_FORMAT).to_string()
    }
}
