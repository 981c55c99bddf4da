//! The order submission form: draft capture, validation and the upload call.

use std::{collections::BTreeMap, fmt, path::PathBuf, sync::Arc};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{notice::UNKNOWN_ERROR_MESSAGE, OrderService, OrderUpload, RequestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DraftField {
    VendorName,
    OrderDate,
    File,
}

impl DraftField {
    pub fn key(self) -> &'static str {
        match self {
            DraftField::VendorName => "vendor_name",
            DraftField::OrderDate => "order_date",
            DraftField::File => "file",
        }
    }

    pub fn required_message(self) -> &'static str {
        match self {
            DraftField::VendorName => "Please enter the vendor's name.",
            DraftField::OrderDate => "Please choose an order date.",
            DraftField::File => "Please select a CSV file.",
        }
    }
}

/// Opaque handle to the CSV chosen by the operator. Path-backed files are
/// only read when the submission is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalFile {
    Path(PathBuf),
    InMemory { file_name: String, bytes: Vec<u8> },
}

impl LocalFile {
    pub fn in_memory(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        LocalFile::InMemory {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn file_name(&self) -> String {
        match self {
            LocalFile::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.csv".to_string()),
            LocalFile::InMemory { file_name, .. } => file_name.clone(),
        }
    }

    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            LocalFile::Path(path) => tokio::fs::read(path).await,
            LocalFile::InMemory { bytes, .. } => Ok(bytes.clone()),
        }
    }
}

/// Midnight of `date` in `tz`, as the instant a date picker would hand over.
pub fn order_date_from_calendar<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionDraft {
    pub vendor_name: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub file: Option<LocalFile>,
}

impl SubmissionDraft {
    pub fn is_empty(&self) -> bool {
        self.vendor_name.is_none() && self.order_date.is_none() && self.file.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    vendor_name: String,
    order_date: DateTime<Utc>,
    file: LocalFile,
}

impl ValidatedSubmission {
    pub fn vendor_name(&self) -> &str {
        &self.vendor_name
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    pub fn order_date_millis(&self) -> i64 {
        self.order_date.timestamp_millis()
    }

    pub fn file(&self) -> &LocalFile {
        &self.file
    }
}

/// One message per missing field; the key set is exactly the missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<DraftField, &'static str>);

impl FieldErrors {
    fn insert(&mut self, field: DraftField) {
        self.0.insert(field, field.required_message());
    }

    fn remove(&mut self, field: DraftField) {
        self.0.remove(&field);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: DraftField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn message(&self, field: DraftField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = DraftField> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DraftField, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().copied().collect();
        f.write_str(&messages.join(" "))
    }
}

impl std::error::Error for FieldErrors {}

/// Checks every required field; never stops at the first missing one.
pub fn validate(draft: &SubmissionDraft) -> Result<ValidatedSubmission, FieldErrors> {
    let mut errors = FieldErrors::default();

    // Whitespace-only counts as missing; accepted names are sent as typed.
    let vendor_name = draft
        .vendor_name
        .as_deref()
        .filter(|name| !name.trim().is_empty());
    if vendor_name.is_none() {
        errors.insert(DraftField::VendorName);
    }
    if draft.order_date.is_none() {
        errors.insert(DraftField::OrderDate);
    }
    if draft.file.is_none() {
        errors.insert(DraftField::File);
    }

    match (vendor_name, draft.order_date, &draft.file) {
        (Some(vendor_name), Some(order_date), Some(file)) => {
            Ok(ValidatedSubmission {
                vendor_name: vendor_name.to_string(),
                order_date,
                file: file.clone(),
            })
        }
        _ => Err(errors),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Empty,
    Editing,
    Validated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success,
    Failure(String),
}

impl SubmissionOutcome {
    fn from_request_error(err: &RequestError) -> Self {
        match err {
            RequestError::Application(app) => match &app.message {
                Some(message) => SubmissionOutcome::Failure(message.clone()),
                None => SubmissionOutcome::Failure(UNKNOWN_ERROR_MESSAGE.to_string()),
            },
            RequestError::Transport(_)
            | RequestError::UnexpectedStatus(_)
            | RequestError::MalformedBody(_) => {
                SubmissionOutcome::Failure(UNKNOWN_ERROR_MESSAGE.to_string())
            }
        }
    }
}

struct FormState {
    draft: SubmissionDraft,
    phase: SubmissionPhase,
    errors: FieldErrors,
}

impl FormState {
    fn empty() -> Self {
        Self {
            draft: SubmissionDraft::default(),
            phase: SubmissionPhase::Empty,
            errors: FieldErrors::default(),
        }
    }

    fn touched(&mut self, field: DraftField) {
        self.errors.remove(field);
        self.phase = if self.draft.is_empty() {
            SubmissionPhase::Empty
        } else {
            SubmissionPhase::Editing
        };
    }
}

pub struct SubmissionForm {
    service: Arc<dyn OrderService>,
    state: Mutex<FormState>,
}

impl SubmissionForm {
    pub fn new(service: Arc<dyn OrderService>) -> Self {
        Self {
            service,
            state: Mutex::new(FormState::empty()),
        }
    }

    pub async fn set_vendor_name(&self, vendor_name: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.draft.vendor_name = Some(vendor_name.into());
        state.touched(DraftField::VendorName);
    }

    /// Stores the date truncated to millisecond precision.
    pub async fn set_order_date(&self, order_date: DateTime<Utc>) {
        let truncated =
            DateTime::from_timestamp_millis(order_date.timestamp_millis()).unwrap_or(order_date);
        let mut state = self.state.lock().await;
        state.draft.order_date = Some(truncated);
        state.touched(DraftField::OrderDate);
    }

    pub async fn set_file(&self, file: LocalFile) {
        let mut state = self.state.lock().await;
        state.draft.file = Some(file);
        state.touched(DraftField::File);
    }

    pub async fn clear_field(&self, field: DraftField) {
        let mut state = self.state.lock().await;
        match field {
            DraftField::VendorName => state.draft.vendor_name = None,
            DraftField::OrderDate => state.draft.order_date = None,
            DraftField::File => state.draft.file = None,
        }
        state.touched(field);
    }

    pub async fn draft(&self) -> SubmissionDraft {
        self.state.lock().await.draft.clone()
    }

    pub async fn phase(&self) -> SubmissionPhase {
        self.state.lock().await.phase
    }

    pub async fn field_errors(&self) -> FieldErrors {
        self.state.lock().await.errors.clone()
    }

    /// Validates the current draft. On failure the draft is kept as is so
    /// only the reported fields need correcting.
    pub async fn validate(&self) -> Result<ValidatedSubmission, FieldErrors> {
        let mut state = self.state.lock().await;
        match validate(&state.draft) {
            Ok(validated) => {
                state.errors = FieldErrors::default();
                state.phase = SubmissionPhase::Validated;
                Ok(validated)
            }
            Err(errors) => {
                debug!(missing = errors.len(), "submission: draft failed validation");
                state.errors = errors.clone();
                if state.phase == SubmissionPhase::Validated {
                    state.phase = SubmissionPhase::Editing;
                }
                Err(errors)
            }
        }
    }

    /// Sends exactly one upload for `validated`. Never retries.
    pub async fn submit(&self, validated: &ValidatedSubmission) -> SubmissionOutcome {
        let file_bytes = match validated.file().read().await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(file = %validated.file().file_name(), %err, "submission: could not read local file");
                return SubmissionOutcome::Failure(UNKNOWN_ERROR_MESSAGE.to_string());
            }
        };
        let upload = OrderUpload {
            vendor_name: validated.vendor_name().to_string(),
            order_date_millis: validated.order_date_millis(),
            file_name: validated.file().file_name(),
            file_bytes,
        };

        match self.service.upload_order_details(upload).await {
            Ok(()) => {
                info!(vendor_name = %validated.vendor_name(), "submission: order details accepted");
                SubmissionOutcome::Success
            }
            Err(err) => {
                warn!(%err, "submission: upload failed");
                SubmissionOutcome::from_request_error(&err)
            }
        }
    }

    /// Discards the draft after a successful submission was acknowledged.
    pub async fn reset(&self) {
        *self.state.lock().await = FormState::empty();
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
