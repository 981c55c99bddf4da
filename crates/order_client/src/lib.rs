use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::PurchaseOrderLine,
    error::ApplicationError,
    protocol::{
        GenericResponse, GetOrderDetailsResponse, ORDER_DETAILS_PATH, PART_FILE, PART_ORDER_DATE,
        PART_VENDOR_NAME, UPLOAD_ORDER_DETAILS_PATH,
    },
};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod columns;
pub mod desk;
pub mod links;
pub mod listing;
pub mod notice;
pub mod submission;

pub use columns::{ColumnDef, ColumnKind, DisplayRow, SortColumn, SortDirection, SortOrder, COLUMNS};
pub use desk::{OrderDesk, SubmitReport};
pub use links::MaintenanceLink;
pub use listing::{ListingPhase, OrderListing, RefreshOutcome};
pub use notice::{Notice, Notifier};
pub use submission::{
    order_date_from_calendar, DraftField, FieldErrors, LocalFile, SubmissionDraft, SubmissionForm,
    SubmissionOutcome, SubmissionPhase, ValidatedSubmission,
};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8169";
const CSV_MIME_TYPE: &str = "text/csv";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RequestError::MalformedBody(err.to_string())
        } else {
            RequestError::Transport(err.to_string())
        }
    }
}

/// A validated submission with its file contents loaded, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpload {
    pub vendor_name: String,
    pub order_date_millis: i64,
    pub file_name: String,
    pub file_bytes: Vec<u8>,
}

impl OrderUpload {
    pub fn order_date_text(&self) -> String {
        self.order_date_millis.to_string()
    }

    fn into_form(self) -> Result<Form, RequestError> {
        let order_date = self.order_date_text();
        let file = Part::bytes(self.file_bytes)
            .file_name(self.file_name)
            .mime_str(CSV_MIME_TYPE)?;
        Ok(Form::new()
            .text(PART_VENDOR_NAME, self.vendor_name)
            .text(PART_ORDER_DATE, order_date)
            .part(PART_FILE, file))
    }
}

/// The two backend calls the client depends on.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn fetch_order_details(&self) -> Result<Vec<PurchaseOrderLine>, RequestError>;
    async fn upload_order_details(&self, upload: OrderUpload) -> Result<(), RequestError>;
}

pub struct HttpOrderService {
    http: Client,
    server_url: String,
}

impl HttpOrderService {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            server_url,
        }
    }

    async fn decode_body<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RequestError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| RequestError::MalformedBody(e.to_string()))
    }
}

#[async_trait]
impl OrderService for HttpOrderService {
    async fn fetch_order_details(&self) -> Result<Vec<PurchaseOrderLine>, RequestError> {
        let url = format!("{}{ORDER_DETAILS_PATH}", self.server_url);
        debug!(%url, "orders: fetching order details");
        let response = self.http.get(&url).send().await?;
        let http_status = response.status();
        // The application status decides; the HTTP code is only logged.
        let body: GetOrderDetailsResponse = Self::decode_body(response).await?;
        let lines = body.into_lines().inspect_err(|err| {
            warn!(http_status = http_status.as_u16(), %err, "orders: listing rejected by server");
        })?;
        info!(count = lines.len(), "orders: order details fetched");
        Ok(lines)
    }

    async fn upload_order_details(&self, upload: OrderUpload) -> Result<(), RequestError> {
        let url = format!("{}{UPLOAD_ORDER_DETAILS_PATH}", self.server_url);
        info!(
            %url,
            vendor_name = %upload.vendor_name,
            order_date = upload.order_date_millis,
            file_name = %upload.file_name,
            file_len = upload.file_bytes.len(),
            "orders: uploading order details"
        );
        let response = self
            .http
            .post(&url)
            .multipart(upload.into_form()?)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            warn!(
                http_status = response.status().as_u16(),
                "orders: upload returned unexpected status"
            );
            return Err(RequestError::UnexpectedStatus(response.status().as_u16()));
        }

        let body: GenericResponse = Self::decode_body(response).await?;
        body.into_result()?;
        info!("orders: upload accepted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
