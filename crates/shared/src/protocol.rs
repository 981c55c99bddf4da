use serde::{Deserialize, Serialize};

use crate::{
    domain::{DetailId, OrderId, PurchaseOrderLine},
    error::{ApiStatus, ApplicationError},
};

pub const ORDER_DETAILS_PATH: &str = "/po/get_order_details";
pub const UPLOAD_ORDER_DETAILS_PATH: &str = "/po/upload_order_details";
pub const RESET_DATABASE_PATH: &str = "/po/reset_database";
pub const SHUTDOWN_PATH: &str = "/shutdown";

/// Multipart part names of an upload.
pub const PART_VENDOR_NAME: &str = "vendor_name";
pub const PART_ORDER_DATE: &str = "order_date";
pub const PART_FILE: &str = "file";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetailRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub detail_id: DetailId,
    pub vendor_name: String,
    pub order_date: i64,
    pub model_number: String,
    pub unit_price: f64,
    pub quantity: u64,
}

impl From<OrderDetailRecord> for PurchaseOrderLine {
    fn from(record: OrderDetailRecord) -> Self {
        Self {
            id: record.detail_id,
            vendor_name: record.vendor_name,
            order_date: record.order_date,
            model_number: record.model_number,
            unit_price: record.unit_price,
            quantity: record.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericResponse {
    pub status: ApiStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GenericResponse {
    pub fn success() -> Self {
        Self {
            status: ApiStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<(), ApplicationError> {
        if self.status.is_success() {
            Ok(())
        } else {
            Err(ApplicationError::new(self.message))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrderDetailsResponse {
    pub status: ApiStatus,
    #[serde(default)]
    pub details: Vec<OrderDetailRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GetOrderDetailsResponse {
    /// Lines in server order, or the reported error. `details` is ignored
    /// whenever the status is not a success.
    pub fn into_lines(self) -> Result<Vec<PurchaseOrderLine>, ApplicationError> {
        if !self.status.is_success() {
            return Err(ApplicationError::new(self.message));
        }
        Ok(self.details.into_iter().map(PurchaseOrderLine::from).collect())
    }
}
