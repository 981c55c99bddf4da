use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(DetailId);
id_newtype!(OrderId);

/// One stored purchase-order line item as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub id: DetailId,
    pub vendor_name: String,
    /// Epoch milliseconds; only the calendar date is meaningful.
    pub order_date: i64,
    pub model_number: String,
    pub unit_price: f64,
    pub quantity: u64,
}
