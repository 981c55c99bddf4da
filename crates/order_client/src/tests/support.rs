use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use shared::domain::{DetailId, PurchaseOrderLine};
use tokio::sync::{oneshot, Mutex};

use crate::{OrderService, OrderUpload, RequestError};

pub(crate) type FetchReply = Result<Vec<PurchaseOrderLine>, RequestError>;

struct ScriptedFetch {
    reply: FetchReply,
    release: Option<oneshot::Receiver<()>>,
}

/// In-memory backend. Scripted fetch replies are consumed first, then the
/// standing listing reply is returned for every further fetch.
pub(crate) struct FakeOrderService {
    scripted_fetches: Mutex<VecDeque<ScriptedFetch>>,
    listing_reply: Mutex<FetchReply>,
    upload_reply: Mutex<Result<(), RequestError>>,
    uploads: Mutex<Vec<OrderUpload>>,
    fetch_calls: AtomicUsize,
}

impl FakeOrderService {
    pub(crate) fn with_listing(lines: Vec<PurchaseOrderLine>) -> Self {
        Self::with_listing_reply(Ok(lines))
    }

    pub(crate) fn with_listing_reply(reply: FetchReply) -> Self {
        Self {
            scripted_fetches: Mutex::new(VecDeque::new()),
            listing_reply: Mutex::new(reply),
            upload_reply: Mutex::new(Ok(())),
            uploads: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_upload_reply(mut self, reply: Result<(), RequestError>) -> Self {
        self.upload_reply = Mutex::new(reply);
        self
    }

    pub(crate) async fn set_listing_reply(&self, reply: FetchReply) {
        *self.listing_reply.lock().await = reply;
    }

    /// The next fetch returns `reply` only after the returned sender fires.
    pub(crate) async fn push_gated_fetch(&self, reply: FetchReply) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.scripted_fetches.lock().await.push_back(ScriptedFetch {
            reply,
            release: Some(rx),
        });
        tx
    }

    pub(crate) async fn push_fetch(&self, reply: FetchReply) {
        self.scripted_fetches.lock().await.push_back(ScriptedFetch {
            reply,
            release: None,
        });
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn uploads(&self) -> Vec<OrderUpload> {
        self.uploads.lock().await.clone()
    }
}

#[async_trait]
impl OrderService for FakeOrderService {
    async fn fetch_order_details(&self) -> FetchReply {
        let scripted = self.scripted_fetches.lock().await.pop_front();
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match scripted {
            Some(ScriptedFetch { reply, release }) => {
                if let Some(release) = release {
                    let _ = release.await;
                }
                reply
            }
            None => self.listing_reply.lock().await.clone(),
        }
    }

    async fn upload_order_details(&self, upload: OrderUpload) -> Result<(), RequestError> {
        self.uploads.lock().await.push(upload);
        self.upload_reply.lock().await.clone()
    }
}

pub(crate) fn line(id: i64, vendor_name: &str, unit_price: f64) -> PurchaseOrderLine {
    PurchaseOrderLine {
        id: DetailId(id),
        vendor_name: vendor_name.to_string(),
        order_date: 1_700_000_000_000 + id * 86_400_000,
        model_number: format!("MODEL-{id}"),
        unit_price,
        quantity: (id as u64) * 2,
    }
}

pub(crate) fn app_error(message: &str) -> RequestError {
    RequestError::Application(shared::error::ApplicationError::new(Some(message.to_string())))
}
