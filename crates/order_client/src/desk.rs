//! Page-level coordinator wiring the submission form to the listing.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::{
    listing::{OrderListing, RefreshOutcome},
    notice::{Notice, Notifier, ORDER_ADDED_MESSAGE},
    submission::{FieldErrors, SubmissionForm, SubmissionOutcome},
    OrderService,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReport {
    /// Required fields were missing; nothing was sent.
    Invalid(FieldErrors),
    /// The upload was sent and failed; the listing was not touched.
    Rejected(String),
    /// The upload succeeded and the listing refresh that followed finished.
    Accepted { refresh: RefreshOutcome },
}

/// Owns one form and one listing. The only coupling between the two is the
/// refresh issued after a successful submission.
pub struct OrderDesk {
    form: SubmissionForm,
    listing: Arc<OrderListing>,
    notifier: Notifier,
}

impl OrderDesk {
    pub fn new(service: Arc<dyn OrderService>) -> Self {
        let notifier = Notifier::new();
        Self {
            form: SubmissionForm::new(Arc::clone(&service)),
            listing: Arc::new(OrderListing::new(service, notifier.clone())),
            notifier,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notifier.subscribe()
    }

    pub fn form(&self) -> &SubmissionForm {
        &self.form
    }

    pub fn listing(&self) -> &Arc<OrderListing> {
        &self.listing
    }

    /// Initial population of the listing.
    pub async fn mount(&self) -> RefreshOutcome {
        info!("desk: mounting");
        self.listing.refresh().await
    }

    /// The operator confirmed the form: validate, upload once, and on success
    /// refresh the listing before the draft is discarded.
    pub async fn confirm_submit(&self) -> SubmitReport {
        let validated = match self.form.validate().await {
            Ok(validated) => validated,
            Err(errors) => {
                self.notifier.publish(Notice::Validation(errors.clone()));
                return SubmitReport::Invalid(errors);
            }
        };

        match self.form.submit(&validated).await {
            SubmissionOutcome::Success => {
                self.notifier
                    .publish(Notice::Success(ORDER_ADDED_MESSAGE.to_string()));
                let refresh = self.listing.refresh().await;
                self.form.reset().await;
                SubmitReport::Accepted { refresh }
            }
            SubmissionOutcome::Failure(message) => {
                self.notifier.publish(Notice::Error(message.clone()));
                SubmitReport::Rejected(message)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/desk_tests.rs"]
mod tests;
