//! Contact form submissions and their notification email.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::side_effect::{Outcome, SideEffect};
use crate::error::{AppError, AppResult};
use crate::models::{ContactSubmission, CreateContact};
use crate::store::ContentStore;

/// Delivers a notification about a new submission.
#[async_trait]
pub trait ContactNotifier: Send + Sync {
    async fn notify(&self, submission: &ContactSubmission) -> anyhow::Result<()>;
}

/// Raw contact form fields.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl ContactForm {
    fn validate(self) -> AppResult<CreateContact> {
        fn required(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }
        fn optional(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        let (Some(first_name), Some(last_name), Some(email), Some(message)) = (
            required(self.first_name),
            required(self.last_name),
            required(self.email),
            required(self.message),
        ) else {
            return Err(AppError::bad_request(
                "Required fields: firstName, lastName, email, message",
            ));
        };

        Ok(CreateContact {
            first_name,
            last_name,
            email,
            phone: optional(self.phone),
            company: optional(self.company),
            subject: optional(self.subject),
            message,
        })
    }
}

/// Service for contact submissions.
#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn ContentStore>,
    notifier: Option<Arc<dyn ContactNotifier>>,
}

impl ContactService {
    pub fn new(store: Arc<dyn ContentStore>, notifier: Option<Arc<dyn ContactNotifier>>) -> Self {
        Self { store, notifier }
    }

    /// Persist a submission, then attempt the notification email.
    ///
    /// The stored record is the primary result; email delivery only affects
    /// the reported side effect.
    pub async fn submit(&self, form: ContactForm) -> AppResult<Outcome<ContactSubmission>> {
        let input = form.validate()?;
        let submission = self.store.insert_contact(input).await?;

        let email = match &self.notifier {
            Some(notifier) => {
                SideEffect::record("contact notification", notifier.notify(&submission).await)
            }
            None => SideEffect::Skipped,
        };

        info!(contact_id = %submission.id, notification = %email, "contact submission stored");
        Ok(Outcome::new(submission, email))
    }

    /// All submissions, newest first.
    pub async fn list(&self) -> AppResult<Vec<ContactSubmission>> {
        Ok(self.store.list_contacts().await?)
    }
}
