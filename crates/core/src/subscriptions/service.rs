//! Subscription action layer.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};

use crate::errors::{Result, StoreError};
use crate::network::NetworkProbe;
use crate::notify::{NoticeKind, Notifier};
use crate::store::{DocumentStore, FieldValue, Query, SUBSCRIPTIONS_COLLECTION};
use crate::subscriptions::{
    next_billing_date, validate_draft, Subscription, SubscriptionDraft,
};

/// Async operations for the subscriptions collection.
pub struct SubscriptionService {
    store: Arc<dyn DocumentStore>,
    probe: Arc<dyn NetworkProbe>,
    notifier: Arc<dyn Notifier>,
}

impl SubscriptionService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        probe: Arc<dyn NetworkProbe>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            probe,
            notifier,
        }
    }

    fn report(&self, context: &str, err: &StoreError) {
        warn!("failed to {context}: {err}");
        match err {
            StoreError::Validation(rules) => self.notifier.notify(
                NoticeKind::Error,
                "Validation error",
                Some(&rules.join(", ")),
            ),
            StoreError::Connectivity(_) => self.notifier.notify(
                NoticeKind::Error,
                "Network error",
                Some("Please check your internet connection."),
            ),
            StoreError::Auth(_) => self.notifier.notify(
                NoticeKind::Error,
                "Session expired",
                Some("Please sign in again."),
            ),
            StoreError::Api { message, .. } => self.notifier.notify(
                NoticeKind::Error,
                &format!("Failed to {context}"),
                Some(message),
            ),
            StoreError::DuplicateName(_) | StoreError::Unexpected(_) => self.notifier.notify(
                NoticeKind::Error,
                "Unexpected error",
                Some(&err.to_string()),
            ),
        }
    }

    /// Validate and create a subscription; returns the stored record on
    /// success, `None` on any failure (already reported).
    pub async fn create(&self, owner_id: &str, draft: SubscriptionDraft) -> Option<Subscription> {
        match self.try_create(owner_id, draft).await {
            Ok(subscription) => {
                self.notifier
                    .notify(NoticeKind::Success, "Subscription added", None);
                Some(subscription)
            }
            Err(err) => {
                self.report("add subscription", &err);
                None
            }
        }
    }

    async fn try_create(&self, owner_id: &str, draft: SubscriptionDraft) -> Result<Subscription> {
        let validated = validate_draft(&draft).map_err(StoreError::Validation)?;
        if !self.probe.is_stable().await {
            return Err(StoreError::connectivity("no stable internet connection"));
        }

        let start = validated.start_date.unwrap_or_else(Utc::now);
        let next = validated
            .next_date
            .unwrap_or_else(|| next_billing_date(validated.billing_cycle, start));

        let id = self
            .store
            .create(
                SUBSCRIPTIONS_COLLECTION,
                validated.fields(owner_id, start, next),
            )
            .await?;
        debug!("created subscription {id} for owner {owner_id}");

        Ok(Subscription {
            id,
            service_name: validated.service_name,
            description: validated.description,
            amount: validated.amount,
            currency: validated.currency,
            billing_cycle: validated.billing_cycle,
            status: validated.status,
            start_date: start,
            next_date: next,
            logo: validated.logo,
            web_link: validated.web_link,
            owner_id: owner_id.to_string(),
        })
    }

    /// Validate and overwrite every user-editable field of a subscription.
    pub async fn update(&self, id: &str, owner_id: &str, draft: SubscriptionDraft) -> bool {
        match self.try_update(id, owner_id, draft).await {
            Ok(()) => {
                self.notifier
                    .notify(NoticeKind::Success, "Subscription updated", None);
                true
            }
            Err(err) => {
                self.report("update subscription", &err);
                false
            }
        }
    }

    async fn try_update(&self, id: &str, owner_id: &str, draft: SubscriptionDraft) -> Result<()> {
        let validated = validate_draft(&draft).map_err(StoreError::Validation)?;
        if !self.probe.is_stable().await {
            return Err(StoreError::connectivity("no stable internet connection"));
        }

        let start = validated.start_date.unwrap_or_else(Utc::now);
        let next = validated
            .next_date
            .unwrap_or_else(|| next_billing_date(validated.billing_cycle, start));

        let fields = validated.fields(owner_id, start, next);
        let mask: Vec<&str> = fields.keys().map(String::as_str).collect();
        self.store
            .patch(SUBSCRIPTIONS_COLLECTION, id, fields.clone(), &mask)
            .await
    }

    pub async fn delete(&self, id: &str) -> bool {
        match self.store.delete(SUBSCRIPTIONS_COLLECTION, id).await {
            Ok(()) => {
                self.notifier
                    .notify(NoticeKind::Success, "Subscription deleted", None);
                true
            }
            Err(err) => {
                self.report("delete subscription", &err);
                false
            }
        }
    }

    /// All of an owner's subscriptions, most recently started first.
    /// Returns an empty list on failure (already reported).
    pub async fn list(&self, owner_id: &str) -> Vec<Subscription> {
        match self.try_list(owner_id).await {
            Ok(subscriptions) => subscriptions,
            Err(err) => {
                self.report("fetch subscriptions", &err);
                Vec::new()
            }
        }
    }

    async fn try_list(&self, owner_id: &str) -> Result<Vec<Subscription>> {
        if !self.probe.is_stable().await {
            return Err(StoreError::connectivity("no stable internet connection"));
        }
        let page = self
            .store
            .query(
                SUBSCRIPTIONS_COLLECTION,
                Query::new()
                    .filter("user_id", FieldValue::str(owner_id))
                    .order_desc("start_date"),
            )
            .await?;
        Ok(page
            .documents
            .iter()
            .map(Subscription::from_document)
            .collect())
    }
}
