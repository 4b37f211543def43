//! Subscription model, enums, and synchronous draft validation.

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Document, FieldValue, Fields};

const MAX_SERVICE_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

/// Supported billing currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Vnd,
    Usd,
    Eur,
    Gbp,
    Jpy,
    Krw,
    Cny,
}

impl Currency {
    pub const ALL: [Currency; 7] = [
        Currency::Vnd,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Krw,
        Currency::Cny,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Vnd => "VND",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Krw => "KRW",
            Currency::Cny => "CNY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == value)
    }
}

/// How often a subscription bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

impl BillingCycle {
    pub const ALL: [BillingCycle; 5] = [
        BillingCycle::Daily,
        BillingCycle::Weekly,
        BillingCycle::Monthly,
        BillingCycle::Yearly,
        BillingCycle::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Daily => "daily",
            BillingCycle::Weekly => "weekly",
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
            BillingCycle::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == value)
    }
}

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Trial,
    Paused,
    Canceled,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 4] = [
        SubscriptionStatus::Active,
        SubscriptionStatus::Trial,
        SubscriptionStatus::Paused,
        SubscriptionStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == value)
    }
}

/// A tracked recurring payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub service_name: String,
    pub description: String,
    pub amount: f64,
    pub currency: Currency,
    pub billing_cycle: BillingCycle,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub next_date: DateTime<Utc>,
    pub logo: String,
    pub web_link: String,
    pub owner_id: String,
}

impl Subscription {
    pub fn from_document(doc: &Document) -> Self {
        let text = |name: &str| doc.field(name).as_str().unwrap_or_default().to_string();
        Self {
            id: doc.id.clone(),
            service_name: text("service_name"),
            description: text("description"),
            amount: doc.field("amount").as_double().unwrap_or(0.0),
            currency: Currency::parse(&text("currency")).unwrap_or(Currency::Usd),
            billing_cycle: BillingCycle::parse(&text("billing_cycle"))
                .unwrap_or(BillingCycle::Monthly),
            status: SubscriptionStatus::parse(&text("status"))
                .unwrap_or(SubscriptionStatus::Active),
            start_date: doc
                .field("start_date")
                .as_timestamp()
                .unwrap_or_else(Utc::now),
            next_date: doc
                .field("next_date")
                .as_timestamp()
                .unwrap_or_else(Utc::now),
            logo: text("logo"),
            web_link: text("web_link"),
            owner_id: text("user_id"),
        }
    }
}

/// User-entered subscription fields, validated before any remote write.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionDraft {
    pub service_name: String,
    pub description: String,
    pub amount: f64,
    pub currency: String,
    pub billing_cycle: String,
    pub status: String,
    pub logo: String,
    pub web_link: String,
    pub start_date: Option<DateTime<Utc>>,
    pub next_date: Option<DateTime<Utc>>,
}

/// Validated form of a draft, ready to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
    pub service_name: String,
    pub description: String,
    pub amount: f64,
    pub currency: Currency,
    pub billing_cycle: BillingCycle,
    pub status: SubscriptionStatus,
    pub logo: String,
    pub web_link: String,
    pub start_date: Option<DateTime<Utc>>,
    pub next_date: Option<DateTime<Utc>>,
}

impl ValidatedDraft {
    pub fn fields(&self, owner_id: &str, start: DateTime<Utc>, next: DateTime<Utc>) -> Fields {
        Fields::from([
            (
                "service_name".to_string(),
                FieldValue::str(self.service_name.clone()),
            ),
            (
                "description".to_string(),
                FieldValue::str(self.description.clone()),
            ),
            ("amount".to_string(), FieldValue::Double(self.amount)),
            (
                "currency".to_string(),
                FieldValue::str(self.currency.as_str()),
            ),
            (
                "billing_cycle".to_string(),
                FieldValue::str(self.billing_cycle.as_str()),
            ),
            ("status".to_string(), FieldValue::str(self.status.as_str())),
            ("start_date".to_string(), FieldValue::Timestamp(start)),
            ("next_date".to_string(), FieldValue::Timestamp(next)),
            ("logo".to_string(), FieldValue::str(self.logo.clone())),
            (
                "web_link".to_string(),
                FieldValue::str(self.web_link.clone()),
            ),
            ("user_id".to_string(), FieldValue::str(owner_id)),
        ])
    }
}

/// A URL field may be empty, but when present it must be http(s) with a
/// non-empty host.
fn valid_optional_url(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));
    matches!(rest, Some(rest) if !rest.is_empty() && !rest.starts_with('/'))
}

/// Validate a draft, collecting every violated rule rather than stopping
/// at the first.
pub fn validate_draft(draft: &SubscriptionDraft) -> Result<ValidatedDraft, Vec<String>> {
    let mut errors = Vec::new();

    let service_name = draft.service_name.trim().to_string();
    if service_name.is_empty() || service_name.chars().count() > MAX_SERVICE_NAME_LEN {
        errors.push(format!(
            "service name must be between 1-{MAX_SERVICE_NAME_LEN} characters"
        ));
    }

    let description = draft.description.trim().to_string();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        errors.push(format!(
            "description must be between 0-{MAX_DESCRIPTION_LEN} characters"
        ));
    }

    if !(draft.amount.is_finite() && draft.amount >= 0.0) {
        errors.push("amount must be a non-negative number".to_string());
    }

    let currency = Currency::parse(&draft.currency);
    if currency.is_none() {
        errors.push("invalid currency; must be one of: VND, USD, EUR, GBP, JPY, KRW, CNY".to_string());
    }

    let billing_cycle = BillingCycle::parse(&draft.billing_cycle);
    if billing_cycle.is_none() {
        errors.push(
            "invalid billing cycle; must be one of: daily, weekly, monthly, yearly, custom"
                .to_string(),
        );
    }

    let status = SubscriptionStatus::parse(&draft.status);
    if status.is_none() {
        errors
            .push("invalid status; must be one of: active, trial, paused, canceled".to_string());
    }

    if !valid_optional_url(&draft.logo) {
        errors.push("logo must be a valid HTTP/HTTPS URL (can be empty)".to_string());
    }
    if !valid_optional_url(&draft.web_link) {
        errors.push("web link must be a valid HTTP/HTTPS URL (can be empty)".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // errors is empty only when every parse above succeeded.
    Ok(ValidatedDraft {
        service_name,
        description,
        amount: draft.amount,
        currency: currency.unwrap_or(Currency::Usd),
        billing_cycle: billing_cycle.unwrap_or(BillingCycle::Monthly),
        status: status.unwrap_or(SubscriptionStatus::Active),
        logo: draft.logo.trim().to_string(),
        web_link: draft.web_link.trim().to_string(),
        start_date: draft.start_date,
        next_date: draft.next_date,
    })
}

/// The billing date following `start` for the given cycle. Custom cycles
/// default to monthly.
pub fn next_billing_date(cycle: BillingCycle, start: DateTime<Utc>) -> DateTime<Utc> {
    match cycle {
        BillingCycle::Daily => start + Duration::days(1),
        BillingCycle::Weekly => start + Duration::days(7),
        BillingCycle::Monthly | BillingCycle::Custom => start
            .checked_add_months(Months::new(1))
            .unwrap_or(start),
        BillingCycle::Yearly => start
            .with_year(start.year() + 1)
            .or_else(|| start.checked_add_months(Months::new(12)))
            .unwrap_or(start),
    }
}
