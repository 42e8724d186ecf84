pub mod razorpay;
pub mod simulator;

pub use razorpay::RazorpayGateway;
pub use simulator::FallbackSimulator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::User;
use crate::config::Settings;
use crate::error::UpgradeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
}

/// One checkout attempt toward the external provider. Immutable once built;
/// prefill fields are copied from the user at session-creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSessionRequest {
    pub amount_minor: u64,
    pub currency: String,
    pub merchant_name: String,
    pub description: String,
    pub image: String,
    pub prefill: Prefill,
    pub theme_color: String,
    /// Correlates the session across log lines.
    pub session_tag: String,
}

impl PaymentSessionRequest {
    pub fn for_user(settings: &Settings, user: &User) -> Self {
        Self {
            amount_minor: settings.checkout.amount_minor,
            currency: settings.checkout.currency.clone(),
            merchant_name: settings.merchant.name.clone(),
            description: settings.merchant.description.clone(),
            image: settings.merchant.image.clone(),
            prefill: Prefill {
                name: user.name.clone(),
                email: user.email.clone(),
            },
            theme_color: settings.merchant.theme_color.clone(),
            session_tag: Uuid::new_v4().to_string(),
        }
    }
}

/// Terminal classification of a session. Exactly one is produced per opened
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success { payment_reference: String },
    Cancelled,
    Failed { reason: String },
}

impl PaymentOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            PaymentOutcome::Success { .. } => OutcomeKind::Success,
            PaymentOutcome::Cancelled => OutcomeKind::Cancelled,
            PaymentOutcome::Failed { .. } => OutcomeKind::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Cancelled,
    Failed,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Cancelled => "cancelled",
            OutcomeKind::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(OutcomeKind::Success),
            "cancelled" => Some(OutcomeKind::Cancelled),
            "failed" => Some(OutcomeKind::Failed),
            _ => None,
        }
    }
}

/// Bridge to a checkout provider. The ready flag and the open operation are
/// the whole contract; resource loading and retries stay outside it.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Whether the external checkout resource finished loading.
    fn is_ready(&self) -> bool;

    /// Opens one checkout session and resolves it to exactly one outcome.
    async fn open_session(
        &self,
        request: PaymentSessionRequest,
    ) -> Result<PaymentOutcome, UpgradeError>;
}
