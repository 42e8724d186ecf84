use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::checkout::{PaymentGateway, PaymentOutcome, PaymentSessionRequest, Prefill};
use crate::config::{CheckoutConfig, MerchantConfig};
use crate::error::UpgradeError;

/// Provider-native session descriptor sent to the hosted checkout.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDescriptor {
    pub key: String,
    pub amount: u64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub prefill: Prefill,
    pub theme: Theme,
}

#[derive(Debug, Clone, Serialize)]
pub struct Theme {
    pub color: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionStatusResponse {
    /// "created" | "paid" | "dismissed" | "failed"
    pub status: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Client for the hosted Razorpay checkout. `load` must complete before
/// sessions can be opened; a gateway whose bootstrap never loaded stays
/// permanently not-ready and the flow falls back to the simulator.
pub struct RazorpayGateway {
    client: reqwest::Client,
    merchant: MerchantConfig,
    checkout: CheckoutConfig,
    ready: AtomicBool,
}

impl RazorpayGateway {
    pub fn new(merchant: MerchantConfig, checkout: CheckoutConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            merchant,
            checkout,
            ready: AtomicBool::new(false),
        }
    }

    /// Fetches the checkout bootstrap once per gateway lifetime, bounded by
    /// the configured timeout. Returns whether the gateway became ready.
    pub async fn load(&self) -> bool {
        if self.is_ready() {
            return true;
        }

        let url = format!(
            "{}/v1/preferences?key_id={}",
            self.checkout.base_url.trim_end_matches('/'),
            self.merchant.key_id
        );
        let timeout = Duration::from_millis(self.checkout.load_timeout_ms);

        match tokio::time::timeout(timeout, self.client.get(&url).send()).await {
            Ok(Ok(response)) if response.status().is_success() => {
                self.ready.store(true, Ordering::SeqCst);
                tracing::info!("checkout bootstrap loaded");
                true
            }
            Ok(Ok(response)) => {
                tracing::warn!("checkout bootstrap returned {}", response.status());
                false
            }
            Ok(Err(e)) => {
                tracing::warn!("checkout bootstrap failed: {}", e);
                false
            }
            Err(_) => {
                tracing::warn!(
                    "checkout bootstrap timed out after {}ms",
                    self.checkout.load_timeout_ms
                );
                false
            }
        }
    }

    fn descriptor(&self, request: &PaymentSessionRequest) -> SessionDescriptor {
        SessionDescriptor {
            key: self.merchant.key_id.clone(),
            amount: request.amount_minor,
            currency: request.currency.clone(),
            name: request.merchant_name.clone(),
            description: request.description.clone(),
            image: request.image.clone(),
            prefill: request.prefill.clone(),
            theme: Theme {
                color: request.theme_color.clone(),
            },
        }
    }

    async fn create_session(
        &self,
        descriptor: &SessionDescriptor,
    ) -> Result<CreateSessionResponse, UpgradeError> {
        let url = format!(
            "{}/v1/checkout/sessions",
            self.checkout.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(descriptor)
            .send()
            .await?;

        Ok(response.json::<CreateSessionResponse>().await?)
    }

    async fn poll_session(&self, session_id: &str) -> Result<PaymentOutcome, UpgradeError> {
        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.checkout.base_url.trim_end_matches('/'),
            session_id
        );
        let interval = Duration::from_millis(self.checkout.poll_interval_ms);

        loop {
            let status = self
                .client
                .get(&url)
                .send()
                .await?
                .json::<SessionStatusResponse>()
                .await?;

            if let Some(outcome) = translate_status(status) {
                return Ok(outcome);
            }
            tokio::time::sleep(interval).await;
        }
    }
}

/// Maps a provider status report to a terminal outcome; `None` means the
/// session is still open.
fn translate_status(status: SessionStatusResponse) -> Option<PaymentOutcome> {
    match status.status.as_str() {
        "paid" => Some(match status.payment_id.filter(|id| !id.is_empty()) {
            Some(payment_reference) => PaymentOutcome::Success { payment_reference },
            // 支付成功但缺少支付凭证，不得据此升级账户
            None => PaymentOutcome::Failed {
                reason: "provider reported payment without a payment reference".to_string(),
            },
        }),
        "dismissed" => Some(PaymentOutcome::Cancelled),
        "failed" => Some(PaymentOutcome::Failed {
            reason: status
                .error_description
                .unwrap_or_else(|| "payment failed".to_string()),
        }),
        _ => None,
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn open_session(
        &self,
        request: PaymentSessionRequest,
    ) -> Result<PaymentOutcome, UpgradeError> {
        if !self.is_ready() {
            return Err(UpgradeError::GatewayUnavailable(
                "checkout resource not loaded".to_string(),
            ));
        }

        let descriptor = self.descriptor(&request);
        let created = self.create_session(&descriptor).await?;
        tracing::debug!(
            "checkout session {} opened (tag {})",
            created.id,
            request.session_tag
        );

        self.poll_session(&created.id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::account::User;
    use crate::config::Settings;

    fn status(status: &str, payment_id: Option<&str>) -> SessionStatusResponse {
        SessionStatusResponse {
            status: status.to_string(),
            payment_id: payment_id.map(|s| s.to_string()),
            error_description: None,
        }
    }

    #[test]
    fn paid_with_reference_is_success() {
        let outcome = translate_status(status("paid", Some("pay_abc123"))).unwrap();
        assert_eq!(
            outcome,
            PaymentOutcome::Success {
                payment_reference: "pay_abc123".to_string(),
            }
        );
    }

    #[test]
    fn paid_without_reference_is_failed() {
        for payment_id in [None, Some("")] {
            let outcome = translate_status(status("paid", payment_id)).unwrap();
            assert!(matches!(outcome, PaymentOutcome::Failed { .. }));
        }
    }

    #[test]
    fn dismissed_is_cancelled_and_open_is_pending() {
        assert_eq!(
            translate_status(status("dismissed", None)).unwrap(),
            PaymentOutcome::Cancelled
        );
        assert!(translate_status(status("created", None)).is_none());
    }

    #[test]
    fn failed_carries_the_provider_reason() {
        let outcome = translate_status(SessionStatusResponse {
            status: "failed".to_string(),
            payment_id: None,
            error_description: Some("card declined".to_string()),
        })
        .unwrap();
        assert_eq!(
            outcome,
            PaymentOutcome::Failed {
                reason: "card declined".to_string(),
            }
        );
    }

    #[test]
    fn descriptor_carries_merchant_and_request_fields() {
        let settings = Settings::default();
        let gateway =
            RazorpayGateway::new(settings.merchant.clone(), settings.checkout.clone());
        let now = Utc::now();
        let user = User {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            is_premium: false,
            created_at: now,
            updated_at: now,
        };

        let request = PaymentSessionRequest::for_user(&settings, &user);
        let descriptor = gateway.descriptor(&request);

        assert_eq!(descriptor.key, settings.merchant.key_id);
        assert_eq!(descriptor.amount, 99_900);
        assert_eq!(descriptor.currency, "INR");
        assert_eq!(descriptor.theme.color, "#6366f1");
        assert_eq!(descriptor.prefill.email, "asha@example.com");

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["amount"], 99_900);
        assert_eq!(json["prefill"]["name"], "Asha");
        assert_eq!(json["theme"]["color"], "#6366f1");
    }

    #[tokio::test]
    async fn open_session_requires_a_loaded_gateway() {
        let settings = Settings::default();
        let gateway =
            RazorpayGateway::new(settings.merchant.clone(), settings.checkout.clone());
        assert!(!gateway.is_ready());

        let now = Utc::now();
        let user = User {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            is_premium: false,
            created_at: now,
            updated_at: now,
        };
        let request = PaymentSessionRequest::for_user(&settings, &user);

        let err = gateway.open_session(request).await.unwrap_err();
        assert!(matches!(err, UpgradeError::GatewayUnavailable(_)));
    }
}
