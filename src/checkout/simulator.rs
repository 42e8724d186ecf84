use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::checkout::{PaymentGateway, PaymentOutcome, PaymentSessionRequest};
use crate::error::UpgradeError;

/// Local stand-in used when the external checkout resource never loaded.
/// Every session completes successfully after a fixed delay so the flow
/// stays usable offline; there is no simulated cancellation or failure.
pub struct FallbackSimulator {
    delay: Duration,
}

impl FallbackSimulator {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl PaymentGateway for FallbackSimulator {
    fn is_ready(&self) -> bool {
        true
    }

    async fn open_session(
        &self,
        request: PaymentSessionRequest,
    ) -> Result<PaymentOutcome, UpgradeError> {
        tokio::time::sleep(self.delay).await;

        let payment_reference = format!("sim_{}", Uuid::new_v4().simple());
        tracing::info!(
            "simulated checkout session completed (tag {})",
            request.session_tag
        );

        Ok(PaymentOutcome::Success { payment_reference })
    }
}
