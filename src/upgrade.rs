use std::sync::{Arc, Mutex, MutexGuard};

use crate::account::AccountStore;
use crate::checkout::{
    FallbackSimulator, OutcomeKind, PaymentGateway, PaymentOutcome, PaymentSessionRequest,
};
use crate::config::Settings;
use crate::error::{Result, UpgradeError};
use crate::navigation::Continuation;
use crate::notify::{Notifier, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeState {
    /// External checkout resource is still loading in the background.
    GatewayLoading,
    /// Resource loaded; no attempt in progress.
    Ready,
    /// An attempt finished; waiting for the next one.
    Idle,
    /// A session is open; exactly one outcome is expected.
    AwaitingOutcome { user_id: String },
    /// Transient: an outcome is being applied.
    Terminal(OutcomeKind),
}

impl UpgradeState {
    fn in_flight(&self) -> bool {
        matches!(
            self,
            UpgradeState::AwaitingOutcome { .. } | UpgradeState::Terminal(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchRoute {
    Gateway,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    Opened(DispatchRoute),
    /// A session is already in flight; the call was a no-op.
    AlreadyProcessing,
}

/// Orchestrates one premium upgrade attempt at a time: checks the signed-in
/// precondition, opens a checkout session through the gateway (or the
/// fallback simulator when the gateway never loaded), applies the account
/// mutation on success and surfaces feedback for every terminal outcome.
#[derive(Clone)]
pub struct UpgradeController {
    settings: Arc<Settings>,
    account: Arc<dyn AccountStore>,
    notifier: Arc<dyn Notifier>,
    gateway: Arc<dyn PaymentGateway>,
    fallback: Arc<FallbackSimulator>,
    continuation: Arc<dyn Continuation>,
    state: Arc<Mutex<UpgradeState>>,
}

impl UpgradeController {
    pub fn new(
        settings: Settings,
        account: Arc<dyn AccountStore>,
        notifier: Arc<dyn Notifier>,
        gateway: Arc<dyn PaymentGateway>,
        continuation: Arc<dyn Continuation>,
    ) -> Self {
        let fallback = Arc::new(FallbackSimulator::new(settings.fallback.delay_ms));
        Self {
            settings: Arc::new(settings),
            account,
            notifier,
            gateway,
            fallback,
            continuation,
            state: Arc::new(Mutex::new(UpgradeState::GatewayLoading)),
        }
    }

    pub fn state(&self) -> UpgradeState {
        self.lock_state().clone()
    }

    /// Signals that the external checkout resource finished loading. Driven
    /// by the gateway's `load`, independent of user action.
    pub fn mark_gateway_ready(&self) {
        let mut state = self.lock_state();
        if matches!(*state, UpgradeState::GatewayLoading) {
            *state = UpgradeState::Ready;
            tracing::debug!("upgrade state: gateway ready");
        }
    }

    /// Begins one upgrade attempt. While a session is in flight this is a
    /// no-op reported as `AlreadyProcessing`; without a signed-in user the
    /// attempt is rejected before any session opens.
    pub async fn start(&self) -> Result<StartStatus> {
        if self.lock_state().in_flight() {
            tracing::debug!("start ignored: a session is already in flight");
            return Ok(StartStatus::AlreadyProcessing);
        }

        let Some(user) = self.account.current_user().await? else {
            self.notifier.show(
                "Error",
                "You need to be logged in to upgrade.",
                Severity::Destructive,
            );
            self.continuation.leave();
            return Err(UpgradeError::Unauthenticated);
        };

        // 同一控制器同一时刻至多一个会话
        {
            let mut state = self.lock_state();
            if state.in_flight() {
                return Ok(StartStatus::AlreadyProcessing);
            }
            *state = UpgradeState::AwaitingOutcome {
                user_id: user.id.clone(),
            };
        }

        let request = PaymentSessionRequest::for_user(&self.settings, &user);

        // The route is decided once per start() and never re-evaluated
        // mid-flight.
        let route = if self.gateway.is_ready() {
            DispatchRoute::Gateway
        } else {
            tracing::info!("checkout resource not loaded, using fallback simulator");
            DispatchRoute::Fallback
        };

        let controller = self.clone();
        tokio::spawn(async move {
            let session = match route {
                DispatchRoute::Gateway => controller.gateway.open_session(request).await,
                DispatchRoute::Fallback => controller.fallback.open_session(request).await,
            };
            let outcome = session.unwrap_or_else(|e| PaymentOutcome::Failed {
                reason: e.to_string(),
            });
            controller.on_outcome(outcome).await;
        });

        Ok(StartStatus::Opened(route))
    }

    /// Single entry point for session completion. At most one outcome is
    /// accepted per awaiting period; anything else is a contract violation
    /// and is dropped.
    pub async fn on_outcome(&self, outcome: PaymentOutcome) {
        let outcome = normalize(outcome);

        let user_id = {
            let mut state = self.lock_state();
            match &*state {
                UpgradeState::AwaitingOutcome { user_id } => {
                    let id = user_id.clone();
                    *state = UpgradeState::Terminal(outcome.kind());
                    id
                }
                other => {
                    tracing::warn!(
                        "outcome {} arrived in state {:?}, ignoring",
                        outcome.kind().as_str(),
                        other
                    );
                    return;
                }
            }
        };

        match &outcome {
            PaymentOutcome::Success { payment_reference } => {
                match self.account.promote_to_premium(&user_id).await {
                    Ok(updated) => {
                        if updated.is_none() {
                            tracing::warn!("promotion requested for unknown user {}", user_id);
                        }
                        tracing::info!(
                            "user {} upgraded to premium, payment reference {}",
                            user_id,
                            payment_reference
                        );
                        self.notifier.show(
                            "Upgrade Successful!",
                            "You now have access to premium features.",
                            Severity::Default,
                        );
                    }
                    Err(e) => {
                        tracing::error!("promotion failed for user {}: {}", user_id, e);
                        self.notifier.show(
                            "Upgrade Failed",
                            "Your payment went through but the account could not be updated. Please contact support.",
                            Severity::Destructive,
                        );
                    }
                }
            }
            PaymentOutcome::Cancelled => {
                self.notifier.show(
                    "Payment Cancelled",
                    "You can upgrade to premium anytime.",
                    Severity::Default,
                );
            }
            PaymentOutcome::Failed { reason } => {
                tracing::warn!("payment failed: {}", reason);
                self.notifier
                    .show("Payment Failed", reason, Severity::Destructive);
            }
        }

        self.continuation.resume(&outcome);

        *self.lock_state() = UpgradeState::Idle;
    }

    /// Leaves the upgrade view. An in-flight session is not cancelled; a
    /// late outcome is still handled when it arrives.
    pub fn go_back(&self) {
        self.continuation.leave();
    }

    fn lock_state(&self) -> MutexGuard<'_, UpgradeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A success without a payment reference must never upgrade the account; it
/// is reclassified as a failure before dispatch.
fn normalize(outcome: PaymentOutcome) -> PaymentOutcome {
    match outcome {
        PaymentOutcome::Success { payment_reference } if payment_reference.is_empty() => {
            PaymentOutcome::Failed {
                reason: "payment provider returned no payment reference".to_string(),
            }
        }
        other => other,
    }
}
