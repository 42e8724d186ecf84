pub mod account;
pub mod checkout;
pub mod config;
pub mod error;
pub mod navigation;
pub mod notify;
pub mod upgrade;

pub use account::{AccountStore, MemoryAccountStore, User};
pub use checkout::{
    FallbackSimulator, PaymentGateway, PaymentOutcome, PaymentSessionRequest, RazorpayGateway,
};
pub use config::Settings;
pub use error::{Result, UpgradeError};
pub use navigation::{ClosingContinuation, Continuation, NavigateContinuation, Navigator};
pub use notify::{Notifier, Severity, TracingNotifier};
pub use upgrade::{DispatchRoute, StartStatus, UpgradeController, UpgradeState};
