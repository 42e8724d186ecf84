pub mod settings;

pub use settings::{CheckoutConfig, FallbackConfig, MerchantConfig, Settings};
