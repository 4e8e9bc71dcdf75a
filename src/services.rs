// src/services.rs

pub mod authorization;
pub mod billing_service;
pub mod clerk;
pub mod company_service;
pub mod device_service;
pub mod session;
pub mod stripe;

pub use authorization::CompanyGate;
pub use billing_service::{BillingService, TrialConfig};
pub use clerk::{ClerkClient, IdentityProvider};
pub use company_service::CompanyService;
pub use device_service::DeviceService;
pub use session::SessionVerifier;
pub use stripe::{PaymentProcessor, StripeClient};
