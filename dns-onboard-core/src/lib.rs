//! DNS Onboard Core Library
//!
//! Provides the onboarding logic behind the chat bot, including:
//! - Credential context (token snapshot per command, shared or per-session scope)
//! - Provisioning workflow (ordered zone setup with per-step retry, reports and resume)
//! - Notification of progress and errors, with an admin copy
//! - Command parsing and routing
//!
//! The library is transport-independent: the chat transport plugs in through
//! [`MessageSink`], and gateways are built through [`GatewayFactory`].

pub mod error;
pub mod services;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::{
    CommandRouter, CredentialContext, CredentialScope, Notifier, ProvisioningService,
    ServiceContext,
};
pub use traits::{CloudflareGatewayFactory, GatewayFactory, MessageSink};
