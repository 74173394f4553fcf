#![doc(test(attr(deny(warnings))))]

//! Payment Wizard drives the ACH payment flow of a policyholder portal: a
//! step-by-step wizard over a serializable payment model, with the portal's
//! save and delete endpoints behind async service traits.

pub mod cli;
pub mod config;
pub mod currency;
pub mod errors;
pub mod model;
pub mod services;
pub mod utils;
pub mod wizard;

pub use errors::{PortalError, Result};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Payment wizard tracing initialized.");
    });
}
