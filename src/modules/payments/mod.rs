//! Payment provider integration for hosted checkout sessions

mod checkout;
mod stripe_client;

pub use checkout::{CheckoutLineItem, CheckoutProvider, CheckoutSessionRequest};
pub use stripe_client::StripeClient;
