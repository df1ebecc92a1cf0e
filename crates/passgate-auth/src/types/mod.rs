//! Domain types shared by the stores, services, and handlers.

pub mod client;
pub mod user;

pub use client::{ClientSecret, RegisteredClient};
pub use user::{UserAccount, UserProfile};
