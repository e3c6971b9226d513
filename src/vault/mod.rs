//! Vault seal-state client and unseal reconciler

pub mod client;
pub mod unseal;

pub use client::{SealApi, SealClient, SealStatus, VaultClient};
pub use unseal::{UnsealOutcome, UnsealReconciler};
