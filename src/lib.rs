//! PIX key banking backend: bank accounts, the PIX keys that route payments
//! to them and transfers between accounts.
//!
//! A host application loads the [`modules`] it needs, starts the backing
//! [`services`] over a shared set of [`repositories`] and serves the
//! resulting router.

pub mod models;
pub mod modules;
pub mod repositories;
pub mod services;
pub mod settings;
