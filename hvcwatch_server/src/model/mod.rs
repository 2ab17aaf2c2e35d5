//! Domain models of the alert server.
//!
//! - `calendar`: NYSE trading sessions, holidays and early closes.
//! - `gate`: market window admission check.
//! - `registry`: validated, deduplicated delivery channels.
//! - `dispatcher`: enrichment once per alert and per-channel fan-out.
//! - `alert_ledger`: weekly/monthly repeat suppression.

pub mod alert_ledger;
pub mod calendar;
pub mod dispatcher;
pub mod gate;
pub mod registry;
