//! Withdrawable-tree engine for Approved Premises placements.
//!
//! Withdrawing an application ripples through everything that depends on it:
//! placement requests raised for the application's initial dates, placement
//! applications submitted later, and the bookings made against each request.
//! This crate builds a read-only consistency tree over those entities, decides
//! which of them can be withdrawn on behalf of the acting user, and cascades
//! the withdrawal top-down while respecting blocking conditions such as a
//! recorded arrival.
//!
//! Entity persistence, REST surfaces, and notification delivery live with the
//! owning services; this crate consumes them through the trait seams in
//! [`workflows::withdrawals::providers`].

pub mod config;
pub mod telemetry;
pub mod workflows;
