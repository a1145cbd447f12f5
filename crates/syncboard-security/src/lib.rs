//! Security primitives for SyncBoard skill dispatch.
//!
//! Provides the security checker contract consulted before every skill
//! invocation, the default policy implementation, and the invocation audit log.
//!
//! # Main types
//!
//! - [`SecurityChecker`] - Async policy gate returning a [`syncboard_core::SecurityVerdict`].
//! - [`PolicyChecker`] - Flag, domain allow-list, and input content checks.
//! - [`DomainAllowlist`] - Hosts webhook skills may call.
//! - [`Sanitizer`] - Input sanitization utilities.
//! - [`AuditStore`] - Append-only invocation log with bounded reads and retention.

/// Invocation audit log.
pub mod audit;
/// Webhook host allow-list.
pub mod allowlist;
/// Security checker contract and implementations.
pub mod checker;
/// Input sanitization utilities.
pub mod sanitizer;

pub use allowlist::DomainAllowlist;
pub use audit::{AuditStore, InvocationLogEntry, MemoryAuditStore, SqliteAuditStore};
pub use checker::{PolicyChecker, SecurityChecker, SecurityPolicy, StaticChecker};
pub use sanitizer::{SanitizeResult, Sanitizer};
