//! Skill registry and audited tool dispatch for SyncBoard.
//!
//! Administrators register skills in the [`SkillRegistry`]. For each turn the
//! [`ToolLoader`] wraps every approved and active skill as a [`Tool`], which
//! checks the invocation with the security checker, runs the underlying
//! template, webhook or code action, and appends one audit entry per call.
//!
//! # Main types
//!
//! - [`SkillRegistry`] - Name-keyed skill records with admin operations.
//! - [`SkillAction`] - Typed skill config, one variant per skill type.
//! - [`ToolLoader`] / [`ToolSet`] - Builds and dispatches the turn's tools.
//! - [`DispatchContext`] - Checker, audit store and executors shared by tools.

/// Typed skill configs.
pub mod action;
/// In-process code handlers.
pub mod code;
/// Tool loader and tool set.
pub mod loader;
/// Skill registry.
pub mod registry;
/// Template rendering.
pub mod template;
/// Tool wrapper and dispatch contract.
pub mod tool;
/// Webhook HTTP caller.
pub mod webhook;

pub use action::{CodeConfig, SkillAction, TemplateConfig, WebhookConfig, WebhookMethod};
pub use code::{CodeHandler, CodeHandlers};
pub use loader::{SkippedSkill, ToolLoader, ToolSet};
pub use registry::{SkillRegistry, SkillSource};
pub use tool::{DispatchContext, Tool, ToolDescriptor};
pub use webhook::WebhookCaller;
