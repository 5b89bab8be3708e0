//! Public facade over the Twin-Agent Bridge engine.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tab_sdk::Bridge;
//! use tab_policy::AutoDeny;
//! use tab_types::{AgentAdapterDescriptor, Policy};
//!
//! # async fn quickstart(claude: AgentAdapterDescriptor, codex: AgentAdapterDescriptor) -> anyhow::Result<()> {
//! let bridge = Bridge::builder()
//!     .with_agent(claude)?
//!     .with_agent(codex)?
//!     .with_policy(Policy::permissive("default"))
//!     .with_approval_resolver(Arc::new(AutoDeny))
//!     .build()?;
//!
//! let (session, _records, summary) = bridge
//!     .run_conversation("code review", vec!["claude".into(), "codex".into()], None, "begin the review".into())
//!     .await?;
//! println!("session ended with {} turns: {:?}", session.turns.len(), summary.termination_reason);
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::{Bridge, BridgeBuilder, BridgeError, ConversationSummary};

pub use tab_adapters::{AdapterError, AgentAdapter};
pub use tab_orchestrator::{OrchestratorConfig, OrchestratorError};
pub use tab_types::{AuditRecord, Policy, Session};
