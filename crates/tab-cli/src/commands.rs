use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tab_observability::Sink;
use tab_sdk::{AuditRecord, Bridge};
use tab_types::config::RuntimeConfig;

use crate::args::{Cli, Commands, OutputFormat};
use crate::config::load_runtime_config;
use crate::tracing_sink::TracingSink;

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Run { config, participants, topic, initial_speaker, audit_export } => {
            run_conversation(&config, participants, topic, initial_speaker, audit_export.as_deref(), cli.format).await
        }
    }
}

fn validate(config_path: &Path) -> Result<()> {
    let config = load_runtime_config(config_path)?;
    println!(
        "config ok: {} agent(s), policy '{}', max_turns={}",
        config.agents.len(),
        config.policy.policy.policy_id,
        config.policy.policy.resource_limits.max_turns
    );
    Ok(())
}

async fn run_conversation(
    config_path: &Path,
    participants_override: Option<Vec<String>>,
    topic_override: Option<String>,
    initial_speaker_override: Option<String>,
    audit_export: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_runtime_config(config_path)?;
    let bridge = build_bridge(&config)?;

    let participants = match participants_override {
        Some(p) => p,
        None => config.agents.iter().map(|a| a.descriptor.agent_id.clone()).collect(),
    };
    if participants.len() < 2 {
        bail!("at least two participants are required to run a conversation");
    }
    let topic = topic_override.unwrap_or_else(|| config.topic.clone());
    let initial_speaker = initial_speaker_override.or_else(|| config.initial_speaker.clone());

    let (session, records, summary) =
        bridge.run_conversation(topic, participants, initial_speaker.as_deref(), config.opening_message.clone()).await?;

    if let Some(export_path) = audit_export {
        write_audit_export(export_path, &records)?;
    }

    match format {
        OutputFormat::Text => print_text_summary(&session, &records, &summary),
        OutputFormat::Json => print_json_summary(&session, &records, &summary)?,
    }

    Ok(())
}

fn build_bridge(config: &RuntimeConfig) -> Result<Bridge> {
    let sink: Arc<dyn Sink> = Arc::new(TracingSink::new());

    let mut builder = Bridge::builder()
        .with_policy(config.policy.policy.clone())
        .with_sink(sink);

    for agent in &config.agents {
        builder = builder.with_agent(agent.descriptor.clone()).context("registering agent adapter")?;
    }

    let mut orchestrator_config = tab_sdk::OrchestratorConfig::default();
    orchestrator_config.circuit_breaker_threshold = config.circuit_breaker_threshold;
    orchestrator_config.circuit_breaker_cooldown = std::time::Duration::from_secs(config.circuit_breaker_cooldown_secs);
    builder = builder.with_config(orchestrator_config);

    Ok(builder.build()?)
}

fn write_audit_export(path: &Path, records: &[AuditRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating audit export directory {}", parent.display()))?;
        }
    }
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("creating audit export file {}", path.display()))?;
    for record in records {
        let line = serde_json::to_string(record).context("serializing audit record")?;
        writeln!(file, "{line}").context("writing audit export")?;
    }
    Ok(())
}

fn print_text_summary(session: &tab_sdk::Session, records: &[AuditRecord], summary: &tab_sdk::ConversationSummary) {
    println!("session {} ended as {:?}", session.session_id, session.status);
    println!("termination reason: {:?}", summary.termination_reason);
    println!("turns: {}", session.turns.len());
    println!("cumulative cost: {:.2}", session.cumulative_cost());
    println!("audit records: {}", records.len());
    for turn in &session.turns {
        println!("  [{:>3}] {} -> {}: {}", turn.sequence, turn.from_agent, turn.to_agent, tab_types::util::truncate(&turn.content, 120));
    }
}

fn print_json_summary(session: &tab_sdk::Session, records: &[AuditRecord], summary: &tab_sdk::ConversationSummary) -> Result<()> {
    let payload = serde_json::json!({
        "session_id": summary.session_id,
        "status": summary.status,
        "turn_count": summary.turn_count,
        "total_cost": summary.total_cost,
        "duration": summary.duration_seconds,
        "termination_reason": summary.termination_reason,
        "summary": summary.summary,
        "audit_record_count": records.len(),
        "turns": session.turns,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
