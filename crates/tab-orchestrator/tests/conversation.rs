use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tab_adapters::AgentAdapter;
use tab_audit::InMemoryJournal;
use tab_observability::NoopSink;
use tab_orchestrator::{ConversationOrchestrator, OrchestratorConfig};
use tab_policy::AutoDeny;
use tab_testing::{tight_policy, two_party_session, FakeAdapter, FakeFailure, ScriptedTurn};
use tokio_util::sync::CancellationToken;

fn orchestrator(
    a: FakeAdapter,
    b: FakeAdapter,
    config: OrchestratorConfig,
) -> ConversationOrchestrator {
    let mut adapters: HashMap<String, Arc<dyn AgentAdapter>> = HashMap::new();
    adapters.insert("agent-a".to_string(), Arc::new(a));
    adapters.insert("agent-b".to_string(), Arc::new(b));
    ConversationOrchestrator::new(
        adapters,
        HashMap::new(),
        Box::new(InMemoryJournal::new()),
        Arc::new(NoopSink),
        Arc::new(AutoDeny),
        config,
    )
}

#[tokio::test]
async fn conversation_terminates_without_running_away() {
    let a = FakeAdapter::new(
        "agent-a",
        vec![
            ScriptedTurn::Reply { content: "still investigating the failure".into(), tools_hint: vec![], latency: Duration::ZERO },
            ScriptedTurn::Reply { content: "LGTM, nothing further to add".into(), tools_hint: vec![], latency: Duration::ZERO },
        ],
    );
    let b = FakeAdapter::new(
        "agent-b",
        vec![
            ScriptedTurn::Reply { content: "agreed, let's keep digging".into(), tools_hint: vec![], latency: Duration::ZERO },
            ScriptedTurn::Reply { content: "LGTM, nothing further to add".into(), tools_hint: vec![], latency: Duration::ZERO },
        ],
    );
    let mut orch = orchestrator(a, b, OrchestratorConfig::default());
    let mut session = two_party_session(tight_policy("p1"));

    let cancel = CancellationToken::new();
    orch.run(&mut session, "kick off the review".into(), cancel).await.unwrap();

    assert_ne!(session.status, tab_types::session::SessionStatus::Active);
    assert!(session.turns.len() as u32 <= session.policy.resource_limits.max_turns);
    assert!(!session.turns.is_empty());
}

#[tokio::test]
async fn hard_turn_limit_forces_termination() {
    let a = FakeAdapter::always_replies("agent-a", "turn content that never concludes anything");
    let b = FakeAdapter::always_replies("agent-b", "more turn content, still going");
    let mut orch = orchestrator(a, b, OrchestratorConfig::default());
    let mut session = two_party_session(tight_policy("p2"));

    let cancel = CancellationToken::new();
    orch.run(&mut session, "start".into(), cancel).await.unwrap();

    assert_eq!(session.status, tab_types::session::SessionStatus::Completed);
    assert!(session.turns.len() as u32 <= session.policy.resource_limits.max_turns);
}

#[tokio::test]
async fn transient_failure_retries_then_succeeds() {
    let a = FakeAdapter::new(
        "agent-a",
        vec![
            ScriptedTurn::Fail(FakeFailure::Transient("rate limited".into())),
            ScriptedTurn::Reply { content: "LGTM, we are done".into(), tools_hint: vec![], latency: Duration::ZERO },
        ],
    );
    let b = FakeAdapter::always_replies("agent-b", "sounds reasonable to me");
    let mut config = OrchestratorConfig::default();
    config.backoff_base = Duration::from_millis(1);
    config.backoff_max = Duration::from_millis(5);
    let mut orch = orchestrator(a, b, config);
    let mut session = two_party_session(tight_policy("p3"));

    let cancel = CancellationToken::new();
    orch.run(&mut session, "start".into(), cancel).await.unwrap();

    assert!(!session.turns.is_empty());
}

#[tokio::test]
async fn permanent_failure_with_no_failover_ends_the_run() {
    let a = FakeAdapter::new("agent-a", vec![ScriptedTurn::Fail(FakeFailure::Permanent("bad credentials".into()))]);
    let b = FakeAdapter::always_replies("agent-b", "waiting on agent-a");
    let mut orch = orchestrator(a, b, OrchestratorConfig::default());
    let mut session = two_party_session(tight_policy("p4"));

    let cancel = CancellationToken::new();
    let result = orch.run(&mut session, "start".into(), cancel).await;

    assert!(result.is_err());
    assert_eq!(session.status, tab_types::session::SessionStatus::Failed);
}
