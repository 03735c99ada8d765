//! Demo agents wired up by `flowkit run`.

use std::sync::Arc;

use serde_json::Value;

use flowkit_protocols::{agent_fn, keys, AgentHandler, AgentResult, State};

pub(crate) const AGENTS: [&str; 3] = ["echo", "upper", "counter"];

/// Data key the demo agents read their input from.
pub(crate) const TEXT: &str = "text";

pub(crate) fn handler(name: &str) -> Option<Arc<dyn AgentHandler>> {
    match name {
        "echo" => Some(echo()),
        "upper" => Some(upper()),
        "counter" => Some(counter()),
        _ => None,
    }
}

fn text(state: &State) -> String {
    match state.get(TEXT) {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Copies `text` to `output`.
fn echo() -> Arc<dyn AgentHandler> {
    agent_fn(|_ctx, _event, state: State| async move {
        let out = text(&state);
        Ok(AgentResult::success(state.with(keys::OUTPUT, out)))
    })
}

/// Upper-cases `text` in place.
fn upper() -> Arc<dyn AgentHandler> {
    agent_fn(|_ctx, _event, state: State| async move {
        let out = text(&state).to_uppercase();
        Ok(AgentResult::success(
            state.with(TEXT, out.clone()).with(keys::OUTPUT, out),
        ))
    })
}

/// Increments `count` and completes the loop once it reaches `until`
/// (default 3).
fn counter() -> Arc<dyn AgentHandler> {
    agent_fn(|_ctx, _event, state: State| async move {
        let count = state.get("count").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
        let until = state.get("until").and_then(|v| v.as_u64()).unwrap_or(3);
        let state = state.with("count", count).with(keys::OUTPUT, count);
        if count >= until {
            state.set(keys::LOOP_COMPLETED, true);
        }
        Ok(AgentResult::success(state))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowkit_protocols::{CancellationToken, Event};
    use serde_json::json;

    async fn run(name: &str, state: State) -> State {
        handler(name)
            .unwrap()
            .run(&CancellationToken::new(), &Event::to(name), state)
            .await
            .unwrap()
            .into_output_state()
            .unwrap()
    }

    #[tokio::test]
    async fn test_echo_and_upper() {
        let out = run("echo", State::new().with(TEXT, "hi")).await;
        assert_eq!(out.get(keys::OUTPUT), Some(json!("hi")));

        let out = run("upper", State::new().with(TEXT, "hi")).await;
        assert_eq!(out.get(TEXT), Some(json!("HI")));
    }

    #[tokio::test]
    async fn test_counter_completes() {
        let out = run("counter", State::new().with("count", 2)).await;
        assert_eq!(out.get("count"), Some(json!(3)));
        assert_eq!(out.get(keys::LOOP_COMPLETED), Some(json!(true)));

        let out = run("counter", State::new()).await;
        assert!(out.get(keys::LOOP_COMPLETED).is_none());
    }

    #[test]
    fn test_unknown_agent() {
        assert!(handler("nope").is_none());
        assert!(AGENTS.iter().all(|name| handler(name).is_some()));
    }
}
