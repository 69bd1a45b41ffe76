//! Property-based tests for turn processing
//!
//! - Each turn adds exactly one user and one assistant message
//! - The stored user message is the utterance verbatim
//! - No system message ever lands in the history
//! - Requests are always system prompt followed by the history
//! - The code-fence filter follows its literal rule

use super::*;
use crate::llm::testing::MockLlmService;
use futures::executor::block_on;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Guest utterance, sometimes mentioning code in any casing
fn arb_utterance() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ?!.,']{1,60}",
        ("[a-z ]{0,20}", prop_oneof![Just("code"), Just("CODE"), Just("Code")], "[a-z ]{0,20}")
            .prop_map(|(a, c, b)| format!("{a}{c}{b}")),
    ]
}

/// Raw model reply, sometimes containing a fence
fn arb_reply() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 .,!\n]{0,80}",
        ("[a-zA-Z .]{0,30}", "[a-z ;=]{0,30}").prop_map(|(a, b)| format!("{a}\n```\n{b}\n```")),
    ]
}

/// Outcome of one simulated remote call
#[derive(Debug, Clone)]
enum Outcome {
    Reply(String),
    Failure(String),
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        4 => arb_reply().prop_map(Outcome::Reply),
        1 => "[a-zA-Z ]{1,40}".prop_map(Outcome::Failure),
    ]
}

fn arb_turns() -> impl Strategy<Value = Vec<(String, Outcome)>> {
    proptest::collection::vec((arb_utterance(), arb_outcome()), 1..8)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn turns_append_two_messages(turns in arb_turns()) {
        let mock = Arc::new(MockLlmService::new("mock"));
        for (_, outcome) in &turns {
            match outcome {
                Outcome::Reply(text) => mock.queue_text(text),
                Outcome::Failure(msg) => mock.queue_error(LlmError::network(msg.clone())),
            }
        }
        let processor = ConversationTurnProcessor::new(mock.clone());
        let mut history = ConversationHistory::new();

        for (utterance, outcome) in &turns {
            let before = history.len();
            let reply = block_on(processor.process_turn(&mut history, utterance));

            prop_assert_eq!(history.len(), before + 2);
            prop_assert_eq!(&history.messages()[before], &Message::user(utterance.as_str()));
            prop_assert_eq!(&history.messages()[before + 1], &Message::assistant(reply.as_str()));

            match outcome {
                Outcome::Reply(raw) => prop_assert_eq!(reply, filter_reply(utterance, raw)),
                Outcome::Failure(msg) => prop_assert_eq!(reply, format!("Error: {msg}")),
            }
        }

        prop_assert!(history.messages().iter().all(|m| m.role() != MessageRole::System));
    }

    #[test]
    fn requests_are_system_then_history(turns in arb_turns()) {
        let mock = Arc::new(MockLlmService::new("mock"));
        for (_, outcome) in &turns {
            match outcome {
                Outcome::Reply(text) => mock.queue_text(text),
                Outcome::Failure(msg) => mock.queue_error(LlmError::network(msg.clone())),
            }
        }
        let processor = ConversationTurnProcessor::new(mock.clone());
        let mut history = ConversationHistory::new();
        for (utterance, _) in &turns {
            block_on(processor.process_turn(&mut history, utterance));
        }

        let requests = mock.recorded_requests();
        prop_assert_eq!(requests.len(), turns.len());
        for (i, request) in requests.iter().enumerate() {
            // Turn i sees the 2*i earlier messages plus its own utterance
            let expected_len = 2 * i + 1;
            prop_assert_eq!(request.messages.len(), expected_len + 1);
            prop_assert_eq!(&request.messages[0], &system_prompt::system_message());
            prop_assert_eq!(&request.messages[1..], &history.messages()[..expected_len]);
            prop_assert!(request.messages[1..].iter().all(|m| m.role() != MessageRole::System));
        }
    }

    #[test]
    fn filter_rule(utterance in arb_utterance(), raw in arb_reply()) {
        let filtered = filter_reply(&utterance, &raw);
        let fenced = raw.contains("```");
        let asked_for_code = utterance.to_lowercase().contains("code");

        if fenced && !asked_for_code {
            prop_assert_eq!(filtered, FALLBACK_REPLY);
        } else {
            prop_assert_eq!(filtered, raw);
        }
    }
}
