//! Code-fence filter applied to model replies
//!
//! The assistant is not meant to emit source code. Any reply containing a
//! fenced block is swapped for an apology unless the guest asked about code.

/// Marker that opens or closes a fenced code block
pub const CODE_FENCE: &str = "```";

/// Reply shown in place of a suppressed one
pub const FALLBACK_REPLY: &str =
    "I apologize, I seem to have misunderstood. Let’s try again. How can I assist you today?";

/// Whether `raw_reply` should be replaced for this `utterance`
pub fn should_suppress(utterance: &str, raw_reply: &str) -> bool {
    raw_reply.contains(CODE_FENCE) && !utterance.to_lowercase().contains("code")
}

/// Return the reply to store: the raw reply, or the fallback when it looks
/// like code the guest did not ask for.
pub fn filter_reply(utterance: &str, raw_reply: &str) -> String {
    if should_suppress(utterance, raw_reply) {
        FALLBACK_REPLY.to_string()
    } else {
        raw_reply.to_string()
    }
}
