//! Pure classification of free-text registrar messages.
//!
//! The remote side returns no fixed enum, only prose, so orchestration keys
//! off substring matches. Keeping the matching here, behind pure functions,
//! lets the pattern list grow without touching the retry/poll loops. The
//! current list is known-good for Etherscan-style registrars but is not
//! assumed complete.

/// Message fragments that indicate a transient condition worth retrying.
const RETRYABLE_PATTERNS: &[&str] = &[
    "rate limit",
    "max rate",
    "pending",
    "indexing",
    "timeout",
    "timed out",
    "try again",
    "temporarily unavailable",
    "unable to locate contractcode",
    "unable to locate contract code",
];

/// True when a submission rejection looks transient (rate limiting, indexing
/// delay, timeouts); everything else is a permanent rejection.
pub fn is_retryable_message(message: &str) -> bool {
    let message = message.to_lowercase();
    RETRYABLE_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

/// True when a submission response means the contract is already verified,
/// which counts as immediate success.
pub fn is_already_verified(message: &str) -> bool {
    message.to_lowercase().contains("already verified")
}

/// How a poll response should advance the verification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDisposition {
    Verified,
    Pending,
    Failed,
}

/// Interprets the free-text result of a status poll.
pub fn interpret_poll_message(message: &str) -> PollDisposition {
    let lowered = message.to_lowercase();
    if lowered.contains("pass") && lowered.contains("verified") {
        PollDisposition::Verified
    } else if lowered.contains("already verified") {
        PollDisposition::Verified
    } else if lowered.contains("pending") {
        PollDisposition::Pending
    } else {
        PollDisposition::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_retryable() {
        assert!(is_retryable_message("Max rate limit reached"));
    }

    #[test]
    fn invalid_api_key_is_not_retryable() {
        assert!(!is_retryable_message("Invalid API Key"));
    }

    #[test]
    fn unindexed_contract_is_retryable() {
        assert!(is_retryable_message(
            "Unable to locate ContractCode at 0xabc"
        ));
    }

    #[test]
    fn poll_pass_verified_is_terminal_success() {
        assert_eq!(
            interpret_poll_message("Pass - Verified"),
            PollDisposition::Verified
        );
    }

    #[test]
    fn poll_already_verified_is_terminal_success() {
        assert_eq!(
            interpret_poll_message("Already Verified"),
            PollDisposition::Verified
        );
    }

    #[test]
    fn poll_pending_keeps_polling() {
        assert_eq!(
            interpret_poll_message("Pending in queue"),
            PollDisposition::Pending
        );
    }

    #[test]
    fn poll_anything_else_is_failure() {
        assert_eq!(
            interpret_poll_message("Fail - Unable to verify"),
            PollDisposition::Failed
        );
    }
}
