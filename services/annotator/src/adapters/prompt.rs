//! services/annotator/src/adapters/prompt.rs
//!
//! Terminal implementations of the `Confirmation` port.

use async_trait::async_trait;
use thematic_core::ports::Confirmation;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

/// Asks on stderr and reads a `y`/`yes` answer from stdin. Anything else,
/// including EOF, declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut stderr = tokio::io::stderr();
        let question = format!("{} [y/N] ", prompt);
        if let Err(e) = stderr.write_all(question.as_bytes()).await {
            warn!("Could not write confirmation prompt; declining: {}", e);
            return false;
        }
        if let Err(e) = stderr.flush().await {
            warn!("Could not flush confirmation prompt; declining: {}", e);
            return false;
        }
        let mut answer = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut answer).await {
            Ok(_) => is_yes(&answer),
            Err(e) => {
                warn!("Could not read confirmation answer: {}", e);
                false
            }
        }
    }
}

/// For `--yes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

#[async_trait]
impl Confirmation for AssumeYes {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yeah"));
    }

    #[tokio::test]
    async fn assume_yes_confirms_without_asking() {
        assert!(AssumeYes.confirm("delete?").await);
    }
}
