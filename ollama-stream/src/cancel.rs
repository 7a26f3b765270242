//! Deadline helper on top of [`CancellationToken`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Derive a token that is cancelled after `timeout`, or earlier if `parent`
/// is cancelled.
///
/// Must be called inside a Tokio runtime. The timer task ends as soon as
/// either token fires, so an abandoned deadline does not outlive its parent.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// let root = CancellationToken::new();
/// let call = ollama_stream::deadline(&root, Duration::from_secs(30));
/// root.cancel();
/// assert!(call.is_cancelled());
/// # }
/// ```
pub fn deadline(parent: &CancellationToken, timeout: Duration) -> CancellationToken {
    let token = parent.child_token();
    let timer = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = timer.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                tracing::debug!(?timeout, "generation deadline elapsed");
                timer.cancel();
            }
        }
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_timeout() {
        let root = CancellationToken::new();
        let token = deadline(&root, Duration::from_secs(30));
        assert!(!token.is_cancelled());

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(!token.is_cancelled());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(token.is_cancelled());
        assert!(!root.is_cancelled(), "deadline must not cancel the parent");
    }

    #[tokio::test]
    async fn follows_parent_cancellation() {
        let root = CancellationToken::new();
        let token = deadline(&root, Duration::from_secs(3600));
        root.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn sibling_deadlines_are_independent() {
        let root = CancellationToken::new();
        let short = deadline(&root, Duration::from_millis(10));
        let long = deadline(&root, Duration::from_secs(3600));
        short.cancelled().await;
        assert!(!long.is_cancelled());
    }
}
