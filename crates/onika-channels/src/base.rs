//! Channel trait — lifecycle of a chat front-end.

use async_trait::async_trait;

/// A long-running chat front-end. Channels own their inbound loop and call
/// the router directly; replies go back on the same connection.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique channel name, matching its config key (e.g. "telegram").
    fn name(&self) -> &str;

    /// Run until `stop()` is called.
    async fn start(&self) -> anyhow::Result<()>;

    /// Ask a running `start()` to return.
    async fn stop(&self) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    struct MockChannel {
        stopped: AtomicBool,
        shutdown: Notify,
    }

    #[async_trait]
    impl Channel for MockChannel {
        fn name(&self) -> &str {
            "mock"
        }

        async fn start(&self) -> anyhow::Result<()> {
            self.shutdown.notified().await;
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.stopped.store(true, Ordering::SeqCst);
            self.shutdown.notify_one();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stop_releases_start() {
        let channel = Arc::new(MockChannel {
            stopped: AtomicBool::new(false),
            shutdown: Notify::new(),
        });
        let dyn_channel: Arc<dyn Channel> = channel.clone();
        assert_eq!(dyn_channel.name(), "mock");

        let runner = dyn_channel.clone();
        let handle = tokio::spawn(async move { runner.start().await });
        dyn_channel.stop().await.unwrap();

        handle.await.unwrap().unwrap();
        assert!(channel.stopped.load(Ordering::SeqCst));
    }
}
