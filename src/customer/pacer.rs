use crate::api::Interface;
use tokio::time::Duration;

/// Pacer is the artificial-delay hook a customer consults right before each send. It exists to
/// model think time / query latency so that queries interleave with in-flight propagations; tests
/// plug in `NoDelay`.
#[async_trait::async_trait]
pub trait Pacer: Send {
    async fn pause(&mut self, interface: Interface);
}

/// NoDelay never waits.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoDelay;

#[async_trait::async_trait]
impl Pacer for NoDelay {
    async fn pause(&mut self, _: Interface) {}
}

/// QueryDelayPacer sleeps a fixed amount before every query and never before a mutation.
#[derive(Copy, Clone, Debug)]
pub struct QueryDelayPacer {
    delay: Duration,
}

impl QueryDelayPacer {
    pub fn new(delay: Duration) -> Self {
        QueryDelayPacer { delay }
    }
}

#[async_trait::async_trait]
impl Pacer for QueryDelayPacer {
    async fn pause(&mut self, interface: Interface) {
        if interface == Interface::Query && self.delay > Duration::from_millis(0) {
            tokio::time::sleep(self.delay).await;
        }
    }
}
