use crate::branch::RetryPolicy;
use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct BranchOptions {
    pub propagate_timeout: Option<Duration>,
    pub propagate_max_attempts: Option<u32>,
    pub propagate_initial_backoff: Option<Duration>,
    pub actor_queue_size: Option<usize>,
}

pub(super) struct BranchOptionsValidated {
    pub propagate_timeout: Duration,
    pub propagate_max_attempts: u32,
    pub propagate_initial_backoff: Duration,
    pub actor_queue_size: usize,
}

impl BranchOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.propagate_max_attempts == 0 {
            return Err("Propagation must be attempted at least once");
        }
        if self.propagate_initial_backoff >= self.propagate_timeout {
            return Err("Propagation initial backoff must be less than the propagation timeout");
        }
        if self.actor_queue_size == 0 {
            return Err("Actor queue size must be greater than zero");
        }

        Ok(())
    }

    pub(super) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            rpc_timeout: self.propagate_timeout,
            max_attempts: self.propagate_max_attempts,
            initial_backoff: self.propagate_initial_backoff,
        }
    }
}

impl TryFrom<BranchOptions> for BranchOptionsValidated {
    type Error = &'static str;

    fn try_from(options: BranchOptions) -> Result<Self, Self::Error> {
        let values = BranchOptionsValidated {
            propagate_timeout: options.propagate_timeout.unwrap_or(Duration::from_secs(1)),
            propagate_max_attempts: options.propagate_max_attempts.unwrap_or(3),
            propagate_initial_backoff: options
                .propagate_initial_backoff
                .unwrap_or(Duration::from_millis(50)),
            actor_queue_size: options.actor_queue_size.unwrap_or(64),
        };

        values.validate()?;
        Ok(values)
    }
}

/// CustomerOptions configures how a customer paces its requests. `query_delay` defaults to zero.
#[derive(Clone, Default)]
pub struct CustomerOptions {
    pub query_delay: Option<Duration>,
}

impl CustomerOptions {
    pub fn query_delay(&self) -> Duration {
        self.query_delay.unwrap_or(Duration::from_millis(0))
    }
}
