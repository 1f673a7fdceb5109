use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

pub(crate) fn shutdown_signal() -> (ServerShutdownHandle, ServerShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (ServerShutdownHandle { tx }, ServerShutdownSignal { rx })
}

/// Dropping the handle (or calling `shutdown()`) stops the server.
pub(crate) struct ServerShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl ServerShutdownHandle {
    pub(crate) fn shutdown(self) {
        let _ = self.tx.send(());
    }
}

pub(crate) struct ServerShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for ServerShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let rx = Pin::new(&mut self.rx);

        match rx.poll(cx) {
            Poll::Pending => Poll::Pending,
            // Sent or dropped, either way we stop.
            Poll::Ready(_) => Poll::Ready(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    #[tokio::test]
    async fn signal_fires_on_shutdown() {
        let (handle, signal) = shutdown_signal();
        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(1), signal)
            .await
            .expect("Signal should fire after shutdown()");
    }

    #[tokio::test]
    async fn signal_fires_on_drop() {
        let (handle, signal) = shutdown_signal();
        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), signal)
            .await
            .expect("Signal should fire after handle is dropped");
    }

    #[tokio::test]
    async fn signal_pending_while_handle_alive() {
        let (_handle, signal) = shutdown_signal();
        tokio::time::timeout(Duration::from_millis(20), signal)
            .await
            .expect_err("Signal should not fire");
    }
}
