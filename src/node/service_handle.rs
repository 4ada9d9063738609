use tokio::sync::watch;
use tokio::task::JoinHandle;
use anyhow::Result;
use tracing::error;

pub type ServiceTask = JoinHandle<Result<()>>;

/// Background tasks of a running devnode plus the shutdown signal they observe.
pub struct ServiceHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<ServiceTask>,
}

impl ServiceHandle {
    /// Create a handle and the receiver that tasks should watch.
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { shutdown_tx: tx, tasks: Vec::new() }, rx)
    }

    pub fn attach(&mut self, task: ServiceTask) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown and join every task. Task failures are logged, not returned.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("service task returned error: {:?}", e),
                Err(e) => error!("task join error: {:?}", e),
            }
        }
        Ok(())
    }
}
