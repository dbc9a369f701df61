use crate::board::TaskBoard;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Background process driving the board's tick pass once per configured
/// interval. `stop` resolves only after the loop has exited, so no tick can
/// fire afterwards.
pub struct TickEngine {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl TickEngine {
    /// Spawns the interval loop; must be called from within a tokio runtime.
    pub fn start(board: TaskBoard) -> Self {
        let (shutdown, mut stopped) = watch::channel(false);
        let interval = board.tick_interval();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // skip the immediate first firing
            debug!(interval_secs = interval.as_secs(), "tick engine started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        board.run_tick();
                    }
                    _ = stopped.changed() => {
                        debug!("tick engine stopped");
                        break;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
