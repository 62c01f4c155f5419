//! Public API: starting a run and controlling it from the outside.

use std::sync::Arc;

use pressroom_core::Parameters;
use tokio::task::JoinHandle;

use crate::emitter::Emitter;
use crate::engine::{SimContext, run_simulation};

/// Coarse run state reported by [`SimulationHandle::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The run is still in progress.
    Running,
    /// The run has finished (normally or after a stop request).
    Idle,
}

/// Handle to a running simulation.
pub struct SimulationHandle {
    ctx: Arc<SimContext>,
    join: JoinHandle<anyhow::Result<()>>,
}

/// Clonable stop/status handle, detached from the run's lifetime so signal
/// handlers can keep it while the main path consumes the
/// [`SimulationHandle`].
#[derive(Clone)]
pub struct Stopper {
    ctx: Arc<SimContext>,
}

impl Stopper {
    /// Requests a cooperative stop. Idempotent.
    pub fn request_stop(&self) {
        self.ctx.request_stop();
    }
}

/// Starts a simulation with the given parameters and event routing.
///
/// Parameter bounds are normalized (inverted ranges swapped) before the run
/// begins; validation against the user-facing ranges is the frontend's job.
pub fn start_simulation(mut params: Parameters, emitter: Emitter) -> SimulationHandle {
    params.normalize();
    let ctx = SimContext::new(params, emitter);
    let join = tokio::spawn(run_simulation(ctx.clone()));
    SimulationHandle { ctx, join }
}

impl SimulationHandle {
    /// Requests a cooperative stop: the queue is drained, every worker wakes
    /// and exits, and the final report is still published. Idempotent.
    pub fn request_stop(&self) {
        self.ctx.request_stop();
    }

    /// A clonable stop handle.
    pub fn stopper(&self) -> Stopper {
        Stopper {
            ctx: self.ctx.clone(),
        }
    }

    /// Whether the run is still in progress.
    pub fn status(&self) -> Status {
        if self.join.is_finished() {
            Status::Idle
        } else {
            Status::Running
        }
    }

    /// Waits for the run to finish.
    pub async fn wait(self) -> anyhow::Result<()> {
        match self.join.await {
            Ok(res) => res,
            Err(err) => Err(anyhow::anyhow!("simulation task join error: {err}")),
        }
    }
}
