//! Director commands
//!
//! Everything that reaches the director task from outside arrives as a
//! [`Command`] on one queue, including tasks sinks schedule for later. The
//! director handles them one at a time between deliveries.

use std::sync::Arc;
use std::time::Duration;

use exporter_protocol::Position;
use exporter_routing::SinkId;
use exporter_sinks::{ScheduledTask, SinkDescriptor, TaskHandle};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::Result;
use crate::health::FailureListener;

pub(crate) enum Command {
    EnableSink {
        descriptor: SinkDescriptor,
        init_from: Option<SinkId>,
        reply: oneshot::Sender<Result<bool>>,
    },
    DisableSink {
        sink_id: SinkId,
        reply: oneshot::Sender<Result<bool>>,
    },
    Pause {
        reply: oneshot::Sender<()>,
    },
    SoftPause {
        reply: oneshot::Sender<()>,
    },
    Resume {
        reply: oneshot::Sender<Result<()>>,
    },
    LowestPosition {
        reply: oneshot::Sender<Result<Position>>,
    },
    AddFailureListener {
        listener: Arc<dyn FailureListener>,
        reply: oneshot::Sender<()>,
    },
    RunTask {
        sink_id: SinkId,
        token: CancellationToken,
        task: ScheduledTask,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::EnableSink { .. } => "enable_sink",
            Self::DisableSink { .. } => "disable_sink",
            Self::Pause { .. } => "pause",
            Self::SoftPause { .. } => "soft_pause",
            Self::Resume { .. } => "resume",
            Self::LowestPosition { .. } => "lowest_position",
            Self::AddFailureListener { .. } => "add_failure_listener",
            Self::RunTask { .. } => "run_task",
            Self::Close { .. } => "close",
        }
    }
}

/// Schedules sink tasks back onto the director's command queue
///
/// Holds only a weak sender so pending tasks never keep a director alive
/// after every handle is gone. Cancelling `token` drops all tasks that have
/// not run yet.
#[derive(Debug, Clone)]
pub(crate) struct TaskScheduler {
    sink_id: SinkId,
    commands: mpsc::WeakSender<Command>,
    token: CancellationToken,
}

impl TaskScheduler {
    pub(crate) fn new(
        sink_id: SinkId,
        commands: mpsc::WeakSender<Command>,
        token: CancellationToken,
    ) -> Self {
        Self {
            sink_id,
            commands,
            token,
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn schedule(&self, delay: Duration, task: ScheduledTask) -> TaskHandle {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                sink_id = %self.sink_id,
                "no runtime available, dropping scheduled task"
            );
            return TaskHandle::cancelled();
        };

        let token = self.token.child_token();
        let handle = TaskHandle::new(token.clone());
        let commands = self.commands.clone();
        let sink_id = self.sink_id.clone();

        runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(sender) = commands.upgrade() {
                        // A closed queue means the director is gone
                        let _ = sender.send(Command::RunTask { sink_id, token, task }).await;
                    }
                }
            }
        });

        handle
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command").field("name", &self.name()).finish()
    }
}
