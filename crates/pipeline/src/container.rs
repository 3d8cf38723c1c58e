//! Sink container
//!
//! Wraps one configured sink for the director: its lifecycle, its accept
//! filter and its progress. Two positions are tracked per sink:
//!
//! - `acknowledged` - the last position the sink confirmed through its
//!   controller, persisted to the position store unless soft-paused
//! - `last_exported` - the last position handed to the sink
//!
//! When nothing is outstanding (`acknowledged >= last_exported`) a record
//! the sink does not want can be acknowledged on its behalf, so a sink
//! with a narrow filter never holds back log truncation.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use exporter_protocol::{NO_POSITION, PartitionId, Position, TypedRecord};
use exporter_routing::{RecordFilter, SinkId};
use exporter_sinks::util::RateLimitedLogger;
use exporter_sinks::{
    ScheduledTask, Sink, SinkContext, SinkController, SinkDescriptor, SinkError, TaskHandle,
};
use exporter_state::{SharedPositionStore, SinkState, StateError};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::command::TaskScheduler;
use crate::error::{PipelineError, Result};

/// Interval between repeated failure logs of one sink
const ERROR_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Outcome of handing something to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The sink accepted it (or did not need it)
    Done,
    /// The sink failed; offer the same thing again later
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Configured,
    Opened,
    Closed,
}

#[derive(Debug)]
struct Progress {
    acknowledged: Position,
    metadata: Bytes,
    soft_paused: bool,
    store_failure: Option<StateError>,
}

/// Progress shared between the container and the sink's controller
struct SharedProgress {
    sink_id: SinkId,
    store: SharedPositionStore,
    progress: Mutex<Progress>,
}

impl SharedProgress {
    /// Move the acknowledged position forward, never backwards
    ///
    /// With metadata an acknowledgement of the current position is accepted
    /// so a sink can update metadata without new records.
    fn acknowledge(&self, position: Position, metadata: Option<Bytes>) -> bool {
        let mut progress = self.progress.lock();
        let advances = match metadata {
            Some(_) => position >= progress.acknowledged,
            None => position > progress.acknowledged,
        };
        if !advances {
            return false;
        }

        progress.acknowledged = position;
        let with_metadata = metadata.is_some();
        if let Some(metadata) = metadata {
            progress.metadata = metadata;
        }
        if !progress.soft_paused {
            self.persist(&mut progress, with_metadata);
        }
        true
    }

    fn persist(&self, progress: &mut Progress, with_metadata: bool) {
        let result = if with_metadata {
            self.store.set_state(
                &self.sink_id,
                progress.acknowledged,
                progress.metadata.clone(),
            )
        } else {
            self.store.set_position(&self.sink_id, progress.acknowledged)
        };
        if let Err(e) = result
            && progress.store_failure.is_none()
        {
            progress.store_failure = Some(e);
        }
    }

    fn take_store_failure(&self) -> Result<()> {
        match self.progress.lock().store_failure.take() {
            Some(e) => Err(PipelineError::Store(e)),
            None => Ok(()),
        }
    }
}

/// The controller handed to an open sink
struct ContainerController {
    shared: Arc<SharedProgress>,
    scheduler: TaskScheduler,
}

impl SinkController for ContainerController {
    fn update_position(&self, position: Position) {
        self.shared.acknowledge(position, None);
    }

    fn update_position_with_metadata(&self, position: Position, metadata: Bytes) {
        self.shared.acknowledge(position, Some(metadata));
    }

    fn read_metadata(&self) -> Option<Bytes> {
        let progress = self.shared.progress.lock();
        (!progress.metadata.is_empty()).then(|| progress.metadata.clone())
    }

    fn schedule_cancellable_task(&self, delay: Duration, task: ScheduledTask) -> TaskHandle {
        self.scheduler.schedule(delay, task)
    }
}

/// One sink of a partition, driven by the director
pub struct SinkContainer {
    descriptor: SinkDescriptor,
    partition_id: PartitionId,
    sink: Box<dyn Sink>,
    filter: RecordFilter,
    shared: Arc<SharedProgress>,
    scheduler: TaskScheduler,
    last_exported: Position,
    lifecycle: Lifecycle,
    error_logger: RateLimitedLogger,
}

impl SinkContainer {
    pub(crate) fn new(
        descriptor: SinkDescriptor,
        partition_id: PartitionId,
        store: SharedPositionStore,
        scheduler: TaskScheduler,
    ) -> Self {
        let shared = Arc::new(SharedProgress {
            sink_id: descriptor.id().clone(),
            store,
            progress: Mutex::new(Progress {
                acknowledged: NO_POSITION,
                metadata: Bytes::new(),
                soft_paused: false,
                store_failure: None,
            }),
        });

        Self {
            sink: descriptor.create_sink(),
            filter: *descriptor.filter(),
            descriptor,
            partition_id,
            shared,
            scheduler,
            last_exported: NO_POSITION,
            lifecycle: Lifecycle::Created,
            error_logger: RateLimitedLogger::new(ERROR_LOG_INTERVAL),
        }
    }

    #[inline]
    pub fn id(&self) -> &SinkId {
        self.descriptor.id()
    }

    /// Accept filter (narrowed by the sink during configure)
    #[inline]
    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    /// Last acknowledged position
    pub fn position(&self) -> Position {
        self.shared.progress.lock().acknowledged
    }

    /// Last position handed to the sink
    #[inline]
    pub fn last_exported(&self) -> Position {
        self.last_exported
    }

    pub fn is_soft_paused(&self) -> bool {
        self.shared.progress.lock().soft_paused
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.lifecycle == Lifecycle::Opened
    }

    /// Whether the sink is configured (and opened when `open` is set)
    pub fn is_ready(&self, open: bool) -> bool {
        match self.lifecycle {
            Lifecycle::Opened => true,
            Lifecycle::Configured => !open,
            Lifecycle::Created | Lifecycle::Closed => false,
        }
    }

    /// Set up the stored state of this sink
    ///
    /// Nothing changes when the store already holds state with a metadata
    /// version at least as new as the descriptor's. Otherwise the state is
    /// (re)initialized fresh, or as a copy of `init_from`'s state.
    pub fn initialize_state(&mut self, init_from: Option<&SinkId>) -> Result<()> {
        let store = &self.shared.store;
        let version = self.descriptor.metadata_version();

        let state = match store.state(self.id())? {
            Some(stored) if stored.metadata_version >= version => stored,
            stored => {
                let seed = match init_from {
                    Some(source) => match store.state(source)? {
                        Some(state) => state,
                        None => {
                            warn!(
                                partition = self.partition_id,
                                sink_id = %self.id(),
                                init_from = %source,
                                "initialization source has no state, starting fresh"
                            );
                            SinkState::fresh(version)
                        }
                    },
                    None => SinkState::fresh(version),
                };
                info!(
                    partition = self.partition_id,
                    sink_id = %self.id(),
                    position = seed.position,
                    metadata_version = version,
                    previous_version = stored.map(|s| s.metadata_version),
                    init_from = init_from.map(SinkId::as_str),
                    "initializing sink state"
                );
                store.initialize(self.id(), seed.position, seed.metadata.clone(), version)?;
                SinkState {
                    metadata_version: version,
                    ..seed
                }
            }
        };

        let mut progress = self.shared.progress.lock();
        progress.acknowledged = state.position;
        progress.metadata = state.metadata;
        Ok(())
    }

    /// Configure the sink (once); may narrow the filter
    pub fn configure(&mut self) -> Result<Delivery> {
        if self.lifecycle != Lifecycle::Created {
            return Ok(Delivery::Done);
        }

        let mut context = SinkContext::new(
            self.id().clone(),
            self.partition_id,
            self.descriptor.config().clone(),
            *self.descriptor.filter(),
        );
        match self.sink.configure(&mut context) {
            Ok(()) => {
                self.filter = *context.filter();
                self.lifecycle = Lifecycle::Configured;
                debug!(
                    partition = self.partition_id,
                    sink_id = %self.id(),
                    sink_type = self.descriptor.sink_type(),
                    "sink configured"
                );
                Ok(Delivery::Done)
            }
            Err(e) => self.on_sink_error("failed to configure", e, None),
        }
    }

    /// Open the sink (once), handing it its controller
    pub fn open(&mut self) -> Result<Delivery> {
        match self.lifecycle {
            Lifecycle::Configured => {}
            Lifecycle::Opened | Lifecycle::Closed => return Ok(Delivery::Done),
            Lifecycle::Created => {
                if self.configure()? == Delivery::Retry {
                    return Ok(Delivery::Retry);
                }
            }
        }

        let controller = Arc::new(ContainerController {
            shared: Arc::clone(&self.shared),
            scheduler: self.scheduler.clone(),
        });
        match self.sink.open(controller) {
            Ok(()) => {
                self.lifecycle = Lifecycle::Opened;
                info!(
                    partition = self.partition_id,
                    sink_id = %self.id(),
                    position = self.position(),
                    "sink opened"
                );
                self.shared.take_store_failure()?;
                Ok(Delivery::Done)
            }
            Err(e) => self.on_sink_error("failed to open", e, None),
        }
    }

    /// Configure, and open when `open` is set
    pub fn prepare(&mut self, open: bool) -> Result<Delivery> {
        if self.configure()? == Delivery::Retry {
            return Ok(Delivery::Retry);
        }
        if open {
            return self.open();
        }
        Ok(Delivery::Done)
    }

    /// Offer one record to the sink
    ///
    /// Records at or below the acknowledged position were exported before
    /// (a restart, or state cloned from a sibling) and are skipped, as are
    /// records at or below the last one handed to this sink, so a rewound
    /// reader or a restarted delivery never repeats a record. Records the
    /// filter rejects take the skip path.
    pub fn export_record(&mut self, record: &TypedRecord) -> Result<Delivery> {
        let position = record.position();
        if position <= self.position().max(self.last_exported) {
            return Ok(Delivery::Done);
        }

        if !self.filter.accepts(&record.metadata()) {
            self.update_position_on_skip_if_up_to_date(position)?;
            return Ok(Delivery::Done);
        }

        match self.sink.export(record) {
            Ok(()) => {
                self.last_exported = position;
                self.shared.take_store_failure()?;
                Ok(Delivery::Done)
            }
            Err(e) => self.on_sink_error("failed to export", e, Some(position)),
        }
    }

    /// Acknowledge `position` on the sink's behalf if nothing is outstanding
    pub fn update_position_on_skip_if_up_to_date(&mut self, position: Position) -> Result<()> {
        let up_to_date = {
            let progress = self.shared.progress.lock();
            progress.acknowledged >= self.last_exported && position > progress.acknowledged
        };
        if up_to_date {
            self.shared.acknowledge(position, None);
        }
        self.shared.take_store_failure()
    }

    /// Apply a position distributed by the leader
    ///
    /// Returns false when the position is not newer than the known one.
    pub fn apply_distributed(&mut self, position: Position, metadata: Bytes) -> Result<bool> {
        let applied = {
            let mut progress = self.shared.progress.lock();
            if position <= progress.acknowledged {
                false
            } else {
                progress.acknowledged = position;
                progress.metadata = metadata;
                if !progress.soft_paused {
                    self.shared.persist(&mut progress, true);
                }
                true
            }
        };
        self.shared.take_store_failure()?;
        Ok(applied)
    }

    /// Keep acknowledgements in memory only
    pub fn soft_pause(&mut self) {
        self.shared.progress.lock().soft_paused = true;
    }

    /// Persist the latest acknowledgement and resume persisting
    pub fn undo_soft_pause(&mut self) -> Result<()> {
        {
            let mut progress = self.shared.progress.lock();
            if !progress.soft_paused {
                return Ok(());
            }
            progress.soft_paused = false;
            if progress.acknowledged > NO_POSITION {
                self.shared.persist(&mut progress, true);
            }
        }
        self.shared.take_store_failure()
    }

    /// Surface a store failure raised by an acknowledgement outside export
    pub fn check_store(&self) -> Result<()> {
        self.shared.take_store_failure()
    }

    /// Close the sink and cancel its scheduled tasks
    ///
    /// Best effort: failures are logged. Always attempted, whatever state
    /// the sink reached.
    pub fn close(&mut self) {
        if self.lifecycle == Lifecycle::Closed {
            return;
        }
        self.scheduler.token().cancel();
        if let Err(e) = self.sink.close() {
            warn!(
                partition = self.partition_id,
                sink_id = %self.id(),
                error = %e,
                "failed to close sink"
            );
        }
        self.lifecycle = Lifecycle::Closed;
        debug!(
            partition = self.partition_id,
            sink_id = %self.id(),
            "sink closed"
        );
    }

    fn on_sink_error(
        &self,
        message: &str,
        error: SinkError,
        position: Option<Position>,
    ) -> Result<Delivery> {
        if !error.is_retryable() {
            return Err(PipelineError::sink(self.id().clone(), error));
        }
        let message = match position {
            Some(position) => format!("sink '{}' {message} at position {position}", self.id()),
            None => format!("sink '{}' {message}", self.id()),
        };
        self.error_logger.warn(&message, &error);
        Ok(Delivery::Retry)
    }
}

impl std::fmt::Debug for SinkContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkContainer")
            .field("id", self.id())
            .field("lifecycle", &self.lifecycle)
            .field("position", &self.position())
            .field("last_exported", &self.last_exported)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "container_test.rs"]
mod container_test;
