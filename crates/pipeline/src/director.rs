//! Export director
//!
//! One director runs per partition as a single tokio task. It owns the sink
//! containers of the partition and is the only place records are handed to
//! sinks, so delivery is strictly ordered and never concurrent.
//!
//! # Modes
//!
//! - **Active** (leader): reads committed entries from the log starting
//!   after the lowest sink position, delivers them to every container and
//!   periodically distributes the stored sink positions to followers.
//! - **Passive** (follower): never reads the log nor opens sinks. It only
//!   applies positions distributed by the leader, so a follower taking over
//!   resumes close to where the leader stopped.
//!
//! # Task loop
//!
//! ```text
//! loop {
//!     drain()            deliver up to MAX_RECORDS_PER_TURN records
//!     select! (biased) {
//!         command        enable/disable/pause/resume/close/scheduled task
//!         retry due      backoff after a failed export or decode elapsed
//!         committed      new entries are readable
//!         distributed    (passive) state batch from the leader
//!         tick           (active) distribute stored positions
//!         more work      drain again
//!     }
//! }
//! ```
//!
//! Commands are always checked first so a busy log never starves control
//! operations.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use exporter_config::{DirectorConfig, DirectorMode};
use exporter_distribution::{DistributedState, StateSubscription, StateTopic};
use exporter_protocol::{LogEntry, LogReader, LogStream, NO_POSITION, PartitionId, Position};
use exporter_routing::{RecordFilter, SinkId};
use exporter_sinks::{ScheduledTask, SinkDescriptor};
use exporter_sinks::util::RateLimitedLogger;
use exporter_state::SharedPositionStore;
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::command::{Command, TaskScheduler};
use crate::configured::ConfiguredSink;
use crate::container::{Delivery, SinkContainer};
use crate::error::{PipelineError, Result};
use crate::handle::ExportDirectorHandle;
use crate::health::{DirectorPhase, FailureContext, FailureListener, HealthReport, HealthStatus};
use crate::metrics::DirectorMetrics;
use crate::retry::{Backoff, RetryPolicy};
use crate::unwrapper::RecordUnwrapper;

/// Records delivered before the director checks its commands again
const MAX_RECORDS_PER_TURN: usize = 512;

/// Interval between repeated decode failure logs
const DECODE_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Builder for a partition's director
///
/// ```ignore
/// let handle = ExportDirector::new(config, store, log, topic)
///     .with_sinks(configured_sinks(&config.sinks, &registry)?)
///     .spawn();
/// ```
pub struct ExportDirector {
    config: DirectorConfig,
    store: SharedPositionStore,
    log: Arc<dyn LogStream>,
    topic: Arc<StateTopic>,
    sinks: Vec<ConfiguredSink>,
}

impl ExportDirector {
    pub fn new(
        config: DirectorConfig,
        store: SharedPositionStore,
        log: Arc<dyn LogStream>,
        topic: Arc<StateTopic>,
    ) -> Self {
        Self {
            config,
            store,
            log,
            topic,
            sinks: Vec::new(),
        }
    }

    /// Enable a sink at startup; sinks receive records in the order added
    #[must_use]
    pub fn with_sink(mut self, descriptor: SinkDescriptor, init_from: Option<SinkId>) -> Self {
        self.sinks.push(ConfiguredSink {
            descriptor,
            init_from,
        });
        self
    }

    #[must_use]
    pub fn with_sinks(mut self, sinks: impl IntoIterator<Item = ConfiguredSink>) -> Self {
        self.sinks.extend(sinks);
        self
    }

    pub fn partition_id(&self) -> PartitionId {
        self.config.partition_id
    }

    /// Start the director task on the current runtime
    ///
    /// The task runs until [`ExportDirectorHandle::close`] is called or
    /// every handle is dropped.
    pub fn spawn(self) -> ExportDirectorHandle {
        let partition_id = self.config.partition_id;
        let (commands, receiver) = mpsc::channel(self.config.command_queue_size.max(1));
        let metrics = Arc::new(DirectorMetrics::new());
        let health = Arc::new(RwLock::new(HealthReport::starting(partition_id)));

        let actor = DirectorActor::new(
            self,
            receiver,
            commands.downgrade(),
            Arc::clone(&metrics),
            Arc::clone(&health),
        );
        tokio::spawn(actor.run());

        ExportDirectorHandle::new(partition_id, commands, metrics, health)
    }
}

impl std::fmt::Debug for ExportDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDirector")
            .field("config", &self.config)
            .field("sinks", &self.sinks)
            .finish_non_exhaustive()
    }
}

/// What woke the director up
enum Event {
    Command(Option<Command>),
    RetryDue,
    Committed(bool),
    Distributed(Option<DistributedState>),
    DistributionDue,
    Continue,
}

struct DirectorActor {
    partition_id: PartitionId,
    active: bool,
    config: DirectorConfig,
    store: SharedPositionStore,
    log: Arc<dyn LogStream>,
    topic: Arc<StateTopic>,
    configured: Vec<ConfiguredSink>,

    containers: Vec<SinkContainer>,
    unwrapper: RecordUnwrapper,
    /// Union of every container's filter
    filter: RecordFilter,

    reader: Option<Box<dyn LogReader>>,
    commits: Option<watch::Receiver<Position>>,
    subscription: Option<StateSubscription>,
    distribution: Option<Interval>,
    /// Entry that failed to decode, read again after the decode delay
    undecodable: Option<LogEntry>,
    /// Position of the last entry taken from the reader
    last_read: Position,

    phase: DirectorPhase,
    failure: Option<FailureContext>,
    listeners: Vec<Arc<dyn FailureListener>>,

    backoff: Backoff,
    retry_at: Option<Instant>,
    decode_logger: RateLimitedLogger,

    commands: mpsc::Receiver<Command>,
    scheduler_commands: mpsc::WeakSender<Command>,
    shutdown: CancellationToken,
    metrics: Arc<DirectorMetrics>,
    health: Arc<RwLock<HealthReport>>,
}

impl DirectorActor {
    fn new(
        director: ExportDirector,
        commands: mpsc::Receiver<Command>,
        scheduler_commands: mpsc::WeakSender<Command>,
        metrics: Arc<DirectorMetrics>,
        health: Arc<RwLock<HealthReport>>,
    ) -> Self {
        let ExportDirector {
            config,
            store,
            log,
            topic,
            sinks,
        } = director;

        Self {
            partition_id: config.partition_id,
            active: config.is_active(),
            backoff: Backoff::new(RetryPolicy::from_config(&config)),
            config,
            store,
            log,
            topic,
            configured: sinks,
            containers: Vec::new(),
            unwrapper: RecordUnwrapper::new(),
            filter: RecordFilter::accept_none(),
            reader: None,
            commits: None,
            subscription: None,
            distribution: None,
            undecodable: None,
            last_read: NO_POSITION,
            phase: DirectorPhase::Exporting,
            failure: None,
            listeners: Vec::new(),
            retry_at: None,
            decode_logger: RateLimitedLogger::new(DECODE_LOG_INTERVAL),
            commands,
            scheduler_commands,
            shutdown: CancellationToken::new(),
            metrics,
            health,
        }
    }

    async fn run(mut self) {
        info!(
            partition = self.partition_id,
            mode = match self.config.mode {
                DirectorMode::Active => "active",
                DirectorMode::Passive => "passive",
            },
            sink_count = self.configured.len(),
            "export director starting"
        );

        self.start();

        loop {
            let more = self.process();
            let reading = self.is_reading();
            let distributing = self.is_distributing();

            let event = tokio::select! {
                biased;

                command = self.commands.recv() => Event::Command(command),
                _ = retry_due(self.retry_at) => Event::RetryDue,
                changed = committed(&mut self.commits), if reading => Event::Committed(changed),
                state = distributed(&mut self.subscription) => Event::Distributed(state),
                _ = distribution_due(&mut self.distribution), if distributing => Event::DistributionDue,
                _ = std::future::ready(()), if more => Event::Continue,
            };

            match event {
                Event::Command(Some(command)) => {
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Event::Command(None) => {
                    debug!(
                        partition = self.partition_id,
                        "all director handles dropped, closing"
                    );
                    self.close();
                    break;
                }
                Event::RetryDue => self.retry_at = None,
                Event::Committed(true) => {}
                Event::Committed(false) => self.commits = None,
                Event::Distributed(Some(state)) => self.apply_distributed(state),
                Event::Distributed(None) => {
                    warn!(
                        partition = self.partition_id,
                        "state topic closed, no longer receiving sink positions"
                    );
                    self.subscription = None;
                }
                Event::DistributionDue => self.distribute(),
                Event::Continue => {}
            }
        }

        let snapshot = self.metrics.snapshot();
        info!(
            partition = self.partition_id,
            records_read = snapshot.records_read,
            records_exported = snapshot.records_exported,
            records_skipped = snapshot.records_skipped,
            export_failures = snapshot.export_failures,
            decode_failures = snapshot.decode_failures,
            retries = snapshot.retries,
            distributions_sent = snapshot.distributions_sent,
            distributions_applied = snapshot.distributions_applied,
            "export director shutting down"
        );
    }

    // =========================================================================
    // Startup and idle
    // =========================================================================

    fn start(&mut self) {
        if self.topic.partition_id() != self.partition_id {
            warn!(
                partition = self.partition_id,
                topic_partition = self.topic.partition_id(),
                "state topic belongs to another partition"
            );
        }
        if let Err(e) = self.try_start() {
            self.fail(&e);
        }
        self.publish_health();
    }

    fn try_start(&mut self) -> Result<()> {
        let configured = std::mem::take(&mut self.configured);
        self.prune_unconfigured(&configured)?;

        for sink in configured {
            if self.container_index(sink.descriptor.id()).is_some() {
                warn!(
                    partition = self.partition_id,
                    sink_id = %sink.descriptor.id(),
                    "sink configured twice, ignoring duplicate"
                );
                continue;
            }
            let container = self.create_container(sink.descriptor, sink.init_from.as_ref())?;
            self.containers.push(container);
        }

        self.refresh_filter();
        if self.containers.is_empty() {
            self.enter_idle();
            Ok(())
        } else {
            self.leave_idle()
        }
    }

    /// Drop stored state of sinks no longer configured so they stop
    /// pinning the log
    fn prune_unconfigured(&self, configured: &[ConfiguredSink]) -> Result<()> {
        for (sink_id, state) in self.store.states()? {
            if !configured.iter().any(|s| s.descriptor.id() == &sink_id) {
                info!(
                    partition = self.partition_id,
                    sink_id = %sink_id,
                    position = state.position,
                    "removing state of sink that is no longer configured"
                );
                self.store.remove(&sink_id)?;
            }
        }
        Ok(())
    }

    /// Build a container with its state initialized and its sink prepared
    fn create_container(
        &self,
        descriptor: SinkDescriptor,
        init_from: Option<&SinkId>,
    ) -> Result<SinkContainer> {
        let scheduler = TaskScheduler::new(
            descriptor.id().clone(),
            self.scheduler_commands.clone(),
            self.shutdown.child_token(),
        );
        let mut container =
            SinkContainer::new(descriptor, self.partition_id, Arc::clone(&self.store), scheduler);

        // A retry is picked up by the next drain
        let prepared = container
            .initialize_state(init_from)
            .and_then(|()| container.prepare(self.active));
        if let Err(e) = prepared {
            container.close();
            return Err(e);
        }

        if self.phase == DirectorPhase::SoftPaused {
            container.soft_pause();
        }
        Ok(container)
    }

    fn leave_idle(&mut self) -> Result<()> {
        if self.active {
            let lowest = self.store.lowest_position()?;
            let mut reader = self.log.new_reader();
            self.commits = Some(self.log.subscribe());
            reader.seek_to(lowest + 1);
            self.reader = Some(reader);
            self.last_read = lowest;

            let period = self.config.distribution_interval();
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.distribution = Some(interval);

            info!(
                partition = self.partition_id,
                sink_count = self.containers.len(),
                from_position = lowest + 1,
                "export director reading log"
            );
        } else {
            match self.topic.subscribe() {
                Ok(subscription) => self.subscription = Some(subscription),
                Err(e) => warn!(
                    partition = self.partition_id,
                    error = %e,
                    "failed to subscribe to sink positions"
                ),
            }
            info!(
                partition = self.partition_id,
                sink_count = self.containers.len(),
                "export director following distributed positions"
            );
        }
        Ok(())
    }

    fn enter_idle(&mut self) {
        self.release_inputs();
        info!(partition = self.partition_id, "no sinks enabled, director idle");
    }

    /// Stop reading and receiving; pending work is dropped
    fn release_inputs(&mut self) {
        self.reader = None;
        self.commits = None;
        self.distribution = None;
        if let Some(subscription) = self.subscription.take() {
            let _ = self.topic.unsubscribe(subscription.id());
        }
        self.unwrapper.clear();
        self.undecodable = None;
        self.retry_at = None;
        self.backoff.reset();
    }

    /// Read again from after the lowest stored position
    fn rewind(&mut self) -> Result<()> {
        let lowest = self.store.lowest_position()?;
        if let Some(reader) = self.reader.as_mut() {
            reader.seek_to(lowest + 1);
        }
        debug!(
            partition = self.partition_id,
            from_position = lowest + 1,
            last_read = self.last_read,
            "rewinding log reader"
        );
        self.last_read = lowest;
        self.unwrapper.clear();
        self.undecodable = None;
        self.retry_at = None;
        self.backoff.reset();
        Ok(())
    }

    // =========================================================================
    // Record delivery
    // =========================================================================

    fn is_processing(&self) -> bool {
        self.failure.is_none()
            && !self.containers.is_empty()
            && matches!(
                self.phase,
                DirectorPhase::Exporting | DirectorPhase::SoftPaused
            )
    }

    fn is_reading(&self) -> bool {
        self.active && self.reader.is_some() && self.is_processing()
    }

    fn is_distributing(&self) -> bool {
        self.active
            && self.failure.is_none()
            && !self.containers.is_empty()
            && self.phase != DirectorPhase::Closed
    }

    /// Do pending work; returns true when more is ready right away
    fn process(&mut self) -> bool {
        match self.drain() {
            Ok(more) => more,
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    fn drain(&mut self) -> Result<bool> {
        if !self.is_processing() || self.retry_at.is_some() {
            return Ok(false);
        }
        if !self.prepare_containers()? || !self.active {
            return Ok(false);
        }

        for _ in 0..MAX_RECORDS_PER_TURN {
            if self.unwrapper.has_record() {
                if !self.deliver()? {
                    return Ok(false);
                }
                continue;
            }

            let entry = match self.undecodable.take() {
                Some(entry) => entry,
                None => match self.next_entry() {
                    Some(entry) => entry,
                    None => return Ok(false),
                },
            };
            if !self.handle_entry(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Configure (and open when active) every container not yet ready
    fn prepare_containers(&mut self) -> Result<bool> {
        let mut prepared = false;
        let mut ready = true;
        for container in &mut self.containers {
            if container.is_ready(self.active) {
                continue;
            }
            prepared = true;
            if container.prepare(self.active)? == Delivery::Retry {
                ready = false;
            }
        }

        if prepared {
            self.refresh_filter();
        }
        if !ready {
            let delay = self.backoff.next_delay();
            self.schedule_retry(delay);
            return Ok(false);
        }
        Ok(true)
    }

    fn next_entry(&mut self) -> Option<LogEntry> {
        let reader = self.reader.as_mut()?;
        if !reader.has_next() {
            return None;
        }
        let entry = reader.next_entry()?;
        self.last_read = entry.position();
        self.metrics.record_read();
        Some(entry)
    }

    /// Returns false when the entry must be retried later
    fn handle_entry(&mut self, entry: LogEntry) -> Result<bool> {
        let position = entry.position();
        if !self.filter.accepts(&entry.metadata()) {
            self.skip(position)?;
            return Ok(true);
        }

        match self.unwrapper.wrap(&entry) {
            Ok(true) => self.deliver(),
            Ok(false) => {
                self.skip(position)?;
                Ok(true)
            }
            Err(e) => {
                self.metrics.record_decode_failure();
                self.decode_logger.warn(
                    &format!(
                        "partition {} failed to decode entry at position {position}, retrying",
                        self.partition_id
                    ),
                    &e,
                );
                self.undecodable = Some(entry);
                self.schedule_retry(self.config.decode_retry_delay());
                Ok(false)
            }
        }
    }

    /// Hand the wrapped record to the containers; false when a sink asked
    /// for a retry
    fn deliver(&mut self) -> Result<bool> {
        if self.unwrapper.export(&mut self.containers)? {
            self.metrics.record_exported();
            self.backoff.reset();
            self.unwrapper.clear();
            return Ok(true);
        }

        self.metrics.record_export_failure();
        let delay = self.backoff.next_delay();
        self.schedule_retry(delay);
        Ok(false)
    }

    /// No sink wants the entry
    fn skip(&mut self, position: Position) -> Result<()> {
        for container in &mut self.containers {
            container.update_position_on_skip_if_up_to_date(position)?;
        }
        self.metrics.record_skipped();
        Ok(())
    }

    fn schedule_retry(&mut self, delay: Duration) {
        trace!(
            partition = self.partition_id,
            delay_ms = delay.as_millis() as u64,
            attempt = self.backoff.attempt(),
            "scheduling retry"
        );
        self.retry_at = Some(Instant::now() + delay);
        self.metrics.record_retry();
    }

    fn refresh_filter(&mut self) {
        self.filter = RecordFilter::union_all(self.containers.iter().map(SinkContainer::filter));
    }

    fn container_index(&self, sink_id: &SinkId) -> Option<usize> {
        self.containers.iter().position(|c| c.id() == sink_id)
    }

    // =========================================================================
    // Position distribution
    // =========================================================================

    /// Broadcast the stored positions of every enabled sink
    fn distribute(&mut self) {
        let states = match self.store.states() {
            Ok(states) => states,
            Err(e) => {
                self.fail(&e.into());
                return;
            }
        };

        let mut state = DistributedState::new(self.partition_id);
        for (sink_id, sink_state) in states {
            if self.container_index(&sink_id).is_some() {
                state.push(sink_id, sink_state.position, sink_state.metadata);
            }
        }
        if state.is_empty() {
            return;
        }

        let delivered = self.topic.distribute(&state);
        self.metrics.record_distribution_sent();
        trace!(
            partition = self.partition_id,
            sink_count = state.len(),
            delivered,
            "distributed sink positions"
        );
    }

    /// Apply a batch from the leader to the enabled sinks
    fn apply_distributed(&mut self, state: DistributedState) {
        if self.failure.is_some() || self.phase == DirectorPhase::Closed {
            return;
        }

        let mut applied = 0;
        for entry in state.entries {
            let Some(index) = self.container_index(&entry.sink_id) else {
                trace!(
                    partition = self.partition_id,
                    sink_id = %entry.sink_id,
                    "ignoring position of sink not enabled here"
                );
                continue;
            };
            match self.containers[index].apply_distributed(entry.position, entry.metadata) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => {
                    self.fail(&e);
                    return;
                }
            }
        }

        self.metrics.record_distribution_applied(applied);
        if applied > 0 {
            debug!(
                partition = self.partition_id,
                applied, "applied distributed sink positions"
            );
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Returns false once the director is closed
    fn handle_command(&mut self, command: Command) -> bool {
        trace!(
            partition = self.partition_id,
            command = command.name(),
            "handling command"
        );

        match command {
            Command::EnableSink {
                descriptor,
                init_from,
                reply,
            } => {
                let result = self.enable_sink(descriptor, init_from);
                self.fail_on_error(&result);
                self.publish_health();
                let _ = reply.send(result);
            }
            Command::DisableSink { sink_id, reply } => {
                let result = self.disable_sink(&sink_id);
                self.fail_on_error(&result);
                self.publish_health();
                let _ = reply.send(result);
            }
            Command::Pause { reply } => {
                self.pause();
                self.publish_health();
                let _ = reply.send(());
            }
            Command::SoftPause { reply } => {
                self.soft_pause();
                self.publish_health();
                let _ = reply.send(());
            }
            Command::Resume { reply } => {
                let result = self.resume();
                self.fail_on_error(&result);
                self.publish_health();
                let _ = reply.send(result);
            }
            Command::LowestPosition { reply } => {
                let _ = reply.send(self.store.lowest_position().map_err(Into::into));
            }
            Command::AddFailureListener { listener, reply } => {
                if self.failure.is_some() {
                    let report = self.health.read().clone();
                    listener.on_failure(&report);
                }
                self.listeners.push(listener);
                let _ = reply.send(());
            }
            Command::RunTask {
                sink_id,
                token,
                task,
            } => self.run_task(&sink_id, &token, task),
            Command::Close { reply } => {
                self.close();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn enable_sink(
        &mut self,
        descriptor: SinkDescriptor,
        init_from: Option<SinkId>,
    ) -> Result<bool> {
        if self.failure.is_some() {
            return Err(self.failed_error());
        }
        if self.container_index(descriptor.id()).is_some() {
            debug!(
                partition = self.partition_id,
                sink_id = %descriptor.id(),
                "sink already enabled"
            );
            return Ok(false);
        }

        let was_idle = self.containers.is_empty();
        let container = self.create_container(descriptor, init_from.as_ref())?;
        let position = container.position();
        info!(
            partition = self.partition_id,
            sink_id = %container.id(),
            position,
            "sink enabled"
        );
        self.containers.push(container);
        self.unwrapper.reset_index();
        self.refresh_filter();

        if was_idle {
            self.leave_idle()?;
        } else if self.active && position < self.last_read {
            self.rewind()?;
        }
        Ok(true)
    }

    fn disable_sink(&mut self, sink_id: &SinkId) -> Result<bool> {
        let Some(index) = self.container_index(sink_id) else {
            debug!(
                partition = self.partition_id,
                sink_id = %sink_id,
                "sink not enabled"
            );
            return Ok(false);
        };

        let mut container = self.containers.remove(index);
        container.close();
        self.store.remove(sink_id)?;
        self.unwrapper.reset_index();
        self.refresh_filter();
        info!(
            partition = self.partition_id,
            sink_id = %sink_id,
            "sink disabled"
        );

        if self.containers.is_empty() {
            self.enter_idle();
        }
        Ok(true)
    }

    fn pause(&mut self) {
        if matches!(
            self.phase,
            DirectorPhase::Exporting | DirectorPhase::SoftPaused
        ) {
            self.phase = DirectorPhase::Paused;
            info!(partition = self.partition_id, "export director paused");
        }
    }

    /// Only from `Exporting`; a paused director stays paused until resumed
    fn soft_pause(&mut self) {
        if self.phase != DirectorPhase::Exporting {
            debug!(
                partition = self.partition_id,
                phase = ?self.phase,
                "soft pause ignored"
            );
            return;
        }
        for container in &mut self.containers {
            container.soft_pause();
        }
        self.phase = DirectorPhase::SoftPaused;
        info!(partition = self.partition_id, "export director soft-paused");
    }

    fn resume(&mut self) -> Result<()> {
        if self.phase == DirectorPhase::Closed {
            return Ok(());
        }
        for container in &mut self.containers {
            container.undo_soft_pause()?;
        }
        if self.phase != DirectorPhase::Exporting {
            self.phase = DirectorPhase::Exporting;
            info!(partition = self.partition_id, "export director resumed");
        }
        Ok(())
    }

    fn run_task(&mut self, sink_id: &SinkId, token: &CancellationToken, task: ScheduledTask) {
        if token.is_cancelled() || self.failure.is_some() {
            return;
        }
        let Some(index) = self.container_index(sink_id) else {
            return;
        };

        task();
        if let Err(e) = self.containers[index].check_store() {
            self.fail(&e);
        }
    }

    fn close(&mut self) {
        if self.phase == DirectorPhase::Closed {
            return;
        }
        self.shutdown.cancel();
        for container in &mut self.containers {
            container.close();
        }
        self.containers.clear();
        self.release_inputs();
        self.phase = DirectorPhase::Closed;
        self.publish_health();
        info!(partition = self.partition_id, "export director closed");
    }

    // =========================================================================
    // Health
    // =========================================================================

    fn fail_on_error<T>(&mut self, result: &Result<T>) {
        if let Err(e) = result {
            self.fail(e);
        }
    }

    /// Stop processing for good and notify failure listeners
    fn fail(&mut self, error: &PipelineError) {
        if self.failure.is_some() {
            return;
        }

        let context = FailureContext {
            sink_id: error.sink_id().cloned(),
            position: self.unwrapper.position(),
            message: error.to_string(),
        };
        error!(
            partition = self.partition_id,
            sink_id = context.sink_id.as_ref().map(SinkId::as_str),
            position = context.position,
            error = %error,
            "export director failed"
        );

        self.failure = Some(context);
        self.reader = None;
        self.commits = None;
        self.distribution = None;
        self.retry_at = None;
        if let Some(subscription) = self.subscription.take() {
            let _ = self.topic.unsubscribe(subscription.id());
        }

        self.publish_health();
        let report = self.health.read().clone();
        for listener in &self.listeners {
            listener.on_failure(&report);
        }
    }

    fn failed_error(&self) -> PipelineError {
        PipelineError::Failed {
            partition_id: self.partition_id,
            reason: self
                .failure
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }

    fn publish_health(&self) {
        *self.health.write() = HealthReport {
            partition_id: self.partition_id,
            status: match self.failure {
                Some(_) => HealthStatus::Failed,
                None => HealthStatus::Healthy,
            },
            phase: self.phase,
            idle: self.containers.is_empty(),
            failure: self.failure.clone(),
        };
    }
}

async fn retry_due(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}

/// Resolves true on a new commit, false once the log is gone
async fn committed(commits: &mut Option<watch::Receiver<Position>>) -> bool {
    match commits {
        Some(commits) => commits.changed().await.is_ok(),
        None => pending().await,
    }
}

async fn distributed(subscription: &mut Option<StateSubscription>) -> Option<DistributedState> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => pending().await,
    }
}

async fn distribution_due(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

#[cfg(test)]
#[path = "director_test.rs"]
mod director_test;
