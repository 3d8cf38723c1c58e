//! Test support: a scriptable sink and record builders

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use exporter_protocol::{LogEntry, Position, RecordKind, RecordMetadata, TypedRecord, ValueKind};
use exporter_routing::{RecordFilter, SinkId};
use exporter_sinks::{Sink, SinkContext, SinkController, SinkDescriptor, SinkError};
use exporter_state::{MemoryPositionStore, SharedPositionStore};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::command::{Command, TaskScheduler};

#[derive(Default)]
pub(crate) struct Script {
    /// Acknowledge every exported record
    pub acknowledge: bool,
    /// Retryable failures left per position
    pub failures: HashMap<Position, u32>,
    /// Position at which export fails unrecoverably
    pub fatal_at: Option<Position>,
    /// Retryable configure failures left
    pub configure_failures: u32,
    /// Filter the sink installs during configure
    pub narrow_filter: Option<RecordFilter>,
    /// Positions of every export call
    pub attempts: Vec<Position>,
    /// Positions exported successfully
    pub exported: Vec<Position>,
    pub configure_calls: u32,
    pub opened: bool,
    pub closed: bool,
    pub controller: Option<Arc<dyn SinkController>>,
}

/// Shared script of a [`ScriptedSink`], inspected by tests
#[derive(Clone, Default)]
pub(crate) struct ScriptHandle(Arc<Mutex<Script>>);

impl ScriptHandle {
    pub fn acknowledging() -> Self {
        let handle = Self::default();
        handle.0.lock().acknowledge = true;
        handle
    }

    pub fn fail(&self, position: Position, times: u32) -> &Self {
        self.0.lock().failures.insert(position, times);
        self
    }

    pub fn fatal_at(&self, position: Position) -> &Self {
        self.0.lock().fatal_at = Some(position);
        self
    }

    pub fn fail_configure(&self, times: u32) -> &Self {
        self.0.lock().configure_failures = times;
        self
    }

    pub fn narrow_filter(&self, filter: RecordFilter) -> &Self {
        self.0.lock().narrow_filter = Some(filter);
        self
    }

    pub fn attempts(&self) -> Vec<Position> {
        self.0.lock().attempts.clone()
    }

    pub fn exported(&self) -> Vec<Position> {
        self.0.lock().exported.clone()
    }

    pub fn configure_calls(&self) -> u32 {
        self.0.lock().configure_calls
    }

    pub fn is_opened(&self) -> bool {
        self.0.lock().opened
    }

    pub fn is_closed(&self) -> bool {
        self.0.lock().closed
    }

    pub fn controller(&self) -> Option<Arc<dyn SinkController>> {
        self.0.lock().controller.clone()
    }

    pub fn descriptor(&self, id: &str) -> SinkDescriptor {
        let script = self.clone();
        SinkDescriptor::new(SinkId::new(id).unwrap(), move || {
            Box::new(ScriptedSink {
                script: script.clone(),
            }) as Box<dyn Sink>
        })
        .with_type("scripted")
    }
}

pub(crate) struct ScriptedSink {
    script: ScriptHandle,
}

impl Sink for ScriptedSink {
    fn configure(&mut self, context: &mut SinkContext) -> Result<(), SinkError> {
        let mut script = self.script.0.lock();
        script.configure_calls += 1;
        if script.configure_failures > 0 {
            script.configure_failures -= 1;
            return Err(SinkError::init("not ready"));
        }
        if let Some(filter) = script.narrow_filter {
            context.set_filter(filter);
        }
        Ok(())
    }

    fn open(&mut self, controller: Arc<dyn SinkController>) -> Result<(), SinkError> {
        let mut script = self.script.0.lock();
        script.opened = true;
        script.controller = Some(controller);
        Ok(())
    }

    fn export(&mut self, record: &TypedRecord) -> Result<(), SinkError> {
        let position = record.position();
        let controller = {
            let mut script = self.script.0.lock();
            script.attempts.push(position);

            if script.fatal_at == Some(position) {
                return Err(SinkError::unrecoverable("scripted failure"));
            }
            if let Some(left) = script.failures.get_mut(&position)
                && *left > 0
            {
                *left -= 1;
                return Err(SinkError::write("scripted retryable failure"));
            }

            script.exported.push(position);
            script
                .acknowledge
                .then(|| script.controller.clone())
                .flatten()
        };

        // Acknowledge outside the script lock, like a real sink would
        if let Some(controller) = controller {
            controller.update_position(position);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let mut script = self.script.0.lock();
        script.closed = true;
        script.controller = None;
        Ok(())
    }
}

pub(crate) fn entry(position: Position, value_kind: ValueKind) -> LogEntry {
    LogEntry::new(
        position,
        RecordMetadata::new(RecordKind::Event, value_kind),
        Bytes::from(format!(r#"{{"position":{position}}}"#)),
    )
}

pub(crate) fn job(position: Position) -> LogEntry {
    entry(position, ValueKind::Job)
}

pub(crate) fn record(position: Position) -> TypedRecord {
    TypedRecord::decode(&job(position)).unwrap().unwrap()
}

pub(crate) fn record_of(position: Position, value_kind: ValueKind) -> TypedRecord {
    TypedRecord::decode(&entry(position, value_kind))
        .unwrap()
        .unwrap()
}

pub(crate) fn sink_id(id: &str) -> SinkId {
    SinkId::new(id).unwrap()
}

pub(crate) fn memory_store() -> SharedPositionStore {
    Arc::new(MemoryPositionStore::new())
}

/// A scheduler whose commands land in the returned receiver
pub(crate) fn scheduler(id: &str) -> (TaskScheduler, mpsc::Sender<Command>, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(8);
    let scheduler = TaskScheduler::new(sink_id(id), tx.downgrade(), CancellationToken::new());
    (scheduler, tx, rx)
}

/// Filter accepting only job records
pub(crate) fn jobs_only() -> RecordFilter {
    RecordFilter::new([RecordKind::Event], [ValueKind::Job])
}
