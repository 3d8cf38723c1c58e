//! Record and value kinds
//!
//! These types mirror the header bytes written by the log layer and are used
//! by sink filters to decide which records a sink receives.
//!
//! NOTE: The numeric values are stored in the log and must never be reused.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Record kind (what happened to a value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum RecordKind {
    /// Default value (should not be used in practice)
    Unknown = 0,
    /// A state change that has been applied
    Event = 1,
    /// A request to change state
    Command = 2,
    /// A command that was rejected
    CommandRejection = 3,
}

impl RecordKind {
    /// All known record kinds, in wire order
    pub const ALL: [RecordKind; 3] = [Self::Event, Self::Command, Self::CommandRejection];

    /// Parse record kind from raw byte value
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Event,
            2 => Self::Command,
            3 => Self::CommandRejection,
            _ => Self::Unknown,
        }
    }

    /// Convert to raw byte value
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get the string name of this record kind
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Event => "event",
            Self::Command => "command",
            Self::CommandRejection => "command_rejection",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::unknown_kind("record kind", s))
    }
}

/// Value kind (which kind of entity the record is about)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ValueKind {
    /// Not a value kind this pipeline knows how to decode
    Unknown = 0,
    Job = 1,
    Deployment = 2,
    Process = 3,
    ProcessInstance = 4,
    Incident = 5,
    Message = 6,
    MessageSubscription = 7,
    Timer = 8,
    Variable = 9,
    Error = 10,
    UserTask = 11,
    Signal = 12,
}

impl ValueKind {
    /// All known value kinds, in wire order
    pub const ALL: [ValueKind; 12] = [
        Self::Job,
        Self::Deployment,
        Self::Process,
        Self::ProcessInstance,
        Self::Incident,
        Self::Message,
        Self::MessageSubscription,
        Self::Timer,
        Self::Variable,
        Self::Error,
        Self::UserTask,
        Self::Signal,
    ];

    /// Parse value kind from raw byte value
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Job,
            2 => Self::Deployment,
            3 => Self::Process,
            4 => Self::ProcessInstance,
            5 => Self::Incident,
            6 => Self::Message,
            7 => Self::MessageSubscription,
            8 => Self::Timer,
            9 => Self::Variable,
            10 => Self::Error,
            11 => Self::UserTask,
            12 => Self::Signal,
            _ => Self::Unknown,
        }
    }

    /// Convert to raw byte value
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if records of this kind can be decoded and exported
    #[inline]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get the string name of this value kind
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Job => "job",
            Self::Deployment => "deployment",
            Self::Process => "process",
            Self::ProcessInstance => "process_instance",
            Self::Incident => "incident",
            Self::Message => "message",
            Self::MessageSubscription => "message_subscription",
            Self::Timer => "timer",
            Self::Variable => "variable",
            Self::Error => "error",
            Self::UserTask => "user_task",
            Self::Signal => "signal",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::unknown_kind("value kind", s))
    }
}
