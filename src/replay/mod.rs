// src/replay/mod.rs
//! Simulated host and trace format for driving the redirector without a
//! real accessibility service

pub mod host;
pub mod trace;

pub use host::{HostAction, HostLog, SimNode, SimulatedClipboard, SimulatedHost};
pub use trace::{parse_line, TraceEvent};
