//! Concrete command sinks

pub mod log;
pub mod udp;

pub use log::LogSink;
pub use udp::UdpEditorSink;
