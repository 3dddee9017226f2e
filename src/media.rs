//! External media tools: a cancellable process runner, `ffprobe` probing and tool discovery.

pub mod probe;
pub mod process;
pub mod tools;
