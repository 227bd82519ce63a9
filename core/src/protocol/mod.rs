mod result;
mod sink;

pub use result::ExecutionResult;
pub use sink::{BufferSink, Channel, Emitted, ProtocolSink, StdioSink};
