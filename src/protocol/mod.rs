//! Frame-level WebSocket types the compression layer operates on (RFC 6455).

pub mod assembler;
pub mod fragmenter;
pub mod frame;
pub mod opcode;
pub mod role;

pub use assembler::{AssembledMessage, MessageAssembler};
pub use fragmenter::MessageFragmenter;
pub use frame::Frame;
pub use opcode::OpCode;
pub use role::{Direction, Role};
