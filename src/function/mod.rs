//! Native function registration and calls.

mod bridge;
mod scratch;
mod thunk;

pub use bridge::FunctionDescriptor;
pub use thunk::{FnAddr, NativeFunction, Thunk, ThunkFrame};

pub(crate) use scratch::ScratchPool;
