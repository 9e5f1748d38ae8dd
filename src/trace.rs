//! Call-tree walking for `callTracer` results
//!
//! Traces come from the node and their depth is controlled by whoever
//! wrote the traced contracts, so every walk here uses an explicit stack
//! instead of recursion.
//!
//! All walks exclude the root frame (the transaction itself) and visit
//! nested calls depth-first, pre-order, in execution order.

use crate::types::{CallFrame, InternalCall, RpcLog};

/// Pre-order iterator over the nested calls of a trace
///
/// Yields each frame with its depth; direct children of the root have depth 1.
pub struct CallWalker<'a> {
    stack: Vec<(&'a CallFrame, usize)>,
}

impl<'a> CallWalker<'a> {
    pub fn new(root: &'a CallFrame) -> Self {
        let stack = root.calls.iter().rev().map(|call| (call, 1)).collect();
        Self { stack }
    }
}

impl<'a> Iterator for CallWalker<'a> {
    type Item = (&'a CallFrame, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (frame, depth) = self.stack.pop()?;
        self.stack
            .extend(frame.calls.iter().rev().map(|call| (call, depth + 1)));
        Some((frame, depth))
    }
}

/// Flatten a trace into its internal calls
///
/// # Arguments
/// * `root` - Root frame returned by `callTracer`
///
/// # Returns
/// One entry per nested frame in pre-order, with the hex `value`
/// already converted to an integer (zero when absent)
pub fn internal_calls(root: &CallFrame) -> Vec<InternalCall> {
    CallWalker::new(root)
        .map(|(frame, depth)| InternalCall::from_frame(frame, depth))
        .collect()
}

/// Collect the logs emitted by nested calls, in the same order as [`internal_calls`]
pub fn trace_logs(root: &CallFrame) -> Vec<RpcLog> {
    CallWalker::new(root)
        .flat_map(|(frame, _)| frame.logs.iter().cloned())
        .collect()
}

/// Depth of the deepest call; 0 when the transaction made no calls
pub fn max_call_depth(root: &CallFrame) -> usize {
    CallWalker::new(root)
        .map(|(_, depth)| depth)
        .max()
        .unwrap_or(0)
}
