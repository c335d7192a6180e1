//! The process-wide record of nested shells.
//!
//! Every running shell owns one [`Frame`]; the prompt shown to the user is the dot-joined
//! list of frame segments, bottom to top. The stack is shared with the signal handler thread,
//! so frames live behind a mutex even though dispatch itself is single-threaded.

use log::trace;
use std::sync::{Arc, Mutex, MutexGuard};

/// One entry of the [`ShellStack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Text contributed to the prompt.
    pub segment: String,
    /// Name of the shell that owns this frame.
    pub shell: String,
}

/// Cloneable handle to the shared stack of running shells.
#[derive(Debug, Clone, Default)]
pub struct ShellStack {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl ShellStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    fn frames(&self) -> MutexGuard<'_, Vec<Frame>> {
        // A panic while holding the lock leaves the frames themselves consistent.
        self.frames.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Push a frame and return the guard that removes it again.
    ///
    /// Dropping the guard truncates the stack to the depth it had before this push, so frames
    /// pushed later (and never popped) go with it, and a frame that was already popped is not
    /// popped twice.
    #[must_use = "dropping the guard pops the frame immediately"]
    pub fn push(&self, segment: impl Into<String>, shell: impl Into<String>) -> StackGuard {
        let mut frames = self.frames();
        let frame = Frame {
            segment: segment.into(),
            shell: shell.into(),
        };
        trace!("push {:?} at depth {}", frame.segment, frames.len());
        frames.push(frame);
        StackGuard {
            stack: self.clone(),
            depth: frames.len() - 1,
        }
    }

    /// Remove the top frame. Popping an empty stack is a no-op and still succeeds.
    pub fn pop(&self) -> bool {
        if let Some(frame) = self.frames().pop() {
            trace!("pop {:?}", frame.segment);
        }
        true
    }

    /// The prompt for the current nesting, e.g. `root.sub> `.
    pub fn prompt(&self) -> String {
        let frames = self.frames();
        let segments: Vec<&str> = frames.iter().map(|f| f.segment.as_str()).collect();
        format!("{}> ", segments.join("."))
    }

    /// Name of the shell on top of the stack.
    pub fn current(&self) -> Option<String> {
        self.frames().last().map(|f| f.shell.clone())
    }

    /// Number of frames, i.e. how many shells are running.
    pub fn depth(&self) -> usize {
        self.frames().len()
    }

    /// No shell is running.
    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    /// Snapshot of all frames, bottom first.
    pub fn frames_snapshot(&self) -> Vec<Frame> {
        self.frames().clone()
    }

    fn truncate(&self, depth: usize) {
        let mut frames = self.frames();
        if frames.len() > depth {
            trace!("unwind to depth {}", depth);
            frames.truncate(depth);
        }
    }
}

/// Keeps a frame on the [`ShellStack`] for as long as it lives.
#[derive(Debug)]
pub struct StackGuard {
    stack: ShellStack,
    depth: usize,
}

impl StackGuard {
    /// Depth of the guarded frame (0 for the outermost shell).
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        self.stack.truncate(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_follows_push_and_pop() {
        let stack = ShellStack::new();
        assert_eq!(stack.prompt(), "> ");

        let _root = stack.push("root", "root");
        let _sub = stack.push("sub", "sub");
        assert_eq!(stack.prompt(), "root.sub> ");
        assert_eq!(stack.current().as_deref(), Some("sub"));

        assert!(stack.pop());
        assert_eq!(stack.prompt(), "root> ");
        assert!(stack.pop());
        assert_eq!(stack.prompt(), "> ");
        assert!(stack.pop());
        assert_eq!(stack.prompt(), "> ");
        assert!(stack.is_empty());
    }

    #[test]
    fn test_guard_pops_its_own_frame() {
        let stack = ShellStack::new();
        let root = stack.push("root", "root");
        {
            let sub = stack.push("sub", "sub");
            assert_eq!(sub.depth(), 1);
            assert_eq!(stack.depth(), 2);
        }
        assert_eq!(stack.prompt(), "root> ");
        drop(root);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_guard_after_explicit_pop_leaves_parent() {
        let stack = ShellStack::new();
        let _root = stack.push("root", "root");
        let sub = stack.push("sub", "sub");
        stack.pop();
        drop(sub);
        assert_eq!(stack.prompt(), "root> ");
    }

    #[test]
    fn test_guard_unwinds_frames_above_it() {
        let stack = ShellStack::new();
        let root = stack.push("root", "root");
        let sub = stack.push("sub", "sub");
        std::mem::forget(sub);
        drop(root);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_clones_share_frames() {
        let stack = ShellStack::new();
        let other = stack.clone();
        let _g = stack.push("db", "database");
        assert_eq!(other.prompt(), "db> ");
        assert_eq!(
            other.frames_snapshot(),
            vec![Frame {
                segment: "db".to_string(),
                shell: "database".to_string()
            }]
        );
    }
}
