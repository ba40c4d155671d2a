//! Acquisition/release bookkeeping for driver handles.
//!
//! Every driver handle is wrapped in a [`Tracked`] guard at acquisition.
//! Dropping the guard runs the handle's pre-release hook, releases the
//! underlying object, and marks the ledger entry exactly once. Guards
//! acquired as locals therefore release in strict reverse-of-acquisition
//! order on every exit path, including early returns and unwinds.
//!
//! The pipeline is single-threaded (one host thread, one in-order queue),
//! so the shared record is a plain `Rc<RefCell<..>>`.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::Device;
use opencl3::kernel::Kernel;
use opencl3::program::Program;

/// The category of a tracked driver handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Device,
    Context,
    Queue,
    Buffer,
    Program,
    Kernel,
}

impl std::fmt::Display for HandleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HandleKind::Device => "device",
            HandleKind::Context => "context",
            HandleKind::Queue => "queue",
            HandleKind::Buffer => "buffer",
            HandleKind::Program => "program",
            HandleKind::Kernel => "kernel",
        };
        write!(f, "{}", name)
    }
}

/// Identifies one ledger entry; assigned in acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleId(usize);

impl HandleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A handle category the ledger knows how to account for.
pub trait TrackedHandle {
    const KIND: HandleKind;

    /// Runs before the handle is released. A failure here is a
    /// non-fatal release warning; it never stops the rest of teardown.
    fn pre_release(&mut self) -> std::result::Result<(), String> {
        Ok(())
    }
}

// Root devices carry no reference count; releasing one is a no-op.
impl TrackedHandle for Device {
    const KIND: HandleKind = HandleKind::Device;
}

impl TrackedHandle for Context {
    const KIND: HandleKind = HandleKind::Context;
}

impl TrackedHandle for CommandQueue {
    const KIND: HandleKind = HandleKind::Queue;

    /// Drains the queue before it is released so no submitted operation
    /// outlives its handles.
    fn pre_release(&mut self) -> std::result::Result<(), String> {
        self.finish().map_err(|e| format!("finish failed: {:?}", e))
    }
}

impl TrackedHandle for Program {
    const KIND: HandleKind = HandleKind::Program;
}

impl TrackedHandle for Kernel {
    const KIND: HandleKind = HandleKind::Kernel;
}

struct Entry {
    kind: HandleKind,
    released: bool,
}

#[derive(Default)]
struct LedgerState {
    entries: Vec<Entry>,
    release_log: Vec<HandleId>,
}

/// Shared record of every acquired handle and its release state.
///
/// Cloning is cheap and shares the underlying record.
#[derive(Clone, Default)]
pub struct ResourceLedger {
    inner: Rc<RefCell<LedgerState>>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the acquisition of `handle` and wraps it in a guard that
    /// releases it on drop.
    pub fn track<T: TrackedHandle>(&self, handle: T) -> Tracked<T> {
        let mut state = self.inner.borrow_mut();
        let id = HandleId(state.entries.len());
        state.entries.push(Entry {
            kind: T::KIND,
            released: false,
        });
        log::debug!("acquired {} handle #{}", T::KIND, id.0);

        Tracked {
            handle: Some(handle),
            id,
            ledger: self.clone(),
        }
    }

    fn mark_released(&self, id: HandleId, kind: HandleKind) {
        let mut state = self.inner.borrow_mut();
        if state.entries[id.0].released {
            log::warn!("{} handle #{} marked released twice", kind, id.0);
            return;
        }
        state.entries[id.0].released = true;
        state.release_log.push(id);
        log::debug!("released {} handle #{}", kind, id.0);
    }

    /// Number of handles acquired so far.
    pub fn tracked(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Number of handles not yet released.
    pub fn outstanding(&self) -> usize {
        self.inner
            .borrow()
            .entries
            .iter()
            .filter(|e| !e.released)
            .count()
    }

    /// Entry ids in the order they were released.
    pub fn release_log(&self) -> Vec<HandleId> {
        self.inner.borrow().release_log.clone()
    }
}

/// Owning guard around a driver handle.
///
/// Dereferences to the handle; releases it exactly once on drop.
pub struct Tracked<T: TrackedHandle> {
    handle: Option<T>,
    id: HandleId,
    ledger: ResourceLedger,
}

impl<T: TrackedHandle> Tracked<T> {
    pub fn id(&self) -> HandleId {
        self.id
    }
}

impl<T: TrackedHandle> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.handle.as_ref().expect("handle accessed after release")
    }
}

impl<T: TrackedHandle> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.handle.as_mut().expect("handle accessed after release")
    }
}

impl<T: TrackedHandle> Drop for Tracked<T> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(msg) = handle.pre_release() {
                log::warn!(
                    "release warning for {} handle #{}: {}",
                    T::KIND,
                    self.id.0,
                    msg
                );
            }
            drop(handle);
            self.ledger.mark_released(self.id, T::KIND);
        }
    }
}
