//! Task queue for slicing jobs.
//!
//! Following the stage pattern: Enqueue → Tick → Completions.
//!
//! [`SlicingStage`] is the synchronous variant: callers enqueue jobs, tick
//! once per frame to process everything pending in parallel, then drain
//! completions. [`AsyncSlicer`] wraps a single job on rayon's pool behind a
//! channel for hosts that must never block.

use std::sync::Arc;

use crossbeam_channel::{self as channel, Receiver, TryRecvError};
use rayon::prelude::*;
use web_time::Instant;

use crate::config::PrintConfig;
use crate::mesh::TriangleMesh;
use crate::slice::{slice_prepared, CancelToken, SliceResult};

/// Request to slice one prepared mesh.
///
/// The mesh must have `prepare()`d topology; it is shared read-only with
/// the workers.
#[derive(Clone)]
pub struct SliceRequest {
  /// Unique identifier for this request.
  pub id: u64,
  pub mesh: Arc<TriangleMesh>,
  pub config: PrintConfig,
}

/// Completed slicing job.
pub struct SliceCompletion {
  /// Request ID this completion corresponds to.
  pub id: u64,
  pub result: SliceResult,
  /// Raw slicing time in microseconds.
  pub slice_time_us: u64,
}

fn run_request(req: SliceRequest, cancel: &CancelToken) -> SliceCompletion {
  let start = Instant::now();
  let result = slice_prepared(&req.mesh, &req.config, cancel);
  SliceCompletion {
    id: req.id,
    result,
    slice_time_us: start.elapsed().as_micros() as u64,
  }
}

/// Slicing stage that processes requests in parallel.
pub struct SlicingStage {
  /// Pending requests waiting to be processed.
  pending: Vec<SliceRequest>,
  /// Completed results ready to be collected.
  completed: Vec<SliceCompletion>,
  /// Next request ID.
  next_id: u64,
  cancel: CancelToken,
}

impl Default for SlicingStage {
  fn default() -> Self {
    Self::new()
  }
}

impl SlicingStage {
  pub fn new() -> Self {
    Self {
      pending: Vec::new(),
      completed: Vec::new(),
      next_id: 0,
      cancel: CancelToken::new(),
    }
  }

  /// Enqueue a slice request, returning the assigned ID.
  pub fn enqueue(&mut self, mesh: Arc<TriangleMesh>, config: PrintConfig) -> u64 {
    let id = self.next_id;
    self.next_id += 1;
    self.pending.push(SliceRequest { id, mesh, config });
    id
  }

  /// Process pending requests in parallel and move completions to output.
  /// Returns the number of jobs processed this tick.
  pub fn tick(&mut self) -> usize {
    if self.pending.is_empty() {
      return 0;
    }
    let requests = std::mem::take(&mut self.pending);
    let count = requests.len();
    let cancel = &self.cancel;

    let completions: Vec<SliceCompletion> = requests
      .into_par_iter()
      .map(|req| run_request(req, cancel))
      .collect();

    self.completed.extend(completions);
    count
  }

  /// Take all completed results.
  pub fn drain_completions(&mut self) -> Vec<SliceCompletion> {
    std::mem::take(&mut self.completed)
  }

  /// Cancellation token shared with every job this stage runs.
  pub fn cancel_token(&self) -> CancelToken {
    self.cancel.clone()
  }

  pub fn pending_count(&self) -> usize {
    self.pending.len()
  }

  pub fn completed_count(&self) -> usize {
    self.completed.len()
  }

  /// True when no work remains.
  pub fn is_idle(&self) -> bool {
    self.pending.is_empty() && self.completed.is_empty()
  }
}

/// Non-blocking single-job slicer.
///
/// Wraps a slicing run on rayon's thread pool behind a bounded channel.
pub struct AsyncSlicer {
  /// Receiver for the pending job's result (None if idle).
  receiver: Option<Receiver<SliceCompletion>>,
  cancel: CancelToken,
}

impl Default for AsyncSlicer {
  fn default() -> Self {
    Self::new()
  }
}

impl AsyncSlicer {
  pub fn new() -> Self {
    Self {
      receiver: None,
      cancel: CancelToken::new(),
    }
  }

  /// Check if a job is currently running.
  pub fn is_busy(&self) -> bool {
    self.receiver.is_some()
  }

  /// Start slicing (non-blocking). Returns `false` if already busy.
  pub fn start(&mut self, mesh: Arc<TriangleMesh>, config: PrintConfig) -> bool {
    if self.is_busy() {
      return false;
    }
    self.cancel = CancelToken::new();
    let cancel = self.cancel.clone();

    let (sender, receiver) = channel::bounded(1);
    self.receiver = Some(receiver);

    rayon::spawn(move || {
      let completion = run_request(
        SliceRequest {
          id: 0,
          mesh,
          config,
        },
        &cancel,
      );
      // Ignore send error (receiver dropped = job abandoned).
      let _ = sender.send(completion);
    });
    true
  }

  /// Request cooperative cancellation of the running job.
  pub fn cancel(&self) {
    self.cancel.cancel();
  }

  /// Poll for the finished result (non-blocking).
  pub fn poll(&mut self) -> Option<SliceCompletion> {
    let receiver = self.receiver.as_ref()?;
    match receiver.try_recv() {
      Ok(completion) => {
        self.receiver = None;
        Some(completion)
      }
      Err(TryRecvError::Empty) => None,
      Err(TryRecvError::Disconnected) => {
        self.receiver = None;
        None
      }
    }
  }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod queue_test;
