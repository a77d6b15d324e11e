//! The pipeline driver (§9's "arena of nodes indexed by small integers"):
//! owns every indicator node in a run, validates declared dependency
//! indices at construction, and drives either evaluation mode over the
//! whole arena.
//!
//! Because a node's [`crate::line::LineHandle`] inputs can only be
//! constructed from line handles that already exist, the arena is
//! acyclic and already in a valid evaluation order by the time a node is
//! added — `deps` is bookkeeping for validation and introspection, not a
//! topological sort the driver has to compute.

use crate::error::{PipelineError, Result};
use crate::indicator::{run_once, tick, Indicator};

/// Owns a run's indicator nodes and drives them bar-by-bar or in batch.
///
/// `!Sync` by construction (every node holds `Rc<RefCell<_>>` line
/// handles internally), matching §5: parallelism across independent runs
/// is achieved by building one `Pipeline` per symbol/DAG, never by
/// sharing one across threads.
#[derive(Default)]
pub struct Pipeline {
    nodes: Vec<Box<dyn Indicator>>,
    deps: Vec<Vec<usize>>,
}

impl Pipeline {
    /// An empty arena.
    pub fn new() -> Self {
        Pipeline {
            nodes: Vec::new(),
            deps: Vec::new(),
        }
    }

    /// Number of nodes currently in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` iff no nodes have been added yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds `node` to the arena, declaring it depends on the nodes at
    /// `deps` (already-added indices, for bookkeeping/introspection only).
    /// Rejects any index that is not yet present — a self-reference or a
    /// forward reference is always out of range, since a node can only be
    /// declared after every node it was built from.
    #[tracing::instrument(level = "debug", skip(self, node), fields(deps = ?deps))]
    pub fn add_node(&mut self, node: Box<dyn Indicator>, deps: &[usize]) -> Result<usize> {
        for &d in deps {
            if d >= self.nodes.len() {
                return Err(PipelineError::construction(format!(
                    "dependency index {d} does not exist in an arena of {} node(s)",
                    self.nodes.len()
                )));
            }
        }
        let idx = self.nodes.len();
        tracing::debug!(idx, mp = node.minperiod(), "node added to pipeline");
        self.nodes.push(node);
        self.deps.push(deps.to_vec());
        Ok(idx)
    }

    /// Read-only access to a node by arena index.
    pub fn node(&self, idx: usize) -> Option<&dyn Indicator> {
        self.nodes.get(idx).map(|b| b.as_ref())
    }

    /// The dependency indices declared for node `idx`, if it exists.
    pub fn deps(&self, idx: usize) -> Option<&[usize]> {
        self.deps.get(idx).map(|v| v.as_slice())
    }

    /// Advances every node in the arena by one bar, in insertion order.
    /// Insertion order is already a valid evaluation order (O1/O2, §5):
    /// a node can only have been added after every node whose lines it
    /// reads.
    #[tracing::instrument(level = "trace", skip(self), fields(nodes = self.nodes.len()))]
    pub fn step(&mut self) {
        for node in &mut self.nodes {
            tick(node.as_mut());
        }
    }

    /// Streaming mode over `bars` consecutive bars: `bars` calls to [`Pipeline::step`].
    pub fn run_streaming(&mut self, bars: usize) {
        for _ in 0..bars {
            self.step();
        }
    }

    /// Batch mode: runs the whole-history kernel on every node for `n` bars.
    #[tracing::instrument(level = "debug", skip(self), fields(nodes = self.nodes.len(), n))]
    pub fn run_batch(&mut self, n: usize) {
        for node in &mut self.nodes {
            run_once(node.as_mut(), n);
        }
    }
}
