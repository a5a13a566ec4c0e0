//! The executable side of planning.

use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rdft_kernel::Ops;

/// An executable transform bound to the geometry of one [`Problem`](crate::Problem).
///
/// Plans are immutable once built and may be shared by several parents;
/// any state they arm between runs sits behind interior locks.
pub trait Plan: Send + Sync + fmt::Debug {
    /// Run the transform.
    ///
    /// # Safety
    /// `input` and `output` must point at buffers covering every offset the
    /// plan's problem reaches through its input and output strides, and the
    /// two must alias exactly when the problem is in-place. Plans may
    /// overwrite the input buffer when the planner allowed it.
    unsafe fn apply(&self, input: *mut f64, output: *mut f64);

    /// Arm (`true`) or release (`false`) precomputed state.
    ///
    /// Calls nest: a plan reachable from several parents is armed once per
    /// parent and stays armed until the last matching release.
    fn awake(&self, _flag: bool) {}

    /// Estimated cost of one [`apply`](Plan::apply).
    fn ops(&self) -> Ops;

    /// Append this plan's structural description.
    fn print(&self, p: &mut Printer);
}

/// Shared handle to a plan.
pub type PlanRef = Arc<dyn Plan>;

/// Registration of a live plan with the planner that built it.
///
/// The count goes down when the plan holding the token is dropped, so a
/// planner can tell whether every plan it handed out has been released.
#[derive(Debug)]
pub struct PlanToken {
    live: Arc<AtomicUsize>,
}

impl PlanToken {
    pub(crate) fn new(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::Relaxed);
        Self {
            live: Arc::clone(live),
        }
    }
}

impl Drop for PlanToken {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Accumulates the nested description of a plan tree.
///
/// The compact form puts children on one line separated by spaces; the
/// verbose form puts each child on its own line, indented by depth, and
/// annotates every plan with its cost.
#[derive(Debug, Default)]
pub struct Printer {
    out: String,
    verbose: bool,
    depth: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::default()
        }
    }

    /// Open a plan node: `(` followed by its label.
    pub fn open(&mut self, label: fmt::Arguments<'_>, ops: Ops) {
        self.out.push('(');
        let _ = self.out.write_fmt(label);
        if self.verbose {
            let _ = write!(self.out, " #{}", ops.cost());
        }
    }

    /// Print a child plan one level deeper.
    pub fn child(&mut self, plan: &dyn Plan) {
        self.depth += 1;
        if self.verbose {
            self.out.push('\n');
            for _ in 0..self.depth {
                self.out.push_str("  ");
            }
        } else {
            self.out.push(' ');
        }
        plan.print(self);
        self.depth -= 1;
    }

    /// Close the node opened by [`open`](Printer::open).
    pub fn close(&mut self) {
        self.out.push(')');
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Compact nested description, e.g.
/// `(rdft-rank>=2/0 (rdft-direct-r2hc-8-x8) (rdft-direct-r2hc-8-x8))`.
pub fn describe(plan: &dyn Plan) -> String {
    let mut p = Printer::new();
    plan.print(&mut p);
    p.finish()
}

/// Multi-line description with per-plan costs.
pub fn describe_verbose(plan: &dyn Plan) -> String {
    let mut p = Printer::verbose();
    plan.print(&mut p);
    p.finish()
}
