use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

pub type SignalId = usize;
pub type ObserverId = usize;

thread_local! {
    static CURRENT_OBSERVER: Cell<Option<ObserverId>> = const { Cell::new(None) };
    static NEXT_SIGNAL: Cell<SignalId> = const { Cell::new(0) };
    static GRAPH: RefCell<DepGraph> = RefCell::new(DepGraph::default());
}

struct Observer {
    /// Scope depth at creation; shallower observers run first.
    depth: usize,
    run: Rc<dyn Fn()>,
}

#[derive(Default)]
struct DepGraph {
    next_observer: ObserverId,
    // signal_id -> observers that depend on it
    edges: HashMap<SignalId, HashSet<ObserverId>>,
    // observer_id -> signals it depends on
    back: HashMap<ObserverId, HashSet<SignalId>>,
    observers: HashMap<ObserverId, Observer>,
    // (depth, id), drained in order by `flush`
    pending: BTreeSet<(usize, ObserverId)>,
    running: HashSet<ObserverId>,
    batch_depth: usize,
    flushing: bool,
}

impl DepGraph {
    fn remove_all_edges_for(&mut self, obs: ObserverId) {
        if let Some(signals) = self.back.remove(&obs) {
            for s in signals {
                if let Some(set) = self.edges.get_mut(&s) {
                    set.remove(&obs);
                }
            }
        }
    }

    fn remove_observer(&mut self, obs: ObserverId) {
        if let Some(o) = self.observers.remove(&obs) {
            self.pending.remove(&(o.depth, obs));
        }
        self.remove_all_edges_for(obs);
        self.running.remove(&obs);
    }

    fn schedule(&mut self, sig: SignalId) {
        let Some(deps) = self.edges.get(&sig) else {
            return;
        };
        let queued: Vec<(usize, ObserverId)> = deps
            .iter()
            .filter(|obs| !self.running.contains(*obs))
            .filter_map(|obs| self.observers.get(obs).map(|o| (o.depth, *obs)))
            .collect();
        self.pending.extend(queued);
    }
}

pub fn next_signal_id() -> SignalId {
    NEXT_SIGNAL.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    })
}

pub fn register_signal_read(sig: SignalId) {
    if let Some(obs) = CURRENT_OBSERVER.with(|co| co.get()) {
        GRAPH.with(|g| {
            let mut g = g.borrow_mut();
            g.edges.entry(sig).or_default().insert(obs);
            g.back.entry(obs).or_default().insert(sig);
        });
    }
}

/// Queue every observer that read `sig` and, outside of a batch, run them.
pub fn signal_changed(sig: SignalId) {
    let flush_now = GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        g.schedule(sig);
        g.batch_depth == 0 && !g.flushing
    });
    if flush_now {
        flush();
    }
}

fn flush() {
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            GRAPH.with(|g| g.borrow_mut().flushing = false);
        }
    }

    GRAPH.with(|g| g.borrow_mut().flushing = true);
    let _guard = Guard;
    loop {
        let next = GRAPH.with(|g| g.borrow_mut().pending.pop_first());
        let Some((_, obs)) = next else {
            break;
        };
        run_observer_now(obs);
    }
}

/// Defers observer re-runs until the outermost batch returns.
///
/// Writes inside the batch are visible immediately to direct reads; effects
/// only see the final state.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            GRAPH.with(|g| g.borrow_mut().batch_depth -= 1);
        }
    }

    GRAPH.with(|g| g.borrow_mut().batch_depth += 1);
    let result = {
        let _guard = Guard;
        f()
    };
    let flush_now = GRAPH.with(|g| {
        let g = g.borrow();
        g.batch_depth == 0 && !g.flushing && !g.pending.is_empty()
    });
    if flush_now {
        flush();
    }
    result
}

/// Runs `f` without recording reads against the current observer.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_OBSERVER.with(|co| co.replace(None));
    let result = f();
    CURRENT_OBSERVER.with(|co| co.set(prev));
    result
}

pub fn new_observer(depth: usize, f: impl Fn() + 'static) -> ObserverId {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        let id = g.next_observer;
        g.next_observer += 1;
        g.observers.insert(
            id,
            Observer {
                depth,
                run: Rc::new(f),
            },
        );
        id
    })
}

/// Remove an observer and all of its dependency edges.
pub fn remove_observer(id: ObserverId) {
    GRAPH.with(|g| g.borrow_mut().remove_observer(id));
}

pub fn observer_count() -> usize {
    GRAPH.with(|g| g.borrow().observers.len())
}

pub fn run_observer_now(id: ObserverId) {
    struct Restore(Option<ObserverId>, ObserverId);
    impl Drop for Restore {
        fn drop(&mut self) {
            CURRENT_OBSERVER.with(|co| co.set(self.0));
            GRAPH.with(|g| g.borrow_mut().running.remove(&self.1));
        }
    }

    let f = GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        // clear previous deps before recompute
        g.remove_all_edges_for(id);
        let f = g.observers.get(&id).map(|o| o.run.clone());
        if f.is_some() {
            g.running.insert(id);
        }
        f
    });
    let Some(f) = f else {
        return;
    };

    let prev = CURRENT_OBSERVER.with(|co| co.replace(Some(id)));
    let _restore = Restore(prev, id);
    f();
}
