//! Completion gate over queued unit loads.
//!
//! Each queued unit runs as its own task. The gate keeps one shared handle
//! per unit in submission order, so any number of waiters can observe the
//! same outcomes and replay them in the order the units were queued,
//! whatever order they finished in.

use crate::loader::{LoadError, LoadedUnit};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::trace;

/// Settled result of one unit: loaded, skipped (`None`) or failed
pub type UnitOutcome = Result<Option<LoadedUnit>, Arc<LoadError>>;

/// Shared handle on one queued unit
pub type PendingUnit = Shared<BoxFuture<'static, UnitOutcome>>;

/// Conjunction of every unit queued so far
#[derive(Default)]
pub struct CompletionGate {
    units: Vec<PendingUnit>,
    requests: usize,
}

impl CompletionGate {
    /// Create a gate with nothing queued
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one load request, even one naming no paths
    pub fn request(&mut self) {
        self.requests += 1;
    }

    /// Whether any load was ever requested
    pub fn was_requested(&self) -> bool {
        self.requests > 0
    }

    /// Number of queued units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no unit was queued
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Start `task` on the runtime and queue its outcome.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue<F>(&mut self, path: PathBuf, task: F) -> PendingUnit
    where
        F: Future<Output = Result<Option<LoadedUnit>, LoadError>> + Send + 'static,
    {
        trace!(path = %path.display(), slot = self.units.len(), "Queueing controller unit");
        let handle = tokio::spawn(task);
        let unit = async move {
            match handle.await {
                Ok(outcome) => outcome.map_err(Arc::new),
                Err(join_error) => Err(Arc::new(LoadError::Aborted {
                    path,
                    reason: join_error.to_string(),
                })),
            }
        }
        .boxed()
        .shared();
        self.units.push(unit.clone());
        unit
    }

    /// Outcomes of every unit queued at or after `start`, in submission order
    pub fn settled_from(&self, start: usize) -> impl Future<Output = Vec<UnitOutcome>> + Send + 'static {
        let pending = self.units.get(start..).unwrap_or_default().to_vec();
        join_all(pending)
    }

    /// Outcomes of every queued unit, in submission order
    pub fn settled(&self) -> impl Future<Output = Vec<UnitOutcome>> + Send + 'static {
        self.settled_from(0)
    }
}

impl std::fmt::Debug for CompletionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionGate")
            .field("units", &self.units.len())
            .field("requests", &self.requests)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;
    use std::time::Duration;
    use tagbridge_domain::ControllerDescriptor;

    fn unit(name: &str) -> LoadedUnit {
        LoadedUnit {
            path: PathBuf::from(format!("{}.rs", name)),
            descriptor: ControllerDescriptor {
                name: name.to_string(),
                description: String::new(),
                methods: Vec::new(),
            },
            controller: Controller::new(),
        }
    }

    fn names(outcomes: &[UnitOutcome]) -> Vec<String> {
        outcomes
            .iter()
            .map(|outcome| match outcome {
                Ok(Some(unit)) => unit.descriptor.name.clone(),
                Ok(None) => "-".to_string(),
                Err(_) => "!".to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_new_gate_is_unrequested() {
        let gate = CompletionGate::new();
        assert!(!gate.was_requested());
        assert!(gate.is_empty());
        assert!(gate.settled().await.is_empty());
    }

    #[tokio::test]
    async fn test_outcomes_follow_submission_order() {
        let mut gate = CompletionGate::new();
        gate.request();
        gate.enqueue(PathBuf::from("slow"), async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            Ok(Some(unit("Slow")))
        });
        gate.enqueue(PathBuf::from("missing"), async { Ok(None) });
        gate.enqueue(PathBuf::from("fast"), async { Ok(Some(unit("Fast"))) });

        let outcomes = gate.settled().await;
        assert_eq!(names(&outcomes), vec!["Slow", "-", "Fast"]);
    }

    #[tokio::test]
    async fn test_failure_stays_in_its_slot() {
        let mut gate = CompletionGate::new();
        gate.request();
        gate.enqueue(PathBuf::from("bad"), async {
            Err(LoadError::Aborted {
                path: PathBuf::from("bad"),
                reason: "boom".to_string(),
            })
        });
        gate.enqueue(PathBuf::from("good"), async { Ok(Some(unit("Good"))) });

        let outcomes = gate.settled().await;
        assert_eq!(names(&outcomes), vec!["!", "Good"]);
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported_as_aborted() {
        let mut gate = CompletionGate::new();
        gate.request();
        let pending = gate.enqueue(PathBuf::from("panics"), async {
            if true {
                panic!("loader blew up");
            }
            Ok(None)
        });

        let err = pending.await.unwrap_err();
        assert!(matches!(*err, LoadError::Aborted { .. }));
    }

    #[tokio::test]
    async fn test_settled_from_skips_replayed_slots() {
        let mut gate = CompletionGate::new();
        gate.request();
        gate.enqueue(PathBuf::from("a"), async { Ok(Some(unit("A"))) });
        gate.request();
        gate.enqueue(PathBuf::from("b"), async { Ok(Some(unit("B"))) });

        assert_eq!(gate.len(), 2);
        assert_eq!(names(&gate.settled_from(1).await), vec!["B"]);
        assert!(gate.settled_from(5).await.is_empty());
    }
}
