use std::future::Future;
use std::pin::Pin;

use crate::error::DashboardResult;

type RollbackFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
type RollbackAction = Box<dyn FnOnce() -> RollbackFuture + Send>;

struct Compensation {
    description: String,
    action: RollbackAction,
}

/// Compensating actions recorded by one logical operation.
///
/// Every mutating store call pushes the action that undoes it. When the
/// operation fails the actions run last-in first-out; an action that fails is
/// logged and skipped so the error that triggered the rollback is the one the
/// caller sees.
pub struct Transaction {
    operation: &'static str,
    compensations: Vec<Compensation>,
}

impl Transaction {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            compensations: Vec::new(),
        }
    }

    /// Record the undo action of a store call that already succeeded
    pub fn add_rollback<F, Fut>(&mut self, description: impl Into<String>, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.compensations.push(Compensation {
            description: description.into(),
            action: Box::new(move || Box::pin(action())),
        });
    }

    pub fn len(&self) -> usize {
        self.compensations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compensations.is_empty()
    }

    /// Discard the recorded compensations
    pub fn commit(self) {
        log::debug!(
            "[{}] committed with {} compensating actions discarded",
            self.operation,
            self.compensations.len()
        );
    }

    /// Run the compensations in reverse order, returning how many failed
    pub async fn rollback(self) -> usize {
        let mut failures = 0;
        for compensation in self.compensations.into_iter().rev() {
            log::info!(
                "[{}._rollback] {}",
                self.operation,
                compensation.description
            );
            if let Err(e) = (compensation.action)().await {
                failures += 1;
                log::error!(
                    "[{}._rollback] failed to {}: {:#}",
                    self.operation,
                    compensation.description,
                    e
                );
            }
        }
        failures
    }

    /// Commit on success, roll back on failure; the result passes through untouched
    pub async fn finish<T>(self, result: DashboardResult<T>) -> DashboardResult<T> {
        match result {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(e) => {
                log::warn!("[{}] failed: {}", self.operation, e);
                self.rollback().await;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("operation", &self.operation)
            .field(
                "compensations",
                &self
                    .compensations
                    .iter()
                    .map(|c| c.description.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
