use std::{fs, marker::PhantomData, path::PathBuf};

/// Enum of possible operations to undo
#[derive(Debug, PartialEq, Eq)]
pub enum RollbackOperation {
    /// A file that did not exist before the run.
    RemoveFile(PathBuf),
    /// A file that existed before the run and was overwritten.
    RestoreFile { path: PathBuf, contents: Vec<u8> },
    /// The topmost directory the run had to create. Everything below it belongs to the run.
    RemoveDir(PathBuf),
}
/// Active Transaction
pub struct Active;
/// Committed Transaction
pub struct Committed;
/// A trait that tells us if rollback should occur when dropped.
pub trait TransactionState {
    const SHOULD_ROLLBACK: bool;
}
impl TransactionState for Active {
    const SHOULD_ROLLBACK: bool = true;
}
impl TransactionState for Committed {
    const SHOULD_ROLLBACK: bool = false;
}
/// Tracks how to undo every filesystem change made during a run.
///
/// A `Transaction<Active>` that is dropped without being committed replays its operations in
/// reverse order, putting the base directory back the way it was found. Calling
/// [`Transaction::commit`] turns it into a `Transaction<Committed>`, which does nothing on drop.
///
/// ```
/// use lampgen::transactions::{Active, RollbackOperation, Transaction};
///
/// let mut trx = Transaction::<Active>::new();
/// trx.add_operation(RollbackOperation::RemoveFile("some/path".into()));
/// let _committed = trx.commit(); // nothing is undone
/// ```
pub struct Transaction<State: TransactionState> {
    rollback_operations: Vec<RollbackOperation>,
    state: PhantomData<State>,
}
impl Transaction<Active> {
    pub fn new() -> Self {
        Transaction {
            rollback_operations: vec![],
            state: PhantomData,
        }
    }
    /// Registers how to undo a change that has just been made.
    pub fn add_operation(&mut self, operation: RollbackOperation) {
        self.rollback_operations.push(operation);
    }
    pub fn len(&self) -> usize {
        self.rollback_operations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rollback_operations.is_empty()
    }
    /// Finalizes the transaction, preventing any rollback from occurring.
    pub fn commit(mut self) -> Transaction<Committed> {
        self.rollback_operations.clear();

        Transaction {
            rollback_operations: vec![],
            state: PhantomData,
        }
    }
}
impl Default for Transaction<Active> {
    fn default() -> Self {
        Self::new()
    }
}
impl<S: TransactionState> Drop for Transaction<S> {
    fn drop(&mut self) {
        if S::SHOULD_ROLLBACK && !self.rollback_operations.is_empty() {
            log::warn!(
                "rolling back {} filesystem change(s)",
                self.rollback_operations.len()
            );
            while let Some(operation) = self.rollback_operations.pop() {
                let outcome = match &operation {
                    RollbackOperation::RemoveDir(path) => {
                        log::debug!("removing dir: {}", path.display());
                        fs::remove_dir_all(path)
                    }
                    RollbackOperation::RemoveFile(path) => {
                        log::debug!("removing file: {}", path.display());
                        fs::remove_file(path)
                    }
                    RollbackOperation::RestoreFile { path, contents } => {
                        log::debug!("restoring file: {}", path.display());
                        fs::write(path, contents)
                    }
                };

                if let Err(error) = outcome {
                    log::warn!("rollback step {:?} failed: {}", operation, error);
                }
            }
        } else if !S::SHOULD_ROLLBACK {
            log::debug!("committing transaction");
        }
    }
}
