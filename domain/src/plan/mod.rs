//! Implementation plan entities
//!
//! A plan is the unit a human reviews and the unit regenerated on revision.
//! It is ordered at both levels: tasks run in sequence, and the atomic
//! tasks inside each task run in sequence, because later edits may depend
//! on earlier ones.

pub mod parser;
pub mod render;

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// The smallest unit of work: one localized edit instruction.
///
/// Immutable once created by planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicTask {
    /// What to change
    pub instruction: String,
    /// Why / surrounding detail the instruction needs
    pub context: String,
}

impl AtomicTask {
    pub fn new(instruction: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            context: context.into(),
        }
    }
}

/// All edits planned for a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationTask {
    /// Path of the file to edit, relative to the run's working directory
    pub file_path: String,
    /// What the edits to this file accomplish together
    pub goal: String,
    /// Ordered edits to apply to this file
    pub atomic_tasks: Vec<AtomicTask>,
}

impl ImplementationTask {
    pub fn new(file_path: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            goal: goal.into(),
            atomic_tasks: Vec::new(),
        }
    }

    pub fn with_atomic(mut self, atomic: AtomicTask) -> Self {
        self.atomic_tasks.push(atomic);
        self
    }
}

/// An ordered plan of per-file tasks (Entity).
///
/// Immutable once approved; a revision discards the whole plan and
/// regenerates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ImplementationPlan {
    pub tasks: Vec<ImplementationTask>,
}

impl ImplementationPlan {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn with_task(mut self, task: ImplementationTask) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn add_task(&mut self, task: ImplementationTask) {
        self.tasks.push(task);
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Total number of atomic tasks across all tasks
    pub fn atomic_count(&self) -> usize {
        self.tasks.iter().map(|t| t.atomic_tasks.len()).sum()
    }

    /// Check structural validity: at least one task, every task names a
    /// file and carries at least one atomic task.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.tasks.is_empty() {
            return Err(DomainError::InvalidPlan("plan has no tasks".to_string()));
        }
        for (i, task) in self.tasks.iter().enumerate() {
            if task.file_path.trim().is_empty() {
                return Err(DomainError::InvalidPlan(format!(
                    "task {} has an empty file path",
                    i + 1
                )));
            }
            if task.atomic_tasks.is_empty() {
                return Err(DomainError::InvalidPlan(format!(
                    "task {} ({}) has no atomic tasks",
                    i + 1,
                    task.file_path
                )));
            }
        }
        Ok(())
    }
}

/// One planned edit, ready for a diff-application collaborator.
///
/// Produced per atomic task during implementation: the snippet to locate in
/// the file plus the instruction describing how it should change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffInstruction {
    pub original_snippet: String,
    pub change_instruction: String,
}

impl DiffInstruction {
    pub fn new(original_snippet: impl Into<String>, change_instruction: impl Into<String>) -> Self {
        Self {
            original_snippet: original_snippet.into(),
            change_instruction: change_instruction.into(),
        }
    }
}
