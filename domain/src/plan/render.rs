//! Deterministic plan rendering for human review.
//!
//! The rendered text is the whole basis for the approve/revise decision, so
//! it includes every file path, goal, and atomic instruction — the reviewer
//! should never need to re-derive the plan from elsewhere.

use super::ImplementationPlan;
use std::fmt::Write;

/// Render a plan as review text.
///
/// Output is a pure function of the plan: the same plan always renders to
/// the same string.
pub fn render_plan(plan: &ImplementationPlan) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Implementation plan for review");
    let _ = writeln!(out, "==============================");
    let _ = writeln!(
        out,
        "{} file(s), {} atomic edit(s)",
        plan.task_count(),
        plan.atomic_count()
    );
    let _ = writeln!(out);

    for (ti, task) in plan.tasks.iter().enumerate() {
        let _ = writeln!(out, "Task {}: {}", ti + 1, task.file_path);
        if !task.goal.is_empty() {
            let _ = writeln!(out, "  Goal: {}", task.goal);
        }
        for (ai, atomic) in task.atomic_tasks.iter().enumerate() {
            let _ = writeln!(out, "  {}.{} {}", ti + 1, ai + 1, atomic.instruction);
            if !atomic.context.is_empty() {
                let _ = writeln!(out, "      context: {}", atomic.context);
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Reply with approval to start implementation, or describe the changes you want."
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{AtomicTask, ImplementationTask};

    fn sample_plan() -> ImplementationPlan {
        ImplementationPlan::new().with_task(
            ImplementationTask::new("src/auth.rs", "Add token refresh")
                .with_atomic(AtomicTask::new("Add refresh_token field", "struct Session"))
                .with_atomic(AtomicTask::new("Call refresh on expiry", "")),
        )
    }

    #[test]
    fn test_render_includes_every_detail() {
        let text = render_plan(&sample_plan());
        assert!(text.contains("src/auth.rs"));
        assert!(text.contains("Add token refresh"));
        assert!(text.contains("1.1 Add refresh_token field"));
        assert!(text.contains("context: struct Session"));
        assert!(text.contains("1.2 Call refresh on expiry"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let plan = sample_plan();
        assert_eq!(render_plan(&plan), render_plan(&plan));
    }

    #[test]
    fn test_render_counts_header() {
        let text = render_plan(&sample_plan());
        assert!(text.contains("1 file(s), 2 atomic edit(s)"));
    }
}
