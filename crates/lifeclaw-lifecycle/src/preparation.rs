//! Category preparation checklists — canned best-effort templates generated
//! at creation time when the deadline is far enough out to act on them.

use lifeclaw_core::types::{Category, Obligation, TaskDraft, TaskPriority};

/// Build the preparation task list for an obligation created `days_until_due`
/// days before its deadline. Empty for near-term deadlines (≤ 3 days) and for
/// categories without a template.
pub fn preparation_tasks(obligation: &Obligation, days_until_due: i64) -> Vec<TaskDraft> {
    if days_until_due <= 3 {
        return Vec::new();
    }

    let title = &obligation.title;
    let mut tasks = Vec::new();

    match obligation.category {
        Category::Education => {
            if days_until_due > 7 {
                tasks.push(task(
                    format!("Gather documents for {title}"),
                    "Collect all required documents and certificates",
                    TaskPriority::Medium,
                ));
            }
            tasks.push(task(
                format!("Review requirements for {title}"),
                "Double-check all requirements and deadlines",
                TaskPriority::High,
            ));
        }
        Category::Finance => {
            if days_until_due > 7 {
                tasks.push(task(
                    format!("Prepare financial documents for {title}"),
                    "Gather bank statements, receipts, and financial records",
                    TaskPriority::High,
                ));
            }
        }
        Category::Work => {
            if days_until_due > 5 {
                tasks.push(task(
                    format!("Prepare for {title}"),
                    "Review materials and prepare necessary items",
                    TaskPriority::Medium,
                ));
            }
        }
        Category::Health => {
            tasks.push(task(
                format!("Prepare for {title}"),
                "Gather medical records and insurance information",
                TaskPriority::High,
            ));
        }
        Category::Personal | Category::Other => {}
    }

    tasks
}

fn task(title: String, description: &str, priority: TaskPriority) -> TaskDraft {
    TaskDraft {
        title,
        description: description.into(),
        priority: Some(priority),
        ai_generated: true,
    }
}
