use anyhow::{Context, bail};
use chrono::{DateTime, NaiveDate, Utc};

use crate::sanitize::sanitize;
use crate::task::{Priority, Task};

/// One task's worth of collected input, not yet validated. Built either
/// from `add` arguments or from the field-by-field edit prompts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub text: String,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
}

impl TaskDraft {
    pub fn from_task(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            priority: Some(task.priority),
            start_date: task.start_date,
            end_date: task.end_date,
            category: task.category.clone(),
        }
    }

    /// Sanitize and validate the draft into a fresh task. The caller owns
    /// the creation timestamp.
    pub fn build(self, now: DateTime<Utc>) -> anyhow::Result<Task> {
        let (text, priority, start_date, end_date, category) = self.into_fields()?;
        Ok(Task::new(text, priority, start_date, end_date, category, now))
    }

    /// Apply the draft to an existing task, replacing every editable field.
    /// Identity, completion state and creation timestamp stay untouched.
    pub fn apply_to(self, task: &mut Task) -> anyhow::Result<()> {
        let (text, priority, start_date, end_date, category) = self.into_fields()?;
        task.text = text;
        task.priority = priority;
        task.start_date = start_date;
        task.end_date = end_date;
        task.category = category;
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn into_fields(
        self,
    ) -> anyhow::Result<(
        String,
        Priority,
        Option<NaiveDate>,
        Option<NaiveDate>,
        Option<String>,
    )> {
        let text = sanitize(&self.text);
        if text.is_empty() {
            bail!("task text must not be empty");
        }
        let category = self
            .category
            .map(|raw| sanitize(&raw))
            .filter(|clean| !clean.is_empty());
        Ok((
            text,
            self.priority.unwrap_or(Priority::Low),
            self.start_date,
            self.end_date,
            category,
        ))
    }
}

/// Parse `add` arguments: `key:value` tokens set the structured fields,
/// everything else joins into the task text in order.
pub fn parse_draft(args: &[String]) -> anyhow::Result<TaskDraft> {
    let mut draft = TaskDraft::default();
    let mut words: Vec<&str> = Vec::with_capacity(args.len());

    for token in args {
        match token.split_once(':') {
            Some(("pri" | "priority", value)) => {
                draft.priority = Some(value.parse()?);
            }
            Some(("start", value)) => {
                draft.start_date = Some(parse_date(value)?);
            }
            Some(("end" | "due", value)) => {
                draft.end_date = Some(parse_date(value)?);
            }
            Some(("cat" | "category", value)) => {
                draft.category = Some(value.to_string());
            }
            _ => words.push(token),
        }
    }

    draft.text = words.join(" ");
    Ok(draft)
}

pub fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    value
        .trim()
        .parse::<NaiveDate>()
        .with_context(|| format!("invalid date '{value}' (expected YYYY-MM-DD)"))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{TaskDraft, parse_draft};
    use crate::task::Priority;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn words_and_modifiers_mix_freely() {
        let draft = parse_draft(&args(&[
            "buy",
            "pri:high",
            "milk",
            "start:2024-01-01",
            "end:2024-01-05",
            "cat:groceries",
        ]))
        .expect("parse");

        assert_eq!(draft.text, "buy milk");
        assert_eq!(draft.priority, Some(Priority::High));
        assert_eq!(draft.start_date, Some("2024-01-01".parse().expect("date")));
        assert_eq!(draft.end_date, Some("2024-01-05".parse().expect("date")));
        assert_eq!(draft.category, Some("groceries".to_string()));
    }

    #[test]
    fn bad_modifiers_are_rejected() {
        assert!(parse_draft(&args(&["x", "pri:urgent"])).is_err());
        assert!(parse_draft(&args(&["x", "end:tomorrow"])).is_err());
    }

    #[test]
    fn build_sanitizes_and_requires_text() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).single().expect("timestamp");

        let draft = parse_draft(&args(&["<b>hello</b>", "cat:<i>home</i>"])).expect("parse");
        let task = draft.build(now).expect("build");
        assert_eq!(task.text, "hello");
        assert_eq!(task.category, Some("home".to_string()));
        assert_eq!(task.priority, Priority::Low);
        assert!(!task.completed);
        assert_eq!(task.created_at, now);

        let empty = parse_draft(&args(&["<script></script>"])).expect("parse");
        assert!(empty.build(now).is_err());
    }

    #[test]
    fn apply_preserves_identity_completion_and_created_at() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).single().expect("timestamp");
        let mut task = parse_draft(&args(&["original"]))
            .expect("parse")
            .build(now)
            .expect("build");
        task.completed = true;
        let id = task.id;

        let draft = TaskDraft {
            text: "replaced".to_string(),
            priority: Some(Priority::High),
            start_date: None,
            end_date: None,
            category: None,
        };
        draft.apply_to(&mut task).expect("apply");

        assert_eq!(task.id, id);
        assert_eq!(task.text, "replaced");
        assert_eq!(task.priority, Priority::High);
        assert!(task.completed);
        assert_eq!(task.created_at, now);
    }

    #[test]
    fn sanitized_empty_category_becomes_none() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).single().expect("timestamp");
        let draft = TaskDraft {
            text: "tidy".to_string(),
            category: Some("<div></div>".to_string()),
            ..TaskDraft::default()
        };
        let task = draft.build(now).expect("build");
        assert_eq!(task.category, None);
    }
}
