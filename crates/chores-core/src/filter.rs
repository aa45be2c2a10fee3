use std::cmp::Ordering;

use anyhow::{anyhow, bail};
use chrono::NaiveDate;
use tracing::trace;

use crate::task::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl StatusFilter {
    pub fn parse(token: &str) -> anyhow::Result<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "completed" | "done" => Ok(Self::Completed),
            "incomplete" | "open" => Ok(Self::Incomplete),
            other => Err(anyhow!(
                "invalid status '{other}' (expected all, completed or incomplete)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    DateCreated,
    DueDate,
    Priority,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub dir: SortDir,
}

impl SortSpec {
    /// Parse a `<criterion>-<direction>` specifier such as `priority-desc`.
    pub fn parse(token: &str) -> anyhow::Result<Self> {
        let (criterion, direction) = token
            .rsplit_once('-')
            .ok_or_else(|| anyhow!("invalid sort '{token}' (expected <criterion>-<direction>)"))?;

        let key = match criterion {
            "dateCreated" | "created" => SortKey::DateCreated,
            "dueDate" | "due" => SortKey::DueDate,
            "priority" => SortKey::Priority,
            "status" => SortKey::Status,
            other => bail!(
                "invalid sort criterion '{other}' (expected dateCreated, dueDate, priority or status)"
            ),
        };
        let dir = match direction {
            "asc" => SortDir::Asc,
            "desc" => SortDir::Desc,
            other => bail!("invalid sort direction '{other}' (expected asc or desc)"),
        };

        Ok(Self { key, dir })
    }

    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        // Priority's base comparison runs descending by weight; the other
        // keys run ascending. Flipping priority on `asc` (and the rest on
        // `desc`) gives every key the same asc/desc meaning.
        let base = match self.key {
            SortKey::DateCreated => a.created_at.cmp(&b.created_at),
            SortKey::DueDate => cmp_due(a.end_date, b.end_date),
            SortKey::Priority => b.priority.weight().cmp(&a.priority.weight()),
            SortKey::Status => a.completed.cmp(&b.completed),
        };

        let flip = match self.key {
            SortKey::Priority => self.dir == SortDir::Asc,
            _ => self.dir == SortDir::Desc,
        };
        if flip { base.reverse() } else { base }
    }
}

// A task without a due date sorts after every dated one, as if due in the
// far future.
fn cmp_due(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The full filter state: search text, priority, status, category and sort
/// specifier. Unset clauses match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub search: Option<String>,
    pub priority: Option<Priority>,
    pub status: StatusFilter,
    pub category: Option<String>,
    pub sort: Option<SortSpec>,
}

impl FilterSpec {
    pub fn matches(&self, task: &Task) -> bool {
        let search_ok = self
            .search
            .as_deref()
            .is_none_or(|needle| task.text.to_lowercase().contains(&needle.to_lowercase()));
        let priority_ok = self.priority.is_none_or(|wanted| task.priority == wanted);
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Incomplete => !task.completed,
        };
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|wanted| task.category.as_deref() == Some(wanted));

        search_ok && priority_ok && status_ok && category_ok
    }

    /// Update one clause from a `key:value` token. The sentinel value `all`
    /// (or an empty value) clears the clause.
    pub fn apply_mod(&mut self, token: &str) -> anyhow::Result<()> {
        let (key, value) = token
            .split_once(':')
            .ok_or_else(|| anyhow!("invalid filter '{token}' (expected key:value)"))?;
        let cleared = value.is_empty() || value.eq_ignore_ascii_case("all");

        match key {
            "text" | "search" => {
                self.search = (!cleared).then(|| value.to_string());
            }
            "pri" | "priority" => {
                self.priority = if cleared { None } else { Some(value.parse()?) };
            }
            "status" => {
                self.status = StatusFilter::parse(value)?;
            }
            "cat" | "category" => {
                self.category = (!cleared).then(|| value.to_string());
            }
            "sort" => {
                self.sort = if cleared || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(SortSpec::parse(value)?)
                };
            }
            other => bail!("unknown filter key '{other}'"),
        }
        Ok(())
    }
}

/// Keep the tasks matching every clause of the spec, in input order.
pub fn filter_tasks<'a>(tasks: &'a [Task], spec: &FilterSpec) -> Vec<&'a Task> {
    tasks.iter().filter(|task| spec.matches(task)).collect()
}

/// Filter, then sort when a specifier is present. `sort_by` is stable, so
/// ties keep their input order.
pub fn process<'a>(tasks: &'a [Task], spec: &FilterSpec) -> Vec<&'a Task> {
    let mut out = filter_tasks(tasks, spec);
    if let Some(sort) = spec.sort {
        out.sort_by(|a, b| sort.compare(a, b));
    }
    trace!(total = tasks.len(), kept = out.len(), "processed task list");
    out
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{FilterSpec, SortDir, SortKey, SortSpec, StatusFilter, filter_tasks, process};
    use crate::task::{Priority, Task};

    fn task(text: &str, priority: Priority, minute: u32) -> Task {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, minute, 0).single().expect("timestamp");
        Task::new(text.to_string(), priority, None, None, None, now)
    }

    fn date(text: &str) -> NaiveDate {
        text.parse().expect("date")
    }

    #[test]
    fn empty_spec_is_identity() {
        let tasks = vec![
            task("a", Priority::Low, 0),
            task("b", Priority::High, 1),
            task("c", Priority::Medium, 2),
        ];
        let kept = filter_tasks(&tasks, &FilterSpec::default());
        let ids: Vec<_> = kept.iter().map(|t| t.id).collect();
        let expected: Vec<_> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let tasks = vec![task("Buy Milk", Priority::Low, 0), task("rent", Priority::Low, 1)];
        let spec = FilterSpec {
            search: Some("milk".to_string()),
            ..FilterSpec::default()
        };
        let kept = filter_tasks(&tasks, &spec);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "Buy Milk");
    }

    #[test]
    fn status_and_priority_and_category_clauses() {
        let mut done = task("done", Priority::High, 0);
        done.completed = true;
        done.category = Some("work".to_string());
        let open = task("open", Priority::Low, 1);

        let tasks = vec![done, open];

        let spec = FilterSpec {
            status: StatusFilter::Completed,
            ..FilterSpec::default()
        };
        assert_eq!(filter_tasks(&tasks, &spec).len(), 1);

        let spec = FilterSpec {
            status: StatusFilter::Incomplete,
            ..FilterSpec::default()
        };
        assert_eq!(filter_tasks(&tasks, &spec)[0].text, "open");

        let spec = FilterSpec {
            priority: Some(Priority::High),
            ..FilterSpec::default()
        };
        assert_eq!(filter_tasks(&tasks, &spec)[0].text, "done");

        let spec = FilterSpec {
            category: Some("work".to_string()),
            ..FilterSpec::default()
        };
        assert_eq!(filter_tasks(&tasks, &spec)[0].text, "done");
    }

    #[test]
    fn priority_asc_puts_low_first_and_unknown_last() {
        let tasks = vec![
            task("medium", Priority::Medium, 0),
            task("unknown", Priority::Unknown, 1),
            task("high", Priority::High, 2),
            task("low", Priority::Low, 3),
        ];
        let spec = FilterSpec {
            sort: Some(SortSpec::parse("priority-asc").expect("sort")),
            ..FilterSpec::default()
        };
        let texts: Vec<_> = process(&tasks, &spec).iter().map(|t| t.text.clone()).collect();
        assert_eq!(texts, vec!["unknown", "low", "medium", "high"]);
    }

    #[test]
    fn priority_directions_reverse_each_other() {
        let tasks = vec![
            task("low", Priority::Low, 0),
            task("high", Priority::High, 1),
            task("medium", Priority::Medium, 2),
        ];
        let asc = FilterSpec {
            sort: Some(SortSpec::parse("priority-asc").expect("sort")),
            ..FilterSpec::default()
        };
        let desc = FilterSpec {
            sort: Some(SortSpec::parse("priority-desc").expect("sort")),
            ..FilterSpec::default()
        };
        let up: Vec<_> = process(&tasks, &asc).iter().map(|t| t.id).collect();
        let mut down: Vec<_> = process(&tasks, &desc).iter().map(|t| t.id).collect();
        down.reverse();
        assert_eq!(up, down);
    }

    #[test]
    fn due_date_sorts_missing_last() {
        let mut with_due = task("due", Priority::Low, 0);
        with_due.end_date = Some(date("2024-02-01"));
        let without = task("no due", Priority::Low, 1);

        let tasks = vec![without, with_due];
        let spec = FilterSpec {
            sort: Some(SortSpec::parse("dueDate-asc").expect("sort")),
            ..FilterSpec::default()
        };
        let texts: Vec<_> = process(&tasks, &spec).iter().map(|t| t.text.clone()).collect();
        assert_eq!(texts, vec!["due", "no due"]);
    }

    #[test]
    fn status_sort_puts_incomplete_first() {
        let mut done = task("done", Priority::Low, 0);
        done.completed = true;
        let open = task("open", Priority::Low, 1);

        let tasks = vec![done, open];
        let spec = FilterSpec {
            sort: Some(SortSpec {
                key: SortKey::Status,
                dir: SortDir::Asc,
            }),
            ..FilterSpec::default()
        };
        let texts: Vec<_> = process(&tasks, &spec).iter().map(|t| t.text.clone()).collect();
        assert_eq!(texts, vec!["open", "done"]);
    }

    #[test]
    fn date_created_sort_follows_creation_order() {
        let tasks = vec![
            task("second", Priority::Low, 10),
            task("first", Priority::Low, 0),
        ];
        let spec = FilterSpec {
            sort: Some(SortSpec::parse("dateCreated-asc").expect("sort")),
            ..FilterSpec::default()
        };
        let texts: Vec<_> = process(&tasks, &spec).iter().map(|t| t.text.clone()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn sort_ties_keep_input_order() {
        let tasks = vec![
            task("one", Priority::Medium, 0),
            task("two", Priority::Medium, 0),
            task("three", Priority::Medium, 0),
        ];
        let spec = FilterSpec {
            sort: Some(SortSpec::parse("priority-desc").expect("sort")),
            ..FilterSpec::default()
        };
        let texts: Vec<_> = process(&tasks, &spec).iter().map(|t| t.text.clone()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn apply_mod_updates_and_clears_clauses() {
        let mut spec = FilterSpec::default();
        spec.apply_mod("pri:high").expect("set priority");
        assert_eq!(spec.priority, Some(Priority::High));

        spec.apply_mod("status:completed").expect("set status");
        assert_eq!(spec.status, StatusFilter::Completed);

        spec.apply_mod("pri:all").expect("clear priority");
        assert_eq!(spec.priority, None);

        spec.apply_mod("sort:priority-desc").expect("set sort");
        assert_eq!(
            spec.sort,
            Some(SortSpec {
                key: SortKey::Priority,
                dir: SortDir::Desc,
            })
        );
        spec.apply_mod("sort:none").expect("clear sort");
        assert_eq!(spec.sort, None);

        assert!(spec.apply_mod("bogus:1").is_err());
        assert!(spec.apply_mod("noseparator").is_err());
    }
}
