use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::i18n::Locale;
use crate::task::Task;
use crate::view::Theme;

/// On-disk state, one file per storage key: the serialized task array plus
/// the two presentation flags.
#[derive(Debug)]
pub struct TaskStore {
    pub data_dir: PathBuf,
    tasks_path: PathBuf,
    theme_path: PathBuf,
    locale_path: PathBuf,
}

impl TaskStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join("tasks.json");
        let theme_path = data_dir.join("theme.data");
        let locale_path = data_dir.join("locale.data");

        if !tasks_path.exists() {
            fs::write(&tasks_path, "[]\n")
                .with_context(|| format!("failed to seed {}", tasks_path.display()))?;
        }

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            "opened task store"
        );

        Ok(Self {
            data_dir,
            tasks_path,
            theme_path,
            locale_path,
        })
    }

    /// Load the full task array. Malformed content is not an error: the
    /// store falls back to an empty list and the next save overwrites it.
    #[tracing::instrument(skip(self))]
    pub fn load_tasks(&self) -> anyhow::Result<Vec<Task>> {
        let raw = fs::read_to_string(&self.tasks_path)
            .with_context(|| format!("failed reading {}", self.tasks_path.display()))?;

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded tasks");
                Ok(tasks)
            }
            Err(err) => {
                warn!(
                    file = %self.tasks_path.display(),
                    error = %err,
                    "malformed task data, starting with an empty list"
                );
                Ok(Vec::new())
            }
        }
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()> {
        debug!(count = tasks.len(), "saving tasks");
        let payload = serde_json::to_string_pretty(tasks)?;
        write_atomic(&self.tasks_path, &payload)
            .with_context(|| format!("failed to save {}", self.tasks_path.display()))
    }

    pub fn load_theme(&self) -> anyhow::Result<Theme> {
        Ok(read_key(&self.theme_path)?
            .map(|raw| Theme::from_flag(&raw))
            .unwrap_or_default())
    }

    #[tracing::instrument(skip(self))]
    pub fn save_theme(&self, theme: Theme) -> anyhow::Result<()> {
        fs::write(&self.theme_path, theme.flag())
            .with_context(|| format!("failed writing {}", self.theme_path.display()))
    }

    pub fn load_locale(&self) -> anyhow::Result<Option<Locale>> {
        let Some(raw) = read_key(&self.locale_path)? else {
            return Ok(None);
        };
        let locale = Locale::from_code(&raw);
        if locale.is_none() {
            warn!(code = %raw, "unrecognized locale code, falling back to default");
        }
        Ok(locale)
    }

    #[tracing::instrument(skip(self))]
    pub fn save_locale(&self, locale: Locale) -> anyhow::Result<()> {
        fs::write(&self.locale_path, locale.code())
            .with_context(|| format!("failed writing {}", self.locale_path.display()))
    }
}

fn read_key(path: &Path) -> anyhow::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn write_atomic(path: &Path, payload: &str) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(payload.as_bytes())?;
    writeln!(temp)?;
    temp.flush()?;
    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::TaskStore;
    use crate::i18n::Locale;
    use crate::task::{Priority, Task};
    use crate::view::Theme;

    #[test]
    fn fresh_store_loads_empty() {
        let temp = tempdir().expect("tempdir");
        let store = TaskStore::open(temp.path()).expect("open store");
        assert!(store.load_tasks().expect("load").is_empty());
        assert_eq!(store.load_theme().expect("theme"), Theme::Light);
        assert_eq!(store.load_locale().expect("locale"), None);
    }

    #[test]
    fn tasks_round_trip_with_all_fields() {
        let temp = tempdir().expect("tempdir");
        let store = TaskStore::open(temp.path()).expect("open store");

        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).single().expect("timestamp");
        let mut task = Task::new(
            "water the plants".to_string(),
            Priority::High,
            Some("2024-01-01".parse().expect("date")),
            Some("2024-01-10".parse().expect("date")),
            Some("home".to_string()),
            now,
        );
        task.completed = true;

        store.save_tasks(&[task.clone()]).expect("save");
        let loaded = store.load_tasks().expect("load");

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, task.id);
        assert_eq!(loaded[0].text, task.text);
        assert_eq!(loaded[0].priority, task.priority);
        assert_eq!(loaded[0].start_date, task.start_date);
        assert_eq!(loaded[0].end_date, task.end_date);
        assert_eq!(loaded[0].category, task.category);
        assert!(loaded[0].completed);
        assert_eq!(loaded[0].created_at, task.created_at);
    }

    #[test]
    fn corrupted_task_file_loads_as_empty() {
        let temp = tempdir().expect("tempdir");
        let store = TaskStore::open(temp.path()).expect("open store");
        std::fs::write(temp.path().join("tasks.json"), "{not json").expect("corrupt");
        assert!(store.load_tasks().expect("load").is_empty());
    }

    #[test]
    fn theme_and_locale_round_trip() {
        let temp = tempdir().expect("tempdir");
        let store = TaskStore::open(temp.path()).expect("open store");

        store.save_theme(Theme::Dark).expect("save theme");
        assert_eq!(store.load_theme().expect("theme"), Theme::Dark);

        store.save_locale(Locale::Vi).expect("save locale");
        assert_eq!(store.load_locale().expect("locale"), Some(Locale::Vi));

        std::fs::write(temp.path().join("locale.data"), "xx").expect("write");
        assert_eq!(store.load_locale().expect("locale"), None);
    }

    #[test]
    fn legacy_boolean_theme_flag_still_parses() {
        let temp = tempdir().expect("tempdir");
        let store = TaskStore::open(temp.path()).expect("open store");
        std::fs::write(temp.path().join("theme.data"), "true").expect("write");
        assert_eq!(store.load_theme().expect("theme"), Theme::Dark);
    }
}
