use std::io::Write;

use anyhow::anyhow;
use chrono::{DateTime, Local, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::filter::FilterSpec;
use crate::form::TaskDraft;
use crate::i18n::{Catalog, Locale};
use crate::sanitize::sanitize;
use crate::store::TaskStore;
use crate::task::{self, Task};
use crate::view::{ListView, RenderContext, Theme};

/// Blocking user dialogs, injected so flows that ask questions stay
/// testable without a terminal. `prompt` returns `None` when cancelled.
pub trait Interaction {
    fn confirm(&mut self, message: &str) -> bool;
    fn prompt(&mut self, message: &str, initial: &str) -> Option<String>;
}

/// The controller: sole owner of the canonical task vector. Views and the
/// shell request mutations here; every mutation persists, recomputes the
/// category list and leaves the next render to pick up the new state.
pub struct App {
    store: TaskStore,
    tasks: Vec<Task>,
    categories: Vec<String>,
    filters: FilterSpec,
    view: ListView,
    locale: Locale,
    theme: Theme,
    page_ids: Vec<Uuid>,
}

impl App {
    #[instrument(skip(store, cfg))]
    pub fn open(store: TaskStore, cfg: &Config, color: bool) -> anyhow::Result<Self> {
        let tasks = store.load_tasks()?;
        let theme = store.load_theme()?;
        let locale = match store.load_locale()? {
            Some(locale) => locale,
            None => cfg
                .get("default.locale")
                .and_then(|code| Locale::from_code(&code))
                .unwrap_or_default(),
        };
        let page_size = cfg
            .get_usize("page.size")
            .filter(|size| *size > 0)
            .unwrap_or(10);
        let categories = task::distinct_categories(&tasks);

        info!(
            count = tasks.len(),
            locale = locale.code(),
            theme = theme.flag(),
            "loaded application state"
        );

        Ok(Self {
            store,
            tasks,
            categories,
            filters: FilterSpec::default(),
            view: ListView::new(page_size, color),
            locale,
            theme,
            page_ids: Vec::new(),
        })
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.locale)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterSpec) {
        debug!(?filters, "filters changed");
        self.filters = filters;
    }

    pub fn set_page(&mut self, page: usize) {
        self.view.set_page(page);
    }

    pub fn task(&self, id: Uuid) -> anyhow::Result<&Task> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or_else(|| anyhow!("task not found: {id}"))
    }

    /// Map a 1-based row number on the most recently rendered page back to
    /// a task id. Row numbers go stale on every mutation; the ids do not.
    pub fn resolve_row(&self, row: usize) -> Option<Uuid> {
        self.page_ids.get(row.checked_sub(1)?).copied()
    }

    #[instrument(skip_all)]
    pub fn render<W: Write>(&mut self, out: &mut W) -> anyhow::Result<()> {
        let ctx = RenderContext {
            catalog: self.catalog(),
            theme: self.theme,
            today: Local::now().date_naive(),
        };
        self.page_ids = self.view.render(out, &self.tasks, &self.filters, &ctx)?;
        Ok(())
    }

    #[instrument(skip(self, draft))]
    pub fn add_task(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> anyhow::Result<()> {
        let task = draft.build(now)?;
        debug!(id = %task.id, "task added");
        self.tasks.push(task);
        self.commit()
    }

    #[instrument(skip(self))]
    pub fn toggle_status(&mut self, id: Uuid) -> anyhow::Result<()> {
        let task = self.find_mut(id)?;
        task.completed = !task.completed;
        debug!(completed = task.completed, "status toggled");
        self.commit()
    }

    #[instrument(skip(self, draft))]
    pub fn edit_task(&mut self, id: Uuid, draft: TaskDraft) -> anyhow::Result<()> {
        let task = self.find_mut(id)?;
        draft.apply_to(task)?;
        self.commit()
    }

    /// Prompt for a replacement category. Cancelling leaves everything
    /// untouched; an answer that sanitizes to nothing clears the category.
    /// Returns whether anything was changed.
    #[instrument(skip(self, interaction))]
    pub fn edit_category(
        &mut self,
        id: Uuid,
        interaction: &mut dyn Interaction,
    ) -> anyhow::Result<bool> {
        let message = self.catalog().text("prompt.category");
        let current = self.task(id)?.category.clone().unwrap_or_default();

        let Some(reply) = interaction.prompt(message, &current) else {
            debug!("category edit cancelled");
            return Ok(false);
        };

        let clean = sanitize(&reply);
        let task = self.find_mut(id)?;
        task.category = (!clean.is_empty()).then_some(clean);
        self.commit()?;
        Ok(true)
    }

    /// Delete after an explicit confirmation. Returns whether the task was
    /// removed.
    #[instrument(skip(self, interaction))]
    pub fn delete_task(
        &mut self,
        id: Uuid,
        interaction: &mut dyn Interaction,
    ) -> anyhow::Result<bool> {
        if !interaction.confirm(self.catalog().text("confirm.delete")) {
            debug!("delete declined");
            return Ok(false);
        }

        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| anyhow!("task not found: {id}"))?;
        self.tasks.remove(index);
        self.commit()?;
        Ok(true)
    }

    #[instrument(skip(self))]
    pub fn toggle_theme(&mut self) -> anyhow::Result<()> {
        self.theme = self.theme.toggled();
        self.store.save_theme(self.theme)
    }

    #[instrument(skip(self))]
    pub fn toggle_locale(&mut self) -> anyhow::Result<()> {
        self.locale = self.locale.toggled();
        self.store.save_locale(self.locale)
    }

    fn find_mut(&mut self, id: Uuid) -> anyhow::Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| anyhow!("task not found: {id}"))
    }

    // Persist, then refresh everything derived from the task vector.
    fn commit(&mut self) -> anyhow::Result<()> {
        self.store.save_tasks(&self.tasks)?;
        self.categories = task::distinct_categories(&self.tasks);
        Ok(())
    }
}
