use std::io::Write;

use chrono::NaiveDate;
use tracing::debug;
use unicode_width::UnicodeWidthStr;
use uuid::Uuid;

use crate::filter::{FilterSpec, process};
use crate::i18n::Catalog;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Earlier versions persisted the dark flag as a plain boolean string.
    pub fn from_flag(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" | "true" | "on" | "1" => Self::Dark,
            _ => Self::Light,
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::Light => "theme.light",
            Self::Dark => "theme.dark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Overdue,
    DueSoon,
    Normal,
}

/// Classify a due date against today at local midnight: strictly past is
/// overdue, today through two days out is due-soon, anything later is
/// normal. Tasks without an end date have no classification at all.
pub fn due_status(end_date: Option<NaiveDate>, today: NaiveDate) -> Option<DueStatus> {
    let end = end_date?;
    let days = (end - today).num_days();
    Some(if days < 0 {
        DueStatus::Overdue
    } else if days <= 2 {
        DueStatus::DueSoon
    } else {
        DueStatus::Normal
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    pub start: usize,
    pub end: usize,
    pub page: usize,
    pub pages: usize,
}

/// 1-based pagination over `total` items. An out-of-range request clamps to
/// the nearest valid page instead of producing an empty slice.
pub fn page_bounds(total: usize, page_size: usize, requested: usize) -> PageBounds {
    let pages = total.div_ceil(page_size).max(1);
    let page = requested.clamp(1, pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total);
    PageBounds {
        start,
        end,
        page,
        pages,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub catalog: Catalog,
    pub theme: Theme,
    pub today: NaiveDate,
}

struct Palette {
    high: &'static str,
    medium: &'static str,
    low: &'static str,
    neutral: &'static str,
    overdue: &'static str,
    due_soon: &'static str,
    done: &'static str,
    current_page: &'static str,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            high: "31",
            medium: "33",
            low: "32",
            neutral: "90",
            overdue: "31",
            due_soon: "33",
            done: "2;9",
            current_page: "7",
        },
        Theme::Dark => Palette {
            high: "91",
            medium: "93",
            low: "92",
            neutral: "37",
            overdue: "91",
            due_soon: "93",
            done: "2;9",
            current_page: "7",
        },
    }
}

struct Cell {
    plain: String,
    painted: String,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        let plain = text.into();
        let painted = plain.clone();
        Self { plain, painted }
    }
}

/// Renders one page of the filtered, sorted task list. Owns the pagination
/// cursor; everything else comes in per render call.
#[derive(Debug)]
pub struct ListView {
    page_size: usize,
    page: usize,
    color: bool,
}

impl ListView {
    pub fn new(page_size: usize, color: bool) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
            color,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Move the cursor. The value is clamped into range on the next render,
    /// so jumping past the end lands on the last page.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Filter, sort, paginate and print one page. Returns the ids of the
    /// rendered rows in display order so callers can resolve a row number
    /// back to a task.
    #[tracing::instrument(skip_all)]
    pub fn render<W: Write>(
        &mut self,
        out: &mut W,
        tasks: &[Task],
        spec: &FilterSpec,
        ctx: &RenderContext,
    ) -> anyhow::Result<Vec<Uuid>> {
        let visible = process(tasks, spec);
        let bounds = page_bounds(visible.len(), self.page_size, self.page);
        self.page = bounds.page;
        let slice = &visible[bounds.start..bounds.end];

        debug!(
            total = tasks.len(),
            visible = visible.len(),
            page = bounds.page,
            pages = bounds.pages,
            "rendering task list"
        );

        if slice.is_empty() {
            writeln!(out, "{}", ctx.catalog.text("list.empty"))?;
            return Ok(Vec::new());
        }

        let colors = palette(ctx.theme);
        let headers = vec![
            Cell::plain("#"),
            Cell::plain(""),
            Cell::plain(ctx.catalog.text("header.task")),
            Cell::plain(ctx.catalog.text("header.priority")),
            Cell::plain(ctx.catalog.text("header.dates")),
            Cell::plain(ctx.catalog.text("header.due")),
            Cell::plain(ctx.catalog.text("header.category")),
        ];

        let mut rows = Vec::with_capacity(slice.len());
        for (offset, task) in slice.iter().enumerate() {
            rows.push(self.build_row(offset + 1, task, ctx, &colors));
        }

        write_table(out, &headers, &rows)?;

        if bounds.pages > 1 {
            let mut numbers = Vec::with_capacity(bounds.pages);
            for page in 1..=bounds.pages {
                if page == bounds.page {
                    numbers.push(self.paint(&format!("[{page}]"), colors.current_page));
                } else {
                    numbers.push(page.to_string());
                }
            }
            writeln!(
                out,
                "{} {}/{}  {}",
                ctx.catalog.text("list.page"),
                bounds.page,
                bounds.pages,
                numbers.join(" ")
            )?;
        }

        Ok(slice.iter().map(|task| task.id).collect())
    }

    fn build_row(&self, number: usize, task: &Task, ctx: &RenderContext, colors: &Palette) -> Vec<Cell> {
        let status = due_status(task.end_date, ctx.today);

        let mark = if task.completed { "[x]" } else { "[ ]" };

        let text = if task.completed {
            Cell {
                plain: task.text.clone(),
                painted: self.paint(&task.text, colors.done),
            }
        } else {
            // Urgent rows carry a colored edge accent, like the list's
            // left-border highlight.
            match status {
                Some(DueStatus::Overdue) => self.accented(&task.text, colors.overdue),
                Some(DueStatus::DueSoon) => self.accented(&task.text, colors.due_soon),
                _ => Cell::plain(task.text.clone()),
            }
        };

        let priority_label = ctx.catalog.text(task.priority.label_key());
        let priority_code = match task.priority.weight() {
            3 => colors.high,
            2 => colors.medium,
            1 => colors.low,
            _ => colors.neutral,
        };
        let priority = Cell {
            plain: priority_label.to_string(),
            painted: self.paint(priority_label, priority_code),
        };

        let dates = Cell::plain(format_date_range(task.start_date, task.end_date));

        // The badge sticks around on completed tasks; only the accent goes.
        let due = match status {
            Some(DueStatus::Overdue) => {
                let label = ctx.catalog.text("badge.overdue");
                Cell {
                    plain: label.to_string(),
                    painted: self.paint(label, colors.overdue),
                }
            }
            Some(DueStatus::DueSoon) => {
                let label = ctx.catalog.text("badge.due_soon");
                Cell {
                    plain: label.to_string(),
                    painted: self.paint(label, colors.due_soon),
                }
            }
            _ => Cell::plain(""),
        };

        let category = match task.category.as_deref() {
            Some(name) => Cell::plain(name),
            None => {
                let label = ctx.catalog.text("category.none");
                Cell {
                    plain: label.to_string(),
                    painted: self.paint(label, colors.neutral),
                }
            }
        };

        vec![
            Cell::plain(number.to_string()),
            Cell::plain(mark),
            text,
            priority,
            dates,
            due,
            category,
        ]
    }

    fn accented(&self, text: &str, code: &'static str) -> Cell {
        Cell {
            plain: format!("▌ {text}"),
            painted: format!("{} {text}", self.paint("▌", code)),
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn format_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    match (start, end) {
        (Some(start), Some(end)) => format!("{start} – {end}"),
        (Some(start), None) => format!("{start} –"),
        (None, Some(end)) => format!("– {end}"),
        (None, None) => "-".to_string(),
    }
}

// Column widths come from the unpainted text, so escape sequences never
// skew the layout.
fn write_table<W: Write>(out: &mut W, headers: &[Cell], rows: &[Vec<Cell>]) -> anyhow::Result<()> {
    let columns = headers.len();
    let mut widths = vec![0usize; columns];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.plain.as_str()));
    }
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(cell.plain.as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write_cell(out, header, widths[idx])?;
    }
    writeln!(out)?;

    for &width in &widths {
        write!(out, "{:-<width$} ", "", width = width)?;
    }
    writeln!(out)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            write_cell(out, cell, widths[idx])?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_cell<W: Write>(out: &mut W, cell: &Cell, width: usize) -> anyhow::Result<()> {
    let visible = UnicodeWidthStr::width(cell.plain.as_str());
    let padding = width.saturating_sub(visible);
    write!(out, "{}{} ", cell.painted, " ".repeat(padding))?;
    Ok(())
}
