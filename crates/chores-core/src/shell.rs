use std::io::{self, BufRead, Write};

use anyhow::anyhow;
use chrono::Utc;
use tracing::{debug, instrument};

use crate::app::{App, Interaction};
use crate::filter::FilterSpec;
use crate::form::{self, TaskDraft};
use crate::i18n::Catalog;
use crate::sanitize::sanitize;
use crate::task::Task;

const COMMANDS: &[&str] = &[
    "add",
    "categories",
    "category",
    "delete",
    "edit",
    "exit",
    "filter",
    "help",
    "lang",
    "list",
    "page",
    "quit",
    "search",
    "theme",
    "toggle",
];

/// Expand a possibly-abbreviated command word. Exact names win; otherwise
/// a prefix works when it is unambiguous.
pub fn expand_command_abbrev(token: &str) -> Option<&'static str> {
    if let Some(name) = COMMANDS.iter().copied().find(|name| *name == token) {
        return Some(name);
    }

    let mut matches = COMMANDS.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() { None } else { Some(first) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Add(Vec<String>),
    Toggle(usize),
    Edit(usize),
    EditCategory(usize),
    Delete(usize),
    Search(Option<String>),
    Filter(Vec<String>),
    Page(usize),
    Categories,
    Lang,
    Theme,
    Help,
    Quit,
}

pub fn parse_command(tokens: &[String]) -> anyhow::Result<Command> {
    let Some(first) = tokens.first() else {
        return Ok(Command::List);
    };
    let name = expand_command_abbrev(&first.to_ascii_lowercase())
        .ok_or_else(|| anyhow!("unknown command: {first}"))?;
    let args = &tokens[1..];

    let command = match name {
        "list" => Command::List,
        "add" => Command::Add(args.to_vec()),
        "toggle" => Command::Toggle(parse_row(args)?),
        "edit" => Command::Edit(parse_row(args)?),
        "category" => Command::EditCategory(parse_row(args)?),
        "delete" => Command::Delete(parse_row(args)?),
        "search" => Command::Search((!args.is_empty()).then(|| args.join(" "))),
        "filter" => Command::Filter(args.to_vec()),
        "page" => Command::Page(parse_row(args)?),
        "categories" => Command::Categories,
        "lang" => Command::Lang,
        "theme" => Command::Theme,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(anyhow!("unknown command: {other}")),
    };
    Ok(command)
}

fn parse_row(args: &[String]) -> anyhow::Result<usize> {
    let token = args
        .first()
        .ok_or_else(|| anyhow!("expected a number argument"))?;
    let value: usize = token
        .parse()
        .map_err(|_| anyhow!("expected a number, got: {token}"))?;
    if value == 0 {
        return Err(anyhow!("numbers start at 1"));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Exit,
}

/// Execute one command against the controller. Commands that touch the
/// task list or the presentation end by re-rendering it.
#[instrument(skip(app, interaction, out))]
pub fn dispatch<W: Write>(
    app: &mut App,
    interaction: &mut dyn Interaction,
    out: &mut W,
    command: Command,
) -> anyhow::Result<Outcome> {
    let catalog = app.catalog();

    match command {
        Command::Quit => return Ok(Outcome::Exit),
        Command::Help => {
            writeln!(out, "{}", catalog.text("help.body"))?;
            return Ok(Outcome::Continue);
        }
        Command::Categories => {
            if app.categories().is_empty() {
                writeln!(out, "{}", catalog.text("msg.no_categories"))?;
            } else {
                for category in app.categories() {
                    writeln!(out, "{category}")?;
                }
            }
            return Ok(Outcome::Continue);
        }
        Command::List => {}
        Command::Add(args) => {
            let draft = if args.is_empty() {
                match collect_add_draft(out, interaction, catalog, app.categories())? {
                    Some(draft) => draft,
                    None => {
                        writeln!(out, "{}", catalog.text("msg.unchanged"))?;
                        return Ok(Outcome::Continue);
                    }
                }
            } else {
                form::parse_draft(&args)?
            };
            app.add_task(draft, Utc::now())?;
            writeln!(out, "{}", catalog.text("msg.added"))?;
        }
        Command::Toggle(row) => {
            let Some(id) = app.resolve_row(row) else {
                writeln!(out, "{}", catalog.text("msg.no_such_row"))?;
                return Ok(Outcome::Continue);
            };
            app.toggle_status(id)?;
            writeln!(out, "{}", catalog.text("msg.updated"))?;
        }
        Command::Edit(row) => {
            let Some(id) = app.resolve_row(row) else {
                writeln!(out, "{}", catalog.text("msg.no_such_row"))?;
                return Ok(Outcome::Continue);
            };
            let current = app.task(id)?.clone();
            match collect_edit_draft(out, interaction, catalog, &current)? {
                Some(draft) => {
                    app.edit_task(id, draft)?;
                    writeln!(out, "{}", catalog.text("msg.updated"))?;
                }
                None => {
                    writeln!(out, "{}", catalog.text("msg.unchanged"))?;
                    return Ok(Outcome::Continue);
                }
            }
        }
        Command::EditCategory(row) => {
            let Some(id) = app.resolve_row(row) else {
                writeln!(out, "{}", catalog.text("msg.no_such_row"))?;
                return Ok(Outcome::Continue);
            };
            let changed = app.edit_category(id, interaction)?;
            let key = if changed { "msg.updated" } else { "msg.unchanged" };
            writeln!(out, "{}", catalog.text(key))?;
        }
        Command::Delete(row) => {
            let Some(id) = app.resolve_row(row) else {
                writeln!(out, "{}", catalog.text("msg.no_such_row"))?;
                return Ok(Outcome::Continue);
            };
            let deleted = app.delete_task(id, interaction)?;
            let key = if deleted { "msg.deleted" } else { "msg.unchanged" };
            writeln!(out, "{}", catalog.text(key))?;
        }
        Command::Search(text) => {
            let mut filters = app.filters().clone();
            filters.search = text;
            app.set_filters(filters);
        }
        Command::Filter(tokens) => {
            if tokens.is_empty() {
                app.set_filters(FilterSpec::default());
            } else {
                let mut filters = app.filters().clone();
                for token in &tokens {
                    filters.apply_mod(token)?;
                }
                app.set_filters(filters);
            }
        }
        Command::Page(page) => {
            app.set_page(page);
        }
        Command::Lang => {
            app.toggle_locale()?;
            let catalog = app.catalog();
            writeln!(
                out,
                "{}: {}",
                catalog.text("msg.language"),
                app.locale().code()
            )?;
        }
        Command::Theme => {
            app.toggle_theme()?;
            writeln!(
                out,
                "{}: {}",
                catalog.text("msg.theme"),
                catalog.text(app.theme().label_key())
            )?;
        }
    }

    app.render(out)?;
    Ok(Outcome::Continue)
}

fn collect_add_draft<W: Write>(
    out: &mut W,
    interaction: &mut dyn Interaction,
    catalog: Catalog,
    categories: &[String],
) -> anyhow::Result<Option<TaskDraft>> {
    let mut draft = TaskDraft::default();

    loop {
        let Some(reply) = interaction.prompt(catalog.text("prompt.text"), "") else {
            return Ok(None);
        };
        if !sanitize(&reply).is_empty() {
            draft.text = reply;
            break;
        }
        writeln!(out, "{}", catalog.text("msg.text_required"))?;
    }

    loop {
        let Some(reply) = interaction.prompt(catalog.text("prompt.priority"), "low") else {
            return Ok(None);
        };
        let reply = reply.trim().to_string();
        if reply.is_empty() {
            break;
        }
        match reply.parse() {
            Ok(priority) => {
                draft.priority = Some(priority);
                break;
            }
            Err(_) => writeln!(out, "{}", catalog.text("msg.invalid_input"))?,
        }
    }

    match prompt_date(out, interaction, catalog, "prompt.start", "")? {
        DateReply::Cancelled => return Ok(None),
        DateReply::Keep | DateReply::Clear => {}
        DateReply::Value(date) => draft.start_date = Some(date),
    }
    match prompt_date(out, interaction, catalog, "prompt.end", "")? {
        DateReply::Cancelled => return Ok(None),
        DateReply::Keep | DateReply::Clear => {}
        DateReply::Value(date) => draft.end_date = Some(date),
    }

    let label = catalog.text("header.category");
    let message = if categories.is_empty() {
        label.to_string()
    } else {
        format!("{label} ({})", categories.join(", "))
    };
    let Some(reply) = interaction.prompt(&message, "") else {
        return Ok(None);
    };
    let reply = reply.trim();
    if !reply.is_empty() {
        draft.category = Some(reply.to_string());
    }

    Ok(Some(draft))
}

// Field-by-field editing, pre-filled with the current values: an empty
// reply keeps the field, `-` clears an optional one, cancelling any prompt
// abandons the whole edit.
fn collect_edit_draft<W: Write>(
    out: &mut W,
    interaction: &mut dyn Interaction,
    catalog: Catalog,
    current: &Task,
) -> anyhow::Result<Option<TaskDraft>> {
    let mut draft = TaskDraft::from_task(current);

    let Some(reply) = interaction.prompt(catalog.text("prompt.text"), &draft.text) else {
        return Ok(None);
    };
    if !reply.trim().is_empty() {
        draft.text = reply;
    }

    loop {
        let initial = current.priority.code();
        let Some(reply) = interaction.prompt(catalog.text("prompt.priority"), initial) else {
            return Ok(None);
        };
        let reply = reply.trim().to_string();
        if reply.is_empty() {
            break;
        }
        match reply.parse() {
            Ok(priority) => {
                draft.priority = Some(priority);
                break;
            }
            Err(_) => writeln!(out, "{}", catalog.text("msg.invalid_input"))?,
        }
    }

    let initial = draft
        .start_date
        .map(|date| date.to_string())
        .unwrap_or_default();
    match prompt_date(out, interaction, catalog, "prompt.start", &initial)? {
        DateReply::Cancelled => return Ok(None),
        DateReply::Keep => {}
        DateReply::Clear => draft.start_date = None,
        DateReply::Value(date) => draft.start_date = Some(date),
    }

    let initial = draft
        .end_date
        .map(|date| date.to_string())
        .unwrap_or_default();
    match prompt_date(out, interaction, catalog, "prompt.end", &initial)? {
        DateReply::Cancelled => return Ok(None),
        DateReply::Keep => {}
        DateReply::Clear => draft.end_date = None,
        DateReply::Value(date) => draft.end_date = Some(date),
    }

    let initial = draft.category.clone().unwrap_or_default();
    let Some(reply) = interaction.prompt(catalog.text("header.category"), &initial) else {
        return Ok(None);
    };
    let reply = reply.trim();
    if reply == "-" {
        draft.category = None;
    } else if !reply.is_empty() {
        draft.category = Some(reply.to_string());
    }

    Ok(Some(draft))
}

enum DateReply {
    Cancelled,
    Keep,
    Clear,
    Value(chrono::NaiveDate),
}

fn prompt_date<W: Write>(
    out: &mut W,
    interaction: &mut dyn Interaction,
    catalog: Catalog,
    key: &str,
    initial: &str,
) -> anyhow::Result<DateReply> {
    loop {
        let Some(reply) = interaction.prompt(catalog.text(key), initial) else {
            return Ok(DateReply::Cancelled);
        };
        let reply = reply.trim().to_string();
        if reply.is_empty() {
            return Ok(DateReply::Keep);
        }
        if reply == "-" {
            return Ok(DateReply::Clear);
        }
        match form::parse_date(&reply) {
            Ok(date) => return Ok(DateReply::Value(date)),
            Err(_) => writeln!(out, "{}", catalog.text("msg.invalid_input"))?,
        }
    }
}

/// Terminal implementation of the dialog surfaces. Cancelling is end-of-
/// input (ctrl-d).
pub struct StdinInteraction;

impl Interaction for StdinInteraction {
    fn confirm(&mut self, message: &str) -> bool {
        print!("{message} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        }
    }

    fn prompt(&mut self, message: &str, initial: &str) -> Option<String> {
        if initial.is_empty() {
            print!("{message}: ");
        } else {
            print!("{message} [{initial}]: ");
        }
        io::stdout().flush().ok()?;
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

/// The command loop standing in for the event loop: one command per turn,
/// each mutation completing (and persisting) before the next line is read.
pub fn run_interactive(app: &mut App) -> anyhow::Result<()> {
    let mut out = io::stdout();
    let mut interaction = StdinInteraction;

    app.render(&mut out)?;
    loop {
        write!(out, "chores> ")?;
        out.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            break;
        }
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            continue;
        }

        let result =
            parse_command(&tokens).and_then(|command| dispatch(app, &mut interaction, &mut out, command));
        match result {
            Ok(Outcome::Exit) => break,
            Ok(Outcome::Continue) => {}
            // Command failures are conversational, not fatal.
            Err(err) => writeln!(out, "error: {err:#}")?,
        }
    }

    debug!("leaving interactive shell");
    Ok(())
}

/// Execute a single command given on the command line and exit.
pub fn run_once(app: &mut App, tokens: &[String]) -> anyhow::Result<()> {
    let command = parse_command(tokens)?;
    let mut out = io::stdout();
    let mut interaction = StdinInteraction;
    dispatch(app, &mut interaction, &mut out, command)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Command, expand_command_abbrev, parse_command};

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn abbreviations_expand_when_unambiguous() {
        assert_eq!(expand_command_abbrev("li"), Some("list"));
        assert_eq!(expand_command_abbrev("a"), Some("add"));
        assert_eq!(expand_command_abbrev("dangling"), None);
        // "t" could be theme or toggle.
        assert_eq!(expand_command_abbrev("t"), None);
        // Exact names always win.
        assert_eq!(expand_command_abbrev("category"), Some("category"));
    }

    #[test]
    fn commands_parse_with_arguments() {
        assert_eq!(parse_command(&tokens(&[])).expect("parse"), Command::List);
        assert_eq!(
            parse_command(&tokens(&["add", "buy", "milk"])).expect("parse"),
            Command::Add(tokens(&["buy", "milk"]))
        );
        assert_eq!(
            parse_command(&tokens(&["toggle", "2"])).expect("parse"),
            Command::Toggle(2)
        );
        assert_eq!(
            parse_command(&tokens(&["search"])).expect("parse"),
            Command::Search(None)
        );
        assert_eq!(
            parse_command(&tokens(&["search", "milk", "run"])).expect("parse"),
            Command::Search(Some("milk run".to_string()))
        );
        assert_eq!(
            parse_command(&tokens(&["page", "3"])).expect("parse"),
            Command::Page(3)
        );
    }

    #[test]
    fn bad_rows_and_unknown_commands_are_rejected() {
        assert!(parse_command(&tokens(&["toggle"])).is_err());
        assert!(parse_command(&tokens(&["toggle", "zero"])).is_err());
        assert!(parse_command(&tokens(&["toggle", "0"])).is_err());
        assert!(parse_command(&tokens(&["frobnicate"])).is_err());
    }
}
