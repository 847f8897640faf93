use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::file::{DiskFile, FileHandle, scan_vault};
use crate::io::logger::{Logger, tracing_logger};
use crate::model::config::Settings;
use crate::model::todo::{AttributeValue, TodoItem, TodoStatus};
use crate::ops::commands::LineCommands;
use crate::ops::file_ops::FileOperations;
use crate::ops::index::TodoIndex;
use crate::ops::matcher::TodoMatcher;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs to know about the vault it runs against
struct Context {
    vault: PathBuf,
    settings: Settings,
    logger: Arc<dyn Logger>,
    json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn dispatch(cli: Cli) -> CmdResult {
    let vault = resolve_vault(cli.vault.as_deref())?;
    let settings = match cli.config.as_deref() {
        Some(path) => config_io::load_settings(Path::new(path))?,
        None => config_io::find_settings(&vault)?,
    };
    let ctx = Context {
        vault,
        settings,
        logger: tracing_logger(),
        json: cli.json,
    };

    match cli.command {
        Commands::List(args) => cmd_list(&ctx, args).await,
        Commands::Status(args) => cmd_status(&ctx, args).await,
        Commands::Set(args) => cmd_set(&ctx, args).await,
        Commands::Unset(args) => cmd_unset(&ctx, args).await,
        Commands::CompleteLine(args) => cmd_complete_line(&ctx, args).await,
        Commands::Toggle(args) => cmd_toggle(&ctx, args).await,
        Commands::Check(args) => cmd_check(&ctx, args).await,
        Commands::Ongoing(args) => cmd_ongoing(&ctx, args).await,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_vault(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve vault path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

fn file_operations(ctx: &Context) -> FileOperations {
    FileOperations::new(&ctx.settings, ctx.logger.clone())
}

fn line_commands(ctx: &Context) -> LineCommands {
    LineCommands::new(&ctx.settings, ctx.logger.clone())
}

/// Apply a line command to the target line and print the result
async fn edit_line<F>(ctx: &Context, target: &LineArgs, edit: F) -> CmdResult
where
    F: FnOnce(&str) -> String,
{
    let file = open_file(ctx, target)?;
    file_operations(ctx)
        .update_line(&file, target.line, edit)
        .await?;
    report_line(ctx, target).await
}

fn open_file(ctx: &Context, target: &LineArgs) -> Result<FileHandle, Box<dyn std::error::Error>> {
    let file = DiskFile::new(&ctx.vault, target.file.as_str());
    if !file.full_path().is_file() {
        return Err(format!("file not found: {}", target.file).into());
    }
    Ok(file.handle())
}

async fn read_line(file: &FileHandle, line: usize) -> Result<String, Box<dyn std::error::Error>> {
    let content = file.content().await?;
    content
        .split('\n')
        .nth(line)
        .map(|raw| raw.trim_end_matches('\r').to_string())
        .ok_or_else(|| format!("line {} is out of range in {}", line, file.id()).into())
}

/// The todo on the target line, stamped with its file
async fn load_todo(ctx: &Context, target: &LineArgs) -> Result<TodoItem, Box<dyn std::error::Error>> {
    let file = open_file(ctx, target)?;
    let raw = read_line(&file, target.line).await?;
    let ops = file_operations(ctx);
    let mut todo = ops
        .line_operations()
        .to_todo(&raw, target.line)
        .todo
        .ok_or_else(|| format!("line {} of {} is not a todo", target.line, target.file))?;
    todo.file = Some(file);
    Ok(todo)
}

/// Print the target line as it now reads on disk
async fn report_line(ctx: &Context, target: &LineArgs) -> CmdResult {
    let file = open_file(ctx, target)?;
    let content = read_line(&file, target.line).await?;
    if ctx.json {
        let change = LineChangeJson {
            file: file.id(),
            line: target.line,
            content,
        };
        println!("{}", serde_json::to_string_pretty(&change)?);
    } else {
        println!("{}", content);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

async fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let status_filter = args
        .status
        .as_deref()
        .map(str::parse::<TodoStatus>)
        .transpose()?;
    let matcher = TodoMatcher::new(args.search.as_deref().unwrap_or(""), args.fuzzy);

    let mut index = TodoIndex::new(&ctx.settings, ctx.logger.clone());
    index.files_loaded(scan_vault(&ctx.vault)).await?;

    let mut todos: Vec<TodoItem> = index
        .todos()
        .into_iter()
        .filter(|todo| status_filter.is_none_or(|status| todo.status == status))
        .filter(|todo| matcher.matches_tree(todo))
        .collect();
    todos.sort_by_key(|todo| todo.status.sort_rank());

    if ctx.json {
        let results: Vec<TodoJson> = todos.iter().map(todo_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for todo in &todos {
            for line in format_todo_tree(todo, 0) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

async fn cmd_status(ctx: &Context, args: StatusArgs) -> CmdResult {
    let status: TodoStatus = args.status.parse()?;
    let mut todo = load_todo(ctx, &args.target).await?;
    todo.status = status;
    file_operations(ctx)
        .update_todo_status(&todo, &ctx.settings.completed_date_attribute)
        .await?;
    report_line(ctx, &args.target).await
}

async fn cmd_set(ctx: &Context, args: SetArgs) -> CmdResult {
    let todo = load_todo(ctx, &args.target).await?;
    let value = match args.value {
        Some(value) => AttributeValue::Text(value),
        None => AttributeValue::Flag,
    };
    file_operations(ctx)
        .update_attribute(&todo, &args.name, value)
        .await?;
    report_line(ctx, &args.target).await
}

async fn cmd_unset(ctx: &Context, args: UnsetArgs) -> CmdResult {
    let todo = load_todo(ctx, &args.target).await?;
    file_operations(ctx)
        .remove_attribute(&todo, &args.name)
        .await?;
    report_line(ctx, &args.target).await
}

async fn cmd_complete_line(ctx: &Context, args: LineArgs) -> CmdResult {
    let commands = line_commands(ctx);
    edit_line(ctx, &args, |raw| commands.complete_line(raw)).await
}

async fn cmd_toggle(ctx: &Context, args: LineArgs) -> CmdResult {
    let commands = line_commands(ctx);
    edit_line(ctx, &args, |raw| commands.line_operations().toggle_todo(raw)).await
}

async fn cmd_check(ctx: &Context, args: LineArgs) -> CmdResult {
    let commands = line_commands(ctx);
    edit_line(ctx, &args, |raw| commands.toggle_checked(raw)).await
}

async fn cmd_ongoing(ctx: &Context, args: LineArgs) -> CmdResult {
    let commands = line_commands(ctx);
    edit_line(ctx, &args, |raw| commands.toggle_ongoing(raw)).await
}
