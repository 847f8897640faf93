use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tally", about = concat!("[x] tally v", env!("CARGO_PKG_VERSION"), " - the todos in your notes"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different vault directory
    #[arg(short = 'C', long = "vault", global = true)]
    pub vault: Option<String>,

    /// Settings file (default: <vault>/.tally.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the todos found in the vault
    List(ListArgs),
    /// Change a todo's status
    Status(StatusArgs),
    /// Set an attribute on a todo (a flag when no value is given)
    Set(SetArgs),
    /// Remove an attribute from a todo
    Unset(UnsetArgs),
    /// Expand shorthand attributes on a line (@today, @high, ...)
    CompleteLine(LineArgs),
    /// Turn a line into a todo, or a todo back into a plain line
    Toggle(LineArgs),
    /// Check a todo and stamp its completion date, or uncheck it
    Check(LineArgs),
    /// Mark a todo in progress and stamp its start date, or uncheck it
    Ongoing(LineArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter by status (todo, in-progress, attention-required, delegated, complete, canceled)
    #[arg(long)]
    pub status: Option<String>,
    /// Only todos whose text contains this term
    #[arg(long)]
    pub search: Option<String>,
    /// Match the search term fuzzily (characters in order)
    #[arg(long)]
    pub fuzzy: bool,
}

/// A line in a note: vault-relative path plus zero-based line number
#[derive(Args)]
pub struct LineArgs {
    /// Note path, relative to the vault
    pub file: String,
    /// Zero-based line number
    pub line: usize,
}

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: LineArgs,
    /// New status
    pub status: String,
}

#[derive(Args)]
pub struct SetArgs {
    #[command(flatten)]
    pub target: LineArgs,
    /// Attribute name
    pub name: String,
    /// Attribute value (omit for a flag)
    pub value: Option<String>,
}

#[derive(Args)]
pub struct UnsetArgs {
    #[command(flatten)]
    pub target: LineArgs,
    /// Attribute name
    pub name: String,
}
