use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use medvault_core::VERSION;

/// Medvault - encrypted clinical records with role-filtered access
#[derive(Parser)]
#[command(name = "medvault")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "MEDVAULT_CONFIG")]
    pub config: Option<String>,

    /// Subject id to sign in as (omit for privileged access)
    #[arg(short, long, global = true, env = "MEDVAULT_SUBJECT")]
    pub subject: Option<String>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a template config file
    InitConfig(InitConfigArgs),

    /// List the records visible to this session
    List(ListArgs),

    /// Add a new record
    Add(AddArgs),

    /// Edit an existing record
    Edit(EditArgs),

    /// Attach a file to an existing record
    Attach(AttachArgs),

    /// Remove an attachment from a record
    Detach(DetachArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Backend {
    File,
    Sqlite,
}

/// Arguments for the `init-config` command
#[derive(Args)]
pub struct InitConfigArgs {
    /// Storage backend
    #[arg(long, value_enum, default_value_t = Backend::File)]
    pub backend: Backend,

    /// Store location (directory for `file`, database file for `sqlite`)
    #[arg(long)]
    pub store_path: Option<String>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Natural key of the record a command operates on
#[derive(Args)]
pub struct RecordKeyArgs {
    /// Patient (subject) id
    #[arg(long)]
    pub patient: String,

    /// Visit date (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    #[command(flatten)]
    pub key: RecordKeyArgs,

    #[arg(long, default_value = "")]
    pub diagnosis: String,

    #[arg(long, default_value = "")]
    pub prescription: String,

    #[arg(long, default_value = "")]
    pub notes: String,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub key: RecordKeyArgs,

    /// Move the record to another date
    #[arg(long)]
    pub new_date: Option<String>,

    #[arg(long)]
    pub diagnosis: Option<String>,

    #[arg(long)]
    pub prescription: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

/// Arguments for the `attach` command
#[derive(Args)]
pub struct AttachArgs {
    #[command(flatten)]
    pub key: RecordKeyArgs,

    /// File to attach
    #[arg(value_name = "FILE")]
    pub file: String,

    /// MIME type (guessed from the extension if omitted)
    #[arg(long)]
    pub mime: Option<String>,

    /// Display name (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for the `detach` command
#[derive(Args)]
pub struct DetachArgs {
    #[command(flatten)]
    pub key: RecordKeyArgs,

    /// Attachment id
    #[arg(value_name = "ID")]
    pub attachment_id: String,
}
