use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use uuid::Uuid;

/// Command-line arguments for the entrystore binary.
#[derive(Debug, Parser)]
#[command(name = "entrystore", version, about = "Multi-site entry store")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "ENTRYSTORE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    /// Site (tenant) every command operates on.
    #[arg(long, env = "ENTRYSTORE_SITE", value_name = "SITE", global = true)]
    pub site: Option<String>,

    #[command(flatten)]
    pub session: SessionArgs,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Identity used for mutating commands.
#[derive(Debug, Args, Default, Clone)]
pub struct SessionArgs {
    /// Person id recorded in the change log.
    #[arg(long = "as", value_name = "PERSON_ID", global = true)]
    pub person_id: Option<String>,

    /// Display name recorded in the change log.
    #[arg(long = "display-name", value_name = "NAME", global = true)]
    pub display_name: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the storage backend (postgres|document|memory).
    #[arg(long = "backend", value_name = "KIND", global = true)]
    pub backend: Option<String>,

    /// Override the storage connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the document-store database name.
    #[arg(long = "database-name", value_name = "NAME", global = true)]
    pub database_name: Option<String>,

    /// Override the connection pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT", global = true)]
    pub database_max_connections: Option<u32>,

    /// Override the number of entries each cache holds.
    #[arg(long = "cache-capacity", value_name = "COUNT", global = true)]
    pub cache_capacity: Option<usize>,

    /// Override the cache entry lifetime.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS", global = true)]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Create tables, collections and indexes for the configured backend.
    Init,
    /// Print every entry of the site, including undated and deleted ones.
    List,
    /// Look an entry up by slug.
    Show { slug: String },
    /// Look an entry up by id.
    Get { id: Uuid },
    /// Entries published before now.
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Entries scheduled after now.
    Future,
    /// Published entries carrying a tag.
    Tag {
        tag: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Entries written by one person.
    Author { id: String },
    /// Keyword search across titles, tags, years and author names.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Field-level change history of one entry.
    History { id: Uuid },
    /// Create an entry.
    Add(AddArgs),
    /// Delete an entry by id.
    Delete { id: Uuid },
}

#[derive(Debug, Args, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub body: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Free-text tag list, split on punctuation (`"rust, async / tokio"`).
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Publication date in RFC 3339 form.
    #[arg(long, value_name = "RFC3339")]
    pub date: Option<String>,

    #[arg(long)]
    pub slug: Option<String>,
}
