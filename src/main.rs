use std::{process::ExitCode, sync::Arc};

use entrystore::{
    application::{
        entries::EntryService,
        error::{AppError, ErrorReport},
        session::SiteSession,
    },
    config::{self, AddArgs, CliArgs, Command},
    domain::{
        entities::{Entry, Person},
        error::DomainError,
        slug::split_tags,
    },
    infra::{bootstrap, error::InfraError, memory::StaticPersonDirectory, telemetry},
};
use serde::Serialize;
use serde_json::json;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_application_error(&error);
            ExitCode::from(error.exit_code())
        }
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error(report_source(error), error);
    if dispatcher::has_been_set() {
        error!(source = report.source, chain = ?report.messages, "command failed");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(source = report.source, chain = ?report.messages, "command failed");
    });
}

fn report_source(error: &AppError) -> &'static str {
    match error {
        AppError::Infra(_) => "infra",
        AppError::Store(_) => "store",
        AppError::Domain(_) | AppError::Validation(_) => "input",
        AppError::NotFound | AppError::Unexpected(_) => "cli",
    }
}

async fn run() -> Result<(), AppError> {
    let (cli, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    telemetry::init(&settings.logging)?;

    let acting = acting_person(&cli);
    let people = Arc::new(StaticPersonDirectory::new(acting.clone()));
    let service = bootstrap::open_store(&settings, people).await?;

    if let Command::Init = cli.command {
        info!(backend = settings.store.backend.as_str(), "schema initialised");
        return Ok(());
    }

    let session = session_for(&cli)?;
    execute(&service, &session, acting, cli.command).await
}

async fn execute(
    service: &EntryService,
    session: &SiteSession,
    acting: Option<Person>,
    command: Command,
) -> Result<(), AppError> {
    match command {
        Command::Init => Ok(()),
        Command::List => print_json(&service.list_entries(session).await?),
        Command::Show { slug } => {
            let entry = service
                .get_entry_by_slug_cached(session, &slug)
                .await?
                .ok_or(AppError::NotFound)?;
            print_json(&entry)
        }
        Command::Get { id } => {
            let entry = service
                .get_entry_cached(session, id)
                .await?
                .ok_or(AppError::NotFound)?;
            print_json(&entry)
        }
        Command::Recent { limit } => print_json(&service.list_recent(session, limit).await?),
        Command::Future => print_json(&service.list_future(session).await?),
        Command::Tag { tag, limit } => {
            print_json(&service.list_by_tag(session, &tag, limit).await?)
        }
        Command::Author { id } => print_json(&service.list_by_author(session, &id).await?),
        Command::Search { query } => {
            print_json(&service.search(session, &query.join(" ")).await?)
        }
        Command::History { id } => print_json(&service.change_history(session, id).await?),
        Command::Add(args) => {
            let entry = entry_from_args(service.new_entry(), args, acting)?;
            print_json(&service.add_entry(session, entry).await?)
        }
        Command::Delete { id } => {
            service.delete_entry(session, id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

fn session_for(cli: &CliArgs) -> Result<SiteSession, AppError> {
    let site = cli
        .site
        .as_deref()
        .map(str::trim)
        .filter(|site| !site.is_empty())
        .ok_or_else(|| AppError::validation("a site is required (--site or ENTRYSTORE_SITE)"))?;

    Ok(match cli.session.person_id.as_deref() {
        Some(person_id) => {
            let display_name = cli.session.display_name.as_deref().unwrap_or(person_id);
            SiteSession::authenticated(site, person_id, display_name)
        }
        None => SiteSession::anonymous(site),
    })
}

/// The person named by `--as`, with `--display-name` split into first and
/// last name.
fn acting_person(cli: &CliArgs) -> Option<Person> {
    let id = cli.session.person_id.as_deref()?;
    let display_name = cli.session.display_name.as_deref().unwrap_or_default().trim();
    let (first, last) = display_name.split_once(' ').unwrap_or((display_name, ""));
    Some(Person::new(id, first.trim(), last.trim()))
}

fn entry_from_args(
    mut entry: Entry,
    args: AddArgs,
    author: Option<Person>,
) -> Result<Entry, AppError> {
    entry.set_title(args.title);
    if let Some(slug) = args.slug.as_deref() {
        entry.set_slug(slug);
    }
    entry.set_description(args.description);
    entry.set_body(args.body);
    entry.set_tags(split_tags(&args.tags));

    if let Some(raw) = args.date.as_deref() {
        let date = OffsetDateTime::parse(raw, &Rfc3339)
            .map_err(|err| DomainError::malformed("date", err.to_string()))?;
        entry.set_date(Some(date));
    }

    entry.set_author(author);
    Ok(entry)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["entrystore"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn session_requires_site() {
        let cli = args(&["list"]);
        assert!(matches!(session_for(&cli), Err(AppError::Validation(_))));
    }

    #[test]
    fn acting_person_splits_display_name() {
        let cli = args(&["--as", "p-7", "--display-name", "Jane Li", "list"]);
        assert_eq!(acting_person(&cli), Some(Person::new("p-7", "Jane", "Li")));
    }

    #[test]
    fn add_arguments_build_an_entry() {
        let cli = args(&[
            "add",
            "--title",
            "A Title",
            "--body",
            "Text",
            "--tags",
            "rust, async",
            "--date",
            "2000-01-02T00:00:00Z",
        ]);
        let Command::Add(add) = cli.command else {
            panic!("expected add command");
        };

        let entry = entry_from_args(Entry::new(), add, None).expect("valid arguments");
        assert_eq!(entry.slug(), "a-title");
        assert_eq!(entry.tags(), ["rust", "async"]);
        assert_eq!(entry.date().map(|date| date.year()), Some(2000));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let cli = args(&["add", "--title", "T", "--body", "B", "--date", "yesterday"]);
        let Command::Add(add) = cli.command else {
            panic!("expected add command");
        };

        let err = entry_from_args(Entry::new(), add, None).expect_err("bad date");
        assert_eq!(err.exit_code(), 3);
    }
}
