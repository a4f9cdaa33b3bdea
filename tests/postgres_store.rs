//! Runs against a live Postgres. Set `DATABASE_URL` and pass `--ignored`.

use std::sync::Arc;

use entrystore::application::audit::ChangeLogService;
use entrystore::application::entries::EntryService;
use entrystore::application::repos::{EntryStore, RepoError};
use entrystore::application::session::SiteSession;
use entrystore::cache::{CacheConfig, EntryCache};
use entrystore::domain::entities::{Entry, Person};
use entrystore::domain::search::tag_key;
use entrystore::infra::db::PostgresRepositories;
use entrystore::infra::memory::StaticPersonDirectory;
use sqlx::PgPool;
use time::macros::datetime;

fn service(repositories: Arc<PostgresRepositories>) -> EntryService {
    EntryService::new(
        repositories.clone(),
        Arc::new(EntryCache::new(&CacheConfig::default())),
        Arc::new(StaticPersonDirectory::new([Person::new(
            "p-william",
            "William",
            "Wang",
        )])),
        ChangeLogService::new(repositories),
    )
}

fn draft(title: &str, tags: &[&str]) -> Entry {
    let mut entry = Entry::new();
    entry.set_title(title);
    entry.set_body("Stored in Postgres");
    entry.set_tags(tags.iter().copied());
    entry.set_date(Some(datetime!(2000-01-02 00:00 UTC)));
    entry.set_author(Some(Person::new("p-william", "William", "Wang")));
    entry
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a Postgres database"]
async fn table_backend_round_trips_entries(pool: PgPool) {
    let repositories = Arc::new(PostgresRepositories::new(pool));
    repositories.health_check().await.expect("server reachable");
    repositories.ensure_schema().await.expect("schema");
    repositories.ensure_schema().await.expect("schema is idempotent");
    let service = service(repositories.clone());
    let session = SiteSession::authenticated("pg.example", "p-william", "William Wang");

    let added = service
        .add_entry(&session, draft("Table Entry", &["Cat", "dog"]))
        .await
        .expect("add");
    let id = added.id().expect("saved id");

    let by_slug = service
        .get_entry_by_slug(&session, "table-entry")
        .await
        .expect("lookup")
        .expect("entry");
    assert_eq!(by_slug.id(), Some(id));
    assert_eq!(by_slug.tags(), ["Cat", "dog"]);
    assert_eq!(by_slug.author().map(|person| person.last_name.as_str()), Some("Wang"));

    let tagged = service.list_by_tag(&session, "cat", 10).await.expect("tag");
    assert_eq!(tagged.len(), 1);
    let none = repositories
        .list_by_tag("pg.example", &tag_key("cat"), datetime!(2100-01-01 00:00 UTC), 0)
        .await
        .expect("zero limit");
    assert!(none.is_empty());
    let found = service.search(&session, "wang table").await.expect("search");
    assert_eq!(found.len(), 1);

    let mut revised = by_slug.clone();
    revised.set_description("now with a description");
    let updated = service.update_entry(&session, revised).await.expect("update");
    assert_eq!(updated.created(), by_slug.created());

    let history = service.change_history(&session, id).await.expect("history");
    assert_eq!(
        history.last().map(|row| row.field.as_str()),
        Some("description")
    );

    let clash = service
        .add_entry(&session, draft("Table Entry", &[]))
        .await
        .expect_err("duplicate slug");
    assert!(matches!(
        clash,
        entrystore::application::error::StoreError::Repo(RepoError::Duplicate { .. })
    ));

    service.delete_entry(&session, id).await.expect("delete");
    assert!(
        repositories
            .find_by_id("pg.example", id)
            .await
            .expect("lookup")
            .is_none()
    );
}
