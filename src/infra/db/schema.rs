/// Idempotent DDL, executed one statement at a time.
pub(super) const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS entries (
        site         TEXT        NOT NULL,
        id           UUID        NOT NULL,
        slug         TEXT        NOT NULL,
        title        TEXT        NOT NULL,
        description  TEXT        NOT NULL DEFAULT '',
        body         TEXT        NOT NULL DEFAULT '',
        thumbnail    TEXT        NOT NULL DEFAULT '',
        cover        TEXT        NOT NULL DEFAULT '',
        tags         TEXT[]      NOT NULL DEFAULT '{}',
        search_tags  TEXT[]      NOT NULL DEFAULT '{}',
        entry_date   TIMESTAMPTZ,
        author_id    TEXT,
        created_at   TIMESTAMPTZ NOT NULL,
        updated_at   TIMESTAMPTZ NOT NULL,
        deleted      BOOLEAN     NOT NULL DEFAULT FALSE,
        PRIMARY KEY (site, id)
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS entries_site_slug_key ON entries (site, slug)",
    "CREATE INDEX IF NOT EXISTS entries_search_tags_idx ON entries USING GIN (search_tags)",
    "CREATE INDEX IF NOT EXISTS entries_site_author_idx ON entries (site, author_id)",
    "CREATE INDEX IF NOT EXISTS entries_site_date_idx ON entries (site, entry_date)",
    r#"
    CREATE TABLE IF NOT EXISTS entry_change_log (
        id            UUID        PRIMARY KEY,
        seq           BIGSERIAL   NOT NULL,
        site          TEXT        NOT NULL,
        entity_id     UUID        NOT NULL,
        person_id     TEXT        NOT NULL,
        display_name  TEXT        NOT NULL,
        field         TEXT        NOT NULL,
        old_value     TEXT        NOT NULL,
        new_value     TEXT        NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS entry_change_log_entity_idx \
     ON entry_change_log (site, entity_id, created_at)",
];
