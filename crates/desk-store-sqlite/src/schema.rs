//! SQL schema for the desk SQLite store.
//!
//! Migrations are applied in order at connection startup. `PRAGMA
//! user_version` records how many have run; each entry in [`MIGRATIONS`] runs
//! exactly once per database.

/// Connection-level settings; not versioned.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Version 1: tickets and their message threads.
const V1_TICKETS: &str = "
CREATE TABLE IF NOT EXISTS tickets (
    ticket_id       TEXT PRIMARY KEY,
    customer_id     TEXT NOT NULL,
    subscription_id TEXT,
    subject         TEXT NOT NULL,
    category        TEXT NOT NULL,
    priority        TEXT NOT NULL DEFAULT 'MEDIUM',
    status          TEXT NOT NULL DEFAULT 'OPEN',
    assignee_id     TEXT,
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC, microseconds
    updated_at      TEXT NOT NULL
);

-- Messages are append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS ticket_messages (
    message_id  TEXT PRIMARY KEY,
    ticket_id   TEXT NOT NULL REFERENCES tickets(ticket_id),
    author_id   TEXT NOT NULL,
    author_type TEXT NOT NULL,       -- 'CUSTOMER' | 'ADMIN'
    content     TEXT NOT NULL,
    is_internal INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS tickets_customer_idx ON tickets(customer_id);
CREATE INDEX IF NOT EXISTS tickets_updated_idx  ON tickets(updated_at);
CREATE INDEX IF NOT EXISTS messages_ticket_idx  ON ticket_messages(ticket_id);
";

/// Version 2: subscriptions and renewal history.
const V2_SUBSCRIPTIONS: &str = "
CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id        TEXT PRIMARY KEY,
    customer_id            TEXT NOT NULL,
    plan_name              TEXT NOT NULL,
    billing_period_months  INTEGER NOT NULL CHECK (billing_period_months > 0),
    mrp_cents              INTEGER NOT NULL,
    discounted_price_cents INTEGER,
    start_date             TEXT NOT NULL,   -- YYYY-MM-DD
    end_date               TEXT NOT NULL,
    status                 TEXT NOT NULL DEFAULT 'ACTIVE',
    created_at             TEXT NOT NULL,
    updated_at             TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subscription_renewals (
    renewal_id        TEXT PRIMARY KEY,
    subscription_id   TEXT NOT NULL REFERENCES subscriptions(subscription_id),
    previous_end_date TEXT NOT NULL,
    new_end_date      TEXT NOT NULL,
    amount_cents      INTEGER NOT NULL,
    renewed_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS subscriptions_customer_idx ON subscriptions(customer_id);
CREATE INDEX IF NOT EXISTS subscriptions_end_idx      ON subscriptions(status, end_date);
";

/// Ordered migrations; index `i` upgrades a database from version `i` to
/// `i + 1`.
pub const MIGRATIONS: &[&str] = &[V1_TICKETS, V2_SUBSCRIPTIONS];

/// The `user_version` of a fully migrated database.
pub const LATEST_VERSION: u32 = MIGRATIONS.len() as u32;
