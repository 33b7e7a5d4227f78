//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Submitted reports. The payload is stored verbatim.
    reports (id) {
        id -> Int8,
        /// Submitter name; `anonymous` when none was given.
        reporter -> Text,
        /// Report type discriminator. Renamed because `type` is a keyword.
        #[sql_name = "type"]
        report_type -> Text,
        payload -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Idempotency keys remembered for report creation.
    report_idempotency_keys (key) {
        key -> Uuid,
        /// SHA-256 of the canonicalised request.
        payload_hash -> Bytea,
        /// Report returned by the original request.
        response_snapshot -> Jsonb,
        created_at -> Timestamptz,
    }
}
