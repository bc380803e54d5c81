//! CQL identifier quoting and generated DDL helpers
//!
//! Object names read back from `system_schema` are quoted before they are
//! interpolated into DROP statements, since case-sensitive names exist.

use crate::keyspace::KeyspaceName;

/// Quote a CQL identifier.
///
/// Wraps the identifier in double quotes and doubles any embedded double
/// quotes.
///
/// # Examples
/// ```
/// use ksm_core::cql_utils::quote_ident;
/// assert_eq!(quote_ident("users"), r#""users""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `DROP TABLE IF EXISTS ks."table"`
pub fn drop_table(keyspace: &KeyspaceName, table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}.{}", keyspace, quote_ident(table))
}

/// `DROP TYPE IF EXISTS ks."type"`
pub fn drop_type(keyspace: &KeyspaceName, type_name: &str) -> String {
    format!("DROP TYPE IF EXISTS {}.{}", keyspace, quote_ident(type_name))
}

/// Idempotent `CREATE KEYSPACE` using `SimpleStrategy`.
pub fn create_keyspace(keyspace: &KeyspaceName, replication_factor: u32) -> String {
    format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{ 'class' : 'SimpleStrategy', 'replication_factor' : {} }}",
        keyspace, replication_factor
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ks() -> KeyspaceName {
        KeyspaceName::parse("cadence").unwrap()
    }

    #[test]
    fn test_quote_ident_simple() {
        assert_eq!(quote_ident("users"), r#""users""#);
    }

    #[test]
    fn test_quote_ident_with_embedded_quotes() {
        assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
    }

    #[test]
    fn test_drop_statements() {
        assert_eq!(
            drop_table(&ks(), "executions"),
            r#"DROP TABLE IF EXISTS cadence."executions""#
        );
        assert_eq!(
            drop_type(&ks(), "Shard"),
            r#"DROP TYPE IF EXISTS cadence."Shard""#
        );
    }

    #[test]
    fn test_create_keyspace() {
        assert_eq!(
            create_keyspace(&ks(), 3),
            "CREATE KEYSPACE IF NOT EXISTS cadence WITH replication = { 'class' : 'SimpleStrategy', 'replication_factor' : 3 }"
        );
    }
}
