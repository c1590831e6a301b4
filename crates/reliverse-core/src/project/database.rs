//! Drizzle database provider conversion
//!
//! Conversion is a literal rewrite through the replacement engine: drizzle
//! core imports, table builders, driver imports, `dialect` strings in
//! `drizzle.config.ts` and the `DATABASE_URL` scheme in `.env` files.
//! Column types that differ between dialects are left for the user.

use crate::templates::replace::{self, ReplacementMap, ReplacementReport};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseProvider {
    Postgres,
    Mysql,
    Sqlite,
    /// Turso, on the sqlite dialect
    Libsql,
}

impl DatabaseProvider {
    /// Providers a conversion may start from
    pub const SOURCES: [DatabaseProvider; 3] = [
        DatabaseProvider::Postgres,
        DatabaseProvider::Mysql,
        DatabaseProvider::Sqlite,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DatabaseProvider::Postgres => "PostgreSQL",
            DatabaseProvider::Mysql => "MySQL",
            DatabaseProvider::Sqlite => "SQLite",
            DatabaseProvider::Libsql => "LibSQL/Turso",
        }
    }

    fn core_module(&self) -> &'static str {
        match self {
            DatabaseProvider::Postgres => "drizzle-orm/pg-core",
            DatabaseProvider::Mysql => "drizzle-orm/mysql-core",
            DatabaseProvider::Sqlite | DatabaseProvider::Libsql => "drizzle-orm/sqlite-core",
        }
    }

    fn table_fn(&self) -> &'static str {
        match self {
            DatabaseProvider::Postgres => "pgTable",
            DatabaseProvider::Mysql => "mysqlTable",
            DatabaseProvider::Sqlite | DatabaseProvider::Libsql => "sqliteTable",
        }
    }

    fn driver_module(&self) -> &'static str {
        match self {
            DatabaseProvider::Postgres => "drizzle-orm/postgres-js",
            DatabaseProvider::Mysql => "drizzle-orm/mysql2",
            DatabaseProvider::Sqlite => "drizzle-orm/better-sqlite3",
            DatabaseProvider::Libsql => "drizzle-orm/libsql",
        }
    }

    fn dialect(&self) -> &'static str {
        match self {
            DatabaseProvider::Postgres => "postgresql",
            DatabaseProvider::Mysql => "mysql",
            DatabaseProvider::Sqlite => "sqlite",
            DatabaseProvider::Libsql => "turso",
        }
    }

    /// URL schemes found in `DATABASE_URL`; the first one is written
    fn url_schemes(&self) -> &'static [&'static str] {
        match self {
            DatabaseProvider::Postgres => &["postgresql://", "postgres://"],
            DatabaseProvider::Mysql => &["mysql://"],
            DatabaseProvider::Sqlite => &["file:"],
            DatabaseProvider::Libsql => &["libsql://"],
        }
    }
}

impl fmt::Display for DatabaseProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Targets offered for `from`. LibSQL is only offered from PostgreSQL.
pub fn available_targets(from: DatabaseProvider) -> Vec<DatabaseProvider> {
    let mut targets: Vec<DatabaseProvider> = DatabaseProvider::SOURCES
        .into_iter()
        .filter(|p| *p != from)
        .collect();
    if from == DatabaseProvider::Postgres {
        targets.push(DatabaseProvider::Libsql);
    }
    targets
}

pub fn conversion_map(from: DatabaseProvider, to: DatabaseProvider) -> ReplacementMap {
    let mut map = ReplacementMap::new();
    map.insert(from.core_module(), to.core_module());
    map.insert(from.table_fn(), to.table_fn());
    map.insert(from.driver_module(), to.driver_module());
    for quote in ['"', '\''] {
        map.insert(
            format!("dialect: {q}{}{q}", from.dialect(), q = quote),
            format!("dialect: {q}{}{q}", to.dialect(), q = quote),
        );
    }
    let target_scheme = to.url_schemes()[0];
    for scheme in from.url_schemes() {
        map.insert(
            format!("DATABASE_URL=\"{}", scheme),
            format!("DATABASE_URL=\"{}", target_scheme),
        );
        map.insert(
            format!("DATABASE_URL={}", scheme),
            format!("DATABASE_URL={}", target_scheme),
        );
    }
    map.valid()
}

/// Guess the current provider from `drizzle.config.ts`
pub fn detect_provider(project_dir: &Path) -> Option<DatabaseProvider> {
    let config = ["drizzle.config.ts", "drizzle.config.js"]
        .iter()
        .find_map(|f| std::fs::read_to_string(project_dir.join(f)).ok())?;
    [
        DatabaseProvider::Libsql,
        DatabaseProvider::Postgres,
        DatabaseProvider::Mysql,
        DatabaseProvider::Sqlite,
    ]
    .into_iter()
    .find(|p| {
        config.contains(&format!("\"{}\"", p.dialect()))
            || config.contains(&format!("'{}'", p.dialect()))
    })
}

/// Rewrite the project from one provider to another
pub async fn convert(
    project_dir: &Path,
    from: DatabaseProvider,
    to: DatabaseProvider,
) -> anyhow::Result<ReplacementReport> {
    if !available_targets(from).contains(&to) {
        anyhow::bail!("Conversion from {} to {} is not supported", from, to);
    }
    tracing::debug!("Converting {} from {} to {}", project_dir.display(), from, to);
    Ok(replace::apply(project_dir, &conversion_map(from, to)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_libsql_only_offered_from_postgres() {
        assert_eq!(
            available_targets(DatabaseProvider::Postgres),
            vec![
                DatabaseProvider::Mysql,
                DatabaseProvider::Sqlite,
                DatabaseProvider::Libsql
            ]
        );
        assert_eq!(
            available_targets(DatabaseProvider::Sqlite),
            vec![DatabaseProvider::Postgres, DatabaseProvider::Mysql]
        );
    }

    #[test]
    fn test_conversion_map_rewrites_schema_source() {
        let map = conversion_map(DatabaseProvider::Postgres, DatabaseProvider::Mysql);
        let schema = "import { pgTable, text } from \"drizzle-orm/pg-core\";\nexport const users = pgTable(\"users\", {});";
        assert_eq!(
            map.apply_to(schema),
            "import { mysqlTable, text } from \"drizzle-orm/mysql-core\";\nexport const users = mysqlTable(\"users\", {});"
        );
        assert_eq!(
            map.apply_to("DATABASE_URL=\"postgres://u@h/db\""),
            "DATABASE_URL=\"mysql://u@h/db\""
        );
    }

    #[test]
    fn test_libsql_keeps_sqlite_core() {
        let map = conversion_map(DatabaseProvider::Postgres, DatabaseProvider::Libsql);
        assert_eq!(
            map.apply_to("export default { dialect: 'postgresql' }"),
            "export default { dialect: 'turso' }"
        );
        assert_eq!(
            map.apply_to("import { drizzle } from \"drizzle-orm/postgres-js\""),
            "import { drizzle } from \"drizzle-orm/libsql\""
        );
    }

    #[tokio::test]
    async fn test_detect_and_convert_project() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("drizzle.config.ts"),
            "export default defineConfig({ dialect: \"postgresql\" });",
        )
        .unwrap();
        std::fs::write(dir.path().join(".env"), "DATABASE_URL=\"postgresql://localhost/db\"\n")
            .unwrap();

        assert_eq!(detect_provider(dir.path()), Some(DatabaseProvider::Postgres));

        let report = convert(dir.path(), DatabaseProvider::Postgres, DatabaseProvider::Sqlite)
            .await
            .unwrap();
        assert_eq!(report.rewritten.len(), 2);
        assert_eq!(detect_provider(dir.path()), Some(DatabaseProvider::Sqlite));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".env")).unwrap(),
            "DATABASE_URL=\"file:localhost/db\"\n"
        );
    }

    #[tokio::test]
    async fn test_unsupported_conversion_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(convert(dir.path(), DatabaseProvider::Sqlite, DatabaseProvider::Libsql)
            .await
            .is_err());
    }
}
