//! Database schema initialization and migrations.

use crate::error::{DatabaseResultExt, GatewayResult};

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> GatewayResult<()> {
        self.connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;

        let schema_sql = include_str!("../../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        self.apply_migrations()?;

        Ok(())
    }

    /// Apply database migrations for existing databases
    fn apply_migrations(&self) -> GatewayResult<()> {
        // Stores created before pausing existed lack resume_at
        let has_resume_column: bool = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('plans') WHERE name = 'resume_at'",
                [],
                |row| row.get(0),
            )
            .map(|count: i64| count > 0)
            .unwrap_or(false);

        if !has_resume_column {
            self.connection
                .execute("ALTER TABLE plans ADD COLUMN resume_at TEXT", [])
                .db_context("Failed to add resume_at column to plans table")?;
        }

        Ok(())
    }
}
