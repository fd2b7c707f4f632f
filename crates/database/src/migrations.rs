use crate::pool::DbPool;
use anyhow::Context;

/// Embedded schema migrations, applied in order. Never edit a shipped entry; append a new one.
const MIGRATIONS: &[(i32, &str, &str)] = &[(
    1,
    "initial",
    include_str!("../migrations/0001_initial.sql"),
)];

/// Apply every migration not yet recorded in `schema_migrations`
pub async fn run(pool: &DbPool) -> anyhow::Result<()> {
    let mut client = pool.get().await?;

    client
        .batch_execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .await
        .context("Failed to create schema_migrations table")?;

    for (version, name, sql) in MIGRATIONS {
        let already_applied = client
            .query_opt(
                "SELECT version FROM schema_migrations WHERE version = $1",
                &[version],
            )
            .await?
            .is_some();

        if already_applied {
            tracing::debug!("Migration {} ({}) already applied", version, name);
            continue;
        }

        tracing::info!("Applying migration {} ({})", version, name);

        let txn = client.transaction().await?;
        txn.batch_execute(sql)
            .await
            .with_context(|| format!("Migration {version} ({name}) failed"))?;
        txn.execute(
            "INSERT INTO schema_migrations (version, name) VALUES ($1, $2)",
            &[version, name],
        )
        .await?;
        txn.commit().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_versions_strictly_increase() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|(v, _, _)| *v).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(versions.first(), Some(&1));
    }

    #[test]
    fn test_initial_migration_creates_billing_tables() {
        let (_, _, sql) = MIGRATIONS[0];
        for table in [
            "users",
            "sessions",
            "accounts",
            "account_memberships",
            "stripe_customer_information",
            "user_pull_request_activity",
        ] {
            assert!(
                sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
                "missing table {table}"
            );
        }
    }
}
