//! Privilege gate run before any cleanup on an instance.

use hcc_core::privilege::PrivilegeMap;
use hcc_core::DbConfig;
use hcc_db::{DbError, QueryCatalog, QueryExecutor};

use crate::instance::InstanceError;

/// Confirm the connecting user holds what `db`'s enabled categories need.
pub async fn check_privileges(
    exec: &dyn QueryExecutor,
    db: &DbConfig,
) -> Result<(), InstanceError> {
    let rows = exec
        .query(&QueryCatalog::privileges(&db.username))
        .await
        .map_err(InstanceError::PrivilegeQuery)?;

    let pairs = rows
        .iter()
        .map(|row| -> Result<(String, String), DbError> { Ok((row.text(0)?, row.text(1)?)) })
        .collect::<Result<Vec<_>, _>>()
        .map_err(InstanceError::PrivilegeQuery)?;

    PrivilegeMap::from_rows(pairs)?.check(db)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hcc_core::error::PrivilegeError;
    use hcc_core::privilege::Privilege;
    use hcc_db::testing::{row, ScriptedExecutor};
    use hcc_db::Row;

    use super::*;
    use crate::cleanup::test_support::settings;

    fn db() -> DbConfig {
        DbConfig {
            name: "PRD".into(),
            hostname: "hana01".into(),
            port: 30015,
            username: "hcc".into(),
            password: None,
            settings: settings(),
        }
    }

    fn grants(denied: &[Privilege]) -> Vec<Row> {
        Privilege::ALL
            .iter()
            .map(|p| {
                let value = if denied.contains(p) { "FALSE" } else { "TRUE" };
                row([p.key(), value])
            })
            .collect()
    }

    #[tokio::test]
    async fn all_grants_pass() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::privileges("hcc"), grants(&[]));
        assert!(check_privileges(&exec, &db()).await.is_ok());
        exec.assert_done();
    }

    #[tokio::test]
    async fn missing_grant_for_enabled_category_fails() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(
            QueryCatalog::privileges("hcc"),
            grants(&[Privilege::ResourceAdmin]),
        );
        assert_matches!(
            check_privileges(&exec, &db()).await,
            Err(InstanceError::Privilege(PrivilegeError::NotGranted {
                privilege: Privilege::ResourceAdmin,
                ..
            }))
        );
    }

    #[tokio::test]
    async fn query_failure_is_reported_separately() {
        let exec = ScriptedExecutor::new();
        exec.expect_query_error(
            QueryCatalog::privileges("hcc"),
            DbError::Driver("view not found".into()),
        );
        assert_matches!(
            check_privileges(&exec, &db()).await,
            Err(InstanceError::PrivilegeQuery(_))
        );
    }
}
