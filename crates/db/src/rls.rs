//! Row-Level Security (RLS) context management.
//!
//! FuelFlow enforces request visibility at the database layer as well as
//! in the application: drivers only see their own fuel requests. The RLS
//! policies key on two session variables, `app.current_user_id` and
//! `app.current_user_role`, both scoped to a transaction with `SET LOCAL`.

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use uuid::Uuid;

use fuelflow_core::workflow::Role;

/// A transaction with the caller's identity set as RLS context.
pub struct RlsConnection {
    txn: DatabaseTransaction,
}

impl RlsConnection {
    /// Begins a transaction and sets the RLS context for the caller.
    ///
    /// Both variables are set with `SET LOCAL` so they vanish when the
    /// transaction ends. The role string comes from a closed enum, and the
    /// user id is a UUID, so interpolation is injection-safe.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the
    /// context cannot be set.
    pub async fn new(
        db: &DatabaseConnection,
        user_id: Uuid,
        role: Role,
    ) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        set_rls_context(&txn, user_id, role).await?;
        Ok(Self { txn })
    }

    /// The underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Sets the RLS context on an existing transaction.
///
/// # Errors
///
/// Returns an error if the context cannot be set.
pub async fn set_rls_context(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    role: Role,
) -> Result<(), DbErr> {
    txn.execute_unprepared(&format!("SET LOCAL app.current_user_id = '{user_id}'"))
        .await?;
    txn.execute_unprepared(&format!(
        "SET LOCAL app.current_user_role = '{}'",
        role.as_str()
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rls_sql_format() {
        let user_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let sql = format!("SET LOCAL app.current_user_id = '{user_id}'");
        assert_eq!(
            sql,
            "SET LOCAL app.current_user_id = '550e8400-e29b-41d4-a716-446655440000'"
        );
        assert_eq!(Role::Fueler.as_str(), "fueler");
    }
}
