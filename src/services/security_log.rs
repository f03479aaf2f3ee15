use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::{DatabaseError, EntityTable, TenantId};

/// Append an audit entry to the tenant's security log
pub async fn record(
    conn: &mut PgConnection,
    tenant: TenantId,
    user_id: Option<Uuid>,
    action: &str,
    details: Option<&str>,
) -> Result<(), DatabaseError> {
    let table = EntityTable::SecurityLog.table_for(tenant)?;
    let sql = format!(
        "INSERT INTO {} (user_id, action, details) VALUES ($1, $2, $3)",
        table.quoted()
    );

    sqlx::query(&sql)
        .bind(user_id)
        .bind(action)
        .bind(details)
        .execute(conn)
        .await?;

    tracing::debug!(tenant = %tenant, action, "Security log entry recorded");
    Ok(())
}
