use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Category;
use crate::database::{EntityTable, TenantId};
use crate::services::{non_blank, required, RequiredFields, ServiceError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub category_name: Option<String>,
    pub category_description: Option<String>,
}

pub async fn create_category(pool: &PgPool, tenant: TenantId, category: NewCategory) -> Result<Category, ServiceError> {
    RequiredFields::new()
        .text("categoryName", category.category_name.as_deref())
        .finish("Please provide")?;

    let table = EntityTable::Category.table_for(tenant)?;
    let sql = format!(
        "INSERT INTO {} (category_name, category_description) VALUES ($1, $2) RETURNING *",
        table.quoted()
    );

    Ok(sqlx::query_as::<_, Category>(&sql)
        .bind(required(category.category_name))
        .bind(non_blank(category.category_description))
        .fetch_one(pool)
        .await?)
}

pub async fn list_categories(pool: &PgPool, tenant: TenantId) -> Result<Vec<Category>, ServiceError> {
    let table = EntityTable::Category.table_for(tenant)?;
    Ok(
        sqlx::query_as::<_, Category>(&format!("SELECT * FROM {} ORDER BY category_name", table.quoted()))
            .fetch_all(pool)
            .await?,
    )
}

pub async fn delete_category(pool: &PgPool, tenant: TenantId, id: Uuid) -> Result<(), ServiceError> {
    let table = EntityTable::Category.table_for(tenant)?;
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table.quoted()))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Category not found"));
    }
    Ok(())
}
