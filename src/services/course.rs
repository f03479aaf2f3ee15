use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{CourseLevel, CourseWithCategory};
use crate::database::{EntityTable, TableNameError, TenantId};
use crate::services::{non_blank, required, RequiredFields, ServiceError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub course_name: Option<String>,
    pub course_price: Option<String>,
    pub course_duration: Option<String>,
    pub course_level: Option<CourseLevel>,
    pub course_thumbnail: Option<String>,
    pub course_description: Option<String>,
    pub teacher_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

fn select_with_category(tenant: TenantId) -> Result<String, TableNameError> {
    let courses = EntityTable::Course.table_for(tenant)?.quoted();
    let categories = EntityTable::Category.table_for(tenant)?.quoted();
    Ok(format!(
        "SELECT c.*, cat.category_name FROM {} AS c LEFT JOIN {} AS cat ON c.category_id = cat.id",
        courses, categories
    ))
}

pub async fn create_course(pool: &PgPool, tenant: TenantId, course: NewCourse) -> Result<CourseWithCategory, ServiceError> {
    RequiredFields::new()
        .text("courseName", course.course_name.as_deref())
        .text("coursePrice", course.course_price.as_deref())
        .text("courseDuration", course.course_duration.as_deref())
        .present("courseLevel", course.course_level.as_ref())
        .present("categoryId", course.category_id.as_ref())
        .finish("Please provide")?;

    let (Some(level), Some(category_id)) = (course.course_level, course.category_id) else {
        return Err(ServiceError::validation("Please provide courseLevel, categoryId"));
    };

    let categories = EntityTable::Category.table_for(tenant)?;
    let category_exists: bool = sqlx::query_scalar(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
        categories.quoted()
    ))
    .bind(category_id)
    .fetch_one(pool)
    .await?;
    if !category_exists {
        return Err(ServiceError::not_found("Category not found"));
    }

    let table = EntityTable::Course.table_for(tenant)?;
    let sql = format!(
        r#"
        INSERT INTO {} (course_name, course_price, course_duration, course_level,
                        course_thumbnail, course_description, teacher_id, category_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
        table.quoted()
    );

    let id: Uuid = sqlx::query_scalar(&sql)
        .bind(required(course.course_name))
        .bind(required(course.course_price))
        .bind(required(course.course_duration))
        .bind(level.as_str())
        .bind(non_blank(course.course_thumbnail))
        .bind(non_blank(course.course_description))
        .bind(course.teacher_id)
        .bind(category_id)
        .fetch_one(pool)
        .await?;

    tracing::info!(tenant = %tenant, course_id = %id, "Course created");
    get_course(pool, tenant, id).await
}

pub async fn list_courses(pool: &PgPool, tenant: TenantId) -> Result<Vec<CourseWithCategory>, ServiceError> {
    let sql = format!("{} ORDER BY c.created_at DESC", select_with_category(tenant)?);
    Ok(sqlx::query_as::<_, CourseWithCategory>(&sql).fetch_all(pool).await?)
}

pub async fn get_course(pool: &PgPool, tenant: TenantId, id: Uuid) -> Result<CourseWithCategory, ServiceError> {
    let sql = format!("{} WHERE c.id = $1", select_with_category(tenant)?);
    sqlx::query_as::<_, CourseWithCategory>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Course not found"))
}

pub async fn delete_course(pool: &PgPool, tenant: TenantId, id: Uuid) -> Result<(), ServiceError> {
    let table = EntityTable::Course.table_for(tenant)?;
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table.quoted()))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Course not found"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_query_joins_tenant_category_table() {
        let sql = select_with_category(TenantId::new(12).unwrap()).unwrap();
        assert!(sql.contains("FROM \"course_12\" AS c"));
        assert!(sql.contains("LEFT JOIN \"category_12\" AS cat"));
    }

    #[test]
    fn unknown_course_level_is_rejected() {
        let parsed = serde_json::from_value::<NewCourse>(serde_json::json!({ "courseLevel": "expert" }));
        assert!(parsed.is_err());
    }
}
