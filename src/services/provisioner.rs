//! Institute provisioning.
//!
//! Creating an institute is an ordered list of [`ProvisionStep`]s run by a
//! [`ProvisioningPipeline`]: one table-creation step per catalog entity, the
//! default category seed, then the security-log entry. The institute row, every
//! step and the owner update share a single Postgres transaction, so a failure
//! at any point leaves nothing behind.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims, JwtError};
use crate::database::ddl::create_table_ddl;
use crate::database::models::{Institute, DEFAULT_CATEGORIES};
use crate::database::{DatabaseError, EntityTable, TenantId};
use crate::services::{non_blank, required, security_log, RequiredFields, ServiceError};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("Provisioning step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: DatabaseError,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl From<sqlx::Error> for ProvisionError {
    fn from(err: sqlx::Error) -> Self {
        ProvisionError::Database(err.into())
    }
}

impl From<ServiceError> for ProvisionError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { message, field_errors } => ProvisionError::Validation {
                message,
                field_errors: field_errors.unwrap_or_default(),
            },
            ServiceError::Database(e) => ProvisionError::Database(e),
            other => ProvisionError::Validation {
                message: other.to_string(),
                field_errors: HashMap::new(),
            },
        }
    }
}

/// Values available to every step
#[derive(Debug, Clone, Copy)]
pub struct ProvisionContext {
    pub tenant: TenantId,
    pub owner_id: Option<Uuid>,
}

/// One unit of provisioning work, executed inside the pipeline's transaction
#[async_trait]
pub trait ProvisionStep: Send + Sync {
    /// Step name for logging and error reports
    fn name(&self) -> String;

    async fn execute(&self, conn: &mut PgConnection, ctx: &ProvisionContext) -> Result<(), DatabaseError>;
}

/// `CREATE TABLE IF NOT EXISTS` for one catalog entity
pub struct CreateTableStep {
    pub entity: EntityTable,
}

#[async_trait]
impl ProvisionStep for CreateTableStep {
    fn name(&self) -> String {
        format!("create_table:{}", self.entity.prefix())
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &ProvisionContext) -> Result<(), DatabaseError> {
        let ddl = create_table_ddl(self.entity, ctx.tenant)?;
        sqlx::query(&ddl).execute(conn).await?;
        Ok(())
    }
}

/// Inserts each default category unless one with the same name exists
pub struct SeedCategoriesStep;

#[async_trait]
impl ProvisionStep for SeedCategoriesStep {
    fn name(&self) -> String {
        "seed_categories".to_string()
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &ProvisionContext) -> Result<(), DatabaseError> {
        let table = EntityTable::Category.table_for(ctx.tenant)?.quoted();
        let sql = format!(
            "INSERT INTO {table} (category_name, category_description) \
             SELECT $1, $2 WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE category_name = $1)"
        );

        let mut inserted = 0;
        for (name, description) in DEFAULT_CATEGORIES {
            let result = sqlx::query(&sql)
                .bind(*name)
                .bind(*description)
                .execute(&mut *conn)
                .await?;
            inserted += result.rows_affected();
        }

        tracing::debug!(tenant = %ctx.tenant, inserted, "Default categories seeded");
        Ok(())
    }
}

pub struct RecordSecurityLogStep;

#[async_trait]
impl ProvisionStep for RecordSecurityLogStep {
    fn name(&self) -> String {
        "record_security_log".to_string()
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &ProvisionContext) -> Result<(), DatabaseError> {
        security_log::record(
            conn,
            ctx.tenant,
            ctx.owner_id,
            "institute_created",
            Some("Institute tables provisioned"),
        )
        .await
    }
}

/// Ordered list of provisioning steps
#[derive(Default)]
pub struct ProvisioningPipeline {
    steps: Vec<Box<dyn ProvisionStep>>,
}

impl ProvisioningPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step; steps run in registration order
    pub fn register(&mut self, step: Box<dyn ProvisionStep>) {
        tracing::debug!("Registered provisioning step '{}'", step.name());
        self.steps.push(step);
    }

    /// Every catalog table followed by the category seed
    pub fn tables_and_seed() -> Self {
        let mut pipeline = Self::new();
        for entity in EntityTable::ALL {
            pipeline.register(Box::new(CreateTableStep { entity }));
        }
        pipeline.register(Box::new(SeedCategoriesStep));
        pipeline
    }

    /// Steps for a brand-new institute
    pub fn for_new_institute() -> Self {
        let mut pipeline = Self::tables_and_seed();
        pipeline.register(Box::new(RecordSecurityLogStep));
        pipeline
    }

    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run every step in order, stopping at the first failure
    pub async fn run(&self, conn: &mut PgConnection, ctx: &ProvisionContext) -> Result<(), ProvisionError> {
        tracing::info!(
            tenant = %ctx.tenant,
            steps = self.steps.len(),
            "Provisioning pipeline starting"
        );

        for step in &self.steps {
            let name = step.name();
            tracing::debug!(tenant = %ctx.tenant, step = %name, "Running provisioning step");
            step.execute(&mut *conn, ctx)
                .await
                .map_err(|source| ProvisionError::Step { step: name, source })?;
        }

        tracing::info!(tenant = %ctx.tenant, "Provisioning pipeline finished");
        Ok(())
    }
}

/// Request body for creating an institute
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstitute {
    pub institute_name: Option<String>,
    pub institute_email: Option<String>,
    pub institute_phone_number: Option<String>,
    pub institute_address: Option<String>,
    pub institute_pan_no: Option<String>,
    pub institute_vat_no: Option<String>,
}

#[derive(Debug, Clone)]
struct ValidInstitute {
    name: String,
    email: String,
    phone: String,
    address: String,
    pan_no: Option<String>,
    vat_no: Option<String>,
}

impl NewInstitute {
    fn validate(self) -> Result<ValidInstitute, ProvisionError> {
        RequiredFields::new()
            .text("instituteName", self.institute_name.as_deref())
            .text("instituteEmail", self.institute_email.as_deref())
            .text("institutePhoneNumber", self.institute_phone_number.as_deref())
            .text("instituteAddress", self.institute_address.as_deref())
            .finish("Please provide")?;

        let email = required(self.institute_email);
        if !email.contains('@') {
            let mut field_errors = HashMap::new();
            field_errors.insert("instituteEmail".to_string(), "Invalid email address".to_string());
            return Err(ProvisionError::Validation {
                message: "Invalid institute email".to_string(),
                field_errors,
            });
        }

        Ok(ValidInstitute {
            name: required(self.institute_name),
            email,
            phone: required(self.institute_phone_number),
            address: required(self.institute_address),
            pan_no: non_blank(self.institute_pan_no),
            vat_no: non_blank(self.institute_vat_no),
        })
    }
}

/// Result of provisioning: the institute plus a token scoped to it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedInstitute {
    #[serde(flatten)]
    pub institute: Institute,
    pub token: String,
}

/// Serialise concurrent provisioning of the same tenant
async fn lock_tenant(conn: &mut PgConnection, tenant: TenantId) -> Result<(), DatabaseError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(tenant.value())
        .execute(conn)
        .await?;
    Ok(())
}

/// Create an institute owned by `owner_id` and build its full table catalog
pub async fn provision(
    pool: &PgPool,
    owner_id: Uuid,
    request: NewInstitute,
) -> Result<ProvisionedInstitute, ProvisionError> {
    provision_with(pool, owner_id, request, &ProvisioningPipeline::for_new_institute()).await
}

/// [`provision`] with a caller-supplied pipeline.
///
/// The institute row, every step and the owner update share one transaction;
/// a failing step leaves no trace.
pub async fn provision_with(
    pool: &PgPool,
    owner_id: Uuid,
    request: NewInstitute,
    pipeline: &ProvisioningPipeline,
) -> Result<ProvisionedInstitute, ProvisionError> {
    let valid = request.validate()?;

    let mut tx = pool.begin().await?;

    let institute: Institute = sqlx::query_as(
        r#"
        INSERT INTO institutes (institute_name, email, phone, address, pan_no, vat_no, owner_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&valid.name)
    .bind(&valid.email)
    .bind(&valid.phone)
    .bind(&valid.address)
    .bind(&valid.pan_no)
    .bind(&valid.vat_no)
    .bind(owner_id)
    .fetch_one(&mut *tx)
    .await?;

    let tenant = TenantId::new(institute.institute_number).map_err(DatabaseError::from)?;
    lock_tenant(&mut tx, tenant).await?;

    let ctx = ProvisionContext {
        tenant,
        owner_id: Some(owner_id),
    };
    pipeline.run(&mut tx, &ctx).await?;

    let updated = sqlx::query(
        r#"
        UPDATE users
        SET current_institute_number = $1, role = 'institute', updated_at = now()
        WHERE id = $2
        "#,
    )
    .bind(tenant.value())
    .bind(owner_id)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(DatabaseError::NotFound("Owner account not found".to_string()).into());
    }

    // Issued before commit so a signing failure rolls the institute back
    let token = generate_jwt(&Claims::new(owner_id, "institute", Some(tenant.value())))?;

    tx.commit().await?;

    tracing::info!(
        tenant = %tenant,
        institute = %institute.institute_name,
        "Institute provisioned"
    );

    Ok(ProvisionedInstitute { institute, token })
}

/// Create any missing tables and seed rows for an existing institute.
///
/// Safe to run repeatedly.
pub async fn ensure_tables(pool: &PgPool, tenant: TenantId) -> Result<(), ProvisionError> {
    let mut tx = pool.begin().await?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM institutes WHERE institute_number = $1)")
        .bind(tenant.value())
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Err(DatabaseError::NotFound(format!("Institute {} not found", tenant)).into());
    }

    lock_tenant(&mut tx, tenant).await?;

    let ctx = ProvisionContext { tenant, owner_id: None };
    ProvisioningPipeline::tables_and_seed().run(&mut tx, &ctx).await?;

    tx.commit().await?;
    Ok(())
}

/// Institute metadata for the caller's active tenant
pub async fn find_institute(pool: &PgPool, tenant: TenantId) -> Result<Institute, ServiceError> {
    sqlx::query_as::<_, Institute>("SELECT * FROM institutes WHERE institute_number = $1")
        .bind(tenant.value())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Institute not found"))
}
