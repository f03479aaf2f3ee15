pub mod ddl;
pub mod manager;
pub mod models;
pub mod tenant;

pub use manager::{DatabaseError, DatabaseManager};
pub use tenant::{
    is_tenant_table_name, resolve_table_name, resolve_table_name_str, EntityTable, TableName,
    TableNameError, TenantId,
};
