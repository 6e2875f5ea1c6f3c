//! Identity-provider tables
//!
//! The table identifiers and their column metadata, assembled into the
//! `TableRegistry` every repository is built from.

use std::fmt;
use store_object::{ColumnDef, ColumnKind, PersistenceError, TableRegistry, TableSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseTableName {
    Tenants,
    CloudUsers,
    Users,
    Clients,
    Roles,
    Permissions,
    RolePermissions,
    UserRoles,
    Tokens,
    AuthorizationCodes,
}

impl DatabaseTableName {
    pub const ALL: [DatabaseTableName; 10] = [
        DatabaseTableName::Tenants,
        DatabaseTableName::CloudUsers,
        DatabaseTableName::Users,
        DatabaseTableName::Clients,
        DatabaseTableName::Roles,
        DatabaseTableName::Permissions,
        DatabaseTableName::RolePermissions,
        DatabaseTableName::UserRoles,
        DatabaseTableName::Tokens,
        DatabaseTableName::AuthorizationCodes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseTableName::Tenants => "tenants",
            DatabaseTableName::CloudUsers => "cloud_users",
            DatabaseTableName::Users => "users",
            DatabaseTableName::Clients => "clients",
            DatabaseTableName::Roles => "roles",
            DatabaseTableName::Permissions => "permissions",
            DatabaseTableName::RolePermissions => "role_permissions",
            DatabaseTableName::UserRoles => "user_roles",
            DatabaseTableName::Tokens => "tokens",
            DatabaseTableName::AuthorizationCodes => "authorization_codes",
        }
    }

    /// Column metadata for this table
    pub fn schema(&self) -> Result<TableSchema, PersistenceError> {
        use ColumnKind::*;

        let col = ColumnDef::new;
        let table = TableSchema::new(self.as_str())?;

        let table = match self {
            DatabaseTableName::Tenants => table
                .column(col("id", Uuid))
                .column(col("name", Varchar))
                .column(col("domain", Varchar).nullable())
                .column(col("settings", Jsonb))
                .column(col("is_active", Boolean))
                .column(col("created_at", Timestamp))
                .column(col("updated_at", Timestamp)),
            DatabaseTableName::CloudUsers => table
                .column(col("id", Uuid))
                .column(col("email", Varchar))
                .column(col("password_hash", Varchar))
                .column(col("name", Varchar).nullable())
                .column(col("is_active", Boolean))
                .column(col("created_at", Timestamp))
                .column(col("updated_at", Timestamp)),
            DatabaseTableName::Users => table
                .column(col("id", Uuid))
                .column(col("tenant_id", Uuid).nullable())
                .column(col("name", Varchar).nullable())
                .column(col("given_name", Varchar).nullable())
                .column(col("family_name", Varchar).nullable())
                .column(col("middle_name", Varchar).nullable())
                .column(col("nickname", Varchar).nullable())
                .column(col("preferred_username", Varchar).nullable())
                .column(col("profile", Varchar).nullable())
                .column(col("picture", Varchar).nullable())
                .column(col("website", Varchar).nullable())
                .column(col("gender", Varchar).nullable())
                .column(col("birthdate", Date).nullable())
                .column(col("zoneinfo", Varchar).nullable())
                .column(col("locale", Varchar).nullable())
                .column(col("updated_at", Timestamp).nullable())
                .column(col("email", Varchar))
                .column(col("email_verified", Boolean))
                .column(col("phone_number", Varchar).nullable())
                .column(col("phone_number_verified", Boolean))
                .column(col("address", Jsonb).nullable())
                .column(col("password_hash", Varchar).nullable())
                .column(col("is_active", Boolean))
                .column(col("metadata", Jsonb))
                .column(col("created_at", Timestamp)),
            DatabaseTableName::Clients => table
                .column(col("id", Uuid))
                .column(col("tenant_id", Uuid).nullable())
                .column(col("client_id", Varchar))
                .column(col("client_secret", Varchar).nullable())
                .column(col("name", Varchar))
                .column(col("type", Varchar))
                .column(col("redirect_uris", TextArray).nullable())
                .column(col("allowed_scopes", TextArray).nullable())
                .column(col("allowed_grants", TextArray).nullable())
                .column(col("is_active", Boolean))
                .column(col("require_pkce", Boolean))
                .column(col("settings", Jsonb))
                .column(col("created_at", Timestamp))
                .column(col("updated_at", Timestamp)),
            DatabaseTableName::Roles => table
                .column(col("id", Uuid))
                .column(col("tenant_id", Uuid).nullable())
                .column(col("name", Varchar))
                .column(col("description", Text).nullable())
                .column(col("is_system", Boolean))
                .column(col("created_at", Timestamp))
                .column(col("updated_at", Timestamp)),
            DatabaseTableName::Permissions => table
                .column(col("id", Uuid))
                .column(col("tenant_id", Uuid).nullable())
                .column(col("name", Varchar))
                .column(col("description", Text).nullable())
                .column(col("created_at", Timestamp)),
            DatabaseTableName::RolePermissions => table
                .column(col("role_id", Uuid))
                .column(col("permission_id", Uuid))
                .column(col("created_at", Timestamp)),
            DatabaseTableName::UserRoles => table
                .column(col("user_id", Uuid))
                .column(col("role_id", Uuid))
                .column(col("created_at", Timestamp)),
            DatabaseTableName::Tokens => table
                .column(col("id", Uuid))
                .column(col("tenant_id", Uuid).nullable())
                .column(col("token", Varchar))
                .column(col("type", Varchar))
                .column(col("expires_at", Timestamp))
                .column(col("client_id", Uuid))
                .column(col("user_id", Uuid).nullable())
                .column(col("scopes", TextArray))
                .column(col("metadata", Jsonb))
                .column(col("created_at", Timestamp))
                .column(col("updated_at", Timestamp)),
            DatabaseTableName::AuthorizationCodes => table
                .column(col("id", Uuid))
                .column(col("tenant_id", Uuid).nullable())
                .column(col("code", Varchar))
                .column(col("client_id", Uuid))
                .column(col("user_id", Uuid))
                .column(col("scopes", TextArray))
                .column(col("code_challenge", Varchar).nullable())
                .column(col("code_challenge_method", Varchar).nullable())
                .column(col("redirect_uri", Text))
                .column(col("expires_at", Timestamp))
                .column(col("created_at", Timestamp)),
        };

        Ok(table)
    }
}

impl AsRef<str> for DatabaseTableName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for DatabaseTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry holding every identity-provider table
pub fn default_registry() -> Result<TableRegistry, PersistenceError> {
    let mut registry = TableRegistry::new();
    for table in DatabaseTableName::ALL {
        registry.register(table.schema()?)?;
    }
    Ok(registry)
}
