//! User records

use crate::core::error::ConfigError;
use crate::core::filter::{FilterDefinition, FilterRegistry, ValueType};
use crate::core::query::SortKey;
use crate::impl_record;

impl_record!(
    User,
    "user",
    "users",
    {
        email: String,
        first_name: String,
        last_name: String,
        role: String,
        active: bool,
        employee_id: Option<String>,
    }
);

pub const USER_ROLES: &[&str] = &["admin", "safety_officer", "pilot", "viewer"];

pub fn user_filters() -> Result<FilterRegistry, ConfigError> {
    let roles = USER_ROLES.iter().map(|r| r.to_string()).collect();

    FilterRegistry::builder("user")
        .filter(FilterDefinition::equals("role", "role", ValueType::Enum(roles)).multiple())
        .filter(FilterDefinition::equals("active", "active", ValueType::Boolean))
        .filter(FilterDefinition::equals("email", "email", ValueType::String))
        .sortable("last_name")
        .sortable("first_name")
        .sortable("created_at")
        .tag("employeeId", "employee_id")
        .default_sort(vec![SortKey::asc("last_name"), SortKey::asc("first_name")])
        .build()
}
