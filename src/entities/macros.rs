//! Macros for reducing boilerplate when defining records
//!
//! These macros generate the struct, the [`Record`](crate::core::record::Record)
//! implementation and the dynamic field access every listable entity needs.

/// Complete macro to create a tenant-owned record type
///
/// Injects `id`, `tenant_id` and `created_at`, then the specific fields.
/// Every field is reachable through `field_value` by its name; map fields
/// are addressed with dotted paths (`tag.customId`).
///
/// Field types must implement [`FieldSource`](crate::core::record::FieldSource).
///
/// # Example
///
/// ```rust,ignore
/// use listq::prelude::*;
///
/// impl_record!(
///     Airport,
///     "airport",
///     "airports",
///     {
///         code: String,
///         name: Option<String>,
///     }
/// );
///
/// let airport = Airport::new(tenant_id, "LFPG".to_string(), None);
/// assert_eq!(airport.field_value("code"), Some(FieldValue::from("LFPG")));
/// ```
#[macro_export]
macro_rules! impl_record {
    (
        $type:ident,
        $singular:expr,
        $plural:expr,
        {
            $( $(#[$field_meta:meta])* $specific_field:ident : $specific_type:ty ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Unique identifier for this record
            pub id: ::uuid::Uuid,

            /// Account owning this record
            pub tenant_id: $crate::core::tenant::TenantId,

            /// When this record was created
            pub created_at: ::chrono::DateTime<::chrono::Utc>,
            $( $(#[$field_meta])* pub $specific_field : $specific_type ),*
        }

        impl $crate::core::record::Record for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn tenant_id(&self) -> $crate::core::tenant::TenantId {
                self.tenant_id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn field_value(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                use $crate::core::record::FieldSource;

                let (head, rest) = $crate::core::record::split_path(field);
                match head {
                    "id" => self.id.field_at(rest),
                    "tenant_id" => self.tenant_id.field_at(rest),
                    "created_at" => self.created_at.field_at(rest),
                    $( name if name == stringify!($specific_field) => self.$specific_field.field_at(rest), )*
                    _ => None,
                }
            }
        }

        impl $type {
            /// Create a new record owned by `tenant_id`
            #[allow(clippy::too_many_arguments)]
            pub fn new(
                tenant_id: $crate::core::tenant::TenantId,
                $( $specific_field: $specific_type ),*
            ) -> Self {
                Self {
                    id: ::uuid::Uuid::new_v4(),
                    tenant_id,
                    created_at: ::chrono::Utc::now(),
                    $( $specific_field ),*
                }
            }

            /// Override the creation timestamp (imports and fixtures)
            pub fn created(mut self, created_at: ::chrono::DateTime<::chrono::Utc>) -> Self {
                self.created_at = created_at;
                self
            }
        }
    };
}
