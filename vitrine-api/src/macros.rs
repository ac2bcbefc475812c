//! Utility macros for reducing boilerplate

/// Implement `FromRef<AppState>` so handlers can extract one piece of state.
///
/// # Example
/// ```ignore
/// impl_from_ref!(Db, db);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for Db {
///     fn from_ref(state: &AppState) -> Self {
///         state.db.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
