/// Trait describing how a row type maps onto a table.
///
/// Backends that generate SQL (e.g. `modelkit-data-sqlx`) use it to build
/// statements; the extension primitives themselves never look at it.
///
/// # Example
///
/// ```ignore
/// impl Entity for Post {
///     fn model_name() -> &'static str { "post" }
///     fn table_name() -> &'static str { "posts" }
///     fn id_column() -> &'static str { "id" }
///     fn columns() -> &'static [&'static str] { &["id", "title", "slug", "deletedAt"] }
/// }
/// ```
pub trait Entity: Send + Sync + Unpin + 'static {
    /// Label used in error messages ("no such post").
    fn model_name() -> &'static str;
    fn table_name() -> &'static str;
    fn id_column() -> &'static str;
    fn columns() -> &'static [&'static str];
}
