//! Shared quoting and formatting helpers.

/// Escape a closing bracket inside a bracketed identifier.
#[inline]
pub fn escape_bracket(name: &str) -> String {
    name.replace(']', "]]")
}

/// Bracket-quote an identifier: `Order]s` becomes `[Order]]s]`.
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("[{}]", escape_bracket(name))
}

/// Escape single quotes for use inside a string literal.
#[inline]
pub fn escape_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Wide-character string literal: `N'...'`.
#[inline]
pub fn sql_string(value: &str) -> String {
    format!("N'{}'", escape_string(value))
}

/// T-SQL `ON`/`OFF` switch value.
#[inline]
pub fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

/// Two-part name, optionally schema-qualified.
pub fn qualified_name(schema: &str, name: &str, schema_qualify: bool) -> String {
    if schema_qualify && !schema.is_empty() {
        format!("{}.{}", quote_ident(schema), quote_ident(name))
    } else {
        quote_ident(name)
    }
}
