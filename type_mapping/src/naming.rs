//! Identifier normalization
//!
//! Domain field names are camelCase, relational columns are snake_case. The
//! mapping is implicit and has to be mirrored by the schema.

/// Convert a camelCase field name into its snake_case column name.
///
/// An underscore is inserted before every ASCII uppercase letter, a single
/// leading underscore is stripped and the result is lowercased:
/// `clientId` becomes `client_id`, `Id` becomes `id`.
pub fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            snake.push('_');
        }
        snake.push(c);
    }

    let snake = snake.strip_prefix('_').unwrap_or(&snake);
    snake.to_lowercase()
}

/// Wrap an identifier in double quotes. Embedded quotes are doubled.
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    quoted.push_str(&name.replace('"', "\"\""));
    quoted.push('"');
    quoted
}

/// Column name for an INSERT column list or a SET assignment.
///
/// Snake_cased and left bare when it is a plain lowercase identifier, which
/// is every key the entity payloads produce. Anything else is quoted so the
/// statement never carries an unbalanced quote character.
pub fn target_column(name: &str) -> String {
    let snake = to_snake_case(name);
    let plain = snake
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && snake
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if plain {
        snake
    } else {
        quote_identifier(&snake)
    }
}

/// Render a column selection list.
///
/// Every field is snake_cased and quoted; an empty selection is `*`.
pub fn render_column_list<S: AsRef<str>>(columns: &[S]) -> String {
    if columns.is_empty() {
        return "*".to_string();
    }

    columns
        .iter()
        .map(|column| quote_identifier(&to_snake_case(column.as_ref())))
        .collect::<Vec<_>>()
        .join(", ")
}
