/// Marker prefix of the directive that declares the active column list.
pub const FIELDS_DIRECTIVE: &str = "#Fields:";

/// Raw field name whose position marks the URL query string column.
pub const QUERY_FIELD: &str = "cs-uri-query";

/// Replace every character outside `[A-Za-z0-9]` with `_`, producing a name
/// that is always a safe SQL identifier.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// SQLite column affinity carried by a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

impl ColumnType {
    pub fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Fixed typing rule: `time-taken` is the only integer field, everything
/// else lands as text.
fn column_type(raw: &str) -> ColumnType {
    match raw {
        "time-taken" => ColumnType::Integer,
        _ => ColumnType::Text,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// Schema derived from one `#Fields:` directive.
///
/// Rebuilt every time a directive is encountered; the table in the store is
/// only created once, so a directive that disagrees with an existing table
/// surfaces as insert errors rather than schema errors.
#[derive(Debug, Clone)]
pub struct LogSchema {
    columns: Vec<Column>,
    extra_columns: Vec<Column>,
    query_column_index: Option<usize>,
}

impl LogSchema {
    /// Derives a schema from the full directive line. Field tokens are
    /// space-separated; repeated spaces collapse. A directive with no tokens
    /// yields an empty column list, which the store rejects at table
    /// creation.
    pub fn from_directive(line: &str, query_params: &[String]) -> Self {
        let fields = line.strip_prefix(FIELDS_DIRECTIVE).unwrap_or(line);
        let columns: Vec<Column> = fields
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(|t| Column {
                name: sanitize(t),
                ty: column_type(t),
            })
            .collect();

        // Inherited quirk: the query column is looked up by (name, type)
        // rather than name alone. Should the typing rule ever map
        // cs-uri-query to something other than TEXT, this lookup misses and
        // extraction silently turns off.
        let wanted = sanitize(QUERY_FIELD);
        let query_column_index = columns
            .iter()
            .position(|c| c.name == wanted && c.ty == ColumnType::Text);

        let extra_columns = query_params
            .iter()
            .map(|p| Column {
                name: sanitize(p),
                ty: ColumnType::Text,
            })
            .collect();

        LogSchema {
            columns,
            extra_columns,
            query_column_index,
        }
    }

    /// Position of the URL query string within the parsed fields, if the
    /// directive declared one. Extra columns sit after the parsed fields, so
    /// they never shift this index.
    pub fn query_column_index(&self) -> Option<usize> {
        self.query_column_index
    }

    /// Parsed columns followed by the configured extraction columns, in
    /// table order.
    pub fn all_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().chain(self.extra_columns.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn col(name: &str, ty: ColumnType) -> Column {
        Column {
            name: name.to_string(),
            ty,
        }
    }

    #[test]
    fn sanitize_replaces_every_non_alphanumeric() {
        assert_eq!(sanitize("cs-uri-query"), "cs_uri_query");
        assert_eq!(sanitize("cs(User-Agent)"), "cs_User_Agent_");
        assert_eq!(sanitize("date"), "date");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["cs-uri-query", "s.port", "x!@#y", "time-taken", "___"] {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn directive_resolves_columns_and_query_index() {
        let schema = LogSchema::from_directive("#Fields: date time cs-uri-query", &[]);
        let cols: Vec<Column> = schema.all_columns().cloned().collect();
        assert_eq!(
            cols,
            vec![
                col("date", ColumnType::Text),
                col("time", ColumnType::Text),
                col("cs_uri_query", ColumnType::Text),
            ]
        );
        assert_eq!(schema.query_column_index(), Some(2));
    }

    #[test]
    fn time_taken_is_integer_and_index_absent_without_query_field() {
        let schema = LogSchema::from_directive("#Fields: date time-taken", &[]);
        let cols: Vec<Column> = schema.all_columns().cloned().collect();
        assert_eq!(
            cols,
            vec![
                col("date", ColumnType::Text),
                col("time_taken", ColumnType::Integer),
            ]
        );
        assert_eq!(schema.query_column_index(), None);
    }

    #[test]
    fn extra_columns_follow_parsed_columns_without_shifting_the_index() {
        let schema = LogSchema::from_directive(
            "#Fields: date time cs-uri-query",
            &params(&["sc-status"]),
        );
        let cols: Vec<Column> = schema.all_columns().cloned().collect();
        assert_eq!(cols.len(), 4);
        assert_eq!(cols[3], col("sc_status", ColumnType::Text));
        assert_eq!(schema.query_column_index(), Some(2));
    }

    #[test]
    fn repeated_spaces_between_fields_collapse() {
        let schema = LogSchema::from_directive("#Fields:  date   time ", &[]);
        assert_eq!(schema.all_columns().count(), 2);
    }

    #[test]
    fn empty_directive_yields_no_columns() {
        let schema = LogSchema::from_directive("#Fields:", &[]);
        assert_eq!(schema.all_columns().count(), 0);
        assert_eq!(schema.query_column_index(), None);
    }
}
