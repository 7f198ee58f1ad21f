//! Statement descriptions and their compilation to parameterized SQL.
//!
//! Every round trip to the database is described by one [`Statement`]
//! variant carrying a typed payload. [`Statement::compile`] turns it into
//! PostgreSQL text with `$n` placeholders plus the bound values, so a value
//! can never be spliced into the SQL text.

use crate::model::ModelMeta;
use crate::query::filters::Condition;
use crate::value::Value;

/// A column ordering direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The column to order by.
    pub column: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl OrderBy {
    /// Creates an ascending order.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Creates a descending order.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    /// Parses `name` or `-name`.
    pub fn parse(term: &str) -> Self {
        term.strip_prefix('-')
            .map_or_else(|| Self::asc(term), Self::desc)
    }

    fn to_sql(&self, qualifier: Option<&str>) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        match qualifier {
            Some(table) => format!("{table}.{} {direction}", self.column),
            None => format!("{} {direction}", self.column),
        }
    }
}

/// A single-use description of one database request.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `CREATE TABLE IF NOT EXISTS` for a model's own columns.
    CreateTable {
        /// Table name.
        table: String,
        /// Column definitions.
        columns: Vec<String>,
        /// Columns of the unique-together clause, if any.
        unique_together: Vec<String>,
    },
    /// Re-creates a named table constraint, so it can be re-run safely.
    AddConstraint {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
        /// Constraint definition, e.g. `FOREIGN KEY (a) REFERENCES b(id)`.
        definition: String,
    },
    /// `CREATE TABLE IF NOT EXISTS` for a many-to-many junction table. Rows
    /// go away with either side they reference.
    CreateRelationTable {
        /// Junction table name.
        table: String,
        /// Column definitions.
        columns: Vec<String>,
    },
    /// `SELECT * FROM table`.
    SelectAll {
        /// Table name.
        table: String,
    },
    /// `SELECT` with an optional condition and ordering.
    Select {
        /// Table name.
        table: String,
        /// Selected columns; empty selects `*`.
        columns: Vec<String>,
        /// Optional `WHERE` condition.
        condition: Option<Condition>,
        /// `ORDER BY` terms.
        ordering: Vec<OrderBy>,
    },
    /// Rows of `table` related to `my_id` through a junction table.
    SelectRelated {
        /// Table of the rows returned.
        table: String,
        /// Primary key column of `table`.
        pk_column: String,
        /// Junction table name.
        junction: String,
        /// Junction column referencing `table`.
        other_column: String,
        /// Junction column referencing the owning model.
        my_column: String,
        /// The owning instance's primary key.
        my_id: Value,
        /// `ORDER BY` terms on `table`.
        ordering: Vec<OrderBy>,
    },
    /// `SELECT COUNT(*)`.
    Count {
        /// Table name.
        table: String,
    },
    /// `INSERT ... RETURNING *`.
    Insert {
        /// Table name.
        table: String,
        /// Column names.
        columns: Vec<String>,
        /// Values, one per column.
        values: Vec<Value>,
    },
    /// `UPDATE ONLY ... WHERE pk=... RETURNING *`.
    Update {
        /// Table name.
        table: String,
        /// Column names.
        columns: Vec<String>,
        /// Values, one per column.
        values: Vec<Value>,
        /// Primary key column.
        pk_column: String,
        /// Primary key of the updated row.
        pk_value: Value,
    },
    /// `DELETE FROM ... WHERE ...`.
    Delete {
        /// Table name.
        table: String,
        /// Rows to delete.
        condition: Condition,
    },
}

/// SQL text plus the values bound to its `$n` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    /// The SQL text.
    pub sql: String,
    /// Bound parameters in placeholder order.
    pub params: Vec<Value>,
}

impl Statement {
    /// Builds the `CREATE TABLE` statement for `meta`, without many-to-many
    /// fields.
    pub fn create_table(meta: &ModelMeta) -> Self {
        Self::CreateTable {
            table: meta.table.clone(),
            columns: meta.column_fields().map(|f| f.column_definition()).collect(),
            unique_together: meta.unique_together.clone(),
        }
    }

    /// Builds the constraints added once `meta`'s table exists.
    pub fn add_constraints(meta: &ModelMeta) -> Vec<Self> {
        meta.column_fields()
            .filter_map(|f| f.trailing_constraint(&meta.table))
            .map(|(name, definition)| Self::AddConstraint {
                table: meta.table.clone(),
                name,
                definition,
            })
            .collect()
    }

    /// Builds one junction table statement per many-to-many field of `meta`.
    pub fn create_relation_tables(meta: &ModelMeta) -> Vec<Self> {
        meta.m2m_fields()
            .filter_map(|f| f.junction.as_ref())
            .map(|j| Self::CreateRelationTable {
                table: j.table.clone(),
                columns: vec![
                    format!(
                        "{} integer NOT NULL REFERENCES {}({}) ON DELETE CASCADE",
                        j.own_column, j.own_table, j.own_pk
                    ),
                    format!(
                        "{} integer NOT NULL REFERENCES {}({}) ON DELETE CASCADE",
                        j.foreign_column, j.foreign_table, j.foreign_pk
                    ),
                ],
            })
            .collect()
    }

    /// Returns the action tag used in logs.
    pub const fn action(&self) -> &'static str {
        match self {
            Self::CreateTable { .. } => "create_table",
            Self::AddConstraint { .. } => "add_constraint",
            Self::CreateRelationTable { .. } => "create_relation_table",
            Self::SelectAll { .. } => "select_all",
            Self::Select { .. } => "select",
            Self::SelectRelated { .. } => "m2m",
            Self::Count { .. } => "count",
            Self::Insert { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    /// Compiles the statement into SQL and parameters.
    pub fn compile(&self) -> CompiledStatement {
        let mut params = Vec::new();

        let sql = match self {
            Self::CreateTable {
                table,
                columns,
                unique_together,
            } => {
                let mut body = columns.join(", ");
                if !unique_together.is_empty() {
                    body.push_str(&format!(", UNIQUE ({})", unique_together.join(",")));
                }
                format!("CREATE TABLE IF NOT EXISTS {table} ({body})")
            }
            Self::AddConstraint {
                table,
                name,
                definition,
            } => format!(
                "ALTER TABLE {table} DROP CONSTRAINT IF EXISTS {name}, ADD CONSTRAINT {name} {definition}"
            ),
            Self::CreateRelationTable { table, columns } => {
                format!("CREATE TABLE IF NOT EXISTS {table} ({})", columns.join(", "))
            }
            Self::SelectAll { table } => format!("SELECT * FROM {table}"),
            Self::Select {
                table,
                columns,
                condition,
                ordering,
            } => {
                let select = if columns.is_empty() {
                    "*".to_string()
                } else {
                    columns.join(", ")
                };
                let mut sql = format!("SELECT {select} FROM {table}");
                if let Some(cond) = condition.as_ref().filter(|c| !c.is_empty()) {
                    sql.push_str(" WHERE ");
                    sql.push_str(&cond.render(None, &mut params));
                }
                push_order_by(&mut sql, ordering, None);
                sql
            }
            Self::SelectRelated {
                table,
                pk_column,
                junction,
                other_column,
                my_column,
                my_id,
                ordering,
            } => {
                params.push(my_id.clone());
                let mut sql = format!(
                    "SELECT {table}.* FROM {table} INNER JOIN {junction} \
                     ON {table}.{pk_column}={junction}.{other_column} \
                     WHERE {junction}.{my_column}=$1"
                );
                push_order_by(&mut sql, ordering, Some(table.as_str()));
                sql
            }
            Self::Count { table } => format!("SELECT COUNT(*) FROM {table}"),
            Self::Insert {
                table,
                columns,
                values,
            } => {
                if columns.is_empty() {
                    format!("INSERT INTO {table} DEFAULT VALUES RETURNING *")
                } else {
                    let placeholders = bind_all(values, &mut params);
                    format!(
                        "INSERT INTO {table} ({}) VALUES ({}) RETURNING *",
                        columns.join(", "),
                        placeholders.join(", ")
                    )
                }
            }
            Self::Update {
                table,
                columns,
                values,
                pk_column,
                pk_value,
            } => {
                let placeholders = bind_all(values, &mut params);
                // PostgreSQL requires ROW() when the target list has one column.
                let values_sql = if placeholders.len() == 1 {
                    format!("ROW({})", placeholders[0])
                } else {
                    format!("({})", placeholders.join(", "))
                };
                params.push(pk_value.clone());
                format!(
                    "UPDATE ONLY {table} SET ({}) = {values_sql} WHERE {pk_column}=${} RETURNING *",
                    columns.join(", "),
                    params.len()
                )
            }
            Self::Delete { table, condition } => {
                format!("DELETE FROM {table} WHERE {}", condition.render(None, &mut params))
            }
        };

        CompiledStatement { sql, params }
    }
}

fn bind_all(values: &[Value], params: &mut Vec<Value>) -> Vec<String> {
    values
        .iter()
        .map(|v| {
            params.push(v.clone());
            format!("${}", params.len())
        })
        .collect()
}

fn push_order_by(sql: &mut String, ordering: &[OrderBy], qualifier: Option<&str>) {
    if ordering.is_empty() {
        return;
    }
    let terms: Vec<String> = ordering.iter().map(|o| o.to_sql(qualifier)).collect();
    sql.push_str(" ORDER BY ");
    sql.push_str(&terms.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldDef, FieldType};
    use crate::query::filters::{compile_filters, Filters};

    fn book_meta() -> ModelMeta {
        ModelMeta::new(
            "Book",
            vec![
                FieldDef::new("name", FieldType::CharField).max_length(50),
                FieldDef::new("content", FieldType::CharField).max_length(255),
                FieldDef::new("author", FieldType::foreign_key("author")).nullable(),
                FieldDef::new("readers", FieldType::many_to_many("reader")),
            ],
        )
        .table("library")
        .ordering(&["-id"])
        .unique_together(&["name", "content"])
    }

    #[test]
    fn test_order_by_parse() {
        assert_eq!(OrderBy::parse("-name"), OrderBy::desc("name"));
        assert_eq!(OrderBy::parse("name"), OrderBy::asc("name"));
    }

    #[test]
    fn test_create_table() {
        let compiled = Statement::create_table(&book_meta()).compile();
        assert_eq!(
            compiled.sql,
            "CREATE TABLE IF NOT EXISTS library (id serial PRIMARY KEY, \
             name varchar(50) NOT NULL, content varchar(255) NOT NULL, \
             author integer NULL, UNIQUE (name,content))"
        );
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_add_constraints() {
        let stmts = Statement::add_constraints(&book_meta());
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].action(), "add_constraint");
        assert_eq!(
            stmts[0].compile().sql,
            "ALTER TABLE library DROP CONSTRAINT IF EXISTS library_author_fkey, \
             ADD CONSTRAINT library_author_fkey FOREIGN KEY (author) REFERENCES author(id)"
        );
    }

    #[test]
    fn test_create_relation_tables() {
        let stmts = Statement::create_relation_tables(&book_meta());
        assert_eq!(stmts.len(), 1);
        assert_eq!(
            stmts[0].compile().sql,
            "CREATE TABLE IF NOT EXISTS library_reader (\
             library integer NOT NULL REFERENCES library(id) ON DELETE CASCADE, \
             reader integer NOT NULL REFERENCES reader(id) ON DELETE CASCADE)"
        );
    }

    #[test]
    fn test_junction_rows_cascade_with_both_sides() {
        let meta = ModelMeta::new(
            "Volume",
            vec![FieldDef::new("shelves", FieldType::many_to_many("shelf"))],
        );
        let sql = Statement::create_relation_tables(&meta)[0].compile().sql;
        assert!(sql.contains("volume integer NOT NULL REFERENCES volume(id) ON DELETE CASCADE"));
        assert!(sql.contains("shelf integer NOT NULL REFERENCES shelf(id) ON DELETE CASCADE"));
    }

    #[test]
    fn test_select_all_and_count() {
        let table = "library".to_string();
        assert_eq!(
            Statement::SelectAll { table: table.clone() }.compile().sql,
            "SELECT * FROM library"
        );
        assert_eq!(
            Statement::Count { table }.compile().sql,
            "SELECT COUNT(*) FROM library"
        );
    }

    #[test]
    fn test_select_with_condition_and_ordering() {
        let meta = book_meta();
        let cond = compile_filters(&meta, &Filters::new().with("name", "Dune"), false).unwrap();
        let stmt = Statement::Select {
            table: meta.table.clone(),
            columns: vec![],
            condition: Some(cond),
            ordering: meta.ordering.clone(),
        };
        let compiled = stmt.compile();
        assert_eq!(compiled.sql, "SELECT * FROM library WHERE name=$1 ORDER BY id DESC");
        assert_eq!(compiled.params, vec![Value::from("Dune")]);
    }

    #[test]
    fn test_select_without_condition() {
        let stmt = Statement::Select {
            table: "library".into(),
            columns: vec!["library AS id".into()],
            condition: None,
            ordering: vec![OrderBy::asc("id")],
        };
        assert_eq!(stmt.compile().sql, "SELECT library AS id FROM library ORDER BY id ASC");
    }

    #[test]
    fn test_select_related() {
        let stmt = Statement::SelectRelated {
            table: "publisher".into(),
            pk_column: "id".into(),
            junction: "author_publisher".into(),
            other_column: "publisher".into(),
            my_column: "author".into(),
            my_id: Value::Int(5),
            ordering: vec![OrderBy::desc("name")],
        };
        let compiled = stmt.compile();
        assert_eq!(
            compiled.sql,
            "SELECT publisher.* FROM publisher INNER JOIN author_publisher \
             ON publisher.id=author_publisher.publisher \
             WHERE author_publisher.author=$1 ORDER BY publisher.name DESC"
        );
        assert_eq!(compiled.params, vec![Value::Int(5)]);
        assert_eq!(stmt.action(), "m2m");
    }

    #[test]
    fn test_insert() {
        let stmt = Statement::Insert {
            table: "library".into(),
            columns: vec!["name".into(), "content".into()],
            values: vec![Value::from("Dune"), Value::from("paperback")],
        };
        let compiled = stmt.compile();
        assert_eq!(
            compiled.sql,
            "INSERT INTO library (name, content) VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(compiled.params.len(), 2);
        assert_eq!(stmt.action(), "create");
    }

    #[test]
    fn test_insert_default_values() {
        let stmt = Statement::Insert {
            table: "tag".into(),
            columns: vec![],
            values: vec![],
        };
        assert_eq!(stmt.compile().sql, "INSERT INTO tag DEFAULT VALUES RETURNING *");
    }

    #[test]
    fn test_update() {
        let stmt = Statement::Update {
            table: "library".into(),
            columns: vec!["name".into(), "content".into()],
            values: vec![Value::from("Dune"), Value::from("paperback")],
            pk_column: "id".into(),
            pk_value: Value::Int(7),
        };
        let compiled = stmt.compile();
        assert_eq!(
            compiled.sql,
            "UPDATE ONLY library SET (name, content) = ($1, $2) WHERE id=$3 RETURNING *"
        );
        assert_eq!(compiled.params[2], Value::Int(7));
    }

    #[test]
    fn test_update_single_column_uses_row() {
        let stmt = Statement::Update {
            table: "publisher".into(),
            columns: vec!["name".into()],
            values: vec![Value::from("Ace")],
            pk_column: "id".into(),
            pk_value: Value::Int(1),
        };
        assert_eq!(
            stmt.compile().sql,
            "UPDATE ONLY publisher SET (name) = ROW($1) WHERE id=$2 RETURNING *"
        );
    }

    #[test]
    fn test_delete() {
        let stmt = Statement::Delete {
            table: "library".into(),
            condition: Condition::equals("id", Value::Int(3)),
        };
        let compiled = stmt.compile();
        assert_eq!(compiled.sql, "DELETE FROM library WHERE id=$1");
        assert_eq!(compiled.params, vec![Value::Int(3)]);
    }
}
