//! Column discovery and batch shape validation

use crate::error::{Error, Result};
use crate::models::registry::TableRegistry;
use crate::models::row::Row;

/// Destination table and ordered column set derived from the first row
#[derive(Debug, Clone, PartialEq)]
pub struct BatchShape {
    pub table: String,
    pub columns: Vec<String>,
}

/// Derive the target table and columns from the first row of a batch
///
/// Records use their own column order and need an explicit table. Entity
/// rows keep only the attributes that are registered columns of their
/// table, in attribute order; the table defaults to the registered one.
pub fn discover(first: &Row, table: Option<&str>, registry: &TableRegistry) -> Result<BatchShape> {
    if let Some(name) = table {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument("Table name must not be empty".to_string()));
        }
    }

    let shape = match first {
        Row::Record(record) => {
            let table = table.ok_or_else(|| {
                Error::InvalidArgument("A table name is required for record rows".to_string())
            })?;
            BatchShape {
                table: table.to_string(),
                columns: record.column_names().map(str::to_string).collect(),
            }
        }
        Row::Entity(entity) => {
            let meta = registry
                .get(entity.entity())
                .ok_or_else(|| Error::UnknownEntity(entity.entity().to_string()))?;

            let (columns, dropped): (Vec<&str>, Vec<&str>) =
                entity.attribute_names().partition(|name| meta.has_column(name));
            if !dropped.is_empty() {
                tracing::debug!(
                    entity = entity.entity(),
                    dropped = ?dropped,
                    "Skipping attributes that are not table columns"
                );
            }

            BatchShape {
                table: table.unwrap_or(&meta.name).to_string(),
                columns: columns.into_iter().map(str::to_string).collect(),
            }
        }
    };

    if shape.columns.is_empty() {
        return Err(Error::UnsupportedRowShape(format!(
            "{} has no insertable columns",
            first.shape()
        )));
    }

    Ok(shape)
}

/// Check that every row matches the first row's shape and column set
///
/// Runs before anything is flushed, so a malformed batch never half-applies.
pub fn validate(rows: &[Row], columns: &[String]) -> Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };

    for (index, row) in rows.iter().enumerate().skip(1) {
        match (first, row) {
            (Row::Record(_), Row::Record(record)) => {
                if record.len() != columns.len() {
                    return Err(Error::RowShapeMismatch {
                        row: index,
                        reason: format!(
                            "expected {} columns, found {}",
                            columns.len(),
                            record.len()
                        ),
                    });
                }
            }
            (Row::Entity(expected), Row::Entity(entity)) => {
                if expected.entity() != entity.entity() {
                    return Err(Error::RowShapeMismatch {
                        row: index,
                        reason: format!(
                            "expected entity `{}`, found `{}`",
                            expected.entity(),
                            entity.entity()
                        ),
                    });
                }
            }
            (expected, found) => {
                return Err(Error::RowShapeMismatch {
                    row: index,
                    reason: format!("expected {}, found {}", expected.shape(), found.shape()),
                });
            }
        }

        if let Some(missing) = columns.iter().find(|c| row.get(c).is_none()) {
            return Err(Error::RowShapeMismatch {
                row: index,
                reason: format!("missing column `{}`", missing),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registry::TableMeta;
    use crate::models::row::{EntityRow, Record};
    use pretty_assertions::assert_eq;

    fn registry() -> TableRegistry {
        let mut registry = TableRegistry::new();
        registry
            .register("Account", TableMeta::new("accounts", ["id", "email", "name"]))
            .unwrap();
        registry
    }

    #[test]
    fn test_record_columns_follow_record_order() {
        let row: Row = Record::new().with("name", "a").with("id", 1).into();
        let shape = discover(&row, Some("people"), &registry()).unwrap();
        assert_eq!(shape.table, "people");
        assert_eq!(shape.columns, vec!["name", "id"]);
    }

    #[test]
    fn test_record_requires_table() {
        let row: Row = Record::new().with("id", 1).into();
        assert!(matches!(discover(&row, None, &registry()), Err(Error::InvalidArgument(_))));
        assert!(matches!(discover(&row, Some("  "), &registry()), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_entity_drops_non_columns_and_keeps_attribute_order() {
        let row: Row = EntityRow::new("Account")
            .with("name", "ann")
            .with("display_label", "Ann!")
            .with("id", 7)
            .into();
        let shape = discover(&row, None, &registry()).unwrap();
        assert_eq!(shape.table, "accounts");
        assert_eq!(shape.columns, vec!["name", "id"]);
    }

    #[test]
    fn test_unregistered_entity_is_rejected() {
        let row: Row = EntityRow::new("Invoice").with("id", 1).into();
        assert!(matches!(
            discover(&row, None, &registry()),
            Err(Error::UnknownEntity(name)) if name == "Invoice"
        ));
    }

    #[test]
    fn test_entity_without_real_columns_is_unsupported() {
        let row: Row = EntityRow::new("Account").with("transient", 1).into();
        assert!(matches!(
            discover(&row, None, &registry()),
            Err(Error::UnsupportedRowShape(_))
        ));
    }

    #[test]
    fn test_validate_rejects_mixed_shapes() {
        let rows: Vec<Row> = vec![
            Record::new().with("id", 1).into(),
            EntityRow::new("Account").with("id", 2).into(),
        ];
        let err = validate(&rows, &["id".to_string()]).unwrap_err();
        assert!(matches!(err, Error::RowShapeMismatch { row: 1, .. }));
    }

    #[test]
    fn test_validate_rejects_missing_and_extra_columns() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let missing: Vec<Row> = vec![
            Record::new().with("id", 1).with("name", "a").into(),
            Record::new().with("id", 2).with("nme", "b").into(),
        ];
        let extra: Vec<Row> = vec![
            Record::new().with("id", 1).with("name", "a").into(),
            Record::new().with("id", 2).with("name", "b").with("age", 3).into(),
        ];

        assert!(matches!(
            validate(&missing, &columns),
            Err(Error::RowShapeMismatch { row: 1, reason }) if reason.contains("`name`")
        ));
        assert!(matches!(validate(&extra, &columns), Err(Error::RowShapeMismatch { row: 1, .. })));
    }

    #[test]
    fn test_validate_accepts_entities_with_extra_attributes() {
        let columns = vec!["id".to_string()];
        let rows: Vec<Row> = vec![
            EntityRow::new("Account").with("id", 1).into(),
            EntityRow::new("Account").with("id", 2).with("cached", true).into(),
        ];
        validate(&rows, &columns).unwrap();
    }
}
