//! `#[derive(Entity)]` and entity batches

use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use batch_insert::models::Entity;
use batch_insert::{BatchInserter, Result, Row, TableMeta, TableRegistry, Value};

#[derive(Debug, Clone, batch_insert::Entity)]
struct Customer {
    id: i64,
    email: String,
    nickname: Option<String>,
    signup_date: NaiveDate,
    // Computed, not a table column
    display_name: String,
    #[entity(skip)]
    #[allow(dead_code)]
    session_token: Vec<u8>,
}

#[derive(Debug, Clone, batch_insert::Entity)]
#[entity(name = "LedgerLine")]
struct Line {
    #[entity(rename = "line_no")]
    number: u32,
    amount: f64,
}

fn customer(id: i64) -> Customer {
    Customer {
        id,
        email: format!("c{}@example.com", id),
        nickname: None,
        signup_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        display_name: format!("Customer #{}", id),
        session_token: vec![1, 2, 3],
    }
}

fn registry() -> TableRegistry {
    let mut registry = TableRegistry::new();
    registry
        .register_entity::<Customer>(TableMeta::new(
            "customers",
            ["id", "email", "nickname", "signup_date"],
        ))
        .unwrap();
    registry
        .register_entity::<Line>(TableMeta::new("ledger_lines", ["line_no", "amount"]))
        .unwrap();
    registry
}

#[test]
fn test_derived_attributes() {
    let attributes = customer(1).attributes();
    let names: Vec<&str> = attributes.iter().map(|(name, _)| name.as_str()).collect();

    assert_eq!(Customer::entity_name(), "Customer");
    assert_eq!(names, vec!["id", "email", "nickname", "signup_date", "display_name"]);
    assert_eq!(attributes[2].1, Value::Null);
}

#[test]
fn test_struct_name_and_field_rename() {
    let line = Line {
        number: 3,
        amount: 9.5,
    };

    assert_eq!(Line::entity_name(), "LedgerLine");
    assert_eq!(
        line.attributes(),
        vec![
            ("line_no".to_string(), Value::Int(3)),
            ("amount".to_string(), Value::Float(9.5)),
        ]
    );
}

#[test]
fn test_insert_entities_uses_registered_table_and_columns() {
    let inserter = BatchInserter::new(Arc::new(registry()), 2);
    let customers: Vec<Customer> = (1..=3).map(customer).collect();

    let mut statements = Vec::new();
    let mut executor = |sql: &str, params: &[Value]| -> Result<u64> {
        statements.push((sql.to_string(), params.len()));
        Ok((params.len() / 4) as u64)
    };

    let affected = inserter.insert_entities(&customers, &mut executor).unwrap();

    assert_eq!(affected, Some(3));
    assert_eq!(
        statements,
        vec![
            (
                "INSERT INTO `customers` (`id`, `email`, `nickname`, `signup_date`) VALUES (?, ?, ?, ?), (?, ?, ?, ?)"
                    .to_string(),
                8
            ),
            (
                "INSERT INTO `customers` (`id`, `email`, `nickname`, `signup_date`) VALUES (?, ?, ?, ?)"
                    .to_string(),
                4
            ),
        ]
    );
}

#[test]
fn test_row_from_entity_snapshot() {
    let row = Row::from_entity(&customer(7));
    assert_eq!(row.get("id"), Some(&Value::Int(7)));
    assert_eq!(row.get("session_token"), None);
    assert_eq!(row.shape(), "entity `Customer`");
}
