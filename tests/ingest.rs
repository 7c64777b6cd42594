mod common;

use common::{TestWorkspace, fixture_path};
use csv_normalize::{
    data::Value,
    ingest::{IngestOptions, load_table},
    model::DataType,
};
use encoding_rs::WINDOWS_1252;

#[test]
fn orders_fixture_loads_with_clean_names_and_types() {
    let table = load_table(&fixture_path("orders.csv"), &IngestOptions::default())
        .expect("load orders fixture");
    assert_eq!(table.name, "orders");
    assert_eq!(
        table.column_names(),
        vec!["order_id", "product", "qty", "customer_name", "customer_email"]
    );
    assert_eq!(table.row_count(), 10);

    let order_id = table.column("order_id").expect("order_id column");
    assert_eq!(order_id.data_type, DataType::Integer);
    assert!(order_id.unique);
    assert!(!order_id.nullable);
    assert_eq!(order_id.sample_values.len(), 5);

    let product = table.column("product").expect("product column");
    assert_eq!(product.data_type, DataType::Varchar { max_length: 50 });
    assert!(!product.unique);
    assert_eq!(table.data[0].get("qty"), Some(&Value::Integer(2)));
}

#[test]
fn placeholders_and_blanks_are_nulls() {
    let table = load_table(&fixture_path("contacts.csv"), &IngestOptions::default())
        .expect("load contacts fixture");
    let phone3 = table.column("phone3").expect("phone3 column");
    assert!(phone3.nullable);
    assert_eq!(phone3.sample_values, vec![Value::from("555-0303")]);
    assert!(!table.data[0].contains_key("phone3"));
    assert!(!table.data[1].contains_key("phone2"));
}

#[test]
fn row_cap_limits_the_sample() {
    let options = IngestOptions {
        max_rows: 4,
        ..IngestOptions::default()
    };
    let table = load_table(&fixture_path("orders.csv"), &options).expect("load capped");
    assert_eq!(table.row_count(), 4);
}

#[test]
fn tsv_and_custom_delimiters_are_honoured() {
    let workspace = TestWorkspace::new();
    let tsv = workspace.write("Stock Levels.tsv", "sku\tqty\nA1\t3\nA2\t4\n");
    let table = load_table(&tsv, &IngestOptions::default()).expect("load tsv");
    assert_eq!(table.name, "stock_levels");
    assert_eq!(table.column_names(), vec!["sku", "qty"]);

    let semicolons = workspace.write("prices.csv", "sku;price\nA1;9.50\nA2;10\n");
    let options = IngestOptions {
        delimiter: Some(b';'),
        ..IngestOptions::default()
    };
    let table = load_table(&semicolons, &options).expect("load semicolon csv");
    assert_eq!(
        table.column("price").map(|c| c.data_type),
        Some(DataType::Decimal)
    );
}

#[test]
fn input_encoding_is_applied() {
    let workspace = TestWorkspace::new();
    let (encoded, _, _) = WINDOWS_1252.encode("id,name\n1,Caf\u{e9}\n");
    let path = workspace.path().join("cafes.csv");
    std::fs::write(&path, &encoded).expect("write encoded input");

    let options = IngestOptions {
        encoding: Some("windows-1252".to_string()),
        ..IngestOptions::default()
    };
    let table = load_table(&path, &options).expect("load encoded csv");
    assert_eq!(table.data[0].get("name"), Some(&Value::from("Caf\u{e9}")));
}

#[test]
fn ragged_rows_report_the_row_number() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("ragged.csv", "a,b\n1,2\n3\n");
    let err = load_table(&path, &IngestOptions::default()).expect_err("ragged input fails");
    assert!(format!("{err:#}").contains("Reading row 2"));
}
