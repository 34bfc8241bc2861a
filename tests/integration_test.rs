use csv_analyzer::db::ColumnKind;
use csv_analyzer::{AnalysisCommand, AnalyzerConfig, AnalyzerError, AnalyzerHost, CellValue};

const ORDERS: &str = "\
order_id,customer,amount,shipped,ordered_on
1,Alice,19.99,true,2024-01-05
2,Bob,5.00,false,2024-01-06
3,Carol,120.50,true,2024-02-11
4,Alice,,false,2024-03-01
";

/// Integer columns well past the type-sniffing sample, then an uncastable value
fn unparseable_csv() -> String {
    let mut csv = String::from("order_id,qty\n");
    for i in 0..30_000 {
        csv.push_str(&format!("{},{}\n", i, i % 5));
    }
    csv.push_str("oops,1\n");
    csv
}

/// Initialized host with ORDERS loaded into the default table
fn loaded_host() -> AnalyzerHost {
    let mut host = AnalyzerHost::new(AnalyzerConfig::default());
    host.initialize().expect("initialize");
    assert_eq!(host.load_csv(ORDERS).expect("load"), 4);
    host
}

#[test]
fn test_minimal_load_and_describe() {
    let mut host = AnalyzerHost::new(AnalyzerConfig::default());
    host.initialize().unwrap();

    assert_eq!(host.load_csv("id,name\n1,Alice\n2,Bob\n").unwrap(), 2);

    let payload = host.describe_data().unwrap();
    let names = payload.table.column_values("column_name").unwrap();
    assert_eq!(names, vec![&CellValue::Text("id".into()), &CellValue::Text("name".into())]);
    assert_eq!(payload.command(), Some(AnalysisCommand::Describe));

    let json = payload.to_json().unwrap();
    assert_eq!(json["command"], "DESCRIBE");
    assert_eq!(json["table_name"], "csv_data");
    assert_eq!(json["source_table_rows"], 2);
    assert_eq!(json["row_count"], 2);
}

#[test]
fn test_describe_reports_inferred_types() {
    let host = loaded_host();

    let info = host.table_info().unwrap();
    assert_eq!(info.row_count, 4);
    assert_eq!(info.column_names(), vec!["order_id", "customer", "amount", "shipped", "ordered_on"]);
    let kinds: Vec<ColumnKind> = info.columns.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![ColumnKind::Number, ColumnKind::String, ColumnKind::Number, ColumnKind::Boolean, ColumnKind::Date]
    );

    let payload = host.describe_data().unwrap();
    assert_eq!(payload.row_count(), 5);
    assert!(payload.table.is_well_formed());
    assert!(payload.columns().iter().any(|c| c == "column_type"));
}

#[test]
fn test_summarize_produces_one_row_per_column() {
    let host = loaded_host();

    let payload = host.summarize_data().unwrap();
    assert_eq!(payload.command(), Some(AnalysisCommand::Summarize));
    assert_eq!(payload.row_count(), 5);
    assert!(payload.columns().iter().any(|c| c == "null_percentage"));

    // Every cell must survive JSON encoding
    let json = payload.to_json().unwrap();
    assert_eq!(json["source_table_rows"], 4);
    assert_eq!(json["data"].as_array().unwrap().len(), 5);
}

#[test]
fn test_describe_is_idempotent() {
    let host = loaded_host();
    let first = host.describe_data().unwrap();
    let second = host.describe_data().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_reload_replaces_table() {
    let host = loaded_host();
    assert_eq!(host.load_csv("x\n10\n20\n").unwrap(), 2);

    let info = host.table_info().unwrap();
    assert_eq!(info.row_count, 2);
    assert_eq!(info.column_names(), vec!["x"]);
}

#[test]
fn test_analysis_before_load_is_table_not_found() {
    let mut host = AnalyzerHost::new(AnalyzerConfig::default());
    host.initialize().unwrap();

    match host.describe_data() {
        Err(AnalyzerError::TableNotFound { table }) => assert_eq!(table, "csv_data"),
        other => panic!("expected TableNotFound, got {other:?}"),
    }
    assert!(matches!(host.summarize_data(), Err(AnalyzerError::TableNotFound { .. })));
}

#[test]
fn test_custom_query_normalizes_values() {
    let host = loaded_host();

    let payload = host
        .custom_query("SELECT customer, SUM(amount) AS total, COUNT(*) AS n FROM csv_data GROUP BY customer ORDER BY customer")
        .unwrap();
    assert_eq!(payload.columns(), &["customer", "total", "n"]);
    assert_eq!(payload.row_count(), 3);

    let alice = &payload.data()[0];
    assert_eq!(alice[0], CellValue::Text("Alice".into()));
    assert!((alice[1].as_f64().unwrap() - 19.99).abs() < 1e-9);
    assert_eq!(alice[2], CellValue::Integer(2));

    let json = payload.to_json().unwrap();
    assert!(json["query"].as_str().unwrap().starts_with("SELECT customer"));
    assert!(json.get("command").is_none());
}

#[test]
fn test_sample_renders_dates_as_text() {
    let host = loaded_host();
    let sample = host.sample_data(Some(1)).unwrap();

    assert_eq!(sample.sample_size, 1);
    assert_eq!(sample.data[0][3], CellValue::Boolean(true));
    assert_eq!(sample.data[0][4], CellValue::Text("2024-01-05".into()));
}

#[test]
fn test_invalid_sql_surfaces_engine_error() {
    let host = loaded_host();
    assert!(matches!(
        host.custom_query("SELECT nope FROM csv_data"),
        Err(AnalyzerError::QueryExecution { .. })
    ));
}

#[test]
fn test_hosts_are_isolated() {
    let first = loaded_host();
    let mut second = AnalyzerHost::new(AnalyzerConfig::default());
    second.initialize().unwrap();

    assert_eq!(first.table_info().unwrap().row_count, 4);
    assert!(matches!(second.describe_data(), Err(AnalyzerError::TableNotFound { .. })));
}

#[test]
fn test_unparseable_csv_is_an_ingestion_error() {
    let mut host = AnalyzerHost::new(AnalyzerConfig::default());
    host.initialize().unwrap();

    match host.load_csv(&unparseable_csv()) {
        Err(AnalyzerError::Ingestion { source, .. }) => {
            assert!(source.downcast_ref::<duckdb::Error>().is_some());
        }
        other => panic!("expected Ingestion, got {other:?}"),
    }
}

#[test]
fn test_failed_reload_returns_to_no_table() {
    let host = loaded_host();

    assert!(matches!(host.load_csv(&unparseable_csv()), Err(AnalyzerError::Ingestion { .. })));
    assert!(matches!(host.describe_data(), Err(AnalyzerError::TableNotFound { .. })));

    // A good load recovers
    assert_eq!(host.load_csv("x\n1\n").unwrap(), 1);
    assert!(host.describe_data().is_ok());
}
