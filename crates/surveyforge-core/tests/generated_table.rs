use surveyforge_core::{CellValue, Column, Error, GeneratedTable};

fn sample_table() -> GeneratedTable {
    GeneratedTable::try_new(
        2,
        vec![
            Column::new("Trust_Q1", vec![CellValue::Int(3), CellValue::Int(5)]),
            Column::new(
                "Age",
                vec![
                    CellValue::Float {
                        value: 31.5,
                        decimals: 2,
                    },
                    CellValue::Float {
                        value: 28.0,
                        decimals: 2,
                    },
                ],
            ),
            Column::new(
                "Gender",
                vec![
                    CellValue::Text("F".to_string()),
                    CellValue::Text("M".to_string()),
                ],
            ),
        ],
    )
    .expect("valid table")
}

#[test]
fn rejects_duplicate_column_names() {
    let result = GeneratedTable::try_new(
        1,
        vec![
            Column::new("X", vec![CellValue::Int(1)]),
            Column::new("X", vec![CellValue::Int(2)]),
        ],
    );
    assert_eq!(result, Err(Error::DuplicateColumnName("X".to_string())));
}

#[test]
fn rejects_ragged_columns() {
    let result = GeneratedTable::try_new(
        2,
        vec![Column::new("X", vec![CellValue::Int(1)])],
    );
    assert!(matches!(result, Err(Error::MismatchedLength { .. })));
}

#[test]
fn formats_cells_per_native_type() {
    let table = sample_table();
    let row: Vec<String> = table
        .row(0)
        .expect("first row")
        .into_iter()
        .map(CellValue::to_csv)
        .collect();
    assert_eq!(row, vec!["3", "31.50", "F"]);
    assert!(table.row(2).is_none());
}

#[test]
fn serializes_cells_untagged() {
    let json = serde_json::to_value(sample_table().column("Trust_Q1").expect("column"))
        .expect("serialize column");
    assert_eq!(
        json,
        serde_json::json!({"name": "Trust_Q1", "values": [3, 5]})
    );
}
