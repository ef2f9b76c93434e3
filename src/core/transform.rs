use crate::domain::model::{ColumnDescriptor, Document, RawRow};
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 列長度小於欄位數時的處理方式
///
/// 列長度大於欄位數時，多出來的值一律忽略。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum ShortRowPolicy {
    /// 整個轉換失敗並回報第一個不一致的列
    #[default]
    Reject,
    /// 缺少的尾端值補 `null`
    PadNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowMapping {
    pub documents: Vec<Document>,
    pub padded_rows: usize,
}

/// 把欄位導向資料轉成文件列表：`D[i][C[j].field_name] == R[i][j]`
///
/// 輸出順序與輸入列順序相同，輸入不會被修改。
pub fn rows_to_documents(
    columns: &[ColumnDescriptor],
    rows: &[RawRow],
    policy: ShortRowPolicy,
) -> Result<RowMapping> {
    let mut documents = Vec::with_capacity(rows.len());
    let mut padded_rows = 0;

    for (index, row) in rows.iter().enumerate() {
        if row.len() < columns.len() {
            match policy {
                ShortRowPolicy::Reject => {
                    return Err(EtlError::InconsistentRowLength {
                        row: index,
                        expected: columns.len(),
                        actual: row.len(),
                    });
                }
                ShortRowPolicy::PadNull => {
                    tracing::debug!(
                        "Row {} has {} of {} values, padding with null",
                        index,
                        row.len(),
                        columns.len()
                    );
                    padded_rows += 1;
                }
            }
        }

        let mut document = Document::new();
        for (position, column) in columns.iter().enumerate() {
            let value = row.get(position).cloned().unwrap_or(Value::Null);
            document.insert(column.field_name.clone(), value);
        }
        documents.push(document);
    }

    Ok(RowMapping {
        documents,
        padded_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<ColumnDescriptor> {
        names.iter().map(|n| ColumnDescriptor::new(*n)).collect()
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_maps_columns_to_row_values() {
        let cols = columns(&["vin", "make"]);
        let rows = vec![vec![json!("1AB"), json!("Tesla")], vec![json!("2CD"), json!("Nissan")]];

        let mapping = rows_to_documents(&cols, &rows, ShortRowPolicy::Reject).unwrap();

        assert_eq!(
            mapping.documents,
            vec![
                doc(json!({"vin": "1AB", "make": "Tesla"})),
                doc(json!({"vin": "2CD", "make": "Nissan"})),
            ]
        );
        assert_eq!(mapping.padded_rows, 0);
    }

    #[test]
    fn test_keys_follow_column_order() {
        let cols = columns(&["zeta", "alpha", "mid"]);
        let rows = vec![vec![json!(1), json!(2), json!(3)]];

        let mapping = rows_to_documents(&cols, &rows, ShortRowPolicy::Reject).unwrap();
        let keys: Vec<&str> = mapping.documents[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_preserves_row_order_and_scalar_types() {
        let cols = columns(&["id", "range", "eligible", "note"]);
        let rows: Vec<RawRow> = (0..50)
            .map(|i| vec![json!(i), json!(i * 10), json!(i % 2 == 0), Value::Null])
            .collect();

        let mapping = rows_to_documents(&cols, &rows, ShortRowPolicy::Reject).unwrap();

        assert_eq!(mapping.documents.len(), rows.len());
        for (i, document) in mapping.documents.iter().enumerate() {
            assert_eq!(document.len(), cols.len());
            for (j, column) in cols.iter().enumerate() {
                assert_eq!(document[&column.field_name], rows[i][j]);
            }
        }
    }

    #[test]
    fn test_is_pure() {
        let cols = columns(&["vin", "make"]);
        let rows = vec![vec![json!("1AB"), json!("Tesla")]];
        let cols_before = cols.clone();
        let rows_before = rows.clone();

        let first = rows_to_documents(&cols, &rows, ShortRowPolicy::Reject).unwrap();
        let second = rows_to_documents(&cols, &rows, ShortRowPolicy::Reject).unwrap();

        assert_eq!(first, second);
        assert_eq!(cols, cols_before);
        assert_eq!(rows, rows_before);
    }

    #[test]
    fn test_empty_rows_yield_no_documents() {
        let cols = columns(&["vin"]);
        let mapping = rows_to_documents(&cols, &[], ShortRowPolicy::Reject).unwrap();
        assert!(mapping.documents.is_empty());
    }

    #[test]
    fn test_no_columns_yield_empty_documents() {
        let rows = vec![vec![json!("ignored"), json!(42)], vec![]];
        let mapping = rows_to_documents(&[], &rows, ShortRowPolicy::Reject).unwrap();
        assert_eq!(mapping.documents.len(), 2);
        assert!(mapping.documents.iter().all(Document::is_empty));
    }

    #[test]
    fn test_longer_rows_drop_trailing_values() {
        let cols = columns(&["vin"]);
        let rows = vec![vec![json!("1AB"), json!("extra"), json!("more")]];
        let mapping = rows_to_documents(&cols, &rows, ShortRowPolicy::Reject).unwrap();
        assert_eq!(mapping.documents, vec![doc(json!({"vin": "1AB"}))]);
    }

    #[test]
    fn test_short_row_rejected() {
        let cols = columns(&["vin", "make", "model"]);
        let rows = vec![
            vec![json!("1AB"), json!("Tesla"), json!("Model 3")],
            vec![json!("2CD"), json!("Nissan")],
        ];

        let err = rows_to_documents(&cols, &rows, ShortRowPolicy::Reject).unwrap_err();
        match err {
            EtlError::InconsistentRowLength {
                row,
                expected,
                actual,
            } => {
                assert_eq!(row, 1);
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_short_row_padded_with_null() {
        let cols = columns(&["vin", "make", "model"]);
        let rows = vec![vec![json!("2CD")], vec![json!("3EF"), json!("Kia"), json!("Niro")]];

        let mapping = rows_to_documents(&cols, &rows, ShortRowPolicy::PadNull).unwrap();
        assert_eq!(mapping.padded_rows, 1);
        assert_eq!(
            mapping.documents[0],
            doc(json!({"vin": "2CD", "make": null, "model": null}))
        );
        assert_eq!(mapping.documents[1]["model"], json!("Niro"));
    }

    #[test]
    fn test_duplicate_field_name_last_value_wins() {
        let cols = columns(&["make", "model", "make"]);
        let rows = vec![vec![json!("first"), json!("Leaf"), json!("second")]];
        let mapping = rows_to_documents(&cols, &rows, ShortRowPolicy::Reject).unwrap();

        let document = &mapping.documents[0];
        assert_eq!(document.len(), 2);
        assert_eq!(document["make"], json!("second"));
        assert_eq!(document.keys().next().map(String::as_str), Some("make"));
    }

    #[test]
    fn test_json_round_trip_matches_in_memory_documents() {
        let cols = columns(&["vin_1_10", "model_year", "electric_range"]);
        let rows = vec![
            vec![json!("5YJ3E1EA7J"), json!("2018"), json!("215")],
            vec![json!("1N4AZ0CP5D"), json!("2013"), Value::Null],
        ];
        let mapping = rows_to_documents(&cols, &rows, ShortRowPolicy::Reject).unwrap();

        let written = serde_json::to_string_pretty(&mapping.documents).unwrap();
        let parsed: Vec<Document> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, mapping.documents);
    }
}
