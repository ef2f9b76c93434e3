use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 單一文件：欄位名稱對應值，鍵的順序與來源欄位順序一致
pub type Document = serde_json::Map<String, Value>;

/// 一列原始資料，位置對應 `ColumnDescriptor` 的順序
pub type RawRow = Vec<Value>;

/// 儲存端保留給內部主鍵的欄位，不對使用者顯示
pub const SURROGATE_KEY: &str = "_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    #[serde(rename = "fieldName")]
    pub field_name: String,
}

impl ColumnDescriptor {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
        }
    }
}

/// 欄位導向的匯出檔：`{ meta: { view: { columns: [...] } }, data: [[...], ...] }`
///
/// 其餘的 metadata 欄位會被忽略。
#[derive(Debug, Clone, Deserialize)]
pub struct TabularDataset {
    pub meta: DatasetMeta,
    pub data: Vec<RawRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetMeta {
    pub view: DatasetView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetView {
    pub columns: Vec<ColumnDescriptor>,
}

impl TabularDataset {
    pub fn new(columns: Vec<ColumnDescriptor>, data: Vec<RawRow>) -> Self {
        Self {
            meta: DatasetMeta {
                view: DatasetView { columns },
            },
            data,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            if e.is_data() {
                EtlError::MalformedInput {
                    message: format!("unexpected dataset layout: {}", e),
                }
            } else {
                EtlError::SerializationError(e)
            }
        })
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.meta.view.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.data
    }
}

/// 從儲存端取出的車輛紀錄，結構上就是一份 `Document`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleRecord {
    fields: Document,
}

impl VehicleRecord {
    pub fn new(fields: Document) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// 依序列出可顯示的欄位（排除 `_id`）
    pub fn visible_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter().filter(|(key, _)| key.as_str() != SURROGATE_KEY)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_document(&self) -> &Document {
        &self.fields
    }

    pub fn into_document(self) -> Document {
        self.fields
    }
}

impl From<Document> for VehicleRecord {
    fn from(fields: Document) -> Self {
        Self::new(fields)
    }
}

/// 分組計數的一筆結果
///
/// 單一欄位分組時 `key` 是該欄位的值；複合分組時是 `{欄位: 值}` 物件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: Value,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dataset_ignores_extra_metadata() {
        let raw = json!({
            "meta": {
                "view": {
                    "id": "f6w7-q2d2",
                    "name": "Electric Vehicle Population Data",
                    "columns": [
                        {"id": -1, "name": "sid", "fieldName": ":sid", "dataTypeName": "meta_data"},
                        {"id": 1, "name": "VIN (1-10)", "fieldName": "vin_1_10", "dataTypeName": "text"}
                    ]
                }
            },
            "data": [["row-1", "5YJ3E1EA7J"]]
        });

        let dataset = TabularDataset::from_slice(raw.to_string().as_bytes()).unwrap();
        assert_eq!(dataset.columns().len(), 2);
        assert_eq!(dataset.columns()[1].field_name, "vin_1_10");
        assert_eq!(dataset.rows().len(), 1);
    }

    #[test]
    fn test_dataset_missing_columns_is_malformed() {
        let raw = br#"{"meta": {"view": {}}, "data": []}"#;
        let err = TabularDataset::from_slice(raw).unwrap_err();
        assert!(matches!(err, EtlError::MalformedInput { .. }));
    }

    #[test]
    fn test_dataset_invalid_json_is_serialization_error() {
        let err = TabularDataset::from_slice(b"{ not json").unwrap_err();
        assert!(matches!(err, EtlError::SerializationError(_)));
    }

    #[test]
    fn test_vehicle_record_hides_surrogate_key() {
        let mut doc = Document::new();
        doc.insert("_id".to_string(), json!("64f0c0ffee"));
        doc.insert("vin_1_10".to_string(), json!("1N4AZ0CP5D"));
        doc.insert("make".to_string(), json!("NISSAN"));

        let record = VehicleRecord::from(doc);
        let keys: Vec<&str> = record.visible_fields().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["vin_1_10", "make"]);
        assert_eq!(record.len(), 3);
    }
}
