use crate::domain::model::{Document, GroupCount};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 預設的識別欄位（VIN 前 10 碼）
pub const DEFAULT_IDENTIFIER_FIELD: &str = "vin_1_10";

/// 熱門車款的預設筆數
pub const DEFAULT_TOP_MODELS_LIMIT: usize = 10;

/// 可更新的欄位，順序即顯示順序
pub const UPDATABLE_FIELDS: [&str; 6] = [
    "make",
    "model",
    "model_year",
    "zip_code",
    "electric_range",
    "base_msrp",
];

/// 取得純量值的文字形式；`null`、陣列與物件沒有文字形式
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// 欄位值與輸入文字完全相等（不做子字串或大小寫比對）
pub fn field_equals(document: &Document, field: &str, expected: &str) -> bool {
    document
        .get(field)
        .and_then(scalar_text)
        .is_some_and(|actual| actual == expected)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// 依條件查 VIN；每個欄位都是選填，有值的欄位以 AND 等值比對
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleFilter {
    pub make: Option<String>,
    pub model: Option<String>,
    pub zip_code: Option<String>,
    pub model_year: Option<String>,
}

impl VehicleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make(mut self, make: impl Into<String>) -> Self {
        self.make = Some(make.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn zip_code(mut self, zip_code: impl Into<String>) -> Self {
        self.zip_code = Some(zip_code.into());
        self
    }

    pub fn model_year(mut self, model_year: impl Into<String>) -> Self {
        self.model_year = Some(model_year.into());
        self
    }

    /// 實際生效的條件，空白輸入視為未填
    pub fn constraints(&self) -> Vec<(&'static str, &str)> {
        [
            ("make", &self.make),
            ("model", &self.model),
            ("zip_code", &self.zip_code),
            ("model_year", &self.model_year),
        ]
        .into_iter()
        .filter_map(|(field, value)| non_blank(value).map(|v| (field, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints().is_empty()
    }

    /// 沒有任何條件時比對所有紀錄
    pub fn matches(&self, document: &Document) -> bool {
        self.constraints()
            .into_iter()
            .all(|(field, expected)| field_equals(document, field, expected))
    }
}

/// 車輛資訊更新
///
/// 空白或未填的欄位保持原值，不會被清成空字串。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub model_year: Option<String>,
    pub zip_code: Option<String>,
    pub electric_range: Option<String>,
    pub base_msrp: Option<String>,
}

impl VehicleUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            "make" => self.make = value,
            "model" => self.model = value,
            "model_year" => self.model_year = value,
            "zip_code" => self.zip_code = value,
            "electric_range" => self.electric_range = value,
            "base_msrp" => self.base_msrp = value,
            other => tracing::warn!("Ignoring update for non-updatable field '{}'", other),
        }
        self
    }

    /// 依 `UPDATABLE_FIELDS` 順序列出要寫入的欄位
    pub fn changes(&self) -> Vec<(&'static str, &str)> {
        [
            ("make", &self.make),
            ("model", &self.model),
            ("model_year", &self.model_year),
            ("zip_code", &self.zip_code),
            ("electric_range", &self.electric_range),
            ("base_msrp", &self.base_msrp),
        ]
        .into_iter()
        .filter_map(|(field, value)| non_blank(value).map(|v| (field, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changes().is_empty()
    }

    /// 套用到文件上，回傳實際寫入的欄位名稱
    pub fn apply_to(&self, document: &mut Document) -> Vec<String> {
        let mut modified = Vec::new();
        for (field, value) in self.changes() {
            document.insert(field.to_string(), Value::String(value.to_string()));
            modified.push(field.to_string());
        }
        modified
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated { modified_fields: Vec<String> },
    NotFound,
}

impl UpdateOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, UpdateOutcome::Updated { .. })
    }
}

/// 分組鍵：單一欄位或複合欄位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupKey {
    Field(String),
    Fields(Vec<String>),
}

impl GroupKey {
    pub fn field(name: impl Into<String>) -> Self {
        GroupKey::Field(name.into())
    }

    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GroupKey::Fields(names.into_iter().map(Into::into).collect())
    }

    /// 取出文件的分組值；缺少的欄位歸到 `null`
    pub fn extract(&self, document: &Document) -> Value {
        match self {
            GroupKey::Field(name) => document.get(name).cloned().unwrap_or(Value::Null),
            GroupKey::Fields(names) => {
                let mut key = Document::new();
                for name in names {
                    key.insert(
                        name.clone(),
                        document.get(name).cloned().unwrap_or(Value::Null),
                    );
                }
                Value::Object(key)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCountQuery {
    pub key: GroupKey,
    pub sort_descending: bool,
    pub limit: Option<usize>,
}

impl GroupCountQuery {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            sort_descending: false,
            limit: None,
        }
    }

    pub fn sort_descending(mut self) -> Self {
        self.sort_descending = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 熱門車款：依 (make, model) 分組，數量由多到少
    pub fn popular_models(limit: usize) -> Self {
        Self::new(GroupKey::fields(["make", "model"]))
            .sort_descending()
            .limit(limit)
    }

    /// 各郡登記數：依 county 分組，數量由多到少，不限筆數
    pub fn adoption_by_county() -> Self {
        Self::new(GroupKey::field("county")).sort_descending()
    }

    /// 對記憶體中的文件執行分組計數
    ///
    /// 同數量時保留第一次出現的順序。
    pub fn evaluate<'a, I>(&self, documents: I) -> Vec<GroupCount>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut groups: Vec<GroupCount> = Vec::new();
        for document in documents {
            let key = self.key.extract(document);
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.count += 1,
                None => groups.push(GroupCount { key, count: 1 }),
            }
        }

        if self.sort_descending {
            groups.sort_by(|a, b| b.count.cmp(&a.count));
        }
        if let Some(limit) = self.limit {
            groups.truncate(limit);
        }
        groups
    }
}
