//! 車輛登記資料的五個檢視：
//! 車輛明細、依條件查 VIN、更新車輛資訊、熱門車款、各郡登記數。
//!
//! 每個檢視只呼叫一次 `DocumentStore` 操作（更新檢視另外先讀取現況），
//! 再把結果整理成可直接輸出的結構。

use crate::core::query::{
    scalar_text, GroupCountQuery, UpdateOutcome, VehicleFilter, VehicleUpdate,
    DEFAULT_TOP_MODELS_LIMIT,
};
use crate::core::DocumentStore;
use crate::domain::model::VehicleRecord;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use serde_json::Value;

/// VIN 只存前 10 碼
pub const VIN_PREFIX_LEN: usize = 10;

/// `model_year` -> `Model year`
pub fn field_label(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        other => scalar_text(other).unwrap_or_else(|| other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleDetails {
    pub identifier: String,
    /// (標籤, 顯示值)，保持紀錄原本的欄位順序
    pub fields: Vec<(String, String)>,
}

impl VehicleDetails {
    fn from_record(identifier: &str, record: &VehicleRecord) -> Self {
        Self {
            identifier: identifier.to_string(),
            fields: record
                .visible_fields()
                .map(|(key, value)| (field_label(key), display_value(value)))
                .collect(),
        }
    }

    pub fn value_of(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupView {
    Found(VehicleDetails),
    NotFound { identifier: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateView {
    Updated {
        before: VehicleDetails,
        after: VehicleDetails,
        modified_fields: Vec<String>,
    },
    Unchanged {
        before: VehicleDetails,
    },
    NotFound {
        identifier: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPopularity {
    pub make: String,
    pub model: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountyAdoption {
    pub county: String,
    pub registrations: u64,
}

pub struct Dashboard<'a> {
    store: &'a dyn DocumentStore,
    top_models_limit: usize,
}

impl<'a> Dashboard<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            top_models_limit: DEFAULT_TOP_MODELS_LIMIT,
        }
    }

    pub fn with_top_models_limit(mut self, limit: usize) -> Self {
        self.top_models_limit = limit;
        self
    }

    fn check_identifier(identifier: &str) -> Result<&str> {
        let identifier = identifier.trim();
        let reason = if identifier.is_empty() {
            "cannot be empty".to_string()
        } else if identifier.chars().count() > VIN_PREFIX_LEN {
            format!("longer than {} characters", VIN_PREFIX_LEN)
        } else {
            return Ok(identifier);
        };
        Err(EtlError::InvalidIdentifier {
            value: identifier.to_string(),
            reason,
        })
    }

    /// 車輛明細
    pub async fn vehicle_details(&self, identifier: &str) -> Result<LookupView> {
        let identifier = Self::check_identifier(identifier)?;
        Ok(match self.store.find_one(identifier).await? {
            Some(record) => LookupView::Found(VehicleDetails::from_record(identifier, &record)),
            None => LookupView::NotFound {
                identifier: identifier.to_string(),
            },
        })
    }

    /// 依條件查 VIN；沒有識別欄位的紀錄不列出
    pub async fn vins_by_criteria(&self, filter: &VehicleFilter) -> Result<Vec<String>> {
        if filter.is_empty() {
            tracing::warn!("No criteria given, every record matches");
        }
        let field = self.store.identifier_field().to_string();
        let records = self.store.find(filter).await?;
        Ok(records
            .iter()
            .filter_map(|record| record.get(&field).and_then(scalar_text))
            .collect())
    }

    /// 更新車輛資訊：先讀現況，再寫入非空白的欄位
    pub async fn update_vehicle(
        &self,
        identifier: &str,
        update: &VehicleUpdate,
    ) -> Result<UpdateView> {
        let identifier = Self::check_identifier(identifier)?;

        let Some(current) = self.store.find_one(identifier).await? else {
            return Ok(UpdateView::NotFound {
                identifier: identifier.to_string(),
            });
        };
        let before = VehicleDetails::from_record(identifier, &current);

        if update.is_empty() {
            return Ok(UpdateView::Unchanged { before });
        }

        match self.store.update_fields(identifier, update).await? {
            UpdateOutcome::NotFound => Ok(UpdateView::NotFound {
                identifier: identifier.to_string(),
            }),
            UpdateOutcome::Updated { modified_fields } => {
                let after = match self.store.find_one(identifier).await? {
                    Some(record) => VehicleDetails::from_record(identifier, &record),
                    None => before.clone(),
                };
                Ok(UpdateView::Updated {
                    before,
                    after,
                    modified_fields,
                })
            }
        }
    }

    /// 熱門車款（依 make + model）
    pub async fn popular_models(&self) -> Result<Vec<ModelPopularity>> {
        let query = GroupCountQuery::popular_models(self.top_models_limit);
        let groups = self.store.aggregate_group_count(&query).await?;

        Ok(groups
            .into_iter()
            .map(|group| {
                let part = |name: &str| group.key.get(name).map(display_value).unwrap_or_default();
                ModelPopularity {
                    make: part("make"),
                    model: part("model"),
                    count: group.count,
                }
            })
            .collect())
    }

    /// 各郡登記數
    pub async fn adoption_by_county(&self) -> Result<Vec<CountyAdoption>> {
        let groups = self
            .store
            .aggregate_group_count(&GroupCountQuery::adoption_by_county())
            .await?;

        Ok(groups
            .into_iter()
            .map(|group| CountyAdoption {
                county: display_value(&group.key),
                registrations: group.count,
            })
            .collect())
    }
}
