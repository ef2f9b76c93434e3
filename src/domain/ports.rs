use crate::core::query::{GroupCountQuery, UpdateOutcome, VehicleFilter, VehicleUpdate};
use crate::core::transform::ShortRowPolicy;
use crate::domain::model::{Document, GroupCount, TabularDataset, VehicleRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    /// 給錯誤訊息用的完整位置
    fn describe(&self, path: &str) -> String;
}

pub trait ConversionSettings: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn short_row_policy(&self) -> ShortRowPolicy;
}

#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub documents: Vec<Document>,
    pub column_count: usize,
    pub padded_rows: usize,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<TabularDataset>;
    async fn transform(&self, dataset: TabularDataset) -> Result<ConversionResult>;
    async fn load(&self, result: ConversionResult) -> Result<String>;
}

/// 車輛紀錄集合的查詢介面
///
/// 查無資料不是錯誤：`find_one` 回傳 `None`，`update_fields` 回傳
/// `UpdateOutcome::NotFound`。連線層級的失敗則以 `StoreUnavailable` 傳回。
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 識別欄位名稱（預設 `vin_1_10`）
    fn identifier_field(&self) -> &str;

    async fn find_one(&self, identifier: &str) -> Result<Option<VehicleRecord>>;

    /// 回傳符合條件的紀錄，每筆只保留識別欄位
    async fn find(&self, filter: &VehicleFilter) -> Result<Vec<VehicleRecord>>;

    async fn update_fields(
        &self,
        identifier: &str,
        update: &VehicleUpdate,
    ) -> Result<UpdateOutcome>;

    async fn aggregate_group_count(&self, query: &GroupCountQuery) -> Result<Vec<GroupCount>>;

    async fn insert_many(&self, documents: Vec<Document>) -> Result<usize>;

    async fn count(&self) -> Result<usize>;
}
