use crate::core::query::{
    field_equals, GroupCountQuery, UpdateOutcome, VehicleFilter, VehicleUpdate,
};
use crate::core::{DocumentStore, Storage};
use crate::domain::model::{Document, GroupCount, VehicleRecord};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// 以單一 JSON 陣列檔保存的車輛集合
///
/// 開啟時整個集合載入記憶體，每次寫入（更新、匯入）後整檔重寫。
/// 變更先寫到副本，寫檔成功後才換進記憶體，寫檔失敗時記憶體維持原狀。
/// 沒有並行寫入保護：兩個程序同時更新同一筆紀錄時以後寫者為準。
pub struct JsonFileStore<S: Storage> {
    storage: S,
    collection_file: String,
    identifier_field: String,
    documents: Mutex<Vec<Document>>,
}

impl<S: Storage> JsonFileStore<S> {
    /// 開啟既有的集合；檔案不存在或無法解析時回傳 `StoreUnavailable`
    pub async fn open(
        storage: S,
        collection_file: impl Into<String>,
        identifier_field: impl Into<String>,
    ) -> Result<Self> {
        let collection_file = collection_file.into();
        let location = storage.describe(&collection_file);

        if !storage.exists(&collection_file).await {
            return Err(EtlError::StoreUnavailable {
                location,
                message: "collection has not been imported yet".to_string(),
            });
        }

        let bytes = storage
            .read_file(&collection_file)
            .await
            .map_err(|e| EtlError::StoreUnavailable {
                location: location.clone(),
                message: e.to_string(),
            })?;
        let documents: Vec<Document> =
            serde_json::from_slice(&bytes).map_err(|e| EtlError::StoreUnavailable {
                location: location.clone(),
                message: format!("collection file is not a JSON array of objects: {}", e),
            })?;

        tracing::info!(
            "📂 Opened collection {} ({} records)",
            location,
            documents.len()
        );

        Ok(Self {
            storage,
            collection_file,
            identifier_field: identifier_field.into(),
            documents: Mutex::new(documents),
        })
    }

    /// 以 `documents` 建立集合並一次寫出，已存在的檔案會被覆蓋
    ///
    /// 寫檔失敗時回傳錯誤，原本的集合檔不受影響。
    pub async fn create(
        storage: S,
        collection_file: impl Into<String>,
        identifier_field: impl Into<String>,
        documents: Vec<Document>,
    ) -> Result<Self> {
        let mut store = Self {
            storage,
            collection_file: collection_file.into(),
            identifier_field: identifier_field.into(),
            documents: Mutex::new(Vec::new()),
        };
        store.persist(&documents).await?;
        tracing::info!(
            "🆕 Created collection {} ({} records)",
            store.location(),
            documents.len()
        );
        *store.documents.get_mut() = documents;
        Ok(store)
    }

    pub fn location(&self) -> String {
        self.storage.describe(&self.collection_file)
    }

    async fn persist(&self, documents: &[Document]) -> Result<()> {
        let data = serde_json::to_vec_pretty(documents)?;
        self.storage
            .write_file(&self.collection_file, &data)
            .await
            .map_err(|e| EtlError::StoreUnavailable {
                location: self.location(),
                message: e.to_string(),
            })
    }

    fn project_identifier(&self, document: &Document) -> VehicleRecord {
        let mut projected = Document::new();
        if let Some(value) = document.get(&self.identifier_field) {
            projected.insert(self.identifier_field.clone(), value.clone());
        }
        VehicleRecord::new(projected)
    }
}

#[async_trait]
impl<S: Storage> DocumentStore for JsonFileStore<S> {
    fn identifier_field(&self) -> &str {
        &self.identifier_field
    }

    async fn find_one(&self, identifier: &str) -> Result<Option<VehicleRecord>> {
        let documents = self.documents.lock().await;
        let found = documents
            .iter()
            .find(|doc| field_equals(doc, &self.identifier_field, identifier))
            .cloned()
            .map(VehicleRecord::new);

        tracing::debug!(
            "find_one {}={} -> {}",
            self.identifier_field,
            identifier,
            if found.is_some() { "found" } else { "not found" }
        );
        Ok(found)
    }

    async fn find(&self, filter: &VehicleFilter) -> Result<Vec<VehicleRecord>> {
        let documents = self.documents.lock().await;
        let matches: Vec<VehicleRecord> = documents
            .iter()
            .filter(|doc| filter.matches(doc))
            .map(|doc| self.project_identifier(doc))
            .collect();

        tracing::debug!("find {:?} -> {} matches", filter.constraints(), matches.len());
        Ok(matches)
    }

    async fn update_fields(
        &self,
        identifier: &str,
        update: &VehicleUpdate,
    ) -> Result<UpdateOutcome> {
        let mut documents = self.documents.lock().await;
        let Some(index) = documents
            .iter()
            .position(|doc| field_equals(doc, &self.identifier_field, identifier))
        else {
            return Ok(UpdateOutcome::NotFound);
        };

        let mut updated = documents[index].clone();
        let modified_fields = update.apply_to(&mut updated);
        if !modified_fields.is_empty() {
            let mut staged = documents.clone();
            staged[index] = updated;
            self.persist(&staged).await?;
            *documents = staged;
            tracing::info!(
                "✏️ Updated {} on {}={}",
                modified_fields.join(", "),
                self.identifier_field,
                identifier
            );
        }

        Ok(UpdateOutcome::Updated { modified_fields })
    }

    async fn aggregate_group_count(&self, query: &GroupCountQuery) -> Result<Vec<GroupCount>> {
        let documents = self.documents.lock().await;
        Ok(query.evaluate(documents.iter()))
    }

    async fn insert_many(&self, new_documents: Vec<Document>) -> Result<usize> {
        let inserted = new_documents.len();
        let mut documents = self.documents.lock().await;
        let mut staged = documents.clone();
        staged.extend(new_documents);
        self.persist(&staged).await?;
        *documents = staged;
        tracing::info!("📥 Inserted {} records into {}", inserted, self.location());
        Ok(inserted)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.documents.lock().await.len())
    }
}
