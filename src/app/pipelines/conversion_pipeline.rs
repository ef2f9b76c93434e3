use crate::core::transform::rows_to_documents;
use crate::core::{ConversionResult, ConversionSettings, Pipeline, Storage, TabularDataset};
use crate::utils::error::Result;

/// 把欄位導向的匯出檔轉成文件陣列檔
pub struct ConversionPipeline<S: Storage, C: ConversionSettings> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConversionSettings> ConversionPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConversionSettings> Pipeline for ConversionPipeline<S, C> {
    async fn extract(&self) -> Result<TabularDataset> {
        let input = self.config.input_path();
        tracing::debug!("Reading dataset from: {}", self.storage.describe(input));

        let bytes = self.storage.read_file(input).await?;
        tracing::debug!("Read {} bytes", bytes.len());

        TabularDataset::from_slice(&bytes)
    }

    async fn transform(&self, dataset: TabularDataset) -> Result<ConversionResult> {
        let policy = self.config.short_row_policy();
        let mapping = rows_to_documents(dataset.columns(), dataset.rows(), policy)?;

        if mapping.padded_rows > 0 {
            tracing::warn!(
                "⚠️ {} rows were shorter than the {} columns and were padded with null",
                mapping.padded_rows,
                dataset.columns().len()
            );
        }

        Ok(ConversionResult {
            documents: mapping.documents,
            column_count: dataset.columns().len(),
            padded_rows: mapping.padded_rows,
        })
    }

    async fn load(&self, result: ConversionResult) -> Result<String> {
        let output = self.config.output_path();
        let json_data = serde_json::to_string_pretty(&result.documents)?;

        tracing::debug!(
            "Writing {} documents ({} bytes)",
            result.documents.len(),
            json_data.len()
        );
        self.storage.write_file(output, json_data.as_bytes()).await?;

        Ok(self.storage.describe(output))
    }
}
