use crate::core::Pipeline;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct EtlReport {
    pub output_path: String,
    pub rows_read: usize,
    pub documents_written: usize,
    pub column_count: usize,
    pub padded_rows: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<EtlReport> {
        let started_at = Utc::now();
        let timer = Instant::now();
        tracing::info!("Starting conversion...");

        // Extract
        let dataset = self.pipeline.extract().await?;
        let rows_read = dataset.rows().len();
        tracing::info!(
            "Extracted {} rows across {} columns",
            rows_read,
            dataset.columns().len()
        );

        // Transform
        let result = self.pipeline.transform(dataset).await?;
        let documents_written = result.documents.len();
        let column_count = result.column_count;
        let padded_rows = result.padded_rows;
        tracing::info!("Transformed {} documents", documents_written);

        // Load
        let output_path = self.pipeline.load(result).await?;
        tracing::info!(
            "Output saved to: {} ({:?})",
            output_path,
            timer.elapsed()
        );

        Ok(EtlReport {
            output_path,
            rows_read,
            documents_written,
            column_count,
            padded_rows,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// 只做 extract + transform，不寫出檔案
    pub async fn dry_run(&self) -> Result<EtlReport> {
        let started_at = Utc::now();
        let dataset = self.pipeline.extract().await?;
        let rows_read = dataset.rows().len();
        let result = self.pipeline.transform(dataset).await?;

        Ok(EtlReport {
            output_path: String::new(),
            rows_read,
            documents_written: 0,
            column_count: result.column_count,
            padded_rows: result.padded_rows,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
