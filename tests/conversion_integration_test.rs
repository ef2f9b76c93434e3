use anyhow::Result;
use ev_registry::config::ConvertConfig;
use ev_registry::domain::model::Document;
use ev_registry::{ConversionPipeline, EtlEngine, EtlError, LocalStorage, ShortRowPolicy};
use serde_json::json;
use tempfile::TempDir;

/// 仿照公開資料平台匯出格式的小型資料集
fn socrata_export() -> serde_json::Value {
    json!({
        "meta": {
            "view": {
                "id": "f6w7-q2d2",
                "name": "Electric Vehicle Population Data",
                "attribution": "Washington State Department of Licensing",
                "columns": [
                    {"id": -1, "name": "sid", "dataTypeName": "meta_data", "fieldName": ":sid", "position": 0},
                    {"id": 1, "name": "VIN (1-10)", "dataTypeName": "text", "fieldName": "vin_1_10", "position": 1},
                    {"id": 2, "name": "County", "dataTypeName": "text", "fieldName": "county", "position": 2},
                    {"id": 3, "name": "Make", "dataTypeName": "text", "fieldName": "make", "position": 3},
                    {"id": 4, "name": "Model", "dataTypeName": "text", "fieldName": "model", "position": 4},
                    {"id": 5, "name": "Model Year", "dataTypeName": "text", "fieldName": "model_year", "position": 5},
                    {"id": 6, "name": "Vehicle Location", "dataTypeName": "point", "fieldName": "geocoded_column", "position": 6}
                ]
            }
        },
        "data": [
            ["row-a1", "5YJ3E1EA7J", "King", "TESLA", "MODEL 3", "2018", "POINT (-122.30839 47.610365)"],
            ["row-a2", "1N4AZ0CP5D", "Thurston", "NISSAN", "LEAF", "2013", null],
            ["row-a3", "KNDCC3LG1L", "Yakima", "KIA", "NIRO", "2020", "POINT (-120.50721 46.60448)"]
        ]
    })
}

fn convert_config(dir: &TempDir, policy: ShortRowPolicy) -> ConvertConfig {
    ConvertConfig {
        input_path: dir.path().join("rows.json").to_string_lossy().into_owned(),
        output_path: dir
            .path()
            .join("out/formatted_ev_data.json")
            .to_string_lossy()
            .into_owned(),
        short_rows: policy,
    }
}

#[tokio::test]
async fn test_end_to_end_conversion_on_disk() -> Result<()> {
    let temp_dir = TempDir::new()?;
    tokio::fs::write(temp_dir.path().join("rows.json"), socrata_export().to_string()).await?;

    let config = convert_config(&temp_dir, ShortRowPolicy::Reject);
    let engine = EtlEngine::new(ConversionPipeline::new(LocalStorage::new("."), config));
    let report = engine.run().await?;

    assert_eq!(report.rows_read, 3);
    assert_eq!(report.documents_written, 3);
    assert_eq!(report.column_count, 7);
    assert!(report.output_path.ends_with("formatted_ev_data.json"));
    assert!(report.finished_at >= report.started_at);

    let written =
        tokio::fs::read_to_string(temp_dir.path().join("out/formatted_ev_data.json")).await?;
    let documents: Vec<Document> = serde_json::from_str(&written)?;

    // 每列一份文件，順序與鍵值對應來源欄位
    assert_eq!(documents.len(), 3);
    let vins: Vec<&str> = documents
        .iter()
        .map(|d| d["vin_1_10"].as_str().unwrap())
        .collect();
    assert_eq!(vins, vec!["5YJ3E1EA7J", "1N4AZ0CP5D", "KNDCC3LG1L"]);

    let keys: Vec<&str> = documents[0].keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![":sid", "vin_1_10", "county", "make", "model", "model_year", "geocoded_column"]
    );
    assert_eq!(documents[1]["geocoded_column"], serde_json::Value::Null);

    // 非緊湊格式
    assert!(written.contains("\n    \"vin_1_10\": \"5YJ3E1EA7J\""));
    Ok(())
}

#[tokio::test]
async fn test_conversion_is_repeatable() -> Result<()> {
    let temp_dir = TempDir::new()?;
    tokio::fs::write(temp_dir.path().join("rows.json"), socrata_export().to_string()).await?;
    let config = convert_config(&temp_dir, ShortRowPolicy::Reject);
    let output = temp_dir.path().join("out/formatted_ev_data.json");

    let engine = EtlEngine::new(ConversionPipeline::new(LocalStorage::new("."), config));
    engine.run().await?;
    let first = tokio::fs::read(&output).await?;
    engine.run().await?;
    let second = tokio::fs::read(&output).await?;

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_short_row_fails_fast_by_default() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut export = socrata_export();
    export["data"][2] = json!(["row-a3", "KNDCC3LG1L", "Yakima"]);
    tokio::fs::write(temp_dir.path().join("rows.json"), export.to_string()).await?;

    let config = convert_config(&temp_dir, ShortRowPolicy::Reject);
    let engine = EtlEngine::new(ConversionPipeline::new(LocalStorage::new("."), config));

    match engine.run().await {
        Err(EtlError::InconsistentRowLength {
            row,
            expected,
            actual,
        }) => {
            assert_eq!((row, expected, actual), (2, 7, 3));
        }
        other => panic!("expected InconsistentRowLength, got {:?}", other.map(|r| r.output_path)),
    }
    assert!(!temp_dir.path().join("out/formatted_ev_data.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_short_row_padded_when_requested() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut export = socrata_export();
    export["data"][2] = json!(["row-a3", "KNDCC3LG1L", "Yakima"]);
    tokio::fs::write(temp_dir.path().join("rows.json"), export.to_string()).await?;

    let config = convert_config(&temp_dir, ShortRowPolicy::PadNull);
    let engine = EtlEngine::new(ConversionPipeline::new(LocalStorage::new("."), config));
    let report = engine.run().await?;
    assert_eq!(report.padded_rows, 1);

    let written = tokio::fs::read(temp_dir.path().join("out/formatted_ev_data.json")).await?;
    let documents: Vec<Document> = serde_json::from_slice(&written)?;
    assert_eq!(documents[2].len(), 7);
    assert_eq!(documents[2]["county"], json!("Yakima"));
    assert_eq!(documents[2]["make"], serde_json::Value::Null);
    Ok(())
}

#[tokio::test]
async fn test_empty_data_writes_empty_array() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut export = socrata_export();
    export["data"] = json!([]);
    tokio::fs::write(temp_dir.path().join("rows.json"), export.to_string()).await?;

    let config = convert_config(&temp_dir, ShortRowPolicy::Reject);
    let engine = EtlEngine::new(ConversionPipeline::new(LocalStorage::new("."), config));
    let report = engine.run().await?;
    assert_eq!(report.documents_written, 0);

    let written =
        tokio::fs::read_to_string(temp_dir.path().join("out/formatted_ev_data.json")).await?;
    assert_eq!(written, "[]");
    Ok(())
}
