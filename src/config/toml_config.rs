use crate::core::query::{DEFAULT_IDENTIFIER_FIELD, DEFAULT_TOP_MODELS_LIMIT};
use crate::core::transform::ShortRowPolicy;
use crate::core::ConversionSettings;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub convert: ConvertConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub database: String,
    pub collection: String,
    pub identifier_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub input_path: String,
    pub output_path: String,
    pub short_rows: ShortRowPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub top_models_limit: usize,
    pub chart_width: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            database: "ev_database".to_string(),
            collection: "vehicle_data".to_string(),
            identifier_field: DEFAULT_IDENTIFIER_FIELD.to_string(),
        }
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input_path: "rows.json".to_string(),
            output_path: "formatted_ev_data.json".to_string(),
            short_rows: ShortRowPolicy::default(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_models_limit: DEFAULT_TOP_MODELS_LIMIT,
            chart_width: 40,
        }
    }
}

impl StoreConfig {
    /// 集合檔相對於 `data_dir` 的路徑：`<database>/<collection>.json`
    pub fn collection_file(&self) -> String {
        format!("{}/{}.json", self.database, self.collection)
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 有指定檔案就載入，否則使用預設值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${EV_DATA_DIR})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        let data_dir = self.store.data_dir.to_string_lossy();
        validation::validate_path("store.data_dir", &data_dir)?;
        validation::validate_path_segment("store.database", &self.store.database)?;
        validation::validate_path_segment("store.collection", &self.store.collection)?;
        validation::validate_non_empty_string(
            "store.identifier_field",
            &self.store.identifier_field,
        )?;

        validation::validate_path("convert.input_path", &self.convert.input_path)?;
        validation::validate_path("convert.output_path", &self.convert.output_path)?;

        validation::validate_positive_number(
            "dashboard.top_models_limit",
            self.dashboard.top_models_limit,
            1,
        )?;
        validation::validate_positive_number(
            "dashboard.chart_width",
            self.dashboard.chart_width,
            1,
        )?;

        Ok(())
    }
}

impl ConversionSettings for ConvertConfig {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn short_row_policy(&self) -> ShortRowPolicy {
        self.short_rows
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
