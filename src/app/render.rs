use crate::app::dashboard::{CountyAdoption, ModelPopularity, UpdateView, VehicleDetails};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// 對齊的文字表格加長條圖
    #[default]
    Table,
    Csv,
    Json,
}

/// 簡單的表格資料，欄位名稱 + 字串列
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// JSON 輸出時轉成數字的欄位索引
    numeric_columns: Vec<usize>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            numeric_columns: Vec::new(),
        }
    }

    /// 將 `header` 欄標為數字欄；找不到欄名時不變
    pub fn numeric_column(mut self, header: &str) -> Self {
        if let Some(index) = self.headers.iter().position(|h| h == header) {
            self.numeric_columns.push(index);
        }
        self
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let format_line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![format_line(self.headers.as_slice())];
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            lines.push(format_line(row.as_slice()));
        }
        lines.join("\n")
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer.into_inner().map_err(|e| EtlError::ProcessingError {
            message: format!("failed to flush CSV output: {}", e),
        })?;
        String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
            message: format!("CSV output is not UTF-8: {}", e),
        })
    }

    /// 輸出成物件陣列；只有數字欄會轉成 JSON 數字，其餘一律保留字串
    pub fn to_json(&self) -> Result<String> {
        let objects: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let object: serde_json::Map<String, Value> = self
                    .headers
                    .iter()
                    .zip(row)
                    .enumerate()
                    .map(|(i, (header, cell))| {
                        let value = if self.numeric_columns.contains(&i) {
                            cell.parse::<u64>()
                                .map(Value::from)
                                .unwrap_or_else(|_| Value::String(cell.clone()))
                        } else {
                            Value::String(cell.clone())
                        };
                        (header.clone(), value)
                    })
                    .collect();
                Value::Object(object)
            })
            .collect();
        Ok(serde_json::to_string_pretty(&objects)?)
    }
}

/// 橫向長條圖，最長的長條佔 `width` 格
pub fn bar_chart(title: &str, bars: &[(String, u64)], width: usize) -> String {
    let max = bars.iter().map(|(_, v)| *v).max().unwrap_or(0);
    let label_width = bars.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);

    let mut lines = vec![title.to_string()];
    for (label, value) in bars {
        let len = if max == 0 {
            0
        } else {
            // 非零值至少畫一格
            ((*value as u128 * width as u128 + max as u128 - 1) / max as u128) as usize
        };
        lines.push(format!(
            "{:<label_width$} | {} {}",
            label,
            "█".repeat(len),
            value,
            label_width = label_width
        ));
    }
    lines.join("\n")
}

pub fn render_details(details: &VehicleDetails) -> String {
    let label_width = details
        .fields
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);

    details
        .fields
        .iter()
        .map(|(label, value)| format!("{:<w$} : {}", label, value, w = label_width))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_vin_list(vins: &[String]) -> String {
    vins.iter()
        .enumerate()
        .map(|(i, vin)| format!("VIN {}: {}", i + 1, vin))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_update(view: &UpdateView) -> String {
    match view {
        UpdateView::Updated {
            before,
            after,
            modified_fields,
        } => format!(
            "Current details of the vehicle:\n{}\n\nUpdated {}:\n{}",
            render_details(before),
            modified_fields.join(", "),
            render_details(after)
        ),
        UpdateView::Unchanged { before } => format!(
            "Current details of the vehicle:\n{}\n\nNothing to update: every field was left blank.",
            render_details(before)
        ),
        UpdateView::NotFound { identifier } => {
            format!("No vehicle found with VIN {}.", identifier)
        }
    }
}

pub fn popular_models_table(models: &[ModelPopularity]) -> Table {
    let mut table = Table::new(["Make", "Model", "Count"]).numeric_column("Count");
    for m in models {
        table.push_row(vec![m.make.clone(), m.model.clone(), m.count.to_string()]);
    }
    table
}

pub fn county_adoption_table(counties: &[CountyAdoption]) -> Table {
    let mut table = Table::new(["County", "Registrations"]).numeric_column("Registrations");
    for c in counties {
        table.push_row(vec![c.county.clone(), c.registrations.to_string()]);
    }
    table
}

pub fn render_popular_models(
    models: &[ModelPopularity],
    format: OutputFormat,
    chart_width: usize,
) -> Result<String> {
    let table = popular_models_table(models);
    match format {
        OutputFormat::Table => {
            let bars: Vec<(String, u64)> = models
                .iter()
                .map(|m| (format!("{} {}", m.make, m.model), m.count))
                .collect();
            Ok(format!(
                "{}\n\n{}",
                table.to_text(),
                bar_chart(&format!("Top {} Popular EV Models", models.len()), &bars, chart_width)
            ))
        }
        OutputFormat::Csv => table.to_csv(),
        OutputFormat::Json => table.to_json(),
    }
}

pub fn render_county_adoption(
    counties: &[CountyAdoption],
    format: OutputFormat,
    chart_width: usize,
) -> Result<String> {
    let table = county_adoption_table(counties);
    match format {
        OutputFormat::Table => {
            let bars: Vec<(String, u64)> = counties
                .iter()
                .map(|c| (c.county.clone(), c.registrations))
                .collect();
            Ok(format!(
                "{}\n\n{}",
                table.to_text(),
                bar_chart("EV Registrations by County", &bars, chart_width)
            ))
        }
        OutputFormat::Csv => table.to_csv(),
        OutputFormat::Json => table.to_json(),
    }
}
