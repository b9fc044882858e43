//! 运行配置：从 `po_fanyi.json` 读取，缺省字段取默认值

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::po_file::{EncodeOptions, LoadOptions, DEFAULT_PROJECT_MARKER_DIR, DEFAULT_SOURCE_NAME};
use crate::model::data_core::AppError;
use crate::model::reconcile::ReconcileOptions;
use crate::utils::fs::read_text_file;

pub const SETTINGS_FILE_NAME: &str = "po_fanyi.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reconcile: ReconcileOptions,
    /// 向上查找项目根目录时识别的目录名
    pub project_marker_dir: String,
    /// 单元没有出现位置时补写的源文件名
    pub source_name: String,
    /// 导入时是否加载源文件上下文
    pub load_context: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reconcile: ReconcileOptions::default(),
            project_marker_dir: DEFAULT_PROJECT_MARKER_DIR.to_string(),
            source_name: DEFAULT_SOURCE_NAME.to_string(),
            load_context: true,
        }
    }
}

impl Settings {
    /// 文件不存在时返回默认配置；内容格式错误时报错
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            tracing::debug!("配置文件不存在，使用默认配置: {}", path.display());
            return Ok(Self::default());
        }
        let text = read_text_file(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        tracing::info!("已加载配置: {}", path.display());
        Ok(settings)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            project_marker_dir: self
                .load_context
                .then(|| self.project_marker_dir.clone()),
        }
    }

    pub fn encode_options(&self, revision_date: Option<String>) -> EncodeOptions {
        EncodeOptions {
            source_name: self.source_name.clone(),
            revision_date,
        }
    }
}
