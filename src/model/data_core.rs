//! AppState：应用核心状态，持有当前目录与视图

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::po_file::{self, ImportWarning};
use crate::config::Settings;
use crate::model::catalog::Catalog;
use crate::model::reconcile::{reconcile, DiffReport};
use crate::model::unit::Unit;
use crate::vm::view::{CatalogView, SortColumn, SortOrder, ViewFilter};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("PO格式错误 (第 {line} 行): {message}")]
    Format { line: usize, message: String },
    #[error("契约违例: {0}")]
    ContractViolation(String),
    #[error("状态错误: {0}")]
    State(String),
}

impl AppError {
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }
}

/// `PO-Revision-Date` 使用的当前时间
pub fn revision_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M%z").to_string()
}

#[derive(Debug, Default)]
pub struct AppState {
    pub original_file_path: Option<PathBuf>,
    pub catalog: Option<Catalog>,
    pub view: CatalogView,
    pub settings: Settings,
    /// 最近一次加载产生的非致命警告
    pub warnings: Vec<ImportWarning>,
}

impl AppState {
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// 加载PO文件并重算视图；失败时保留之前的状态
    pub fn load_file(&mut self, p: &Path) -> Result<(), AppError> {
        let decoded = po_file::load(p, &self.settings.load_options())?;
        self.original_file_path = Some(p.to_path_buf());
        self.warnings = decoded.warnings;
        self.catalog = Some(decoded.catalog);
        self.refresh_view();
        Ok(())
    }

    /// 直接接管一个内存中的目录（如新建模板）
    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = Some(catalog);
        self.warnings.clear();
        self.refresh_view();
    }

    pub fn catalog(&self) -> Result<&Catalog, AppError> {
        self.catalog
            .as_ref()
            .ok_or_else(|| AppError::State("目录尚未加载".into()))
    }

    fn catalog_mut(&mut self) -> Result<&mut Catalog, AppError> {
        self.catalog
            .as_mut()
            .ok_or_else(|| AppError::State("目录尚未加载".into()))
    }

    /// 将当前目录保存到指定路径，并更新修订时间
    pub fn save_to_file(&self, path: &Path) -> Result<(), AppError> {
        let catalog = self.catalog()?;
        let options = self.settings.encode_options(Some(revision_timestamp()));
        po_file::save(path, catalog, &options)
    }

    /// 将当前目录保存回原始文件路径
    pub fn save_to_original_file(&self) -> Result<(), AppError> {
        let original_path = self
            .original_file_path
            .as_ref()
            .ok_or_else(|| AppError::State("原始文件路径未设置".into()))?;
        self.save_to_file(original_path)
    }

    pub fn apply_filter(&mut self, filter: ViewFilter) {
        self.view.set_filter(filter);
        self.refresh_view();
    }

    pub fn apply_sort(&mut self, column: SortColumn, order: SortOrder) {
        self.view.set_sort(column, order);
        self.refresh_view();
    }

    /// 当前视图中可见的单元，按视图顺序
    pub fn visible_units(&self) -> Vec<&Unit> {
        match &self.catalog {
            Some(catalog) => self.view.units(catalog).collect(),
            None => Vec::new(),
        }
    }

    /// 用新提取结果对账，合并目录替换当前目录
    pub fn reconcile_with(&mut self, extracted: &[Unit]) -> Result<DiffReport, AppError> {
        let result = reconcile(self.catalog()?, extracted, &self.settings.reconcile)?;
        self.catalog = Some(result.merged);
        self.refresh_view();
        Ok(result.report)
    }

    pub fn set_translation(&mut self, id: &str, translation: &str) -> Result<(), AppError> {
        let unit = self.unit_mut(id)?;
        unit.translation = translation.to_string();
        self.refresh_view();
        Ok(())
    }

    /// 切换审校状态，返回新状态
    pub fn toggle_reviewed(&mut self, id: &str) -> Result<bool, AppError> {
        let unit = self.unit_mut(id)?;
        let reviewed = !unit.is_reviewed();
        unit.set_reviewed(reviewed);
        self.refresh_view();
        Ok(reviewed)
    }

    /// 切换忽略状态，返回新状态
    pub fn toggle_ignored(&mut self, id: &str) -> Result<bool, AppError> {
        let unit = self.unit_mut(id)?;
        let ignored = !unit.is_ignored();
        unit.set_ignored(ignored);
        self.refresh_view();
        Ok(ignored)
    }

    pub fn delete_unit(&mut self, id: &str) -> Result<Unit, AppError> {
        let removed = self
            .catalog_mut()?
            .remove_by_id(id)
            .ok_or_else(|| AppError::State(format!("未找到单元: {}", id)))?;
        tracing::info!("已删除单元: {}", removed.original);
        self.refresh_view();
        Ok(removed)
    }

    fn unit_mut(&mut self, id: &str) -> Result<&mut Unit, AppError> {
        self.catalog_mut()?
            .unit_mut_by_id(id)
            .ok_or_else(|| AppError::State(format!("未找到单元: {}", id)))
    }

    fn refresh_view(&mut self) {
        if let Some(catalog) = &self.catalog {
            self.view.refresh(catalog);
        }
    }
}
