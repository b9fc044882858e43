//! PO翻译目录工具库
//!
//! 提供PO文件读写（私有审校/忽略标记）、重新提取后的对账合并，
//! 以及按状态加权排序的过滤视图

pub mod codec;
pub mod config;
pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use codec::po_file::{decode, encode, load, save, Decoded, EncodeOptions, ImportWarning, LoadOptions};
pub use config::Settings;
pub use model::catalog::{Catalog, CatalogMetadata, CatalogStats, HeaderLine};
pub use model::data_core::{AppError, AppState};
pub use model::reconcile::{reconcile, DiffReport, ModifiedPair, ReconcileOptions, Reconciliation};
pub use model::similarity::similarity;
pub use model::unit::{Occurrence, Unit, NEW_ENTRY_ID};
pub use vm::view::{CatalogView, SortColumn, SortOrder, ViewFilter};
