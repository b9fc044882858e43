//! 数据模型：翻译单元、目录、相似度、对账与应用状态

pub mod catalog;
pub mod data_core;
pub mod performance;
pub mod quality;
pub mod reconcile;
pub mod similarity;
pub mod unit;
