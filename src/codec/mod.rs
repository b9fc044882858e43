//! PO 交换格式的读写

pub mod escape;
pub mod markers;
pub mod parser;
pub mod po_file;
