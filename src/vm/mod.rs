pub mod bridge;
pub mod view;
