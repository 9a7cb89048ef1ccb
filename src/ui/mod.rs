pub mod chart;
pub mod file_view;
pub mod panels;
