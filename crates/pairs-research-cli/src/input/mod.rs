pub mod csv_panel;
pub mod file;
pub mod stdin;
