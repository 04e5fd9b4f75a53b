//! `Tasklist`: terminal task tracker library.

pub mod app;
pub mod cli;
pub mod config;
pub mod storage;
pub mod tasks;
pub mod ui;
