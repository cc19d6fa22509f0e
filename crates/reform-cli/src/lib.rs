//! 远程单对账命令行工具

pub mod cli;
