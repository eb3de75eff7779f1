//! 工具程序依赖的通用组件.

use std::str::FromStr;

use log::LevelFilter;
use simple_logger::SimpleLogger;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 安装日志. 级别取自环境变量 `$SEG_LOG` (如 `debug`), 默认为 `info`.
pub fn init_logger() -> anyhow::Result<()> {
    let level = match std::env::var("SEG_LOG") {
        Ok(s) => LevelFilter::from_str(&s)?,
        Err(_) => LevelFilter::Info,
    };
    SimpleLogger::new().with_level(level).init()?;
    Ok(())
}
