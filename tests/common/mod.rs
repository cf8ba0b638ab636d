#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const USAGE_REPORT: &str = "\
acctA|cpu=4,mem=2097152|00:10:00|alice
acctA|cpu=2,gres/gpu=1|01:00:00|bob
acctB|cpu=8,node=2|1-00:00:00|carol
acctB|cpu=1|850:00:00|carol
not a report line
";

pub const ASSOCIATION_REPORT: &str = "\
acctA|cpu=100,node=10
acctA|cpu=10,mem=4G|alice
acctB|node=2,gres/gpu=4
";

pub const MAPPING_CONFIG: &str = r#"
[logging]
level = "ERROR"
format = "pretty"
output = "console"

[parsing]
tres_keys = ["cpu", "mem", "node", "gres/gpu"]

[components.cpu]

[components.node.target_components.gpu_hours]
factor = 5.0

[components.node.target_components.storage_gb_hours]
factor = 10.0
"#;

pub fn write_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Temp dir holding a config, a usage report and an association report
pub fn setup_test_environment() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    write_file(temp_dir.path(), "tres-usage.toml", MAPPING_CONFIG)?;
    write_file(temp_dir.path(), "usage.txt", USAGE_REPORT)?;
    write_file(temp_dir.path(), "assoc.txt", ASSOCIATION_REPORT)?;
    Ok(temp_dir)
}
