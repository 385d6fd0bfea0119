//! Test configuration helpers

use pagepulse::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration with every path inside `dir`
pub fn test_config(dir: &Path, auditor: PathBuf) -> Config {
    let mut config = Config::default();
    config.input_path = dir.join("urls.csv");
    config.auditor.executable = Some(auditor);
    config.auditor.output_dir = dir.join("audits");
    config.auditor.timeout = Duration::from_secs(30);
    config.http.timeout = Duration::from_secs(5);
    config.http.connect_timeout = Duration::from_secs(2);
    config.persistence.database_path = dir.join("pagepulse.db");
    config
}

/// Write the input list
pub fn write_input(config: &Config, rows: &[(&str, &str)]) {
    let mut csv = String::from("url,description\n");
    for (url, description) in rows {
        csv.push_str(url);
        if !description.is_empty() {
            csv.push(',');
            csv.push_str(description);
        }
        csv.push('\n');
    }
    std::fs::write(&config.input_path, csv).unwrap();
}
