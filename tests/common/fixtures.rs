//! Auditor reports and fake auditor scripts

use std::path::{Path, PathBuf};

/// Auditor report with every field pagepulse reads
pub const SAMPLE_REPORT: &str = r#"{
  "lighthouseVersion": "11.4.0",
  "categories": {
    "performance": { "score": 0.64 },
    "accessibility": { "score": 0.95 },
    "best-practices": { "score": 1 },
    "seo": { "score": 0.873 }
  },
  "audits": {
    "metrics": {
      "details": {
        "items": [
          {
            "firstContentfulPaint": 912,
            "speedIndex": 1530.5,
            "largestContentfulPaint": 2104,
            "cumulativeLayoutShift": 0.0421,
            "totalBlockingTime": 120,
            "interactive": 3311
          }
        ]
      }
    }
  }
}"#;

/// Write an executable shell script standing in for the auditor
///
/// `body` runs with `$out` set to the `--output-path=` argument and `$url`
/// set to the first argument.
#[cfg(unix)]
pub fn write_auditor_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\nurl=\"$1\"\nout=\"\"\nfor arg in \"$@\"; do\n  case \"$arg\" in\n    --output-path=*) out=\"${{arg#--output-path=}}\" ;;\n  esac\ndone\n{}\n",
        body
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Script body writing [`SAMPLE_REPORT`] for every URL except those containing
/// `/silent`, for which it exits 0 without a report
pub fn report_unless_silent() -> String {
    format!(
        "case \"$url\" in\n  */silent*) exit 0 ;;\nesac\ncat > \"$out\" <<'EOF'\n{}\nEOF\nexit 0",
        SAMPLE_REPORT
    )
}

/// A localhost port nothing listens on
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
