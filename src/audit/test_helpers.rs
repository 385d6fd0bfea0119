//! Shared fixtures for auditor tests: a trimmed report and fake auditor scripts.

use std::path::{Path, PathBuf};

/// Trimmed auditor report with every field the extractor reads
pub(crate) const SAMPLE_REPORT: &str = r#"{
  "lighthouseVersion": "11.4.0",
  "requestedUrl": "http://example.com/",
  "categories": {
    "performance": { "id": "performance", "score": 0.64 },
    "accessibility": { "id": "accessibility", "score": 0.95 },
    "best-practices": { "id": "best-practices", "score": 1 },
    "seo": { "id": "seo", "score": 0.873 }
  },
  "audits": {
    "metrics": {
      "id": "metrics",
      "details": {
        "type": "debugdata",
        "items": [
          {
            "firstContentfulPaint": 912,
            "speedIndex": 1530.5,
            "largestContentfulPaint": 2104,
            "cumulativeLayoutShift": 0.0421,
            "totalBlockingTime": 120,
            "interactive": 3311
          },
          { "lcpInvalidated": false }
        ]
      }
    }
  }
}"#;

/// Write an executable shell script standing in for the auditor
///
/// `body` runs with `$out` set to the value of the `--output-path=` argument.
#[cfg(unix)]
pub(crate) fn write_auditor_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\nout=\"\"\nfor arg in \"$@\"; do\n  case \"$arg\" in\n    --output-path=*) out=\"${{arg#--output-path=}}\" ;;\n  esac\ndone\n{}\n",
        body
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Script body that writes [`SAMPLE_REPORT`] and exits 0
#[cfg(unix)]
pub(crate) fn writes_sample_report() -> String {
    format!("cat > \"$out\" <<'EOF'\n{}\nEOF\nexit 0", SAMPLE_REPORT)
}
