use std::path::Path;

use crate::pipeline::PipelineReport;

pub fn summarize(report: &PipelineReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("Client: {}\n", report.client));
    output.push_str(&format!("Output: {}\n", report.output_dir.display()));
    output.push_str(&format!(
        "Cleared: {} files, {} directories\n",
        report.cleared.files_removed, report.cleared.dirs_removed
    ));

    output.push_str("Kept:\n");
    if report.cleared.kept.is_empty() {
        output.push_str("  (none)\n");
    } else {
        for path in &report.cleared.kept {
            output.push_str(&format!("  - {path}\n"));
        }
    }

    output.push_str(&format!("Generator: {}\n", report.generator.command_line));

    output.push_str("Patched files:\n");
    if report.patched.is_empty() {
        output.push_str("  (none)\n");
    } else {
        for path in &report.patched {
            output.push_str(&format!(
                "  - {}\n",
                relative_display(path, &report.output_dir)
            ));
        }
    }

    if report.license_seeded {
        output.push_str("License: seeded LICENSE.md\n");
    }

    output.trim_end().to_string()
}

fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
