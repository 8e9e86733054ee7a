//! Run summary printed on stdout

use graft_engine::{UpdateOptions, UpdateReport};
use graft_foundation::module_name::mod_to_path;

pub fn print_report(report: &UpdateReport, options: &UpdateOptions) {
    print!("{}", render_report(report, options));
}

fn render_report(report: &UpdateReport, options: &UpdateOptions) -> String {
    if report.is_empty() {
        return "Nothing to copy\n".to_string();
    }

    let mut out = format!(
        "Copied {} {} modules into '{}'\n",
        report.modules.len(),
        options.library,
        options.dest_dir.join(mod_to_path(&options.base)).display()
    );
    out.push_str(&format!(
        "  {} files written, {} existing files kept\n",
        report.written.len(),
        report.skipped.len()
    ));

    if let Some(removed) = &report.removed {
        out.push_str(&format!("  removed '{}'\n", removed.display()));
    }
    for (module, target) in &report.shared {
        out.push_str(&format!("  using '{}' for '{}'\n", target, module));
    }
    for group in &report.entrypoints.groups {
        out.push_str(&format!("  entry point group '{}'\n", group));
    }
    if let Some(manifest) = &report.entrypoints.manifest {
        let verb = if report.entrypoints.manifest_existed {
            "updated"
        } else {
            "created"
        };
        out.push_str(&format!("  {} '{}'\n", verb, manifest.display()));
    }
    out
}
