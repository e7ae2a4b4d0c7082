use std::path::{Path, PathBuf};

use skillport::{AgentId, Registry, TransformOptions, Transformed};

use super::Format;

pub(crate) struct Args {
    pub to: AgentId,
    pub from: Option<AgentId>,
    pub comments: bool,
    pub target_version: Option<String>,
    pub validate: bool,
    pub output: Option<PathBuf>,
}

pub(crate) fn run(file: &Path, args: Args, format: Format) {
    let content = super::read_input("convert", file);
    let registry = Registry::new();
    let options = TransformOptions {
        source_agent: args.from,
        target_agent: args.to,
        source_file: Some(super::path_hint(file)),
        include_comments: args.comments,
        target_version: args.target_version,
        validate_output: args.validate,
    };
    let out = match skillport::transform(&registry, &content, &options) {
        Ok(out) => out,
        Err(e) => super::fail("convert", e),
    };

    if let Some(root) = &args.output {
        if let Err(e) = write_outputs(root, &out) {
            super::fail("convert", format!("{}: {e}", root.display()));
        }
    }

    match format {
        Format::Text => {
            if args.output.is_none() {
                print!("{}", out.output);
                if !out.output.ends_with('\n') {
                    println!();
                }
            }
            print_summary(&out);
        }
        Format::Json => super::print_json(&out),
    }
}

/// Write the main output and any companion files under `root`.
fn write_outputs(root: &Path, out: &Transformed) -> std::io::Result<()> {
    let files = std::iter::once((out.directory.as_str(), out.filename.as_str(), out.output.as_str()))
        .chain(
            out.extra_files
                .iter()
                .map(|f| (f.directory.as_str(), f.filename.as_str(), f.content.as_str())),
        );
    for (directory, filename, content) in files {
        let dir = root.join(directory);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(filename);
        std::fs::write(&path, content)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn print_summary(out: &Transformed) {
    eprintln!(
        "{} -> {} ({}): fidelity {}/100",
        out.source_agent.display_name(),
        out.report.target.agent.display_name(),
        out.path(),
        out.fidelity_score
    );
    for loss in &out.report.losses {
        let severity = match loss.severity {
            skillport::LossSeverity::Critical => "critical",
            skillport::LossSeverity::Warning => "warning",
            skillport::LossSeverity::Info => "info",
        };
        eprintln!("  {severity}: {}: {}", loss.source_field, loss.description);
        if let Some(rec) = &loss.recommendation {
            eprintln!("    hint: {rec}");
        }
    }
    for warning in &out.warnings {
        eprintln!("  {}: {}", warning.code, warning.message);
    }
}
