use std::path::Path;

use skillport::{AdaptPolicy, AgentId};

use super::Format;

pub(crate) fn run(
    file: &Path,
    agent: AgentId,
    from: Option<String>,
    to: &str,
    strict: bool,
    format: Format,
) {
    let content = super::read_input("adapt", file);
    let from = from.unwrap_or_else(|| {
        let detected = skillport::detect_version(agent, &content, Some(&super::path_hint(file)));
        eprintln!(
            "detected {} {} (confidence {}%)",
            agent.display_name(),
            detected.version,
            detected.confidence
        );
        detected.version
    });
    let policy = if strict {
        AdaptPolicy::Strict
    } else {
        AdaptPolicy::Lenient
    };

    let adaptation = match skillport::adapt_version_with(agent, &content, &from, to, policy) {
        Ok(adaptation) => adaptation,
        Err(e) => super::fail("adapt", e),
    };

    match format {
        Format::Text => {
            print!("{}", adaptation.content);
            if !adaptation.content.ends_with('\n') {
                println!();
            }
            for applied in &adaptation.transformations {
                eprintln!("applied: {applied}");
            }
            for warning in &adaptation.warnings {
                eprintln!("warning: {}: {}", warning.code, warning.message);
            }
        }
        Format::Json => super::print_json(&adaptation),
    }
}
