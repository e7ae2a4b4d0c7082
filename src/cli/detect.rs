use std::path::Path;

use skillport::{AgentId, Registry, SkillportError};

use super::Format;

pub(crate) fn run(file: &Path, agent: Option<AgentId>, format: Format) {
    let content = super::read_input("detect", file);
    let hint = super::path_hint(file);
    let agent = agent
        .or_else(|| Registry::new().detect_agent(&content, Some(&hint)))
        .unwrap_or_else(|| super::fail("detect", SkillportError::UndetectedAgent));
    let detection = skillport::detect_version(agent, &content, Some(&hint));

    match format {
        Format::Text => {
            println!(
                "{} {} (confidence {}%{})",
                agent.display_name(),
                detection.version,
                detection.confidence,
                if detection.is_definitive { ", definitive" } else { "" }
            );
            for marker in &detection.matched_markers {
                println!("  matched: {marker}");
            }
        }
        Format::Json => super::print_json(&detection),
    }
}
