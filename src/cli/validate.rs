use std::path::Path;

use skillport::{AgentId, ComponentType, Diagnostic, ParseOptions, Registry, ValidateOptions};

use super::Format;

pub(crate) fn run(
    file: &Path,
    agent: Option<AgentId>,
    component_type: Option<ComponentType>,
    strict: bool,
    version: Option<String>,
    format: Format,
) {
    let content = super::read_input("validate", file);
    let hint = super::path_hint(file);
    let registry = Registry::new();

    let Some(agent) = agent.or_else(|| registry.detect_agent(&content, Some(&hint))) else {
        super::fail("validate", "could not detect the agent; pass --agent");
    };
    // Without an explicit type, take the one the parser infers. Unparseable
    // content still goes through the validator so it gets a diagnostic.
    let component_type = component_type.unwrap_or_else(|| {
        let options = ParseOptions::for_agent(agent).with_source_file(hint.clone());
        skillport::parse(&registry, &content, &options)
            .map(|parsed| parsed.spec.component_type())
            .unwrap_or(ComponentType::Skill)
    });

    let options = ValidateOptions { strict, version };
    let result = skillport::validate(&content, agent, component_type, &options);

    match format {
        Format::Text => {
            for diag in result.all() {
                eprintln!("{}", render(diag));
            }
            if result.valid {
                eprintln!("{}: ok", file.display());
            }
        }
        Format::Json => super::print_json(&result),
    }

    if !result.valid {
        std::process::exit(1);
    }
}

fn render(diag: &Diagnostic) -> String {
    match &diag.suggestion {
        Some(suggestion) => format!("{diag}\n  suggestion: {suggestion}"),
        None => diag.to_string(),
    }
}
