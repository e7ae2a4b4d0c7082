use std::path::Path;

use skillport::{AgentId, ParseOptions, Registry};

pub(crate) fn run(file: &Path, agent: Option<AgentId>) {
    let content = super::read_input("parse", file);
    let options = ParseOptions {
        agent,
        source_file: Some(super::path_hint(file)),
        validate_on_parse: false,
    };
    match skillport::parse(&Registry::new(), &content, &options) {
        Ok(parsed) => {
            for warning in &parsed.warnings {
                eprintln!("warning: {}: {}", warning.code, warning.message);
            }
            super::print_json(&parsed.spec);
        }
        Err(e) => super::fail("parse", e),
    }
}
