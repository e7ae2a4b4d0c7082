use std::path::Path;

use skillport::{AgentId, ComponentSpec, ParseOptions, Registry};

use super::Format;

fn load(registry: &Registry, file: &Path, agent: Option<AgentId>) -> ComponentSpec {
    let content = super::read_input("diff", file);
    let options = ParseOptions {
        agent,
        source_file: Some(super::path_hint(file)),
        validate_on_parse: false,
    };
    match skillport::parse(registry, &content, &options) {
        Ok(parsed) => parsed.spec,
        Err(e) => super::fail("diff", format!("{}: {e}", file.display())),
    }
}

pub(crate) fn run(a: &Path, b: &Path, agent: Option<AgentId>, patch: bool, format: Format) {
    let registry = Registry::new();
    let (spec_a, spec_b) = (load(&registry, a, agent), load(&registry, b, agent));
    let diff = skillport::diff_specs(&spec_a, &spec_b);

    match format {
        Format::Text => {
            if diff.is_identical() {
                println!("identical");
            }
            for d in &diff.field_diffs {
                println!("{}: {}: {} -> {}", d.severity.as_str(), d.field, d.before, d.after);
            }
            println!("body similarity: {:.2}", diff.body_similarity);
            if patch {
                print!("{}", skillport::body_patch(&spec_a, &spec_b));
            }
        }
        Format::Json => {
            if patch {
                let value = serde_json::json!({
                    "diff": diff,
                    "patch": skillport::body_patch(&spec_a, &spec_b),
                });
                super::print_json(&value);
            } else {
                super::print_json(&diff);
            }
        }
    }
}
