use skillport::mapping::Strategy;
use skillport::AgentId;

use super::Format;

pub(crate) fn run(from: AgentId, to: AgentId, format: Format) {
    let table = skillport::mappings(from, to);
    match format {
        Format::Text => {
            for mapping in &table {
                let detail = match &mapping.strategy {
                    Strategy::Direct {
                        source_key,
                        target_key,
                    } => format!("{source_key} -> {target_key}"),
                    Strategy::Transform { description } => description.clone(),
                    Strategy::Fallback { default } => format!("defaults to {default}"),
                    Strategy::Unsupported { reason } => (*reason).to_string(),
                };
                println!("{:<32} {:<12} {detail}", mapping.field, mapping.strategy.kind());
            }
        }
        Format::Json => super::print_json(&table),
    }
}
