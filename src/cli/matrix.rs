use skillport::{compatibility_matrix, Registry};

use super::Format;

pub(crate) fn run(format: Format) {
    let matrix = compatibility_matrix(&Registry::new());
    match format {
        Format::Text => {
            let agents: Vec<_> = matrix.rows().map(|(agent, _)| agent).collect();
            let header: String = agents.iter().map(|a| format!("{:>9}", a.as_str())).collect();
            println!("{:<9}{header}", "from\\to");
            for (source, row) in matrix.rows() {
                let cells: String = row.values().map(|score| format!("{score:>9}")).collect();
                println!("{:<9}{cells}", source.as_str());
            }
        }
        Format::Json => super::print_json(&matrix),
    }
}
