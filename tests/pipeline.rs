//! End-to-end properties of the conversion pipeline over every dialect.

use skillport::diagnostics::E000;
use skillport::report::fidelity_score;
use skillport::version::confidence;
use skillport::{
    compatibility_matrix, diff_specs, transform, validate, AgentId, ComponentType,
    ConversionLoss, ConversionWarning, DiffSeverity, LossSeverity, ParseOptions, Registry,
    SkillportError, TransformOptions, ValidateOptions,
};

/// One native sample per dialect, each written the way that agent expects.
const SAMPLES: &[(AgentId, &str, &str)] = &[
    (
        AgentId::Claude,
        ".claude/skills/code-review/SKILL.md",
        "---\nname: code-review\ndescription: Reviews code for bugs. Use when the user asks for a review.\nallowed-tools: Read, Grep\nmodel: sonnet\n---\n\n# Code Review\n\nReview $ARGUMENTS carefully.",
    ),
    (
        AgentId::Codex,
        ".codex/prompts/review.md",
        "---\ndescription = \"Review staged changes\"\nsandbox_mode = \"read-only\"\n---\n\nReview $ARGUMENTS.",
    ),
    (
        AgentId::Cursor,
        ".cursor/rules/ts.mdc",
        "---\ndescription: TS rules\nglobs: src/**/*.ts\nalwaysApply: false\n---\nUse strict mode.",
    ),
    (
        AgentId::Windsurf,
        ".windsurf/workflows/lint.md",
        "---\ndescription: Lint\nauto_execution_mode: 3\n---\nRun the linter.",
    ),
    (
        AgentId::Copilot,
        ".github/prompts/react-form.prompt.md",
        "---\nmode: agent\ndescription: Generate a React form\ntools: ['codebase', 'search']\nmodel: GPT-4o\n---\nForm for ${input:formName}.",
    ),
    (
        AgentId::Gemini,
        ".gemini/commands/plan.toml",
        "description = \"Plan a change\"\nprompt = \"Plan {{args}}.\"\n",
    ),
];

const FORK_SKILL: &str =
    "---\nname: test-skill\ndescription: A test skill\ncontext: fork\n---\n\nBody.";

fn options(source: AgentId, target: AgentId, path: &str) -> TransformOptions {
    TransformOptions::to(target)
        .from(source)
        .with_source_file(path)
}

#[test]
fn self_conversion_is_idempotent() {
    let registry = Registry::new();
    for &(agent, path, content) in SAMPLES {
        let out = transform(&registry, content, &options(agent, agent, path))
            .unwrap_or_else(|e| panic!("{agent}: {e}"));
        assert!(
            out.fidelity_score >= 95,
            "{agent}: score {} {:?}",
            out.fidelity_score,
            out.report.losses
        );

        let reparsed = skillport::parse(
            &registry,
            &out.output,
            &ParseOptions::for_agent(agent).with_source_file(out.path()),
        )
        .unwrap_or_else(|e| panic!("{agent} reparse: {e}"));
        let diff = diff_specs(&out.spec, &reparsed.spec);
        assert!(
            diff.overall_severity <= DiffSeverity::Minor,
            "{agent}: {:?}",
            diff.field_diffs
        );
    }
}

#[test]
fn scores_stay_in_bounds_for_every_pair() {
    let registry = Registry::new();
    for &(source, path, content) in SAMPLES {
        for target in registry.agents() {
            let out = transform(&registry, content, &options(source, target, path))
                .unwrap_or_else(|e| panic!("{source} -> {target}: {e}"));
            assert!(out.fidelity_score <= 100);
            assert_eq!(out.fidelity_score, out.report.fidelity_score);
        }
    }
}

#[test]
fn every_loss_lowers_the_score() {
    let warnings: Vec<ConversionWarning> = Vec::new();
    let mut losses = Vec::new();
    let mut previous = fidelity_score(100, &losses, &warnings);
    assert_eq!(previous, 100);
    for severity in [
        LossSeverity::Info,
        LossSeverity::Warning,
        LossSeverity::Critical,
        LossSeverity::Critical,
        LossSeverity::Critical,
        LossSeverity::Critical,
        LossSeverity::Critical,
        LossSeverity::Critical,
    ] {
        losses.push(ConversionLoss::new("execution", severity, "execution.context", "dropped"));
        let score = fidelity_score(100, &losses, &warnings);
        assert!(score <= previous);
        previous = score;
    }
    assert_eq!(previous, 0);
}

#[test]
fn confidence_grows_with_score() {
    let max = 20;
    let mut previous = confidence(0, max);
    for score in 1..=max + 5 {
        let next = confidence(score, max);
        assert!(next >= previous, "{score}: {next} < {previous}");
        assert!(next <= 100);
        previous = next;
    }
    assert_eq!(previous, 100);
}

#[test]
fn empty_input_is_rejected_for_every_pair() {
    let registry = Registry::new();
    for source in registry.agents() {
        for target in registry.agents() {
            let result = transform(&registry, "", &TransformOptions::to(target).from(source));
            assert!(
                matches!(result, Err(SkillportError::Parse { .. })),
                "{source} -> {target}"
            );
        }
        let report = validate("", source, ComponentType::Skill, &ValidateOptions::default());
        assert!(!report.valid);
        assert_eq!(report.issues[0].code, E000);
    }
}

#[test]
fn fork_skill_to_windsurf_loses_one_execution_feature() {
    let registry = Registry::new();
    let out = transform(
        &registry,
        FORK_SKILL,
        &options(AgentId::Claude, AgentId::Windsurf, ".claude/skills/test-skill/SKILL.md"),
    )
    .unwrap();
    let execution: Vec<_> = out
        .report
        .losses
        .iter()
        .filter(|l| l.category == "execution")
        .collect();
    assert_eq!(execution.len(), 1);
    assert!(out.fidelity_score < 100);
}

#[test]
fn comments_mention_the_source_agent() {
    let registry = Registry::new();
    let mut opts = options(AgentId::Claude, AgentId::Cursor, ".claude/skills/test-skill/SKILL.md");
    opts.include_comments = true;
    let out = transform(&registry, FORK_SKILL, &opts).unwrap();
    assert!(out.output.contains("<!--"));
    assert!(out.output.contains("Claude Code"));
}

#[test]
fn matrix_diagonal_is_perfect_and_kiro_is_unsupported() {
    let registry = Registry::new();
    let matrix = compatibility_matrix(&registry);
    for agent in registry.agents() {
        assert_eq!(matrix.get(agent, agent), 100);
        assert_eq!(matrix.get(agent, AgentId::Kiro), 0);
        assert_eq!(matrix.get(AgentId::Kiro, agent), 0);
    }
    for (_, row) in matrix.rows() {
        assert!(row.values().all(|score| *score <= 100));
    }
}
