//! Task Prompt Composer
//!
//! Deterministic assembly of the instruction payload handed to the task
//! execution service. No I/O happens here: the same [`TaskRunContext`]
//! always produces the same payload.
//!
//! The payload is built from fixed sections, in order:
//!
//! 1. Target repository
//! 2. Autonomy statement (plan or auto)
//! 3. Scenario focus
//! 4. User task, when present
//! 5. Memory (local summary, then remote context behind a separator)
//! 6. Output contract

use sdk::types::{Mode, RepoId, Scenario};

/// Separator placed between local and remote memory context
pub const REMOTE_MEMORY_SEPARATOR: &str = "--- Remote memory ---";

/// Everything one task run needs to compose its instructions
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRunContext {
    pub repo: RepoId,

    /// Effective mode, after scenario escalation
    pub mode: Mode,

    pub scenario: Scenario,

    /// Free-text task from the caller
    pub task: Option<String>,

    /// Rendered local memory
    pub memory_summary: String,

    /// Context recalled by the remote memory service
    pub remote_context: Option<String>,
}

impl TaskRunContext {
    /// User task, if it carries any text
    pub fn user_task(&self) -> Option<&str> {
        self.task.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Local memory followed by remote context, when there is any
    pub fn combined_memory(&self) -> String {
        match self
            .remote_context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            Some(remote) => format!(
                "{}\n\n{}\n{}",
                self.memory_summary.trim(),
                REMOTE_MEMORY_SEPARATOR,
                remote
            ),
            None => self.memory_summary.trim().to_string(),
        }
    }
}

const PLAN_AUTONOMY: &str = "\
## Autonomy: PLAN (read-only)
You are in read-only diagnosis mode. Inspect the repository and report what you find.
Do not perform any write action of any kind: no labels, no comments, no issues,
no pull requests, no commits. Describe the actions you would recommend instead.";

const AUTO_AUTONOMY: &str = "\
## Autonomy: AUTO (bounded write actions)
You are authorized to perform only these low-risk write actions:
- Add or adjust labels on issues and pull requests.
- Comment on stale issues and pull requests to ask for an update.
- Open at most one new issue that summarizes your findings.
You must never:
- Force-push or rewrite history on any branch.
- Modify code, create commits, or push branches.
- Close issues or pull requests, except unambiguous spam.
Report every write action you performed.";

const HEALTH_FOCUS: &str = "\
## Focus: repository health
Assess overall maintenance health: recent commit activity, open issue and pull
request volume and age, CI status on the default branch, release cadence,
documentation and contributor guidelines, and signs of abandoned work.";

const BACKLOG_FOCUS: &str = "\
## Focus: backlog triage
Review open issues and pull requests. Identify stale items, unlabeled items,
duplicates, questions waiting on maintainers, and pull requests blocked on
review. Propose a triage plan ordered by impact.";

const RELEASE_FOCUS: &str = "\
## Focus: release readiness
Evaluate whether the default branch is ready to release: changes since the last
release, open release-blocking issues, CI health, changelog state, and version
metadata. Give a go / no-go recommendation with reasons.";

const CUSTOM_FOCUS: &str = "\
## Focus: custom
Follow the user task below. If no user task is given, perform a general review
of the repository and report the most important observations.";

const CHAT_FOCUS: &str = "\
## Focus: conversation
Act as a fully agentic maintainer assistant. Answer the user's request end to
end, using the repository inspection tools as needed.";

const OUTPUT_CONTRACT: &str = "\
## Required output
Respond in Markdown with exactly these parts, in this order:
1. A first line of the form `Health Score: NN/100`, where NN is an integer from 0 to 100.
2. `## Summary` with two to four sentences.
3. `## Findings` as a bulleted list, most important first.
4. `## Recommended Actions` as a numbered list.
5. `## Actions Taken` listing every write action performed, or `None.` if there were none.
Do not add any other top-level sections.";

fn autonomy_statement(mode: Mode) -> &'static str {
    match mode {
        Mode::Plan => PLAN_AUTONOMY,
        Mode::Auto => AUTO_AUTONOMY,
    }
}

fn scenario_focus(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::Health => HEALTH_FOCUS,
        Scenario::Backlog => BACKLOG_FOCUS,
        Scenario::Release => RELEASE_FOCUS,
        Scenario::Custom => CUSTOM_FOCUS,
        Scenario::Chat => CHAT_FOCUS,
    }
}

/// Compose the instruction payload for one task run
pub fn compose(ctx: &TaskRunContext) -> String {
    let mut sections = vec![
        format!(
            "You are a repository maintenance agent working on the GitHub repository `{}`.\n\
             Use the repository inspection tools available to you; do not guess facts you can look up.",
            ctx.repo
        ),
        autonomy_statement(ctx.mode).to_string(),
        scenario_focus(ctx.scenario).to_string(),
    ];

    if let Some(task) = ctx.user_task() {
        sections.push(format!(
            "## User task (takes priority over the default focus)\n{}",
            task
        ));
    }

    sections.push(format!("## Memory from previous runs\n{}", ctx.combined_memory()));
    sections.push(OUTPUT_CONTRACT.to_string());

    sections.join("\n\n")
}

/// Small digest sent to the remote memory service to recall context
pub fn conversation_digest(ctx: &TaskRunContext) -> String {
    format!(
        "scenario: {}\nmode: {}\nuser task: {}\nlocal memory:\n{}",
        ctx.scenario,
        ctx.mode,
        ctx.user_task().unwrap_or("(none)"),
        ctx.memory_summary.trim()
    )
}

/// Text pushed to the remote memory service after a run
pub fn run_digest(
    repo: &RepoId,
    scenario: Scenario,
    mode: Mode,
    score: Option<u8>,
    report: &str,
) -> String {
    let mut digest = format!(
        "Repository: {}\nScenario: {}\nMode: {}\n",
        repo, scenario, mode
    );
    if let Some(score) = score {
        digest.push_str(&format!("Health Score: {}/100\n", score));
    }
    digest.push_str("Report:\n");
    digest.push_str(report);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(mode: Mode, scenario: Scenario) -> TaskRunContext {
        TaskRunContext {
            repo: RepoId::parse("acme/widgets").unwrap(),
            mode,
            scenario,
            task: None,
            memory_summary: "No prior memory for this repository.".to_string(),
            remote_context: None,
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        let mut context = ctx(Mode::Auto, Scenario::Backlog);
        context.task = Some("Look at PR #12".into());
        context.remote_context = Some("Maintainers prefer small PRs".into());

        assert_eq!(compose(&context), compose(&context.clone()));
    }

    #[test]
    fn test_sections_in_order() {
        let mut context = ctx(Mode::Plan, Scenario::Health);
        context.task = Some("Check the CI".into());
        let prompt = compose(&context);

        let positions: Vec<usize> = [
            "`acme/widgets`",
            "## Autonomy: PLAN",
            "## Focus: repository health",
            "## User task (takes priority over the default focus)\nCheck the CI",
            "## Memory from previous runs\nNo prior memory",
            "## Required output",
        ]
        .iter()
        .map(|needle| prompt.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_autonomy_templates() {
        let plan = compose(&ctx(Mode::Plan, Scenario::Health));
        assert!(plan.contains(PLAN_AUTONOMY));
        assert!(!plan.contains("AUTO"));

        let auto = compose(&ctx(Mode::Auto, Scenario::Health));
        assert!(auto.contains(AUTO_AUTONOMY));
        assert!(auto.contains("at most one new issue"));
        assert!(auto.contains("Force-push"));
    }

    #[test]
    fn test_every_scenario_has_distinct_focus() {
        let prompts: Vec<String> = Scenario::ALL
            .iter()
            .map(|s| compose(&ctx(Mode::Plan, *s)))
            .collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_blank_user_task_omitted() {
        let mut context = ctx(Mode::Plan, Scenario::Custom);
        context.task = Some("   ".into());
        assert!(!compose(&context).contains("## User task"));
    }

    #[test]
    fn test_remote_context_behind_separator() {
        let mut context = ctx(Mode::Plan, Scenario::Health);
        assert!(!compose(&context).contains(REMOTE_MEMORY_SEPARATOR));

        context.remote_context = Some("Flaky CI on Mondays".into());
        let memory = context.combined_memory();
        assert_eq!(
            memory,
            format!(
                "No prior memory for this repository.\n\n{}\nFlaky CI on Mondays",
                REMOTE_MEMORY_SEPARATOR
            )
        );
        assert!(compose(&context).contains(&memory));
    }

    #[test]
    fn test_output_contract_always_present() {
        for scenario in Scenario::ALL {
            let prompt = compose(&ctx(Mode::Plan, scenario));
            assert!(prompt.ends_with(OUTPUT_CONTRACT));
            assert!(prompt.contains("Health Score: NN/100"));
        }
    }

    #[test]
    fn test_digests() {
        let mut context = ctx(Mode::Auto, Scenario::Release);
        context.task = Some("ship it?".into());
        let digest = conversation_digest(&context);
        assert!(digest.starts_with("scenario: release\nmode: auto\nuser task: ship it?"));

        let run = run_digest(&context.repo, Scenario::Release, Mode::Auto, Some(72), "Report body");
        assert!(run.contains("Repository: acme/widgets"));
        assert!(run.contains("Health Score: 72/100"));
        assert!(run.ends_with("Report body"));

        let unscored = run_digest(&context.repo, Scenario::Health, Mode::Plan, None, "x");
        assert!(!unscored.contains("Health Score"));
    }
}
