use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use repopulse_engine::config::Config;
use repopulse_engine::memory::{Episode, RepoMemory, EPISODE_SUMMARY_CHARS, MAX_EPISODES};
use repopulse_engine::score::extract_score;

proptest! {
    // Score extraction never panics and never exceeds 100
    #[test]
    fn test_extract_score_is_total(text in ".{0,400}") {
        if let Some(score) = extract_score(&text) {
            prop_assert!(score <= 100);
        }
    }

    #[test]
    fn test_extract_score_reads_contract_line(
        score in 0u16..=999,
        prefix in "[a-zA-Z ,.\n]{0,40}",
        suffix in "[a-zA-Z ,.\n]{0,80}",
    ) {
        let text = format!("{}\nHealth Score: {}/100\n{}", prefix, score, suffix);
        prop_assert_eq!(extract_score(&text), Some(score.min(100) as u8));
    }

    // The episodic log never exceeds its capacity and keeps append order
    #[test]
    fn test_episodic_capacity(runs in 0usize..40, score in proptest::option::of(0u8..=100)) {
        let mut memory = RepoMemory::default();
        for n in 0..runs {
            let ts = Utc.timestamp_opt(1_700_000_000 + n as i64 * 60, 0).unwrap();
            memory.push_episode(Episode::at(ts, score, &format!("run {}", n)));
            prop_assert!(memory.episodic.len() <= MAX_EPISODES);
        }

        prop_assert_eq!(memory.episodic.len(), runs.min(MAX_EPISODES));
        let expected: Vec<String> = (runs.saturating_sub(MAX_EPISODES)..runs)
            .map(|n| format!("run {}", n))
            .collect();
        let actual: Vec<String> = memory.episodic.iter().map(|e| e.summary.clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn test_episode_summary_is_bounded(result in "\\PC{0,3000}") {
        let episode = Episode::new(None, &result);
        prop_assert!(episode.summary.chars().count() <= EPISODE_SUMMARY_CHARS);
        prop_assert!(result.starts_with(&episode.summary));
    }

    // Stored documents survive a serialization round trip unchanged
    #[test]
    fn test_memory_document_round_trip(runs in 0usize..15, description in proptest::option::of("[a-z ]{1,30}")) {
        let mut memory = RepoMemory::default();
        if let Some(description) = description {
            memory.core = Some(repopulse_engine::memory::CoreFacts {
                description: Some(description),
                owners: vec!["alice".to_string()],
            });
        }
        for n in 0..runs {
            let ts = Utc.timestamp_opt(1_700_000_000 + n as i64, 0).unwrap();
            memory.push_episode(Episode::at(ts, Some((n * 7 % 101) as u8), "ok"));
        }

        let json = serde_json::to_string(&memory).unwrap();
        let restored: RepoMemory = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(restored, memory);
    }

    #[test]
    fn test_config_accepts_valid_schedules(
        log_level in "error|warn|info|debug|trace",
        hour in 0u32..24,
        minute in 0u32..60,
        max_iterations in 1u32..100,
    ) {
        let toml = format!(r#"
[core]
log_level = "{}"
data_dir = "/tmp/repopulse"

[executor]
max_iterations = {}

[schedule]
enabled = true
repo = "https://github.com/acme/widgets"
scenario = "backlog"
hour_utc = {}
minute_utc = {}
"#, log_level, max_iterations, hour, minute);

        let config = Config::from_toml_str(&toml).unwrap();
        prop_assert_eq!(config.executor.max_iterations, max_iterations);
        prop_assert_eq!(config.scheduled_repo().unwrap().unwrap().to_string(), "acme/widgets");
    }
}
