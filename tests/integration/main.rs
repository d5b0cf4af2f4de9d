//! Integration tests for viewercount

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    const SETTING_VARS: [&str; 12] = [
        "VIEWERCOUNT_CONFIG",
        "SESSION_TIMEOUT",
        "CLEANUP_INTERVAL",
        "MAX_SESSIONS",
        "EVICTION_BUFFER",
        "SWEEP_SAMPLE_RATE",
        "VIEWERCOUNT_HOST",
        "PORT",
        "CORS_ORIGINS",
        "PRODUCTION",
        "LOG_FORMAT",
        "RUST_LOG",
    ];

    fn viewercount() -> Command {
        let mut cmd = cargo_bin_cmd!("viewercount");
        for var in SETTING_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Empty config file so the user's real config never leaks in
    fn empty_config(dir: &TempDir) -> String {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        path.display().to_string()
    }

    #[test]
    fn help_displays() {
        viewercount()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve").and(predicate::str::contains("config")));
    }

    #[test]
    fn version_displays() {
        viewercount()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("viewercount"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        viewercount()
            .args(["--config", &empty_config(&temp), "config", "show"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("[sessions]")
                    .and(predicate::str::contains("timeout_ms = 60000"))
                    .and(predicate::str::contains("max_sessions = 10000"))
                    .and(predicate::str::contains("eviction_buffer = 100")),
            );
    }

    #[test]
    fn config_show_applies_env_overrides() {
        let temp = TempDir::new().unwrap();
        viewercount()
            .args(["--config", &empty_config(&temp), "config", "show"])
            .env("MAX_SESSIONS", "500")
            .env("SESSION_TIMEOUT", "15000")
            .env("PRODUCTION", "true")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("max_sessions = 500")
                    .and(predicate::str::contains("timeout_ms = 15000"))
                    .and(predicate::str::contains("production = true")),
            );
    }

    #[test]
    fn flag_beats_env_and_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 3500\n").unwrap();

        viewercount()
            .args(["--config", path.to_str().unwrap(), "config", "show", "--port", "5000"])
            .env("PORT", "4000")
            .assert()
            .success()
            .stdout(predicate::str::contains("port = 5000"));
    }

    #[test]
    fn invalid_eviction_buffer_rejected() {
        let temp = TempDir::new().unwrap();
        viewercount()
            .args(["--config", &empty_config(&temp), "config", "show"])
            .env("MAX_SESSIONS", "100")
            .env("EVICTION_BUFFER", "100")
            .assert()
            .failure()
            .stderr(predicate::str::contains("eviction_buffer"));
    }

    #[test]
    fn missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.toml");

        viewercount()
            .args(["--config", path.to_str().unwrap(), "config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"));
    }

    #[test]
    fn config_init_then_show() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fresh").join("config.toml");
        let path_str = path.to_str().unwrap();

        viewercount()
            .args(["--config", path_str, "config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));

        viewercount()
            .args(["--config", path_str, "config", "init"])
            .assert()
            .success();
        assert!(path.exists());

        viewercount()
            .args(["--config", path_str, "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[server]"));
    }
}

mod registry_tests {
    use chrono::TimeDelta;
    use std::sync::Arc;
    use viewercount::clock::ManualClock;
    use viewercount::session::{RegistryLimits, SessionRegistry};

    fn registry(max_sessions: usize, eviction_buffer: usize) -> (SessionRegistry, Arc<ManualClock>) {
        let limits = RegistryLimits {
            max_sessions,
            eviction_buffer,
            sweep_sample_rate: 0.0,
            ..RegistryLimits::default()
        };
        let clock = Arc::new(ManualClock::at_millis(0));
        (SessionRegistry::with_clock(limits, clock.clone()), clock)
    }

    #[test]
    fn touch_refresh_then_expire() {
        let (registry, clock) = registry(10_000, 100);

        let first = registry.touch("a", None, None).unwrap();
        assert!(first.is_new);
        assert_eq!(registry.count(), 1);

        clock.set_millis(10);
        let second = registry.touch("a", None, None).unwrap();
        assert!(!second.is_new);
        assert_eq!(registry.count(), 1);

        clock.set_millis(61_000);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn repeated_touch_is_idempotent() {
        let (registry, clock) = registry(10_000, 100);

        for i in 0..5 {
            let outcome = registry
                .touch("same", Some("/page".into()), Some("agent"))
                .unwrap();
            assert_eq!(outcome.is_new, i == 0);
            assert_eq!(registry.count(), 1);
            clock.advance(TimeDelta::milliseconds(1_000));
        }
    }

    #[test]
    fn expiry_boundary() {
        let (registry, clock) = registry(10_000, 100);
        registry.touch("exact", None, None).unwrap();
        clock.set_millis(1);
        registry.touch("inside", None, None).unwrap();

        let now = chrono::DateTime::from_timestamp_millis(60_000).unwrap();
        assert_eq!(registry.sweep_expired(now), 0);

        let now = chrono::DateTime::from_timestamp_millis(60_001).unwrap();
        assert_eq!(registry.sweep_expired(now), 1);
        assert!(!registry.contains("exact"));
        assert!(registry.contains("inside"));
    }

    #[test]
    fn capacity_eviction_at_default_limits() {
        let (registry, clock) = registry(10_000, 100);

        for i in 0..10_000 {
            registry.touch(&format!("s{i:05}"), None, None).unwrap();
            clock.advance(TimeDelta::milliseconds(1));
        }
        assert_eq!(registry.len(), 10_000);

        // The 10,001st insert overflows by one and trims the buffer as well
        let outcome = registry.touch("s10000", None, None).unwrap();
        clock.advance(TimeDelta::milliseconds(1));
        assert_eq!(outcome.evicted, 101);
        assert_eq!(outcome.live_viewers, 9_900);
        for i in 0..=100 {
            assert!(!registry.contains(&format!("s{i:05}")), "s{i:05} survived");
        }
        assert!(registry.contains("s00101"));

        for i in 10_001..10_100 {
            let outcome = registry.touch(&format!("s{i:05}"), None, None).unwrap();
            assert_eq!(outcome.evicted, 0);
            clock.advance(TimeDelta::milliseconds(1));
        }
        assert_eq!(registry.len(), 9_999);
        assert!(registry.len() <= 10_000);
    }

    #[test]
    fn count_never_exceeds_cap() {
        let (registry, clock) = registry(50, 5);

        for i in 0..1_000u32 {
            let id = format!("v{}", (i * 7) % 120);
            registry.touch(&id, None, None).unwrap();
            clock.advance(TimeDelta::milliseconds(3));
            assert!(registry.len() <= 50, "cap exceeded after touch {i}");

            if i % 11 == 0 {
                registry.remove(&format!("v{}", i % 120)).unwrap();
                assert!(registry.len() <= 50);
            }
        }
    }

    #[test]
    fn eviction_removes_oldest_heartbeats() {
        let (registry, clock) = registry(5, 1);

        for id in ["a", "b", "c", "d", "e"] {
            registry.touch(id, None, None).unwrap();
            clock.advance(TimeDelta::milliseconds(10));
        }
        // refresh a and b so c and d become the oldest
        registry.touch("a", None, None).unwrap();
        clock.advance(TimeDelta::milliseconds(10));
        registry.touch("b", None, None).unwrap();
        clock.advance(TimeDelta::milliseconds(10));

        let outcome = registry.touch("f", None, None).unwrap();
        assert_eq!(outcome.evicted, 2);

        let mut ids: Vec<String> = registry.snapshot().into_iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "e", "f"]);
    }

    #[test]
    fn remove_semantics() {
        let (registry, _) = registry(10_000, 100);
        registry.touch("a", None, None).unwrap();
        registry.touch("b", None, None).unwrap();

        let before = registry.count();
        assert!(registry.remove("a").unwrap().removed);
        assert_eq!(registry.count(), before - 1);

        let before = registry.count();
        assert!(!registry.remove("a").unwrap().removed);
        assert_eq!(registry.count(), before);
    }

    #[test]
    fn evicted_session_returns_as_new() {
        let (registry, clock) = registry(2, 0);

        registry.touch("a", None, None).unwrap();
        clock.advance(TimeDelta::milliseconds(1));
        registry.touch("b", None, None).unwrap();
        clock.advance(TimeDelta::milliseconds(1));
        registry.touch("c", None, None).unwrap();
        clock.advance(TimeDelta::milliseconds(1));
        assert!(!registry.contains("a"));

        assert!(registry.touch("a", None, None).unwrap().is_new);
    }
}
