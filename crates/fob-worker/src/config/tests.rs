#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::error::ConfigError;
    use serde_json::json;

    fn config_with(entries: &[(&str, &str)], filename: &str) -> BuildConfig {
        BuildConfig {
            entry: entries.iter().copied().collect(),
            output: OutputConfig {
                filename: filename.to_string(),
                path: None,
            },
            ..BuildConfig::default()
        }
    }

    #[test]
    fn test_display_name_substitutes_single_entry() {
        let config = config_with(&[("main", "./src/index.js")], "[name].bundle.js");
        assert_eq!(config.display_name(), "main.bundle.js");
    }

    #[test]
    fn test_display_name_keeps_placeholder_with_multiple_entries() {
        let config = config_with(
            &[("main", "./src/index.js"), ("admin", "./src/admin.js")],
            "[name].bundle.js",
        );
        assert_eq!(config.display_name(), "[name].bundle.js");
    }

    #[test]
    fn test_display_name_prefers_explicit_name() {
        let config = BuildConfig {
            name: Some("client".to_string()),
            ..config_with(&[("main", "./src/index.js")], "[name].bundle.js")
        };
        assert_eq!(config.display_name(), "client");
    }

    #[test]
    fn test_display_name_without_placeholder() {
        let config = config_with(&[("main", "./src/index.js")], "bundle.js");
        assert_eq!(config.display_name(), "bundle.js");
    }

    #[test]
    fn test_entry_string_shorthand() {
        let config: BuildConfig = serde_json::from_value(json!({
            "entry": "./src/index.ts",
            "output": { "filename": "[name].js" }
        }))
        .unwrap();
        assert_eq!(config.entry.names().collect::<Vec<_>>(), vec!["main"]);
        assert_eq!(config.display_name(), "main.js");
    }

    #[test]
    fn test_entry_order_is_preserved() {
        let config: BuildConfig = serde_json::from_value(json!({
            "entry": { "zeta": "./z.ts", "alpha": "./a.ts" }
        }))
        .unwrap();
        assert_eq!(config.entry.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_defaults_and_extra_fields() {
        let config: BuildConfig = serde_json::from_value(json!({
            "entry": "./src/index.ts",
            "mode": "production",
            "devtool": false
        }))
        .unwrap();

        assert_eq!(config.output.filename, "[name].js");
        assert_eq!(config.watch_options.aggregate_timeout, 300);
        assert!(!config.watch);
        assert_eq!(config.extra.get("mode"), Some(&json!("production")));
        assert_eq!(config.extra.get("devtool"), Some(&json!(false)));

        // camelCase on the way out
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("watchOptions").is_some());
        assert!(value.get("watch_options").is_none());
        assert!(value.get("command").is_none());
    }

    #[test]
    fn test_artifact_from_value() {
        let single = ConfigArtifact::from_value(json!({ "entry": "a.ts" })).unwrap();
        assert!(matches!(single, ConfigArtifact::Single(_)));
        assert_eq!(single.len(), 1);

        let multi =
            ConfigArtifact::from_value(json!([{ "entry": "a.ts" }, { "entry": "b.ts" }])).unwrap();
        assert_eq!(multi.len(), 2);

        let err = ConfigArtifact::from_value(json!("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_single_artifact_requires_expected_count_of_one() {
        let artifact = ConfigArtifact::Single(BuildConfig::default());
        assert!(artifact.validate_count(1).is_ok());

        for expected in [0, 2, 5] {
            let err = artifact.validate_count(expected).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::CountMismatch { actual: 1, .. }
            ));
        }
    }

    #[test]
    fn test_collection_length_must_match() {
        let artifact = ConfigArtifact::Multi(vec![BuildConfig::default(); 3]);
        assert!(artifact.validate_count(3).is_ok());
        assert!(matches!(
            artifact.validate_count(2).unwrap_err(),
            ConfigError::CountMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_select_by_index() {
        let configs = (0..3)
            .map(|i| BuildConfig {
                name: Some(format!("config-{}", i)),
                ..BuildConfig::default()
            })
            .collect();
        let artifact = ConfigArtifact::Multi(configs);

        let selected = artifact.clone().select(2, 3).unwrap();
        assert_eq!(selected.name.as_deref(), Some("config-2"));

        let selected = artifact.clone().select(0, 3).unwrap();
        assert_eq!(selected.name.as_deref(), Some("config-0"));

        assert!(matches!(
            artifact.select(3, 3).unwrap_err(),
            ConfigError::IndexOutOfRange { index: 3, len: 3 }
        ));
    }

    #[test]
    fn test_select_single_ignores_index() {
        let artifact = ConfigArtifact::Single(BuildConfig {
            name: Some("only".to_string()),
            ..BuildConfig::default()
        });
        let selected = artifact.select(7, 1).unwrap();
        assert_eq!(selected.name.as_deref(), Some("only"));
    }

    #[test]
    fn test_validation() {
        assert!(BuildConfig::default().validate().is_ok());

        let mut config = BuildConfig::default();
        config.output.filename = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = BuildConfig::default();
        config.stats.exclude = Some("node_modules(".to_string());
        assert!(config.validate().is_err());

        let mut config = BuildConfig::default();
        config.stats.exclude = Some("node_modules".to_string());
        assert!(config.validate().is_ok());
    }

    mod loading {
        use crate::config::*;
        use crate::error::ConfigError;
        use std::fs;
        use std::path::Path;
        use tempfile::TempDir;

        async fn load(path: &Path) -> Result<ConfigArtifact, ConfigError> {
            FileConfigLoader::new()
                .load(path, &LoadContext::default())
                .await
        }

        #[tokio::test]
        async fn test_load_json_collection() {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("fob.config.json");
            fs::write(&path, r#"[{ "name": "client" }, { "name": "server" }]"#).unwrap();

            let artifact = load(&path).await.unwrap();
            assert_eq!(artifact.len(), 2);
            let server = artifact.select(1, 2).unwrap();
            assert_eq!(server.name.as_deref(), Some("server"));
        }

        #[tokio::test]
        async fn test_load_toml_single_and_collection() {
            let temp = TempDir::new().unwrap();

            let single = temp.path().join("single.toml");
            fs::write(&single, "name = \"app\"\nentry = \"src/app.ts\"\n").unwrap();
            match load(&single).await.unwrap() {
                ConfigArtifact::Single(config) => {
                    assert_eq!(config.display_name(), "app");
                    assert_eq!(config.entry.len(), 1);
                }
                other => panic!("expected a single configuration, got {:?}", other),
            }

            let multi = temp.path().join("multi.toml");
            fs::write(
                &multi,
                "[[configs]]\nname = \"a\"\n\n[[configs]]\nname = \"b\"\n",
            )
            .unwrap();
            assert_eq!(load(&multi).await.unwrap().len(), 2);
        }

        #[tokio::test]
        async fn test_load_missing_file() {
            let temp = TempDir::new().unwrap();
            let result = load(&temp.path().join("nope.json")).await;
            assert!(matches!(result, Err(ConfigError::NotFound(_))));
        }

        #[tokio::test]
        async fn test_load_unsupported_format() {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("fob.config.yaml");
            fs::write(&path, "name: app").unwrap();
            assert!(matches!(
                load(&path).await,
                Err(ConfigError::UnsupportedFormat(_))
            ));
        }

        #[tokio::test]
        async fn test_load_invalid_json() {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("fob.config.json");
            fs::write(&path, "{ not json").unwrap();
            assert!(matches!(load(&path).await, Err(ConfigError::InvalidJson(_))));
        }

        #[tokio::test]
        async fn test_loaded_entries_keep_file_order() {
            let temp = TempDir::new().unwrap();

            let json_path = temp.path().join("fob.config.json");
            fs::write(
                &json_path,
                r#"{ "entry": { "zeta": "./z.ts", "alpha": "./a.ts", "mid": "./m.ts" } }"#,
            )
            .unwrap();
            let toml_path = temp.path().join("fob.config.toml");
            fs::write(
                &toml_path,
                "[entry]\nzeta = \"./z.ts\"\nalpha = \"./a.ts\"\nmid = \"./m.ts\"\n",
            )
            .unwrap();

            for path in [json_path, toml_path] {
                let config = load(&path).await.unwrap().select(0, 1).unwrap();
                assert_eq!(
                    config.entry.names().collect::<Vec<_>>(),
                    vec!["zeta", "alpha", "mid"],
                    "{}",
                    path.display()
                );
            }
        }

        #[cfg(unix)]
        fn script(dir: &Path, body: &str) -> std::path::PathBuf {
            use std::os::unix::fs::PermissionsExt;
            let path = dir.join("fob.config");
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[cfg(unix)]
        #[tokio::test]
        async fn test_script_receives_argv() {
            let temp = TempDir::new().unwrap();
            let path = script(temp.path(), r#"printf '[{"name":"%s"},{"name":"%s"}]' "$1" "$2""#);
            let ctx = LoadContext {
                argv: Some(vec!["dev".to_string(), "prod".to_string()]),
            };

            let artifact = FileConfigLoader::new().load(&path, &ctx).await.unwrap();
            let prod = artifact.select(1, 2).unwrap();
            assert_eq!(prod.name.as_deref(), Some("prod"));
        }

        #[cfg(unix)]
        #[tokio::test]
        async fn test_script_failure() {
            let temp = TempDir::new().unwrap();
            let path = script(temp.path(), "echo 'bad env' >&2; exit 3");

            match load(&path).await {
                Err(ConfigError::ScriptFailed { stderr, .. }) => assert_eq!(stderr, "bad env"),
                other => panic!("expected script failure, got {:?}", other),
            }
        }
    }
}
