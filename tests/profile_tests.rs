//! Integration tests for profile activation and application.
//!
//! Each test resolves a config file end to end with explicit run options:
//! - overlay semantics (oneOf unions, empty values)
//! - patch validation, oneOf unions after patching, unique image names
//! - activation by command, env and kube-context
//! - kube-context consistency and the global config default repo

use indoc::indoc;
use rstest::rstest;
use skaffold_config::config::{Environment, RunOptions};
use skaffold_config::{ConfigError, ErrorCode, ResolvedConfigs, resolve, resolve_file};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Options that never touch the user's kubeconfig or global config.
fn options(command: &str) -> RunOptions {
    RunOptions {
        kube_context: Some("minikube".into()),
        global_config: Some(PathBuf::from("/nonexistent/skaffold/config")),
        ..RunOptions::new(command)
    }
}

fn with_profiles(profiles: &[&str]) -> RunOptions {
    RunOptions {
        profiles: profiles.iter().map(|name| name.to_string()).collect(),
        ..options("dev")
    }
}

fn resolve_one(yaml: &str, options: &RunOptions) -> skaffold_config::ResolvedConfig {
    let resolved: ResolvedConfigs = resolve(yaml, options).expect("config should resolve");
    assert_eq!(resolved.configs().len(), 1);
    resolved.into_configs().remove(0)
}

#[test]
fn old_config_with_profile_resolves_to_latest() {
    let resolved = resolve_one(
        indoc! {"
            apiVersion: skaffold/v1beta13
            kind: Config
            build:
              tagPolicy:
                sha256: {}
              artifacts:
              - image: app
            deploy:
              kubectl:
                manifests: [k8s/*.yaml]
            profiles:
            - name: custom
              deploy:
                kubectl:
                  manifests: [custom-*]
        "},
        &with_profiles(&["custom"]),
    );

    assert_eq!(resolved.source_version, "skaffold/v1beta13");
    assert_eq!(resolved.applied_profiles, vec!["custom".to_string()]);

    let config = &resolved.config;
    assert_eq!(config.api_version, "skaffold/v4beta1");
    assert!(config.pipeline.build.tag_policy.sha256.is_some());
    assert_eq!(config.pipeline.manifests.raw_yaml, vec!["custom-*".to_string()]);
    assert_eq!(config.pipeline.build.artifacts.len(), 1);
    assert!(config.profiles.is_empty());
}

#[test]
fn profile_build_type_replaces_whole_union() {
    let resolved = resolve_one(
        indoc! {"
            apiVersion: skaffold/v4beta1
            kind: Config
            build:
              local:
                push: false
              tagPolicy:
                gitCommit: {}
            profiles:
            - name: cluster
              build:
                cluster:
                  namespace: builds
                tagPolicy:
                  dateTime:
                    format: '2006'
        "},
        &with_profiles(&["cluster"]),
    );

    let build = &resolved.config.pipeline.build;
    assert!(build.local.is_none());
    assert_eq!(build.cluster.as_ref().unwrap().namespace, "builds");
    assert!(build.tag_policy.git_commit.is_none());
    assert_eq!(build.tag_policy.date_time.as_ref().unwrap().format, "2006");
}

#[test]
fn empty_profile_values_keep_the_base() {
    let resolved = resolve_one(
        indoc! {"
            apiVersion: skaffold/v4beta1
            kind: Config
            build:
              artifacts:
              - image: app
              local:
                push: false
            manifests:
              rawYaml: [k8s/*.yaml]
            deploy:
              kubeContext: base
            profiles:
            - name: noop
              build:
                artifacts: []
              manifests:
                rawYaml: []
        "},
        &with_profiles(&["noop"]),
    );

    let pipeline = &resolved.config.pipeline;
    assert_eq!(pipeline.build.artifacts.len(), 1);
    assert_eq!(pipeline.build.local.as_ref().unwrap().push, Some(false));
    assert_eq!(pipeline.manifests.raw_yaml, vec!["k8s/*.yaml".to_string()]);
    assert_eq!(pipeline.deploy.kube_context, "base");
}

#[test]
fn patches_apply_after_overlay() {
    let resolved = resolve_one(
        indoc! {"
            apiVersion: skaffold/v4beta1
            kind: Config
            build:
              artifacts:
              - image: app
            profiles:
            - name: extra
              build:
                artifacts:
                - image: profile-app
              patches:
              - op: add
                path: /build/artifacts/-
                value:
                  image: patched-app
              - path: /build/artifacts/0/context
                op: add
                value: src
        "},
        &with_profiles(&["extra"]),
    );

    let images: Vec<(&str, &str)> = resolved
        .config
        .pipeline
        .build
        .artifacts
        .iter()
        .map(|artifact| (artifact.image.as_str(), artifact.context.as_str()))
        .collect();
    assert_eq!(images, vec![("profile-app", "src"), ("patched-app", "")]);
}

#[test]
fn invalid_patch_path_is_reported() {
    let err = resolve(
        indoc! {"
            apiVersion: skaffold/v4beta1
            kind: Config
            profiles:
            - name: broken
              patches:
              - op: replace
                path: /deploy/kubeContext
                value: other
        "},
        &with_profiles(&["broken"]),
    )
    .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidPatch);
    assert_eq!(err.to_string(), "invalid path: /deploy/kubeContext");
}

#[test]
fn patched_union_must_stay_exclusive() {
    let err = resolve(
        indoc! {"
            apiVersion: skaffold/v4beta1
            kind: Config
            build:
              local: {}
            profiles:
            - name: gcb
              patches:
              - op: add
                path: /build/googleCloudBuild
                value:
                  projectId: p
        "},
        &with_profiles(&["gcb"]),
    )
    .unwrap_err();

    assert_eq!(err.code(), ErrorCode::StructuralMismatch);
    assert!(
        matches!(err, ConfigError::OneOfViolation { ref path, union: "build", ref fields }
            if path == "/build" && fields == &["local", "googleCloudBuild"]),
        "{err}"
    );
}

#[test]
fn profile_may_not_duplicate_another_documents_image() {
    let yaml = indoc! {"
        apiVersion: skaffold/v4beta1
        kind: Config
        metadata:
          name: web
        build:
          artifacts:
          - image: web
        ---
        apiVersion: skaffold/v2beta29
        kind: Config
        metadata:
          name: worker
        build:
          artifacts:
          - image: worker
        profiles:
        - name: clash
          build:
            artifacts:
            - image: web
    "};

    let resolved = resolve(yaml, &options("dev")).unwrap();
    assert_eq!(resolved.pipelines().len(), 2);

    let err = resolve(yaml, &with_profiles(&["clash"])).unwrap_err();
    assert_eq!(err.code(), ErrorCode::StructuralMismatch);
    assert!(
        matches!(err, ConfigError::DuplicateImage { ref image, ref first, ref second }
            if image == "web" && first == "config[0] (web)" && second == "config[1] (worker)"),
        "{err}"
    );
}

#[test]
fn unmatched_profile_is_an_error() {
    let err = resolve(
        "apiVersion: skaffold/v4beta1\nkind: Config\n",
        &with_profiles(&["missing"]),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::ProfileNotFound(ref name) if name == "missing"));
}

#[test]
fn deactivating_an_undefined_profile_is_fine() {
    let resolved = resolve_one(
        "apiVersion: skaffold/v4beta1\nkind: Config\n",
        &with_profiles(&["-missing"]),
    );
    assert!(resolved.applied_profiles.is_empty());
}

#[test]
fn profiles_may_live_in_any_document() {
    let resolved = resolve(
        indoc! {"
            apiVersion: skaffold/v4beta1
            kind: Config
            metadata:
              name: base
            ---
            apiVersion: skaffold/v2beta29
            kind: Config
            metadata:
              name: extra
            profiles:
            - name: only-here
              deploy:
                kubeContext: here
        "},
        &with_profiles(&["only-here"]),
    )
    .unwrap();

    let applied: Vec<&[String]> = resolved
        .configs()
        .iter()
        .map(|config| config.applied_profiles.as_slice())
        .collect();
    assert_eq!(applied, vec![&[][..], &["only-here".to_string()][..]]);
    assert_eq!(resolved.pipelines()[1].deploy.kube_context, "here");
}

const ACTIVATED: &str = indoc! {"
    apiVersion: skaffold/v4beta1
    kind: Config
    profiles:
    - name: auto
      activation:
      - env: STAGE=prod
        kubeContext: gke.*
        command: run
      deploy:
        statusCheck: false
"};

#[rstest]
#[case("run", Some("prod"), "gke-east", true)]
#[case("run", Some("production"), "gke_west", true)]
#[case("dev", Some("prod"), "gke-east", false)]
#[case("run", Some("staging"), "gke-east", false)]
#[case("run", None, "gke-east", false)]
#[case("run", Some("prod"), "minikube", false)]
fn activation_requires_every_criterion(
    #[case] command: &str,
    #[case] stage: Option<&str>,
    #[case] kube_context: &str,
    #[case] active: bool,
) {
    let mut environment = Environment::default();
    if let Some(stage) = stage {
        environment = environment.with("STAGE", stage);
    }
    let options = RunOptions {
        environment,
        kube_context: Some(kube_context.into()),
        ..options(command)
    };

    let resolved = resolve_one(ACTIVATED, &options);
    assert_eq!(!resolved.applied_profiles.is_empty(), active);
    assert_eq!(
        resolved.config.pipeline.deploy.status_check,
        active.then_some(false)
    );
}

#[rstest]
#[case(None, true)]
#[case(Some(""), true)]
#[case(Some("1"), false)]
fn empty_env_value_matches_only_unset(#[case] value: Option<&str>, #[case] active: bool) {
    let mut environment = Environment::default();
    if let Some(value) = value {
        environment = environment.with("FOO", value);
    }
    let options = RunOptions {
        environment,
        ..options("dev")
    };

    let resolved = resolve_one(
        indoc! {"
            apiVersion: skaffold/v4beta1
            kind: Config
            profiles:
            - name: no-foo
              activation:
              - env: FOO=
        "},
        &options,
    );
    assert_eq!(resolved.applied_profiles.len(), usize::from(active));
}

#[test]
fn malformed_env_activation_fails() {
    let err = resolve(
        indoc! {"
            apiVersion: skaffold/v4beta1
            kind: Config
            profiles:
            - name: bad
              activation:
              - env: FOO
        "},
        &options("dev"),
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Environment);
}

#[test]
fn requires_all_activations() {
    let yaml = indoc! {"
        apiVersion: skaffold/v4beta1
        kind: Config
        profiles:
        - name: strict
          requiresAllActivations: true
          activation:
          - command: dev
          - env: CI=true
    "};

    let without_ci = resolve_one(yaml, &options("dev"));
    assert!(without_ci.applied_profiles.is_empty());

    let with_ci = RunOptions {
        environment: Environment::default().with("CI", "true"),
        ..options("dev")
    };
    assert_eq!(resolve_one(yaml, &with_ci).applied_profiles, vec!["strict".to_string()]);
}

#[test]
fn auto_activation_can_be_turned_off() {
    let options = RunOptions {
        profile_auto_activation: false,
        ..options("run")
    };
    let resolved = resolve_one(ACTIVATED, &options);
    assert!(resolved.applied_profiles.is_empty());
}

fn kubeconfig(temp: &TempDir, current_context: &str) -> PathBuf {
    let path = temp.path().join("kubeconfig");
    fs::write(
        &path,
        format!("apiVersion: v1\nkind: Config\ncurrent-context: {current_context}\n"),
    )
    .unwrap();
    path
}

const CONTEXT_SWITCH: &str = indoc! {"
    apiVersion: skaffold/v4beta1
    kind: Config
    profiles:
    - name: switch
      activation:
      - kubeContext: minikube
      deploy:
        kubeContext: gke
"};

#[test]
fn context_activated_profile_cannot_switch_context() {
    let temp = TempDir::new().unwrap();
    let options = RunOptions {
        kube_context: None,
        kubeconfig: Some(kubeconfig(&temp, "minikube")),
        ..options("dev")
    };

    let err = resolve(CONTEXT_SWITCH, &options).unwrap_err();
    assert!(
        matches!(
            err,
            ConfigError::StaleKubeContext { ref profiles, ref current, ref effective }
                if profiles == &["switch".to_string()] && current == "minikube" && effective == "gke"
        ),
        "{err}"
    );
}

#[test]
fn cli_kube_context_skips_consistency_check() {
    let resolved = resolve_one(CONTEXT_SWITCH, &options("dev"));
    assert_eq!(resolved.applied_profiles, vec!["switch".to_string()]);
    assert_eq!(resolved.config.pipeline.deploy.kube_context, "gke");
}

#[test]
fn kubeconfig_is_read_from_env() {
    let temp = TempDir::new().unwrap();
    let path = kubeconfig(&temp, "gke");
    let options = RunOptions {
        kube_context: None,
        environment: Environment::default().with("KUBECONFIG", path.to_string_lossy()),
        ..options("dev")
    };

    let resolved = resolve_one(CONTEXT_SWITCH, &options);
    assert!(resolved.applied_profiles.is_empty());
}

#[test]
fn default_repo_comes_from_global_config() {
    let temp = TempDir::new().unwrap();
    let global = temp.path().join("config");
    fs::write(
        &global,
        indoc! {"
            global:
              default-repo: gcr.io/global
            kubeContexts:
            - kube-context: kind
              default-repo: localhost:5000
        "},
    )
    .unwrap();

    let mut options = RunOptions {
        kube_context: Some("kind".into()),
        global_config: Some(global),
        ..RunOptions::new("dev")
    };
    let resolved = resolve("apiVersion: skaffold/v4beta1\nkind: Config\n", &options).unwrap();
    assert_eq!(resolved.default_repo(), Some("localhost:5000"));

    options.kube_context = Some("gke".into());
    let resolved = resolve("apiVersion: skaffold/v4beta1\nkind: Config\n", &options).unwrap();
    assert_eq!(resolved.default_repo(), Some("gcr.io/global"));

    options.default_repo = Some("cli.io/repo".into());
    let resolved = resolve("apiVersion: skaffold/v4beta1\nkind: Config\n", &options).unwrap();
    assert_eq!(resolved.default_repo(), Some("cli.io/repo"));
}

#[test]
fn resolve_file_reads_from_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("skaffold.yaml");
    fs::write(&path, "apiVersion: skaffold/v2alpha3\nkind: Config\n").unwrap();

    let resolved = resolve_file(&path, &options("dev")).unwrap();
    assert_eq!(resolved.configs()[0].source_version, "skaffold/v2alpha3");
}
