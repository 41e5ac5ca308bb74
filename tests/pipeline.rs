mod support;

use std::fs;

use openapi_client_gen::client::ClientKind;
use openapi_client_gen::error::GenerateError;
use openapi_client_gen::pipeline::{LICENSE_FILE, run_pipeline, seed_license};
use openapi_client_gen::source_patch::SourcePatch;
use support::{create_fake_generator, fixtures_root, generation_config, list_files, write_file};
use tempfile::TempDir;

#[test]
fn nodejs_run_clears_generates_patches_and_seeds_license() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("client-js");
    write_file(&out, "stale/old-model.ts", "export interface Old {}\n");
    write_file(&out, "docs/keep.md", "hand written\n");
    let bin = create_fake_generator(
        &tmp.path().join("bin"),
        Some(&fixtures_root().join("generated")),
        false,
    );
    let mut config = generation_config(ClientKind::NodeJs, tmp.path(), &out, &bin);
    config.ignored_paths.insert("docs/keep.md".to_string());

    let report = run_pipeline(&config).unwrap();

    assert_eq!(report.cleared.files_removed, 1);
    assert_eq!(report.cleared.kept, vec!["docs/keep.md".to_string()]);
    assert!(report.license_seeded);
    assert_eq!(report.patched.len(), 3);
    assert!(report.generator.command_line.contains("typescript-axios"));
    assert_eq!(
        list_files(&out),
        vec![
            ".generator-args",
            "LICENSE.md",
            "README.md",
            "docs/keep.md",
            "models/delivery-method-enum.ts",
            "models/order-source-enum.ts",
            "models/order.ts",
            "models/payment-status-enum.ts",
        ]
    );
    assert!(!out.join("stale").exists());
    assert_eq!(fs::read_to_string(out.join("docs/keep.md")).unwrap(), "hand written\n");

    let payment = fs::read_to_string(out.join("models/payment-status-enum.ts")).unwrap();
    assert!(payment.contains("     * Refunded to the customer\n     */\n    REFUNDED: 3\n"));
    let license = fs::read_to_string(out.join(LICENSE_FILE)).unwrap();
    assert!(license.contains("MIT License"));
}

#[test]
fn generator_receives_spec_generator_and_output() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("client-php");
    let bin = create_fake_generator(&tmp.path().join("bin"), None, false);
    let mut config = generation_config(ClientKind::Php, tmp.path(), &out, &bin);
    config
        .additional_params
        .insert("packageName".to_string(), "Orders".to_string());
    config.git_user = Some("Baristanko".to_string());

    run_pipeline(&config).unwrap();

    if cfg!(unix) {
        let recorded = fs::read_to_string(out.join(".generator-args")).unwrap();
        let args: Vec<&str> = recorded.lines().collect();
        assert_eq!(
            args,
            vec![
                "generate",
                "-i",
                config.spec_path.to_str().unwrap(),
                "-g",
                "php",
                "-o",
                out.to_str().unwrap(),
                "--git-user-id",
                "Baristanko",
                "-p",
                "packageName=Orders",
            ]
        );
    }
}

#[test]
fn generator_path_with_spaces_is_not_split() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("client-js");
    let bin = create_fake_generator(
        &tmp.path().join("generator tools"),
        Some(&fixtures_root().join("generated")),
        false,
    );
    let config = generation_config(ClientKind::Js, tmp.path(), &out, &bin);

    let report = run_pipeline(&config).unwrap();

    assert_eq!(report.generator.exit_code, Some(0));
    if cfg!(unix) {
        assert!(report.generator.stdout.contains("generated client in"));
    }
    assert!(out.join(".generator-args").is_file());
}

#[test]
fn existing_license_is_never_overwritten() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("client-js");
    let bin = create_fake_generator(
        &tmp.path().join("bin"),
        Some(&fixtures_root().join("generated")),
        false,
    );
    let mut config = generation_config(ClientKind::NodeJs, tmp.path(), &out, &bin);
    config.ignored_paths.insert(LICENSE_FILE.to_string());
    write_file(&out, LICENSE_FILE, "Proprietary\n");

    let report = run_pipeline(&config).unwrap();

    assert!(!report.license_seeded);
    assert_eq!(fs::read_to_string(out.join(LICENSE_FILE)).unwrap(), "Proprietary\n");
}

#[test]
fn seeds_license_from_custom_template_once() {
    let tmp = TempDir::new().unwrap();
    let template = write_file(tmp.path(), "LICENSE-acme.md", "Acme license\n");
    let out = tmp.path().join("client");
    fs::create_dir_all(&out).unwrap();

    assert!(seed_license(&out, Some(&template)).unwrap());
    write_file(tmp.path(), "LICENSE-acme.md", "Changed\n");
    assert!(!seed_license(&out, Some(&template)).unwrap());

    assert_eq!(fs::read_to_string(out.join(LICENSE_FILE)).unwrap(), "Acme license\n");
}

#[test]
fn failing_generator_reports_stderr_and_stops() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("client-js");
    let bin = create_fake_generator(&tmp.path().join("bin"), None, true);
    let config = generation_config(ClientKind::NodeJs, tmp.path(), &out, &bin);

    let err = run_pipeline(&config).unwrap_err();

    match err {
        GenerateError::Subprocess { stderr, .. } => {
            assert!(stderr.contains("generator exploded"), "{stderr}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!out.join(LICENSE_FILE).exists());
}

#[test]
fn missing_generator_binary_leaves_output_untouched() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("client-js");
    write_file(&out, "models/old.ts", "old\n");
    let bin = tmp.path().join("no-such-generator");
    let config = generation_config(ClientKind::NodeJs, tmp.path(), &out, &bin);

    let err = run_pipeline(&config).unwrap_err();

    assert!(matches!(err, GenerateError::Subprocess { .. }), "{err:?}");
    assert!(out.join("models/old.ts").exists());
}

#[test]
fn output_dir_outside_root_is_refused_before_clearing() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("clients");
    let out = tmp.path().join("elsewhere");
    write_file(&out, "precious.txt", "keep me\n");
    let bin = create_fake_generator(&tmp.path().join("bin"), None, false);
    let config = generation_config(ClientKind::Js, &root, &out, &bin);

    let err = run_pipeline(&config).unwrap_err();

    assert!(matches!(err, GenerateError::Configuration(_)));
    assert!(out.join("precious.txt").exists());
}

#[test]
fn php_run_applies_source_patches() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("client-php");
    let bin = create_fake_generator(
        &tmp.path().join("bin"),
        Some(&fixtures_root().join("generated")),
        false,
    );
    let mut config = generation_config(ClientKind::Php, tmp.path(), &out, &bin);
    config.source_patches = vec![SourcePatch {
        file: "README.md".to_string(),
        search: "# Generated client".to_string(),
        replace: "# Orders client".to_string(),
    }];

    let report = run_pipeline(&config).unwrap();

    assert_eq!(report.patched, vec![out.join("README.md")]);
    assert_eq!(
        fs::read_to_string(out.join("README.md")).unwrap().trim_end(),
        "# Orders client"
    );
    // PHP runs leave TypeScript enums alone.
    let payment = fs::read_to_string(out.join("models/payment-status-enum.ts")).unwrap();
    assert!(!payment.contains("/**\n     * Paid"));
}

#[test]
fn drifted_source_patch_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("client-php");
    let bin = create_fake_generator(
        &tmp.path().join("bin"),
        Some(&fixtures_root().join("generated")),
        false,
    );
    let mut config = generation_config(ClientKind::Php, tmp.path(), &out, &bin);
    config.source_patches = vec![SourcePatch {
        file: "README.md".to_string(),
        search: "no longer generated".to_string(),
        replace: "anything".to_string(),
    }];

    let err = run_pipeline(&config).unwrap_err();

    assert!(matches!(err, GenerateError::PatchMismatch { .. }), "{err:?}");
    assert!(!out.join(LICENSE_FILE).exists());
}
