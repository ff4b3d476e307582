//! Runs the `constgen` executable on declaration files.

use std::{fs, path::PathBuf, process::Output};

use assert_cmd::Command;

fn inputs() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../inputs")
}

fn constgen(arguments: &[&str]) -> Output {
    Command::cargo_bin("constgen")
        .unwrap()
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .args(arguments)
        .output()
        .unwrap()
}

const ODD_ONLY: &str = r#"(
    items: [
        (
            name: "center",
            generic_parameters: [Value((name: "n", domain: Primitive(Usize)))],
            where_clauses: [
                (
                    expression: Binary((
                        operator: Equal,
                        lhs: Binary((operator: Remainder, lhs: Parameter("n"), rhs: Literal((text: "2")))),
                        rhs: Literal((text: "1")),
                    )),
                ),
            ],
        ),
    ],
    uses: [
        (item: "center", call_site: (generic_arguments: (constants: [Literal((text: "7"))]))),
        (item: "center", call_site: (generic_arguments: (constants: [Literal((text: "7"))]))),
    ],
)"#;

#[test]
fn sample_declarations() {
    let file = inputs().join("vectors.ron");
    let output = constgen(&[file.to_str().unwrap()]);

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec![
        "fn inc_explicit<3>(T<3>) -> T<4>",
        "fn bar<3>([f64; 3]) -> Bar<3>",
        "fn center<5>()",
        "struct Buffer<16>",
        "struct Buffer<16>",
        "fn check<Foo, 3>()",
    ]);

    // `center<4>` is the only failing use site
    assert!(!output.status.success());
    assert!(stderr.contains("is not satisfied"));
    assert!(stderr.contains("113:49"));
}

#[test]
fn successful_run() {
    let directory = tempfile::tempdir().unwrap();
    let file = directory.path().join("odd.ron");
    fs::write(&file, ODD_ONLY).unwrap();

    let config = directory.path().join("constgen.toml");
    fs::write(&config, "budget = 100\nordering = \"Mixed\"\n").unwrap();

    let output = constgen(&[
        file.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--budget",
        "500",
    ]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "fn center<7>()\nfn center<7>()\n");
    assert!(output.stderr.is_empty());
}

#[test]
fn missing_file() {
    let directory = tempfile::tempdir().unwrap();
    let file = directory.path().join("absent.ron");

    let output = constgen(&[file.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr).unwrap().contains("failed to read"));
}
