//! Test runner that compares generated components against .expected.js files
//!
//! Run with: cargo test --test expected_tests

use libtest_mimic::{Arguments, Failed, Trial};
use mdjsx_transpiler::generate::to_pascal_case;
use mdjsx_transpiler::{Options, Pipeline, wrap_component};
use std::fs;
use std::path::{Path, PathBuf};

/// Collect all .md fixtures
fn collect_test_files() -> Vec<PathBuf> {
    let pattern = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/*.md");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .filter_map(Result::ok)
        .collect();
    files.sort();
    files
}

fn check_expected(path: &Path) -> Result<(), Failed> {
    let expected_js = path.with_extension("expected.js");
    let expected = fs::read_to_string(&expected_js)
        .map_err(|e| format!("Missing expected file {}: {}", expected_js.display(), e))?;
    let source = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Document");
    let options = Options { initial_indent: 4, ..Options::default() };
    let rendered = Pipeline::with_options(options).compile(&source);
    let actual = wrap_component(&to_pascal_case(stem), &rendered);

    if actual.trim() != expected.trim() {
        return Err(format!(
            "Output mismatch: {}\n--- expected ---\n{}\n--- actual ---\n{}",
            path.display(),
            expected.trim(),
            actual.trim()
        )
        .into());
    }
    Ok(())
}

fn main() {
    let args = Arguments::from_args();

    let trials = collect_test_files()
        .into_iter()
        .map(|path| {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Trial::test(name, move || check_expected(&path))
        })
        .collect();

    libtest_mimic::run(&args, trials).exit();
}
