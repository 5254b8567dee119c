use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const ORIGINAL: &str = "\
GuardAK74 : struct.begin
   MaxShots = 3
   Accuracy = 0.5
struct.end
GuardPM : struct.begin
   MaxShots = 2
struct.end
";

const PATCH: &str = "\
GuardAK74 : struct.begin {bpatch}
   MaxShots = 5
   Accuracy = 0.5f
struct.end

GuardPM : struct.begin {bpatch}
   MaxShots = 2
struct.end
";

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_cfgpatch") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("cfgpatch{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_cfgpatch is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn run_cfgpatch(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .output()
        .expect("run cfgpatch")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

fn diff_inputs() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("NPCWeaponAttributesPrototypes.cfg");
    let patch = dir.path().join("NPCWeaponAttributesPrototypes_patch_Mod.cfg");
    fs::write(&original, ORIGINAL).unwrap();
    fs::write(&patch, PATCH).unwrap();
    (dir, original, patch)
}

#[test]
fn diff_text_report() {
    let (_dir, original, patch) = diff_inputs();
    let output = run_cfgpatch(&["diff", original.to_str().unwrap(), patch.to_str().unwrap()]);

    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.contains("== GuardAK74"));
    assert!(!text.contains("GuardPM"));
    assert!(text.ends_with("1 of 2 structs changed: 1 modified, 0 added, 1 unchanged\n"));
}

#[test]
fn diff_changed_only_csv_to_file() {
    let (dir, original, patch) = diff_inputs();
    let report = dir.path().join("report.csv");
    let output = run_cfgpatch(&[
        "diff",
        original.to_str().unwrap(),
        patch.to_str().unwrap(),
        "--format",
        "csv",
        "--changed-only",
        "--output",
        report.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        fs::read_to_string(&report).unwrap(),
        "struct,path,original,patched,change,delta\nGuardAK74,MaxShots,3,5,modified,2\n"
    );
}

#[test]
fn diff_json_report() {
    let (_dir, original, patch) = diff_inputs();
    let output = run_cfgpatch(&[
        "diff",
        original.to_str().unwrap(),
        patch.to_str().unwrap(),
        "--format",
        "json",
    ]);

    assert!(output.status.success(), "{output:?}");
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["summary"]["structs_compared"], 2);
    assert_eq!(value["structs"][0]["name"], "GuardAK74");
}

#[test]
fn validate_clean_mod_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("dump");
    let mods = dir.path().join("mod");
    touch(&dump.join("ObjPrototypes/NPC.cfg"));
    touch(&mods.join("GameData/ObjPrototypes/NPC/NPC_patch_Mod.cfg"));

    let output = run_cfgpatch(&[
        "validate",
        mods.to_str().unwrap(),
        "--source",
        dump.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).contains("Checked 1 files (0 outside GameData), 0 issues"));
}

#[test]
fn validate_reports_issues_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("dump");
    let mods = dir.path().join("mod");
    fs::create_dir_all(&dump).unwrap();
    touch(&mods.join("GameData/ObjPrototypes/NPC_patch_Mod.cfg"));

    let output = run_cfgpatch(&[
        "validate",
        mods.to_str().unwrap(),
        "--source",
        dump.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("[FAIL] Prototype folder error"));
    assert!(text.contains("[FAIL] Prototype missing original"));
}
