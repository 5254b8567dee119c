use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const NPC_FILE: &str = "GameData/ObjPrototypes/GeneralNPCObjPrototypes.cfg";

const NPC_TEXT: &str = "\
NPCBase : struct.begin
   Protection : struct.begin
      Strike = 0.1
   struct.end
   MaxHealth = 100
struct.end
Bandit : struct.begin {refkey=NPCBase}
   MaxHealth = 80
struct.end
BanditBoss : struct.begin {refkey=[Bandit]}
struct.end
Loner : struct.begin
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

fn source_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(NPC_FILE);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, NPC_TEXT).unwrap();
    dir
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn inheritors_lists_sorted_descendants() {
    let source = source_tree();
    let output = run_cfgpatch(&[
        "inheritors",
        "NPCBase",
        "--source-root",
        path_str(source.path()),
        NPC_FILE,
    ]);

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "Bandit\nBanditBoss\nNPCBase\n");
}

#[test]
fn inheritors_json_output() {
    let source = source_tree();
    let output = run_cfgpatch(&[
        "inheritors",
        "Bandit",
        "--source-root",
        path_str(source.path()),
        "--json",
        NPC_FILE,
    ]);

    assert!(output.status.success(), "{output:?}");
    let names: Vec<String> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(names, vec!["Bandit", "BanditBoss"]);
}

#[test]
fn inheritors_fails_when_nothing_loads() {
    let source = tempfile::tempdir().unwrap();
    let output = run_cfgpatch(&[
        "inheritors",
        "NPCBase",
        "--source-root",
        path_str(source.path()),
        "Missing.cfg",
    ]);

    assert!(!output.status.success());
}

#[test]
fn show_prints_direct_field() {
    let source = source_tree();
    let file = source.path().join(NPC_FILE);
    let output = run_cfgpatch(&["show", path_str(&file), "Bandit", "--field", "MaxHealth"]);

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "MaxHealth = 80\n");
}

#[test]
fn show_resolves_inherited_section_field() {
    let source = source_tree();
    let file = source.path().join(NPC_FILE);
    let output = run_cfgpatch(&[
        "show",
        path_str(&file),
        "BanditBoss",
        "--section",
        "Protection",
        "--field",
        "Strike",
        "--inherited",
    ]);

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "Strike = 0.1 (from NPCBase)\n");
}

#[test]
fn show_prints_block() {
    let source = source_tree();
    let file = source.path().join(NPC_FILE);
    let output = run_cfgpatch(&["show", path_str(&file), "Loner"]);

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "Loner : struct.begin\nstruct.end\n");
}

#[test]
fn show_without_inheritance_fails_for_missing_field() {
    let source = source_tree();
    let file = source.path().join(NPC_FILE);
    let output = run_cfgpatch(&[
        "show",
        path_str(&file),
        "BanditBoss",
        "--field",
        "MaxHealth",
    ]);

    assert!(!output.status.success());
}
