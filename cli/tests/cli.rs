use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cpr-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn attack(target: &str, location: &str, raw: i32) -> String {
    format!(
        r#"{{"targets":[{{"target":"{target}","perLocationHits":[{{"location":"{location}","rawDamage":{raw}}}]}}]}}"#
    )
}

fn cpr() -> Command {
    Command::cargo_bin("cpr").unwrap()
}

#[test]
fn roll_prints_one_total_per_line() {
    let out = cpr()
        .args(["roll", "--dice", "2d10", "--rolls", "3", "--seed", "7"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    let totals: Vec<i32> = text.lines().map(|l| l.parse().unwrap()).collect();
    assert_eq!(totals.len(), 3);
    assert!(totals.iter().all(|t| (2..=20).contains(t)));
}

#[test]
fn roll_rejects_bad_dice() {
    cpr().args(["roll", "--dice", "banana"]).assert().failure();
}

#[test]
fn preview_prints_the_breakdown() {
    let path = scratch_file("preview.json", attack("ganger", "torso", 18).as_bytes());
    cpr()
        .args(["preview", "--attack"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ganger (ganger)"))
        .stdout(predicate::str::contains("total wound 6 cyber 0"));
}

#[test]
fn preview_reads_files_with_a_bom() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(attack("rook", "head", 30).as_bytes());
    let path = scratch_file("bom.json", &bytes);
    cpr()
        .args(["preview", "--weapon", "Riot Shotgun", "--attack"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("total wound 0"));
}

#[test]
fn commit_writes_the_updated_encounter() {
    let path = scratch_file("commit.json", attack("ganger", "torso", 18).as_bytes());
    let out = path.with_file_name("after-commit.json");
    cpr()
        .args(["commit", "--seed", "3", "--attack"])
        .arg(&path)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("[DMG][Ganger] 0 → 6 (+6)"));

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(saved["combatants"]["ganger"]["damage"], 6);
    assert_eq!(
        saved["combatants"]["ganger"]["items"]["vest"]["kind"]["coverage"]["torso"]["ablation"],
        1
    );
}

#[test]
fn committing_the_same_record_twice_applies_it_once() {
    let path = scratch_file("twice.json", attack("ganger", "torso", 18).as_bytes());
    let record = path.with_file_name("twice-record.json");
    let out = path.with_file_name("twice-encounter.json");
    let _ = fs::remove_file(&record);

    cpr()
        .args(["commit", "--seed", "3", "--id", "burst-1", "--attack"])
        .arg(&path)
        .arg("--record")
        .arg(&record)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("[DMG][Ganger] 0 → 6 (+6)"));

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&record).unwrap()).unwrap();
    assert_eq!(saved["id"], "burst-1");
    assert_eq!(saved["applied"], true);

    cpr()
        .args(["commit", "--seed", "3", "--encounter"])
        .arg(&out)
        .arg("--attack")
        .arg(&path)
        .arg("--record")
        .arg(&record)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("attack burst-1 already applied"))
        .stdout(predicate::str::contains("[DMG]").not());

    let encounter: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(encounter["combatants"]["ganger"]["damage"], 6);
}

#[test]
fn commit_needs_an_attack_or_a_saved_record() {
    cpr()
        .args(["commit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--attack is required"));
}

#[test]
fn dump_is_pretty_unless_compact() {
    let pretty = cpr().args(["dump"]).assert().success().get_output().stdout.clone();
    assert!(String::from_utf8(pretty).unwrap().lines().count() > 1);

    let compact = cpr()
        .args(["dump", "--compact"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(compact).unwrap();
    assert_eq!(text.lines().count(), 1);
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(v["combatants"]["rook"].is_object());
}

#[test]
fn turn_hands_over_and_resets_initiative() {
    cpr()
        .args(["turn", "--prior", "rook", "--current", "ganger", "--round", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ROUND] 2 → initiative reset"))
        .stdout(predicate::str::contains("round 2 → ganger"));
}

#[test]
fn sp_lists_every_location() {
    cpr()
        .args(["sp", "--target", "rook"])
        .assert()
        .success()
        .stdout(predicate::str::contains("head: SP 14 (Hard)"))
        .stdout(predicate::str::contains("left leg: unarmored"));
}

#[test]
fn unknown_encounter_lists_the_builtins() {
    cpr()
        .args(["dump", "--encounter", "no-such-place"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("built-in encounters are: alley"));
}
