use std::{fs, path::Path, process::Command};

fn roomballot_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_roomballot"))
}

const PEOPLE: &str = "name,id,priority,choice_1,choice_2\n\
                      Ann,a1,1,A,B\n\
                      Bob,b1,1,A,C\n\
                      Cat,c1,2,B,A\n\
                      Dan,d1,3,A,B\n";

#[derive(serde::Deserialize)]
struct Token {
    name: String,
    index: String,
    pad: String,
}

fn read_tokens(path: &Path) -> Vec<Token> {
    csv::Reader::from_path(path)
        .expect("open tokens")
        .deserialize()
        .collect::<Result<_, _>>()
        .expect("parse tokens")
}

fn verify_token(dir: &Path, token: &Token) -> std::process::Output {
    roomballot_cmd()
        .current_dir(dir)
        .args([
            "verify",
            "public.json",
            "--index",
            &token.index,
            "--pad",
            &token.pad,
            "--name",
            &token.name,
        ])
        .output()
        .expect("failed to run verify")
}

fn run_ballot(dir: &Path, people: &str) -> std::process::Output {
    let people_path = dir.join("people.csv");
    fs::write(&people_path, people).expect("write people");
    roomballot_cmd()
        .current_dir(dir)
        .args(["run", "people.csv", "--seed", "7"])
        .output()
        .expect("failed to run roomballot")
}

#[test]
fn run_then_everyone_verifies() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = run_ballot(tmp.path(), PEOPLE);
    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Placed: 3"), "stdout={stdout}");
    assert!(stdout.contains("Kicked: 1"), "stdout={stdout}");

    let results = fs::read_to_string(tmp.path().join("results.csv")).expect("results");
    assert_eq!(results.lines().count(), 5);
    assert_eq!(results.matches("KICKED").count(), 1);
    for name in ["Ann", "Bob", "Cat", "Dan"] {
        assert!(!results.contains(name), "results leak {name}");
    }

    let tokens = read_tokens(&tmp.path().join("tokens.csv"));
    assert_eq!(tokens.len(), 4);
    for token in &tokens {
        let verify = verify_token(tmp.path(), token);
        assert_eq!(verify.status.code(), Some(0), "verify {} failed", token.name);
        let text = String::from_utf8_lossy(&verify.stdout);
        if token.name == "Dan" {
            assert!(text.contains("Outcome: KICKED"), "stdout={text}");
        }
    }
}

#[test]
fn quoted_comma_in_name_verifies() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let people = "name,id,priority,choice_1,choice_2\n\
                  \"Smith, Ann\",as1,1,A,B\n\
                  Bob,b1,2,A,B\n";
    assert!(run_ballot(tmp.path(), people).status.success());

    let tokens = read_tokens(&tmp.path().join("tokens.csv"));
    let ann = tokens.iter().find(|t| t.name == "Smith, Ann").expect("Ann's token");
    let output = verify_token(tmp.path(), ann);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Outcome: A (choice 1)"));
}

#[test]
fn replay_reproduces_published_outcomes() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::write(tmp.path().join("people.csv"), PEOPLE).expect("write people");
    let run = roomballot_cmd()
        .current_dir(tmp.path())
        .args(["run", "people.csv", "--seed", "11", "--max-rooms", "2"])
        .output()
        .expect("failed to run roomballot");
    assert!(run.status.success());

    let output = roomballot_cmd()
        .current_dir(tmp.path())
        .args(["replay", "public.json"])
        .output()
        .expect("failed to run replay");
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Outcomes: reproduced"), "stdout={stdout}");
    assert!(stdout.contains("Rooms: match"), "stdout={stdout}");
}

#[test]
fn wrong_pad_fails_verification() {
    let tmp = tempfile::tempdir().expect("tempdir");
    assert!(run_ballot(tmp.path(), PEOPLE).status.success());
    let tokens = read_tokens(&tmp.path().join("tokens.csv"));

    let forged = Token {
        name: tokens[0].name.clone(),
        index: tokens[0].index.clone(),
        pad: tokens[1].pad.clone(),
    };
    let output = verify_token(tmp.path(), &forged);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("RB_ERR_600"));
}

#[test]
fn audit_reproduces_order() {
    let tmp = tempfile::tempdir().expect("tempdir");
    assert!(run_ballot(tmp.path(), PEOPLE).status.success());
    let output = roomballot_cmd()
        .current_dir(tmp.path())
        .args(["audit", "public.json", "tokens.csv"])
        .output()
        .expect("failed to run audit");
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Publication order: reproduced"));
}

#[test]
fn tampered_artifact_rejected() {
    let tmp = tempfile::tempdir().expect("tempdir");
    assert!(run_ballot(tmp.path(), PEOPLE).status.success());
    let public = tmp.path().join("public.json");
    let json = fs::read_to_string(&public).expect("public");
    fs::write(&public, json.replacen("\"KICKED\"", "\"C\"", 1)).expect("write");

    let output = roomballot_cmd()
        .current_dir(tmp.path())
        .args(["verify", "public.json", "--secret", "00"])
        .output()
        .expect("failed to run verify");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("RB_ERR_601"));
}

#[test]
fn ragged_input_writes_nothing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = run_ballot(tmp.path(), "name,id,priority,c1,c2\nAnn,a1,1,A,B\nBob,b1,1,A\n");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("RB_ERR_101"));
    assert!(!tmp.path().join("results.csv").exists());
    assert!(!tmp.path().join("tokens.csv").exists());
}

#[test]
fn long_name_rejected_before_output() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let long = "X".repeat(40);
    let output = run_ballot(tmp.path(), &format!("name,id,priority,c1\n{long},x1,1,A\n"));
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("RB_ERR_500"));
    assert!(!tmp.path().join("public.json").exists());
}

#[test]
fn collusion_report_names_cluster() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::write(
        tmp.path().join("people.csv"),
        "name,id,priority,c1,c2,c3\n\
         Ann,a1,1,A,B,C\n\
         Bob,b1,1,A,B,C\n\
         Cat,c1,1,A,B,C\n\
         Dan,d1,1,A,B,D\n",
    )
    .expect("write people");
    let output = roomballot_cmd()
        .current_dir(tmp.path())
        .args(["collusion", "people.csv", "--prefix", "3", "--ordered"])
        .output()
        .expect("failed to run collusion");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "k=3 [A, B, C]: Ann, Bob, Cat\n"
    );
}
