use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, tempdir};

mod common;

#[test]
fn test_process_end_to_end() {
    let dir = tempdir().unwrap();
    let seed_path = dir.path().join("seed.json");
    common::write_demo_seed(&seed_path);

    let mut ops = NamedTempFile::new().unwrap();
    writeln!(ops, "op, actor, job, target, amount").unwrap();
    writeln!(ops, "pay, 1, 1, ,").unwrap(); // client 1 pays job 1 (200)
    writeln!(ops, "deposit, 2, , 1, 50").unwrap(); // 50 < 303 / 4
    writeln!(ops, "pay, 1, 999, ,").unwrap(); // unknown job, logged and skipped
    writeln!(ops, "pay, 2, 1, ,").unwrap(); // already paid, logged and skipped
    writeln!(ops, "deposit, 4, , 2, 1000").unwrap(); // insufficient balance
    writeln!(ops, "transfer, 6, , 5, 14").unwrap();

    let mut cmd = Command::new(cargo_bin!("gigpay"));
    cmd.arg("process")
        .arg(ops.path())
        .arg("--seed")
        .arg(&seed_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error processing operation"))
        .stdout(predicate::str::contains("id,kind,profession,balance"))
        .stdout(predicate::str::contains("1,client,wizard,1000"))
        .stdout(predicate::str::contains("2,client,hacker,181.11"))
        .stdout(predicate::str::contains("4,client,pokemon master,1.3"))
        .stdout(predicate::str::contains("5,contractor,Musician,78"))
        .stdout(predicate::str::contains("6,contractor,Programmer,1400"))
        .stdout(predicate::str::contains("7,contractor,Programmer,22"));
}

#[test]
fn test_process_rejections_leave_balances_untouched() {
    let dir = tempdir().unwrap();
    let seed_path = dir.path().join("seed.json");
    common::write_demo_seed(&seed_path);

    let mut ops = NamedTempFile::new().unwrap();
    writeln!(ops, "op, actor, job, target, amount").unwrap();
    // Every single one must be rejected.
    writeln!(ops, "pay, 4, 5, ,").unwrap(); // price 200.1 > balance 1.3
    writeln!(ops, "pay, 2, 2, ,").unwrap(); // job 2 belongs to client 1
    writeln!(ops, "deposit, 1, , 2, 1000").unwrap(); // 1000 >= 200 / 4
    writeln!(ops, "deposit, 1, , 2, 0").unwrap(); // invalid amount
    writeln!(ops, "deposit, 1, , 6, 10").unwrap(); // target is a contractor
    writeln!(ops, "transfer, 1, , 1, 10").unwrap(); // self transfer

    let mut cmd = Command::new(cargo_bin!("gigpay"));
    cmd.arg("process")
        .arg(ops.path())
        .arg("--seed")
        .arg(&seed_path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,client,wizard,1150"))
        .stdout(predicate::str::contains("2,client,hacker,231.11"))
        .stdout(predicate::str::contains("4,client,pokemon master,1.3"))
        .stdout(predicate::str::contains("6,contractor,Programmer,1214"));
}

#[test]
fn test_report_best_profession_and_clients() {
    let dir = tempdir().unwrap();
    let seed_path = dir.path().join("seed.json");
    common::write_demo_seed(&seed_path);

    let mut cmd = Command::new(cargo_bin!("gigpay"));
    cmd.env("GIGPAY_ADMIN_TOKEN", "super_secret")
        .arg("report")
        .arg("--start")
        .arg("2020-08-01")
        .arg("--end")
        .arg("2020-08-31")
        .arg("--admin-token")
        .arg("super_secret")
        .arg("--seed")
        .arg(&seed_path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Musician"))
        .stdout(predicate::str::contains("Harry Potter"))
        .stdout(predicate::str::contains("142.11"));
}

#[test]
fn test_report_rejects_bad_admin_token() {
    let dir = tempdir().unwrap();
    let seed_path = dir.path().join("seed.json");
    common::write_demo_seed(&seed_path);

    let mut cmd = Command::new(cargo_bin!("gigpay"));
    cmd.env("GIGPAY_ADMIN_TOKEN", "super_secret")
        .arg("report")
        .arg("--start")
        .arg("2020-08-01")
        .arg("--end")
        .arg("2020-08-31")
        .arg("--admin-token")
        .arg("guess")
        .arg("--seed")
        .arg(&seed_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("admin token"));
}

#[test]
fn test_report_rejects_invalid_dates() {
    let dir = tempdir().unwrap();
    let seed_path = dir.path().join("seed.json");
    common::write_demo_seed(&seed_path);

    let mut cmd = Command::new(cargo_bin!("gigpay"));
    cmd.env("GIGPAY_ADMIN_TOKEN", "super_secret")
        .arg("report")
        .arg("--start")
        .arg("2020-08-10")
        .arg("--end")
        .arg("20124-04-241")
        .arg("--admin-token")
        .arg("super_secret")
        .arg("--seed")
        .arg(&seed_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("YYYY-MM-DD"));
}
