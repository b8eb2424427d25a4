use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

const READ_CLOCK_RESPONSE: &str = "80 01 00 00 00 23 00 00 00 00 \
    00 00 00 00 00 00 27 10 00 00 00 00 00 00 03 e8 \
    00 00 00 01 00 00 00 02 01";

fn tpmwire() -> Command {
    Command::cargo_bin("tpmwire").unwrap()
}

#[test]
fn test_rc_success() {
    tpmwire()
        .args(["rc", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Response code: 0x00000000"))
        .stdout(predicate::str::contains("Class: success"));
}

#[test]
fn test_rc_parameter_error() {
    tpmwire()
        .args(["rc", "0x1d4", "--command", "StartAuthSession"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Command: TPM2_StartAuthSession"))
        .stdout(predicate::str::contains("Class: parameter"))
        .stdout(predicate::str::contains("Index: 1"))
        .stdout(predicate::str::contains(
            "TPM returned an error for parameter 1 whilst executing command TPM2_StartAuthSession",
        ));
}

#[test]
fn test_rc_warning_json() {
    let output = tpmwire()
        .args(["rc", "0x922", "-c", "0x181", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!("warning", report["class"]);
    assert_eq!("TPM_RC_RETRY", report["code"]);
    assert_eq!("TPM2_ReadClock", report["command"]);
    assert_eq!(
        "the TPM was not able to start the command",
        report["description"]
    );
}

#[test]
fn test_rc_invalid_code() {
    tpmwire()
        .args(["rc", "0xnope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid number"));
}

#[test]
fn test_response_hex_input() {
    tpmwire()
        .args(["response", "--hex-input", "--command", "ReadClock"])
        .write_stdin(READ_CLOCK_RESPONSE)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tag: TPM_ST_NO_SESSIONS"))
        .stdout(predicate::str::contains("Size: 35"))
        .stdout(predicate::str::contains("Class: success"))
        .stdout(predicate::str::contains("Payload: 25 bytes"))
        .stdout(predicate::str::contains("00000000  00 00 00 00 00 00 27 10"));
}

#[test]
fn test_response_hex_input_json_payload() {
    let output = tpmwire()
        .args(["response", "--hex-input", "-c", "ReadClock", "-o", "json"])
        .write_stdin(format!("0x{}", READ_CLOCK_RESPONSE.replace(' ', "")))
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        "000000000000271000000000000003e8000000010000000201",
        report["payload"]
    );
    assert_eq!("success", report["status"]["class"]);
}

#[test]
fn test_response_invalid_hex() {
    tpmwire()
        .args(["response", "--hex-input"])
        .write_stdin("80 01 0g")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid hex input"));
}

#[test]
fn test_response_file_json() {
    let mut file = std::env::temp_dir();
    file.push(format!("tpmwire-response-{}.bin", std::process::id()));
    let mut f = std::fs::File::create(&file).unwrap();
    f.write_all(&[0x80, 0x01, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x09, 0x8e])
        .unwrap();
    drop(f);

    let output = tpmwire()
        .args(["response", file.to_str().unwrap(), "-o", "json"])
        .output()
        .unwrap();
    std::fs::remove_file(&file).unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(10, report["size"]);
    assert_eq!("", report["payload"]);
    assert_eq!("session", report["status"]["class"]);
    assert_eq!("TPM_RC_AUTH_FAIL", report["status"]["code"]);
    assert_eq!(1, report["status"]["index"]);
}

#[test]
fn test_response_invalid_header() {
    tpmwire()
        .args(["response", "--hex-input"])
        .write_stdin("80 01 00 00 00 0b 00 00 00 00")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not match the number of bytes received"));
}
