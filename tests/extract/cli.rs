//! Drives the `embeddedresourcetool` binary.

use crate::common::macho::stamped_image;
use crate::common::{create_temp_file, STAMP};
use std::process::Command;

fn tool() -> Command {
    Command::new(env!("CARGO_BIN_EXE_embeddedresourcetool"))
}

#[test]
fn prints_stamp() {
    let file = create_temp_file(&stamped_image(STAMP));
    let out = tool().arg(file.path()).output().unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "2024-07-20T10:00:00\n");
}

#[test]
fn hex_output() {
    let file = create_temp_file(&stamped_image(b"ab\0"));
    let out = tool().arg(file.path()).arg("--hex").output().unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "616200");
}

#[test]
fn json_output_and_exit_codes() {
    let file = create_temp_file(&stamped_image(STAMP));
    let out = tool()
        .args(["--output", "json"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["text"], "2024-07-20T10:00:00");
    assert_eq!(value["offset"], 4096);
    assert_eq!(value["size"], 20);

    let out = tool()
        .args(["--output", "json", "--section", "missing"])
        .arg(file.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["exit_code"], 3);
}

#[test]
fn not_a_binary_exits_with_format_code() {
    let file = create_temp_file(b"#!/bin/sh\necho hi\n");
    let out = tool().arg(file.path()).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("error:"));
}

#[test]
fn config_file_sets_target() {
    let file = create_temp_file(&stamped_image(STAMP));
    let config = create_temp_file(br#"{"segment": "__TEXT", "section": "__text"}"#);
    let out = tool()
        .arg("--config")
        .arg(config.path())
        .arg("--hex")
        .arg(file.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "c3".repeat(32));

    // flags override the file
    let out = tool()
        .arg("--config")
        .arg(config.path())
        .args(["--section", "myinfo"])
        .arg(file.path())
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "2024-07-20T10:00:00");
}

#[test]
fn list_mode() {
    let file = create_temp_file(&stamped_image(STAMP));
    let out = tool()
        .args(["--list", "--output", "json"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(
        value["segments"],
        serde_json::json!(["__PAGEZERO", "__TEXT", "__LINKEDIT"])
    );
    assert_eq!(value["sections"].as_array().unwrap().len(), 2);
}
