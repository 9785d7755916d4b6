//! Facade precondition tests: invalid parameters are rejected before any
//! transport call is attempted

mod common;

use common::{credentials, MockFactory};
use ftpsync::{Credentials, FtpClient, FtpError, TransferSettings};
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Fixture {
    client: FtpClient,
    server: std::sync::Arc<common::MockServer>,
    upload_file: PathBuf,
    working: TempDir,
}

fn fixture() -> Fixture {
    let working = TempDir::new().unwrap();
    let upload_file = working.path().join("upload.txt");
    fs::write(&upload_file, "This file is for uploading.").unwrap();

    let (factory, server) = MockFactory::new();
    Fixture {
        client: FtpClient::with_factory(factory),
        server,
        upload_file,
        working,
    }
}

#[rstest]
#[case::blank_host("", "/test.html", "username", "password", "host")]
#[case::blank_remote_path("my.server.com", " ", "username", "password", "remote path")]
#[case::blank_username("my.server.com", "/test.html", "", "password", "username")]
#[case::blank_password("my.server.com", "/test.html", "username", "  ", "password")]
fn upload_rejects_blank_parameter(
    #[case] host: &str,
    #[case] remote_path: &str,
    #[case] username: &str,
    #[case] password: &str,
    #[case] parameter: &str,
) {
    let f = fixture();
    let creds = Credentials::new(username, password);
    let err = f
        .client
        .upload_file(
            host,
            remote_path,
            &f.upload_file,
            &creds,
            &TransferSettings::default(),
        )
        .unwrap_err();

    match err {
        FtpError::MissingParameter(name) => assert_eq!(name, parameter),
        other => panic!("expected MissingParameter, got {other:?}"),
    }
    assert!(f.server.calls().is_empty(), "no transport call expected");
}

#[rstest]
#[case::blank_host("", "/test.html", "host")]
#[case::blank_remote_path("my.server.com", "", "remote path")]
fn delete_rejects_blank_parameter(
    #[case] host: &str,
    #[case] remote_path: &str,
    #[case] parameter: &str,
) {
    let f = fixture();
    let err = f
        .client
        .delete_file(host, remote_path, &credentials(), &TransferSettings::default())
        .unwrap_err();

    match err {
        FtpError::MissingParameter(name) => assert_eq!(name, parameter),
        other => panic!("expected MissingParameter, got {other:?}"),
    }
    assert!(f.server.calls().is_empty());
}

#[test]
fn download_rejects_blank_credentials() {
    let f = fixture();
    let creds = Credentials::new("", "");
    let err = f
        .client
        .download_file(
            "my.server.com",
            "/test.html",
            &f.upload_file,
            &creds,
            &TransferSettings::default(),
        )
        .unwrap_err();

    assert!(matches!(err, FtpError::MissingParameter("username")));
    assert!(f.server.calls().is_empty());
}

#[test]
fn upload_rejects_missing_local_file() {
    let f = fixture();
    let missing = f.working.path().join("does-not-exist.txt");
    let err = f
        .client
        .upload_file(
            "my.server.com",
            "/test.html",
            &missing,
            &credentials(),
            &TransferSettings::default(),
        )
        .unwrap_err();

    assert!(matches!(err, FtpError::LocalPathNotFound(_)));
    assert!(err.is_precondition());
    assert!(f.server.calls().is_empty());
}

#[test]
fn upload_rejects_http_scheme_uri() {
    let f = fixture();
    let err = f
        .client
        .upload_file_uri(
            "http://my.server.com/test.html",
            &f.upload_file,
            &credentials(),
            &TransferSettings::default(),
        )
        .unwrap_err();

    match err {
        FtpError::InvalidScheme { uri, scheme } => {
            assert_eq!(scheme, "http");
            assert_eq!(uri, "http://my.server.com/test.html");
        }
        other => panic!("expected InvalidScheme, got {other:?}"),
    }
    assert!(f.server.calls().is_empty());
}

#[test]
fn delete_rejects_http_scheme_uri_before_any_transport_call() {
    let f = fixture();
    let err = f
        .client
        .delete_file_uri(
            "http://my.server.com/test.html",
            &credentials(),
            &TransferSettings::default(),
        )
        .unwrap_err();

    assert!(matches!(err, FtpError::InvalidScheme { .. }));
    assert!(f.server.calls().is_empty());
}

#[test]
fn upload_directory_rejects_missing_local_directory() {
    let f = fixture();
    let err = f
        .client
        .upload_directory_parallel(
            "my.server.com",
            "/site",
            &f.working.path().join("gone"),
            2,
            None,
            &credentials(),
            &TransferSettings::default(),
        )
        .unwrap_err();

    assert!(matches!(err, FtpError::LocalPathNotFound(_)));
    assert!(f.server.calls().is_empty());
}

#[test]
fn ftp_uri_form_resolves_like_host_and_path_form() {
    let f = fixture();
    f.client
        .upload_file_uri(
            "ftp://my.server.com/test.html",
            &f.upload_file,
            &credentials(),
            &TransferSettings::default(),
        )
        .unwrap();

    let uploads = f.server.uploaded_remotes();
    assert_eq!(uploads, vec!["/test.html".to_string()]);
}
