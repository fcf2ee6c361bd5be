//! Startup lifecycle tests against real files on disk.
//!
//! Each test uses its own key variable so they can run in parallel.

mod common;

use std::fs;

use spam_guard::security::encryption::MAGIC;
use spam_guard::{
    ArtifactCipher, ArtifactKey, ArtifactMode, Label, PredictionServer, StartupError,
};

fn encrypt_all(key: &ArtifactKey, paths: &spam_guard::ArtifactPaths) {
    let cipher = ArtifactCipher::new(key.clone());
    for path in paths.iter() {
        cipher.encrypt_file(path).unwrap();
    }
}

#[test]
fn encrypted_startup_loads_model_and_reseals_files() {
    let dir = tempfile::tempdir().unwrap();
    let paths = common::write_spam_artifacts(dir.path());
    let key = ArtifactKey::generate();
    encrypt_all(&key, &paths);
    let sealed_model = fs::read(&paths.model).unwrap();

    std::env::set_var("SG_IT_KEY_RESEAL", key.to_base64());
    let config = common::config_for(&paths, ArtifactMode::Encrypted, "SG_IT_KEY_RESEAL");
    let server = PredictionServer::from_config(config).unwrap();

    let labels = server
        .model()
        .predict(&["FREE MONEY NOW", "meeting at 3pm"])
        .unwrap();
    assert_eq!(labels, vec![Label::Int(1), Label::Int(0)]);

    // Both files are encrypted again, under a fresh nonce.
    for path in paths.iter() {
        let bytes = fs::read(path).unwrap();
        assert!(bytes.starts_with(MAGIC), "{} left in plaintext", path.display());
    }
    assert_ne!(fs::read(&paths.model).unwrap(), sealed_model);

    // And they still open with the same key.
    let cipher = ArtifactCipher::new(key);
    for path in paths.iter() {
        cipher.decrypt_file(path).unwrap();
    }
}

#[test]
fn restart_after_reseal_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let paths = common::write_spam_artifacts(dir.path());
    let key = ArtifactKey::generate();
    encrypt_all(&key, &paths);

    std::env::set_var("SG_IT_KEY_RESTART", key.to_base64());
    let config = common::config_for(&paths, ArtifactMode::Encrypted, "SG_IT_KEY_RESTART");
    PredictionServer::from_config(config.clone()).unwrap();
    let server = PredictionServer::from_config(config).unwrap();
    assert_eq!(server.model().n_features(), 5);
}

#[test]
fn wrong_key_aborts_startup_and_leaves_files_sealed() {
    let dir = tempfile::tempdir().unwrap();
    let paths = common::write_spam_artifacts(dir.path());
    let key = ArtifactKey::generate();
    encrypt_all(&key, &paths);
    let before: Vec<Vec<u8>> = paths.iter().map(|p| fs::read(p).unwrap()).collect();

    std::env::set_var("SG_IT_KEY_WRONG", ArtifactKey::generate().to_base64());
    let config = common::config_for(&paths, ArtifactMode::Encrypted, "SG_IT_KEY_WRONG");
    let err = PredictionServer::from_config(config).unwrap_err();
    assert!(matches!(err, StartupError::Decrypt { .. }), "got {err:?}");

    let after: Vec<Vec<u8>> = paths.iter().map(|p| fs::read(p).unwrap()).collect();
    assert_eq!(before, after);
}

#[test]
fn malformed_key_is_a_key_error() {
    let dir = tempfile::tempdir().unwrap();
    let paths = common::write_spam_artifacts(dir.path());

    std::env::set_var("SG_IT_KEY_MALFORMED", "not a key");
    let config = common::config_for(&paths, ArtifactMode::Encrypted, "SG_IT_KEY_MALFORMED");
    let err = PredictionServer::from_config(config).unwrap_err();
    assert!(matches!(err, StartupError::Key(_)), "got {err:?}");

    // Key resolution happens before any file is touched.
    assert!(!fs::read(&paths.model).unwrap().starts_with(MAGIC));
}

#[test]
fn plaintext_mode_never_rewrites_files() {
    let dir = tempfile::tempdir().unwrap();
    let paths = common::write_spam_artifacts(dir.path());
    let before = fs::read(&paths.vectorizer).unwrap();

    let config = common::config_for(&paths, ArtifactMode::Plaintext, "SG_IT_KEY_UNUSED");
    let server = PredictionServer::from_config(config).unwrap();
    assert_eq!(server.model().classes(), &[Label::Int(0), Label::Int(1)]);
    assert_eq!(fs::read(&paths.vectorizer).unwrap(), before);
}
