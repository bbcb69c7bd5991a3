//! Push and export integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn push_then_export_round_trip() {
  let env = TestEnv::new();
  env.write_file("module/a.proto", "message A {}\n");
  env.write_file("module/nested/deep/b.proto", "message B {}\n");

  env
    .protopin_cmd()
    .arg("push")
    .arg("--registry")
    .arg(env.registry_path())
    .arg("local/acme/weather:c1")
    .arg(env.path("module"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Pushed local/acme/weather:c1 (2 file(s))"))
    .stdout(predicate::str::contains("sha256:"));

  env
    .protopin_cmd()
    .arg("export")
    .arg("--registry")
    .arg(env.registry_path())
    .arg("local/acme/weather:c1")
    .arg(env.path("exported"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Exported 2 file(s)"));

  assert_eq!(
    std::fs::read_to_string(env.path("exported/nested/deep/b.proto")).unwrap(),
    "message B {}\n"
  );
}

#[test]
fn export_verifies_pinned_digest() {
  let env = TestEnv::new();
  env.write_file("module/a.proto", "message A {}\n");
  env.push("local/acme/weather:c1", &env.path("module"));

  let wrong = format!("local/acme/weather:c1@sha256:{}", "0".repeat(64));
  env
    .protopin_cmd()
    .arg("export")
    .arg("--registry")
    .arg(env.registry_path())
    .arg(&wrong)
    .arg(env.path("exported"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("digest mismatch"));

  assert!(!env.path("exported").exists());
}

#[test]
fn export_detects_tampered_blob() {
  let env = TestEnv::new();
  env.write_file("module/a.proto", "message A {}\n");
  env.push("local/acme/weather:c1", &env.path("module"));

  let blobs = env.registry_path().join("blobs").join("sha256");
  for entry in std::fs::read_dir(&blobs).unwrap() {
    let path = entry.unwrap().path();
    if std::fs::read_to_string(&path).unwrap() == "message A {}\n" {
      std::fs::write(&path, "message Evil {}\n").unwrap();
    }
  }

  env
    .protopin_cmd()
    .arg("export")
    .arg("--registry")
    .arg(env.registry_path())
    .arg("local/acme/weather:c1")
    .arg(env.path("exported"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("digest mismatch"));
}

#[test]
fn export_reports_lock_dependencies() {
  let env = TestEnv::new();
  env.write_file("module/a.proto", "message A {}\n");
  env.write_file(
    "module/protopin.lock",
    "version: v1\ndeps:\n  - remote: local\n    owner: acme\n    repository: units\n    commit: u1\n",
  );
  env.push("local/acme/weather:c1", &env.path("module"));

  env
    .protopin_cmd()
    .arg("export")
    .arg("--registry")
    .arg(env.registry_path())
    .arg("local/acme/weather:c1")
    .arg(env.path("exported"))
    .assert()
    .success()
    .stdout(predicate::str::contains("local/acme/units:u1"));
}

#[cfg(unix)]
#[test]
fn push_follows_symlinks() {
  let env = TestEnv::new();
  env.write_file("shared/common.proto", "message Common {}\n");
  env.write_file("module/a.proto", "message A {}\n");
  std::os::unix::fs::symlink(env.path("shared/common.proto"), env.path("module/common.proto")).unwrap();
  std::os::unix::fs::symlink(env.path("shared"), env.path("module/vendor")).unwrap();

  env
    .protopin_cmd()
    .arg("push")
    .arg("--registry")
    .arg(env.registry_path())
    .arg("local/acme/weather:c1")
    .arg(env.path("module"))
    .assert()
    .success()
    .stdout(predicate::str::contains("(3 file(s))"));

  env
    .protopin_cmd()
    .arg("export")
    .arg("--registry")
    .arg(env.registry_path())
    .arg("local/acme/weather:c1")
    .arg(env.path("exported"))
    .assert()
    .success();
  assert_eq!(
    std::fs::read_to_string(env.path("exported/common.proto")).unwrap(),
    "message Common {}\n"
  );
  assert_eq!(
    std::fs::read_to_string(env.path("exported/vendor/common.proto")).unwrap(),
    "message Common {}\n"
  );
}
