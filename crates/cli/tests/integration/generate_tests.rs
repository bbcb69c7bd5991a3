//! Generate command integration tests.
//!
//! Plugins and compilers are `/bin/sh` scripts, so these tests are unix-only.
#![cfg(unix)]

use predicates::prelude::*;

use super::common::TestEnv;

const IMAGE: &str = r#"{"files":["a.proto","b.proto"],"data":"aW1n"}"#;

/// A plugin that ignores its input and emits fixed files.
fn emitting_plugin(env: &TestEnv, name: &str, files: &[(&str, &str)]) -> String {
  let files: Vec<serde_json::Value> = files
    .iter()
    .map(|(path, content)| serde_json::json!({ "path": path, "content": content }))
    .collect();
  let response = serde_json::json!({ "files": files }).to_string();
  let script = env.write_script(
    &format!("plugins/{}", name),
    &format!("cat > /dev/null\ncat <<'EOF'\n{}\nEOF", response),
  );
  script.to_string_lossy().into_owned()
}

fn write_config(env: &TestEnv, plugins: &[(&str, &str, &str)]) -> String {
  let mut yaml = String::from("version: v1\nplugins:\n");
  for (name, path, out) in plugins {
    yaml.push_str(&format!("  - name: {}\n    path: {}\n    out: {}\n", name, path, out));
  }
  env
    .write_file("protopin.gen.yaml", &yaml)
    .to_string_lossy()
    .into_owned()
}

#[test]
fn generate_from_image_file() {
  let env = TestEnv::new();
  env.write_file("image.json", IMAGE);
  let go = emitting_plugin(&env, "go", &[("a.pb.go", "package a\n")]);
  write_config(&env, &[("go", &go, "gen/go")]);

  env
    .protopin_cmd()
    .args(["generate", "--input", "image.json", "--output"])
    .arg(env.output_path())
    .assert()
    .success()
    .stdout(predicate::str::contains("gen/go/a.pb.go"))
    .stdout(predicate::str::contains("Generated 1 file(s)"));

  assert_eq!(env.read_output("gen/go/a.pb.go"), "package a\n");
}

#[test]
fn generate_from_module_in_registry() {
  let env = TestEnv::new();
  env.write_file("module/a.proto", "syntax = \"proto3\";\n");
  env.write_file("module/sub/b.proto", "syntax = \"proto3\";\n");
  env.push("local/acme/weather:c1", &env.path("module"));

  let compiler = env.write_script(
    "tools/compile",
    r#"cat > /dev/null; printf '{"image":{"files":["a.proto","sub/b.proto"],"data":""}}'"#,
  );
  let go = emitting_plugin(&env, "go", &[("weather.pb.go", "package weather\n")]);
  write_config(&env, &[("go", &go, ".")]);

  env
    .protopin_cmd()
    .args(["generate", "--input", "local/acme/weather:c1"])
    .arg("--registry")
    .arg(env.registry_path())
    .arg("--compiler")
    .arg(&compiler)
    .arg("--output")
    .arg(env.output_path())
    .assert()
    .success();

  assert_eq!(env.read_output("weather.pb.go"), "package weather\n");
}

#[test]
fn plugin_failure_writes_nothing() {
  let env = TestEnv::new();
  env.write_file("image.json", IMAGE);
  let go = emitting_plugin(&env, "go", &[("a.pb.go", "package a\n")]);
  let bad = env
    .write_script("plugins/bad", "cat > /dev/null; echo 'cannot generate' >&2; exit 1")
    .to_string_lossy()
    .into_owned();
  write_config(&env, &[("go", &go, "gen"), ("bad", &bad, "gen")]);

  env
    .protopin_cmd()
    .args(["generate", "--input", "image.json", "--output"])
    .arg(env.output_path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("plugin bad failed"))
    .stderr(predicate::str::contains("cannot generate"));

  assert!(!env.output_path().exists());
}

#[test]
fn compiler_diagnostics_are_printed() {
  let env = TestEnv::new();
  env.write_file("module/a.proto", "syntax = ;\n");
  env.push("local/acme/broken:c1", &env.path("module"));
  let compiler = env.write_script(
    "tools/compile",
    r#"cat > /dev/null; printf '{"diagnostics":[{"path":"a.proto","line":1,"column":10,"message":"unexpected ;"}]}'"#,
  );
  let go = emitting_plugin(&env, "go", &[]);
  write_config(&env, &[("go", &go, "gen")]);

  env
    .protopin_cmd()
    .args(["generate", "--input", "local/acme/broken:c1"])
    .arg("--registry")
    .arg(env.registry_path())
    .arg("--compiler")
    .arg(&compiler)
    .assert()
    .failure()
    .stderr(predicate::str::contains("a.proto:1:10: unexpected ;"))
    .stderr(predicate::str::contains("Compilation failed with 1 diagnostic(s)"));

  env
    .protopin_cmd()
    .args(["generate", "--input", "local/acme/broken:c1", "--error-format", "json"])
    .arg("--registry")
    .arg(env.registry_path())
    .arg("--compiler")
    .arg(&compiler)
    .assert()
    .failure()
    .stdout(predicate::str::contains(r#""message": "unexpected ;""#));
}

#[test]
fn collisions_fail_unless_overlap_allowed() {
  let env = TestEnv::new();
  env.write_file("image.json", IMAGE);
  let one = emitting_plugin(&env, "one", &[("shared.txt", "one")]);
  let two = emitting_plugin(&env, "two", &[("shared.txt", "two")]);
  write_config(&env, &[("one", &one, "gen"), ("two", &two, "gen")]);

  env
    .protopin_cmd()
    .args(["generate", "--input", "image.json", "--output"])
    .arg(env.output_path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("gen/shared.txt"));

  env
    .protopin_cmd()
    .args(["generate", "--input", "image.json", "--allow-overlap", "--output"])
    .arg(env.output_path())
    .assert()
    .success();
  assert_eq!(env.read_output("gen/shared.txt"), "two");
}

#[test]
fn file_filter_reaches_plugin() {
  let env = TestEnv::new();
  env.write_file("image.json", IMAGE);
  let dump = env.path("request.json");
  let plugin = env
    .write_script("plugins/dump", r#"cat > "$PROTOPIN_REQUEST_DUMP"; printf '{}'"#)
    .to_string_lossy()
    .into_owned();
  write_config(&env, &[("dump", &plugin, "gen")]);

  env
    .protopin_cmd()
    .args(["generate", "--input", "image.json", "--file", "b.proto"])
    .env("PROTOPIN_REQUEST_DUMP", &dump)
    .assert()
    .success();

  let request: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&dump).unwrap()).unwrap();
  assert_eq!(request["files_to_generate"], serde_json::json!(["b.proto"]));
  assert_eq!(request["out"], "gen");
  assert_eq!(request["image"]["data"], "aW1n");
}

#[test]
fn inline_template() {
  let env = TestEnv::new();
  env.write_file("image.json", IMAGE);
  let go = emitting_plugin(&env, "go", &[("a.pb.go", "inline\n")]);
  let template = serde_json::json!({
    "version": "v1",
    "plugins": [{ "name": "go", "path": go, "out": "x" }],
  })
  .to_string();

  env
    .protopin_cmd()
    .args(["generate", "--input", "image.json", "--template", &template, "--output"])
    .arg(env.output_path())
    .assert()
    .success();
  assert_eq!(env.read_output("x/a.pb.go"), "inline\n");
}
