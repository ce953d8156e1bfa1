use std::{env, fs, path::PathBuf, process::Command};

fn run_bin(args: &[&str]) -> bool {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_jcsim"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    if !output.status.success() {
        let stdout_str = String::from_utf8_lossy(&output.stdout);
        let stderr_str = String::from_utf8_lossy(&output.stderr);
        eprintln!("failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n");
    }
    output.status.success()
}

fn prepare_dir(name: &str, config_contents: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir_all(&test_dir).expect("failed to create test directory");
    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");

    test_dir
}

#[test]
fn basic_workflow() {
    let config_contents = String::new()
        + "[model]\n"
        + "seq_len = 1000\n"
        + "policy = \"exclusive-replacement\"\n"
        + "\n"
        + "[run]\n"
        + "n_rounds = 2000\n"
        + "seed = 12345\n";
    let test_dir = prepare_dir("basic_workflow", &config_contents);
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(run_bin(&["--sim-dir", test_dir_str, "create"]));
    assert!(run_bin(&["--sim-dir", test_dir_str, "create"]));

    for run in ["run-0000", "run-0001"] {
        assert!(test_dir.join(run).join("trajectory.msgpack").is_file());
        assert!(test_dir.join(run).join("sequences.msgpack").is_file());
    }

    assert!(run_bin(&["--sim-dir", test_dir_str, "analyze"]));

    let results = fs::read_to_string(test_dir.join("run-0000").join("results.toml"))
        .expect("failed to read results");
    let results: toml::Table = toml::from_str(&results).expect("failed to parse results");
    assert!(results.contains_key("obs_frac"));
    assert!(results.contains_key("corr_bias"));

    assert!(run_bin(&["--sim-dir", test_dir_str, "clean"]));
    assert!(!test_dir.join("run-0000").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_config_is_rejected() {
    let config_contents = String::new()
        + "[model]\n"
        + "seq_len = 0\n"
        + "policy = \"uniform-replacement\"\n"
        + "\n"
        + "[run]\n"
        + "n_rounds = 10\n";
    let test_dir = prepare_dir("invalid_config", &config_contents);
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(!run_bin(&["--sim-dir", test_dir_str, "create"]));
    assert!(!test_dir.join("run-0000").exists());

    fs::remove_dir_all(&test_dir).ok();
}
