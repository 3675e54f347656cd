use std::{env, fs, path::PathBuf, process::Command};

fn run_bin(args: &[&str]) -> (bool, String, String) {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_shapewatch"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    let stdout_str =
        String::from_utf8(output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        String::from_utf8(output.stderr).expect("failed to convert stderr to string");

    (output.status.success(), stdout_str, stderr_str)
}

fn run_bin_ok(args: &[&str]) -> String {
    let (success, stdout_str, stderr_str) = run_bin(args);
    assert!(
        success,
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
    stdout_str
}

fn setup_dir(name: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir_all(&test_dir).expect("failed to create test directory");
    test_dir
}

#[test]
fn basic_workflow() {
    let test_dir = setup_dir("basic_workflow");

    let input_path = test_dir.join("series.csv");
    let input_contents = String::new()
        + "week,deaths\n"
        + "2020-01-06,0\n"
        + "2020-01-13,0\n"
        + "2020-01-20,\n"
        + "2020-01-27,0\n"
        + "2020-02-03,0\n"
        + "2020-02-10,0\n"
        + "2020-02-17,5\n"
        + "2020-02-24,5\n"
        + "2020-03-02,NA\n"
        + "2020-03-09,5\n"
        + "2020-03-16,5\n"
        + "2020-03-23,5\n"
        + "2020-03-30,6\n";
    fs::write(&input_path, input_contents).expect("failed to write input file");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "[input]\n"
        + "timestamp_column = \"week\"\n"
        + "value_column = \"deaths\"\n"
        + "\n"
        + "[spike]\n"
        + "quantile = 0.99\n"
        + "\n"
        + "[turn]\n"
        + "w_pre = 3\n"
        + "w_post = 3\n";
    fs::write(&config_path, config_contents).expect("failed to write config file");

    let output_path = test_dir.join("results.json");

    let input_str = input_path.to_str().expect("failed to convert path to string");
    let config_str = config_path.to_str().expect("failed to convert path to string");
    let output_str = output_path.to_str().expect("failed to convert path to string");

    run_bin_ok(&[
        "--input", input_str, "--config", config_str, "--output", output_str, "analyze",
    ]);

    let results = fs::read_to_string(&output_path).expect("failed to read results file");
    let results: serde_json::Value =
        serde_json::from_str(&results).expect("failed to parse results file");

    assert_eq!(results["n_points"], 13);
    assert_eq!(results["n_valid"], 11);
    assert_eq!(results["spikes"]["timestamps"], serde_json::json!(["2020-03-30"]));
    assert_eq!(
        results["turns"]["patterns"]["flat_turn_up"],
        serde_json::json!(["2020-02-17"])
    );
    for pattern in ["down_turn_flat", "flat_turn_down", "up_turn_flat"] {
        assert_eq!(results["turns"]["patterns"][pattern], serde_json::json!([]));
    }

    let stdout_str = run_bin_ok(&[
        "--input", input_str, "--config", config_str, "spikes", "--quantile", "0.5",
    ]);
    let results: serde_json::Value =
        serde_json::from_str(&stdout_str).expect("failed to parse stdout");
    assert_eq!(results["spikes"]["quantile"], 0.5);
    assert!(results.get("turns").is_none());

    let stdout_str = run_bin_ok(&[
        "--input", input_str, "--config", config_str, "turns", "--w-pre", "4",
    ]);
    let results: serde_json::Value =
        serde_json::from_str(&stdout_str).expect("failed to parse stdout");
    assert!(results.get("spikes").is_none());
    assert_eq!(results["turns"]["patterns"].as_object().map(|map| map.len()), Some(4));

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn rejects_bad_input() {
    let test_dir = setup_dir("rejects_bad_input");

    let input_path = test_dir.join("series.csv");
    fs::write(&input_path, "timestamp,value\n3,1.0\n2,4.0\n1,2.0\n")
        .expect("failed to write input file");
    let input_str = input_path.to_str().expect("failed to convert path to string");

    let (success, _, _) = run_bin(&["--input", input_str, "analyze"]);
    assert!(!success, "unordered timestamps must be rejected");

    fs::write(&input_path, "timestamp,value\n1,1.0\n2,4.0\n3,2.0\n")
        .expect("failed to write input file");
    let (success, _, _) = run_bin(&["--input", input_str, "spikes", "--quantile", "1.5"]);
    assert!(!success, "out of range quantiles must be rejected");

    let (success, stdout_str, _) = run_bin(&["--input", input_str, "spikes"]);
    assert!(success);
    let results: serde_json::Value =
        serde_json::from_str(&stdout_str).expect("failed to parse stdout");
    assert_eq!(results["spikes"]["timestamps"], serde_json::json!([]));
    assert_eq!(results["spikes"]["threshold"], serde_json::Value::Null);

    fs::remove_dir_all(&test_dir).ok();
}
