use boardlink::config::Config;

#[tokio::test]
async fn create_default_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let path = path.to_str().unwrap();

    Config::create_default(path).await.unwrap();
    let config = Config::load(path).await.unwrap();
    assert_eq!(config.serial.port, "/dev/ttyACM0");
    assert_eq!(config.serial.baud_rate, 115200);
    assert_eq!(config.link.timeout_us, 500);
    assert_eq!(config.control.params().gain, 2.0);
}

#[tokio::test]
async fn load_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[link]
timeout_us = 0

[serial]
port = "/dev/ttyACM0"

[logging]
level = "info"
"#,
    )
    .unwrap();

    let err = Config::load(path.to_str().unwrap()).await.unwrap_err();
    assert!(err.to_string().contains("timeout_us"), "{err}");
}

#[tokio::test]
async fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = Config::load(path.to_str().unwrap()).await.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[tokio::test]
async fn sbus_section_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sbus.toml");
    std::fs::write(
        &path,
        r#"
[link]
header = 0xAABBCCDD

[serial]
port = "/dev/ttyACM1"
baud_rate = 921600

[sbus]
port = "/dev/ttyS1"

[control]
gain = 0.5
cycle_ms = 5

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = Config::load(path.to_str().unwrap()).await.unwrap();
    assert_eq!(config.sbus.unwrap().port, "/dev/ttyS1");
    assert_eq!(config.link.header, 0xAABB_CCDD);
    assert_eq!(config.control.cycle_ms, 5);
}
