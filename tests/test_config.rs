use mediaserve::config::{CONFIG_ENV, Config};
use std::collections::HashMap;
use std::path::PathBuf;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let cfg = Config::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.root, PathBuf::from("."));
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.max_level(), tracing::Level::INFO);
}

#[test]
fn test_config_env_overrides() {
    let cfg = Config::from_lookup(lookup(&[
        ("LISTEN", "0.0.0.0:3000"),
        ("ROOT", "/srv/media"),
        ("LOG_LEVEL", "debug"),
    ]))
    .unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.root, PathBuf::from("/srv/media"));
    assert_eq!(cfg.max_level(), tracing::Level::DEBUG);
}

#[test]
fn test_config_from_yaml_partial() {
    let cfg = Config::from_yaml("root: /var/www\n").unwrap();
    assert_eq!(cfg.root, PathBuf::from("/var/www"));
    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
}

#[test]
fn test_config_from_yaml_invalid() {
    assert!(Config::from_yaml("listen_addr: [1, 2]\n").is_err());
}

#[test]
fn test_config_file_then_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mediaserve.yaml");
    std::fs::write(
        &path,
        "listen_addr: 0.0.0.0:9000\nroot: /data\nlog_level: warn\n",
    )
    .unwrap();
    let path = path.to_string_lossy().into_owned();

    let cfg = Config::from_lookup(lookup(&[(CONFIG_ENV, path.as_str()), ("ROOT", "/override")])).unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:9000");
    assert_eq!(cfg.root, PathBuf::from("/override"));
    assert_eq!(cfg.max_level(), tracing::Level::WARN);
}

#[test]
fn test_config_missing_file() {
    let result = Config::from_lookup(lookup(&[(CONFIG_ENV, "/nonexistent/mediaserve.yaml")]));
    assert!(result.is_err());
}

#[test]
fn test_config_unknown_log_level_falls_back() {
    let cfg = Config::from_lookup(lookup(&[("LOG_LEVEL", "chatty")])).unwrap();
    assert_eq!(cfg.max_level(), tracing::Level::INFO);
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.listen_addr, cfg2.listen_addr);
}
