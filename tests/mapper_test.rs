use std::collections::BTreeMap;
use tres_usage::config::Config;
use tres_usage::{ComponentConfig, ComponentMapper};

mod common;

fn limits(entries: &[(&str, i64)]) -> BTreeMap<String, i64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn usage(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn mapper_from_toml() -> ComponentMapper {
    let config: Config = toml::from_str(common::MAPPING_CONFIG).unwrap();
    config.build_mapper().unwrap()
}

#[test]
fn test_passthrough_round_trip() {
    let mut config = BTreeMap::new();
    for name in ["cpu", "mem", "gres/gpu"] {
        config.insert(name.to_string(), ComponentConfig::passthrough());
    }
    let mapper = ComponentMapper::from_config(&config).unwrap();
    assert!(mapper.is_passthrough());

    for name in ["cpu", "mem", "gres/gpu"] {
        assert_eq!(
            mapper.convert_limits_to_target(&limits(&[(name, 123)])),
            limits(&[(name, 123)])
        );
        assert_eq!(
            mapper.convert_usage_from_target(&usage(&[(name, 4.5)])),
            usage(&[(name, 4.5)])
        );
    }
}

#[test]
fn test_multi_target_from_config_file() {
    let mapper = mapper_from_toml();
    assert!(!mapper.is_passthrough());

    assert_eq!(
        mapper.convert_limits_to_target(&limits(&[("node", 100)])),
        limits(&[("gpu_hours", 500), ("storage_gb_hours", 1000)])
    );
    assert_eq!(
        mapper.convert_usage_from_target(&usage(&[
            ("gpu_hours", 500.0),
            ("storage_gb_hours", 1000.0)
        ])),
        usage(&[("node", 200.0)])
    );
}

#[test]
fn test_many_to_many_reverse_is_not_an_inverse() {
    // Feeding only one of the two targets attributes half of the forward amount
    let mapper = mapper_from_toml();
    let forward = mapper.convert_limits_to_target(&limits(&[("node", 100)]));
    assert_eq!(forward["gpu_hours"], 500);

    let back = mapper.convert_usage_from_target(&usage(&[("gpu_hours", 500.0)]));
    assert_eq!(back, usage(&[("node", 100.0)]));
}

#[test]
fn test_unknown_components() {
    let mapper = mapper_from_toml();

    assert!(mapper
        .convert_usage_from_target(&usage(&[("unknown_component", 10.0)]))
        .is_empty());
    assert_eq!(
        mapper.convert_limits_to_target(&limits(&[("unknown_component", 10)])),
        limits(&[("unknown_component", 10)])
    );
}

#[test]
fn test_component_projections() {
    let mapper = mapper_from_toml();
    assert_eq!(mapper.source_components().collect::<Vec<_>>(), vec!["cpu", "node"]);
    assert_eq!(
        mapper.target_components().collect::<Vec<_>>(),
        vec!["cpu", "gpu_hours", "storage_gb_hours"]
    );
    assert_eq!(mapper.forward_mappings("node").len(), 2);
    assert!(mapper.forward_mappings("missing").is_empty());
}

#[test]
fn test_shared_across_threads() {
    let mapper = std::sync::Arc::new(mapper_from_toml());

    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let mapper = std::sync::Arc::clone(&mapper);
            std::thread::spawn(move || mapper.convert_limits_to_target(&limits(&[("node", n)])))
        })
        .collect();

    for (n, handle) in (1i64..=4).zip(handles) {
        let converted = handle.join().unwrap();
        assert_eq!(converted["gpu_hours"], 5 * n);
        assert_eq!(converted["storage_gb_hours"], 10 * n);
    }
}
