/*
 * Integration tests for pcimap
 *
 * These tests drive whole runs against temporary mapping files, with the
 * inventory and hostname collaborators replaced by mocks or shell stubs.
 */

use clap::Parser;
use mockall::mock;
use serial_test::serial;
use std::fs;
use std::path::Path;

use pcimap::app::{exit_code_for, run_with};
use pcimap::cli::Cli;
use pm_core::{
    decode, encode, HostIdentity, InventorySource, LspciSource, MappingEntry, MappingStore,
    Reconciler, Report, Settings, Warning,
};

mock! {
    pub Source {}
    impl InventorySource for Source {
        fn name(&self) -> String;
        fn collect(&self) -> pm_core::Result<String>;
    }
}

mock! {
    pub Host {}
    impl HostIdentity for Host {
        fn hostname(&self) -> pm_core::Result<String>;
    }
}

const TWO_DEVICES: &str = "\
Slot:\t0000:02:00.0
Class:\tEthernet controller [0200]
Vendor:\tIntel Corporation [8086]
Device:\tI210 Gigabit Network Connection [1533]
SVendor:\tASRock Incorporation [1849]
SDevice:\tDevice [1533]
IOMMUGroup:\t14

Slot:\t0000:04:00.0
Class:\tVGA compatible controller [0300]
Vendor:\tNVIDIA Corporation [10de]
Device:\tAD104 [GeForce RTX 4070 Ti] [2882]
SVendor:\tGigabyte Technology Co., Ltd [1458]
SDevice:\tDevice [4102]
IOMMUGroup:\t13
";

const DUPLICATE_HBAS: &str = "\
Slot:\t0000:05:00.0
Vendor:\tBroadcom / LSI [1000]
Device:\tSAS1068 [0001]
IOMMUGroup:\t20

Slot:\t0000:06:00.0
Vendor:\tBroadcom / LSI [1000]
Device:\tSAS1068 [0001]
IOMMUGroup:\t21
";

fn source_with(text: &'static str) -> MockSource {
    let mut source = MockSource::new();
    source.expect_name().return_const("lspci".to_string());
    source.expect_collect().returning(move || Ok(text.to_string()));
    source
}

fn host_named(name: &'static str) -> MockHost {
    let mut host = MockHost::new();
    host.expect_hostname().returning(move || Ok(name.to_string()));
    host
}

fn run_once(path: &Path, inventory: &'static str, dry_run: bool) -> Report {
    let source = source_with(inventory);
    let host = host_named("pve1");
    let mut report = Report::new();
    Reconciler::new(&source, &host)
        .run(&MappingStore::new(path), dry_run, &mut report)
        .unwrap();
    report
}

fn labels(text: &str) -> Vec<String> {
    decode(text, "test").entries.into_iter().map(|e| e.label).collect()
}

#[test]
fn test_scenario_empty_mapping_is_left_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    fs::write(&path, "").unwrap();

    let report = run_once(&path, TWO_DEVICES, false);

    assert!(report.has_empty_mapping());
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn test_absent_mapping_file_warns_and_is_not_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping").join("pci.cfg");

    let report = run_once(&path, TWO_DEVICES, false);

    assert!(report.has_empty_mapping());
    assert!(!path.exists());
    assert!(!dir.path().join("mapping").exists());
}

#[test]
fn test_scenario_matched_entry_is_refreshed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    fs::write(&path, "gpu0\n\tid=10de:2882\n\tnode=oldhost\n\tpath=0000:0300\n").unwrap();

    let report = run_once(&path, TWO_DEVICES, false);
    assert!(report.is_empty());

    let entries = decode(&fs::read_to_string(&path).unwrap(), "test").entries;
    assert_eq!(entries.len(), 1);
    let gpu = &entries[0];
    assert_eq!(gpu.label, "gpu0");
    assert_eq!(gpu.get("id"), Some("10de:2882"));
    assert_eq!(gpu.get("path"), Some("0000:0400"));
    assert_eq!(gpu.get("node"), Some("pve1"));
    assert_eq!(gpu.get("iommugroup"), Some("13"));
    assert_eq!(gpu.get("subsystem-id"), Some("1458:4102"));
}

#[test]
fn test_scenario_unmatched_entry_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    let original = "nic1\n\tid=8086:9999\n\tnode=pve0\n\tpath=0000:0700\n";
    fs::write(&path, original).unwrap();

    run_once(&path, TWO_DEVICES, false);

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_scenario_duplicate_ids_bind_first_device() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    fs::write(&path, "hba0\n\tid=1000:0001\n\nhba1\n\tid=1000:0001\n").unwrap();

    let report = run_once(&path, DUPLICATE_HBAS, false);

    let entries = decode(&fs::read_to_string(&path).unwrap(), "test").entries;
    for entry in &entries {
        assert_eq!(entry.get("path"), Some("0000:0500"));
        assert_eq!(entry.get("iommugroup"), Some("20"));
    }
    assert_eq!(
        report.warnings(),
        &[Warning::DuplicateDeviceId {
            id: "1000:0001".to_string(),
            kept_slot: "0000:05:00.0".to_string(),
            ignored_slot: "0000:06:00.0".to_string(),
        }]
    );
}

#[test]
fn test_round_trip_of_recognized_attributes() {
    let entries = vec![
        MappingEntry::new("gpu0")
            .with_attr("id", "10de:2882")
            .with_attr("iommugroup", "13")
            .with_attr("node", "pve1")
            .with_attr("path", "0000:0400")
            .with_attr("subsystem-id", "1458:4102"),
        MappingEntry::new("nic1").with_attr("id", "8086:1533"),
    ];
    assert_eq!(decode(&encode(&entries), "test").entries, entries);
}

#[test]
fn test_unmatched_entry_survives_alongside_matched_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    let nic = "nic1\n\tid=8086:9999\n\tnode=pve0\n\tpath=0000:0700\n";
    fs::write(&path, format!("gpu0\n\tid=10de:2882\n\n{}", nic)).unwrap();

    run_once(&path, TWO_DEVICES, false);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.ends_with(&format!("\n\n{}", nic)));
    assert_eq!(labels(&text), vec!["gpu0", "nic1"]);
}

#[test]
fn test_second_run_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    fs::write(&path, "gpu0\n\tid=10de:2882\n\nnic0\n\tid=8086:1533\n").unwrap();

    run_once(&path, TWO_DEVICES, false);
    let first = fs::read_to_string(&path).unwrap();
    run_once(&path, TWO_DEVICES, false);
    let second = fs::read_to_string(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_labels_are_never_invented() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    let input = "gpu0\n\tid=10de:2882\n\nspare\n\tid=dead:beef\n";
    fs::write(&path, input).unwrap();

    run_once(&path, TWO_DEVICES, false);

    assert_eq!(labels(&fs::read_to_string(&path).unwrap()), labels(input));
}

#[test]
fn test_dry_run_never_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    let input = "# managed by hand\ngpu0\n\tid=10de:2882\n\tpath=0000:0300\n";
    fs::write(&path, input).unwrap();

    run_once(&path, TWO_DEVICES, true);

    assert_eq!(fs::read_to_string(&path).unwrap(), input);
}

#[test]
fn test_cli_dry_run_prints_preview() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    fs::write(&path, "gpu0\n\tid=10de:2882\n\tpath=0000:0300\n").unwrap();

    let cli = Cli::parse_from(["pcimap", "--dry-run"]);
    let settings = Settings {
        mapping_file: path.clone(),
        ..Settings::default()
    };
    let source = source_with(TWO_DEVICES);
    let host = host_named("pve1");
    let mut out = Vec::new();

    run_with(&cli, &settings, &source, &host, None, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("1 of 1 entries would change\n"));
    assert!(text.contains("\tpath: 0000:0300 -> 0000:0400\n"));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "gpu0\n\tid=10de:2882\n\tpath=0000:0300\n"
    );
}

#[test]
fn test_cli_print_pci_info_skips_mapping_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        mapping_file: dir.path().join("pci.cfg"),
        ..Settings::default()
    };
    let cli = Cli::parse_from(["pcimap", "--print-pci-info"]);
    let source = source_with(TWO_DEVICES);
    let host = host_named("pve1");
    let mut out = Vec::new();

    run_with(&cli, &settings, &source, &host, None, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Detected PCI Devices:\n"));
    assert!(text.contains("0000:02:00.0 - Intel Corporation I210 Gigabit Network Connection [8086:1533]"));
    assert!(!settings.mapping_file.exists());
}

#[test]
fn test_missing_program_exits_with_collection_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    fs::write(&path, "gpu0\n\tid=10de:2882\n").unwrap();

    let settings = Settings {
        mapping_file: path.clone(),
        lspci_program: "/nonexistent/pcimap-test-lspci".to_string(),
        resolve_iommu_groups: false,
        ..Settings::default()
    };
    let cli = Cli::parse_from(["pcimap"]);
    let source = settings.inventory_source();
    let host = host_named("pve1");
    let mut out = Vec::new();

    let err = run_with(&cli, &settings, &source, &host, None, &mut out).unwrap_err();

    assert_eq!(exit_code_for(&err), 2);
    assert_eq!(fs::read_to_string(&path).unwrap(), "gpu0\n\tid=10de:2882\n");
}

#[test]
fn test_shell_stub_source_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci.cfg");
    fs::write(&path, "gpu0\n\tid=10de:2882\n").unwrap();

    let script = "printf 'Slot:\\t0000:04:00.0\\nVendor:\\tNVIDIA [10de]\\nDevice:\\tAD104 [2882]\\nIOMMUGroup:\\t13\\n'";
    let source = LspciSource::new("sh", vec!["-c".to_string(), script.to_string()]);
    let host = host_named("pve1");
    let mut report = Report::new();

    let outcome = Reconciler::new(&source, &host)
        .run(&MappingStore::new(&path), false, &mut report)
        .unwrap();

    assert!(outcome.written);
    let entries = decode(&fs::read_to_string(&path).unwrap(), "test").entries;
    assert_eq!(entries[0].get("path"), Some("0000:0400"));
    assert_eq!(entries[0].get("iommugroup"), Some("13"));
}

#[test]
#[serial]
fn test_config_env_points_at_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("settings.json");
    fs::write(&config, r#"{ "mapping_file": "/srv/mapping/pci.cfg" }"#).unwrap();

    std::env::set_var("PCIMAP_CONFIG", &config);
    let settings = pcimap::app::effective_settings(&Cli::parse_from(["pcimap"]));
    std::env::remove_var("PCIMAP_CONFIG");

    assert_eq!(
        settings.unwrap().mapping_file,
        std::path::PathBuf::from("/srv/mapping/pci.cfg")
    );
}

#[test]
#[serial]
fn test_malformed_settings_exit_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("settings.json");
    fs::write(&config, "[1, 2").unwrap();

    std::env::set_var("PCIMAP_CONFIG", &config);
    let result = pcimap::app::run(&Cli::parse_from(["pcimap"]));
    std::env::remove_var("PCIMAP_CONFIG");

    assert_eq!(exit_code_for(&result.unwrap_err()), 4);
}
