//! End-to-end exchange against a stand-in simulator process.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use glam::DVec2;
use riverguard_core::{LevelStats, SpawnRecord, TowerRecord, WaveOffload, WavePayload};
use riverguard_offload::OffloadClient;

/// Writes an executable shell script and returns its path.
fn fake_simulator(name: &str, script: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "riverguard-fake-sim-{}-{}",
        std::process::id(),
        name
    ));
    fs::write(&path, script).expect("write script");
    let mut permissions = fs::metadata(&path).expect("stat").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).expect("chmod");
    path
}

fn sample_payload() -> WavePayload {
    WavePayload {
        coins: 1000,
        xp: 50,
        leak_coins: 145,
        leak_xp: 8,
        dt: 0.06,
        spawn_interval: 0.5,
        routes: vec![vec![DVec2::new(0.0, 0.5), DVec2::new(1.0, 0.5)]],
        spawn_queue: vec![SpawnRecord {
            hp: 220.0,
            speed: 1.4,
            coin_reward: 75,
            xp_reward: 7,
            route_index: 0,
        }],
        towers: vec![TowerRecord {
            slot_index: 0,
            type_index: 0,
            position: DVec2::new(0.5, 0.45),
            cooldown: 0.0,
            stats: LevelStats {
                damage: 42.0,
                range: 2.9,
                attack_speed: 1.18,
                ..LevelStats::default()
            },
        }],
        zones: Vec::new(),
    }
}

#[test]
fn exchanges_one_line_per_wave_with_a_persistent_child() {
    let script = "#!/bin/sh\n\
        while read line; do\n\
        echo \"OK 1075 57 0 1 1 0 0 0 0.85\"\n\
        done\n";
    let binary = fake_simulator("persistent", script);
    let mut client = OffloadClient::new(&binary);

    let payload = sample_payload();
    let first = client.simulate_wave(&payload).expect("first wave");
    assert_eq!(first.coins, 1075);
    assert_eq!(first.killed, 1);
    assert!(!first.defeat);
    assert_eq!(first.cooldowns, vec![(0, 0.85)]);

    // Same child serves the second wave.
    let second = client.simulate_wave(&payload).expect("second wave");
    assert_eq!(second.xp, 57);

    fs::remove_file(&binary).expect("cleanup");
}

#[test]
fn child_that_exits_after_one_wave_is_respawned() {
    let script = "#!/bin/sh\n\
        read line\n\
        echo \"OK 900 40 1 0 0 0 0\"\n";
    let binary = fake_simulator("one-shot", script);
    let mut client = OffloadClient::new(&binary);

    let payload = sample_payload();
    let first = client.simulate_wave(&payload).expect("first wave");
    assert_eq!(first.leaked, 1);
    // Give the one-shot child time to exit so the client sees it gone.
    std::thread::sleep(std::time::Duration::from_millis(200));
    let second = client.simulate_wave(&payload).expect("respawned wave");
    assert_eq!(second.coins, 900);

    fs::remove_file(&binary).expect("cleanup");
}

#[test]
fn garbage_response_is_a_malformed_response_error() {
    let script = "#!/bin/sh\n\
        read line\n\
        echo \"BUSY try-again-later\"\n";
    let binary = fake_simulator("garbage", script);
    let mut client = OffloadClient::new(&binary);

    let error = client
        .simulate_wave(&sample_payload())
        .expect_err("rejected");
    assert!(error.to_string().contains("malformed"));

    fs::remove_file(&binary).expect("cleanup");
}
