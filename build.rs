//! Build script for NutriScale
//!
//! Embeds a build counter and timestamp. The counter lives in `build_number.txt`
//! at the crate root; setting NUTRISCALE_BUILD_NUMBER pins it instead.

use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn next_build_number() -> u64 {
    let path = Path::new(COUNTER_FILE);
    let current: u64 = fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);

    let next = current + 1;
    if let Err(e) = fs::write(path, next.to_string()) {
        println!("cargo:warning=could not update {}: {}", COUNTER_FILE, e);
    }
    next
}

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-env-changed=NUTRISCALE_BUILD_NUMBER");

    let build_number = match std::env::var("NUTRISCALE_BUILD_NUMBER") {
        Ok(pinned) if pinned.trim().parse::<u64>().is_ok() => pinned.trim().to_string(),
        _ => next_build_number().to_string(),
    };

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=NUTRISCALE_BUILD_NUMBER={}", build_number);
    println!("cargo:rustc-env=NUTRISCALE_BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:warning=NutriScale Build #{} at {}", build_number, timestamp);
}
