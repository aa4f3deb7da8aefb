//! Shared fixtures for the integration tests.
//!
//! Each test binary includes this module with `mod common;`, so not every
//! helper is used by every binary.
#![allow(dead_code)]

use std::path::Path;

use fbsr_core::blueprint::{Blueprint, MapVersion};
use fbsr_core::diagnostics::Reporting;
use fbsr_data::{GameData, load_game_data};
use fbsr_render::{FactoryRegistry, RenderOptions, Scene, build_scene};

/// The small vanilla data set under `tests/data/vanilla`.
pub fn vanilla() -> GameData {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/vanilla");
    load_game_data(&dir).unwrap()
}

/// Render options without the border panels.
pub fn plain() -> RenderOptions {
    RenderOptions {
        show_info_panels: false,
        ..RenderOptions::default()
    }
}

/// Build the scene for `bp` with the standard registry.
pub fn scene(bp: &Blueprint, data: &GameData, options: &RenderOptions) -> (Scene, Reporting) {
    let mut reporting = Reporting::new();
    let scene = build_scene(bp, data, &FactoryRegistry::standard(), options, &mut reporting);
    (scene, reporting)
}

/// Version number as written in a blueprint document.
pub fn version_number(major: u16, minor: u16, patch: u16) -> u64 {
    MapVersion::new(major, minor, patch, 0).0
}
