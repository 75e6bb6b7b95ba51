use flate2::write::GzEncoder;
use flate2::Compression;
use setup_fluence::config::SetupConfig;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

pub const FAKE_FLUENCE: &str = "#!/bin/sh\necho \"fluence $@\"\n";

/// A gzipped tarball holding an executable `fluence/bin/fluence`.
pub fn fluence_tarball() -> Vec<u8> {
    fluence_tarball_with(FAKE_FLUENCE)
}

/// Like [`fluence_tarball`], with `script` as the binary.
pub fn fluence_tarball_with(script: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    let mut header = tar::Header::new_gnu();
    header.set_size(script.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder
        .append_data(&mut header, "fluence/bin/fluence", script.as_bytes())
        .unwrap();

    builder.into_inner().unwrap().finish().unwrap()
}

pub fn zip_of(members: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in members {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Configuration pointing every remote at `base_url` and every local path into `dir`.
pub fn config(base_url: &str, dir: &Path) -> SetupConfig {
    SetupConfig {
        bucket_url: base_url.to_string(),
        temp_root: dir.join("temp"),
        install_root: dir.join("install"),
        smoke_test_args: vec!["dep".to_string(), "versions".to_string()],
        channels: ["kras", "testnet", "stage", "latest", "stable", "main", "unstable"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        channels_url: None,
        github_api_url: base_url.to_string(),
        github_repository: None,
        github_run_id: None,
        github_token: None,
        github_path: Some(dir.join("github_path")),
    }
}
