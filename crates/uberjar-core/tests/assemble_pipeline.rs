//! End-to-end assembly over real archives on disk.

use sha2::{Digest, Sha256};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uberjar_core::{
    assemble, assemble_report, inspect, ArchiveFormat, AssemblyError, BuildConfig,
    BuildConfigOverrides, Manifest, MANIFEST_PATH,
};
use zip::write::SimpleFileOptions;

/// Write a jar with the given (name, contents) entries; names ending in `/`
/// become directories.
fn write_jar(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        if let Some(dir) = name.strip_suffix('/') {
            zip.add_directory(dir, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
    }
    let bytes = zip.finish().unwrap().into_inner();
    std::fs::write(path, bytes).unwrap();
}

fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) {
    let gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(gz);
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data.as_bytes()).unwrap();
    }
    let bytes = builder.into_inner().unwrap().finish().unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn read_jar(path: &Path) -> Vec<(String, Vec<u8>)> {
    let bytes = std::fs::read(path).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut out = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        out.push((file.name().to_string(), data));
    }
    out
}

fn lookup<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> Option<&'a [u8]> {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, d)| d.as_slice())
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// The reference build: an application jar with its own manifest and
    /// one dependency that also ships a `Main.class`.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        write_jar(
            &dir.path().join("app.jar"),
            &[
                ("META-INF/", ""),
                (
                    "META-INF/MANIFEST.MF",
                    "Manifest-Version: 1.0\r\nMain-Class: com.example.Old\r\n\r\n",
                ),
                ("Main.class", "b1"),
            ],
        );
        write_jar(
            &dir.path().join("dep.jar"),
            &[("lib/", ""), ("lib/Helper.class", "b2"), ("Main.class", "b3")],
        );
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn overrides(&self, output: &str) -> BuildConfigOverrides {
        BuildConfigOverrides {
            primary: Some(self.path("app.jar")),
            dependencies: vec![self.path("dep.jar")],
            main_class: Some("com.example.Main".into()),
            output: Some(self.path(output)),
            ..Default::default()
        }
    }

    fn config(&self, output: &str) -> BuildConfig {
        BuildConfig::from_overrides(self.overrides(output)).unwrap()
    }
}

#[test]
fn reference_scenario() {
    let fx = Fixture::new();
    let artifact = assemble(&fx.config("app-uber.jar")).unwrap();
    assert_eq!(artifact.format, ArchiveFormat::Jar);

    let entries = read_jar(&artifact.path);
    assert_eq!(lookup(&entries, "Main.class"), Some(&b"b1"[..]));
    assert_eq!(lookup(&entries, "lib/Helper.class"), Some(&b"b2"[..]));

    let manifest = Manifest::parse(lookup(&entries, MANIFEST_PATH).unwrap()).unwrap();
    assert_eq!(manifest.main_class(), Some("com.example.Main"));

    assert_eq!(entries[0].0, "META-INF/");
    assert_eq!(entries[1].0, MANIFEST_PATH);
    assert_eq!(artifact.entry_count, entries.len());
}

#[test]
fn report_lists_excluded_duplicates() {
    let fx = Fixture::new();
    let report = assemble_report(&fx.config("app-uber.jar")).unwrap();
    let paths: Vec<&str> = report.conflicts.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["Main.class"]);
    assert_eq!(report.conflicts[0].winner.path(), fx.path("app.jar"));
    assert_eq!(report.conflicts[0].dropped[0].path(), fx.path("dep.jar"));
}

#[test]
fn shared_directories_are_not_reported() {
    let fx = Fixture::new();
    write_jar(
        &fx.path("more.jar"),
        &[("META-INF/", ""), ("lib/", ""), ("lib/Other.class", "o")],
    );
    let mut overrides = fx.overrides("app-uber.jar");
    overrides.dependencies.push(fx.path("more.jar"));
    let report = assemble_report(&BuildConfig::from_overrides(overrides).unwrap()).unwrap();

    let paths: Vec<&str> = report.conflicts.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["Main.class"]);
}

#[test]
fn two_runs_are_byte_identical() {
    let fx = Fixture::new();
    for (a, b) in [("one.jar", "two.jar"), ("one.tar.gz", "two.tar.gz")] {
        let first = assemble(&fx.config(a)).unwrap();
        let second = assemble(&fx.config(b)).unwrap();

        let bytes_a = std::fs::read(&first.path).unwrap();
        let bytes_b = std::fs::read(&second.path).unwrap();
        assert_eq!(bytes_a, bytes_b, "{a} and {b} differ");
        assert_eq!(first.sha256, second.sha256);
        assert_eq!(
            first.sha256,
            format!("sha256:{}", hex::encode(Sha256::digest(&bytes_a)))
        );
    }
}

#[test]
fn output_contains_union_of_inputs() {
    let fx = Fixture::new();
    write_jar(
        &fx.path("extra.jar"),
        &[("org/", ""), ("org/lib/", ""), ("org/lib/Util.class", "u")],
    );
    let mut overrides = fx.overrides("app-uber.jar");
    overrides.dependencies.push(fx.path("extra.jar"));
    let artifact = assemble(&BuildConfig::from_overrides(overrides).unwrap()).unwrap();

    let summary = inspect(&artifact.path).unwrap();
    let names: Vec<&str> = summary.entry_names().collect();
    for expected in [
        "META-INF/",
        "META-INF/MANIFEST.MF",
        "Main.class",
        "lib/",
        "lib/Helper.class",
        "org/",
        "org/lib/",
        "org/lib/Util.class",
    ] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }
    assert_eq!(names.len(), 8);

    // Every directory precedes its contents.
    for (i, name) in names.iter().enumerate() {
        if let Some((parent, _)) = name.trim_end_matches('/').rsplit_once('/') {
            let dir = format!("{parent}/");
            let pos = names.iter().position(|n| *n == dir).unwrap();
            assert!(pos < i, "{dir} after {name}");
        }
    }
}

#[test]
fn zip_and_tar_gz_inputs_mix() {
    let fx = Fixture::new();
    write_tar_gz(
        &fx.path("native.tar.gz"),
        &[("native/libjni.so", "elf"), ("Main.class", "tar")],
    );
    let mut overrides = fx.overrides("app-uber.tgz");
    overrides.dependencies.push(fx.path("native.tar.gz"));
    let artifact = assemble(&BuildConfig::from_overrides(overrides).unwrap()).unwrap();
    assert_eq!(artifact.format, ArchiveFormat::TarGz);

    let summary = inspect(&artifact.path).unwrap();
    assert_eq!(summary.format, ArchiveFormat::TarGz);
    assert_eq!(summary.main_class.as_deref(), Some("com.example.Main"));
    let native = summary
        .entries
        .iter()
        .find(|e| e.path.as_str() == "native/libjni.so")
        .unwrap();
    assert_eq!(native.size, 3);
    let main = summary
        .entries
        .iter()
        .find(|e| e.path.as_str() == "Main.class")
        .unwrap();
    assert_eq!(main.size, 2);
}

#[test]
fn excludes_drop_matching_entries() {
    let fx = Fixture::new();
    write_jar(
        &fx.path("signed.jar"),
        &[
            ("META-INF/SIGNER.SF", "sig"),
            ("META-INF/SIGNER.RSA", "rsa"),
            ("signed/Api.class", "api"),
        ],
    );
    let mut overrides = fx.overrides("app-uber.jar");
    overrides.dependencies.push(fx.path("signed.jar"));
    overrides.excludes = vec!["META-INF/*.SF".into(), "META-INF/*.RSA".into()];
    let artifact = assemble(&BuildConfig::from_overrides(overrides).unwrap()).unwrap();

    let entries = read_jar(&artifact.path);
    assert!(lookup(&entries, "META-INF/SIGNER.SF").is_none());
    assert!(lookup(&entries, "META-INF/SIGNER.RSA").is_none());
    assert_eq!(lookup(&entries, "signed/Api.class"), Some(&b"api"[..]));
}

#[test]
fn corrupt_dependency_aborts_and_names_it() {
    let fx = Fixture::new();
    let broken = fx.path("broken.jar");
    let good = std::fs::read(fx.path("dep.jar")).unwrap();
    std::fs::write(&broken, &good[..good.len() / 2]).unwrap();

    let mut overrides = fx.overrides("app-uber.jar");
    overrides.dependencies.push(broken.clone());
    let err = assemble(&BuildConfig::from_overrides(overrides).unwrap()).unwrap_err();

    assert!(matches!(err, AssemblyError::CorruptArchive { .. }), "{err}");
    assert_eq!(err.artifact().unwrap().path(), broken);
    assert_eq!(err.exit_code(), 1);
    assert!(!fx.path("app-uber.jar").exists());
}

#[test]
fn missing_dependency_is_unreadable() {
    let fx = Fixture::new();
    let mut overrides = fx.overrides("app-uber.jar");
    overrides.dependencies.push(fx.path("nope.jar"));
    let err = assemble(&BuildConfig::from_overrides(overrides).unwrap()).unwrap_err();

    assert!(matches!(err, AssemblyError::UnreadableArtifact { .. }));
    assert_eq!(err.artifact().unwrap().path(), fx.path("nope.jar"));
    assert!(!fx.path("app-uber.jar").exists());
}

#[test]
fn missing_main_class_reads_nothing() {
    let fx = Fixture::new();
    let mut overrides = fx.overrides("app-uber.jar");
    overrides.main_class = None;
    // An unreadable dependency would fail first if inputs were read.
    overrides.dependencies.push(fx.path("nope.jar"));
    let err = assemble(&BuildConfig::from_overrides(overrides).unwrap()).unwrap_err();
    assert!(matches!(err, AssemblyError::MissingEntryPoint));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn write_failure_leaves_existing_output_untouched() {
    let fx = Fixture::new();
    let mut overrides = fx.overrides("app-uber.jar");
    overrides.output = Some(fx.path("no-such-dir").join("app-uber.jar"));
    let err = assemble(&BuildConfig::from_overrides(overrides).unwrap()).unwrap_err();
    assert!(matches!(err, AssemblyError::WriteFailure { .. }));
    assert_eq!(err.exit_code(), 3);
    assert!(!fx.path("no-such-dir").exists());
}

#[test]
fn yaml_config_drives_a_build() {
    let fx = Fixture::new();
    let config_path = fx.path("uberjar.yaml");
    std::fs::write(
        &config_path,
        "primary: app.jar\n\
         dependencies: [dep.jar]\n\
         main_class: com.example.Main\n\
         output: out/app-uber.jar\n\
         attributes:\n  Implementation-Version: 0.0.1-SNAPSHOT\n",
    )
    .unwrap();
    std::fs::create_dir(fx.path("out")).unwrap();

    let artifact = assemble(&BuildConfig::load(&config_path).unwrap()).unwrap();
    assert_eq!(artifact.path, fx.path("out").join("app-uber.jar"));

    let entries = read_jar(&artifact.path);
    let manifest = Manifest::parse(lookup(&entries, MANIFEST_PATH).unwrap()).unwrap();
    assert_eq!(manifest.get("Implementation-Version"), Some("0.0.1-SNAPSHOT"));
    assert_eq!(manifest.main_class(), Some("com.example.Main"));
}
