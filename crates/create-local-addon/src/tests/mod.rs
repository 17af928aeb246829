//! Shared test doubles and fixtures.


use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use addon_config::Config;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockall::mock;
use tempfile::TempDir;

use crate::activation::{BuildError, BuildRunner, BuildStep};
use crate::fetch::{ArchiveTransport, FetchError};
use crate::host::{ADDONS_DIR, HostVariant, MANIFEST_FILE};
use crate::naming::{Prompt, PromptError, Prompter};
use crate::pipeline::{Completion, Invocation, Pipeline, PipelineError};

pub(crate) const TEST_ARCHIVE_ROOT: &str = "local-addon-boilerplate-master";
pub(crate) const TEST_ARCHIVE_URL: &str = "https://example.invalid/boilerplate.tar.gz";

// ---------------------------------------------------------------------------
// Prompting
// ---------------------------------------------------------------------------

/// Answers prompts from a fixed script and records every question.
///
/// Running out of answers behaves like a closed terminal.
#[derive(Debug, Default)]
pub(crate) struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<Prompt>,
}

impl ScriptedPrompter {
    pub(crate) fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|answer| (*answer).to_owned()).collect(),
            asked: Vec::new(),
        }
    }

    pub(crate) fn asked(&self) -> &[Prompt] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &Prompt) -> Result<String, PromptError> {
        self.asked.push(prompt.clone());
        self.answers.pop_front().ok_or_else(|| PromptError::Closed {
            message: prompt.message().to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

mock! {
    pub Builder {}
    impl BuildRunner for Builder {
        fn run_step(&self, directory: &Path, step: BuildStep) -> Result<(), BuildError>;
    }
}

/// A builder that expects every step once and lets each succeed.
pub(crate) fn passing_builder() -> MockBuilder {
    let mut builder = MockBuilder::new();
    builder.expect_run_step().times(2).returning(|_, _| Ok(()));
    builder
}

/// A builder whose first step fails like a non-zero `npm install`.
pub(crate) fn failing_builder() -> MockBuilder {
    let mut builder = MockBuilder::new();
    builder
        .expect_run_step()
        .times(1)
        .returning(|_, step| Err(failed_step(step)));
    builder
}

/// A builder that must never be invoked.
pub(crate) fn idle_builder() -> MockBuilder {
    let mut builder = MockBuilder::new();
    builder.expect_run_step().never();
    builder
}

#[cfg(unix)]
fn failed_step(step: BuildStep) -> BuildError {
    use std::os::unix::process::ExitStatusExt;
    BuildError::Failed {
        program: "npm".to_owned(),
        step,
        status: std::process::ExitStatus::from_raw(1 << 8),
    }
}

#[cfg(not(unix))]
fn failed_step(step: BuildStep) -> BuildError {
    BuildError::Spawn {
        program: "npm".to_owned(),
        step,
        source: io::Error::new(io::ErrorKind::NotFound, "npm not found"),
    }
}

// ---------------------------------------------------------------------------
// Archives
// ---------------------------------------------------------------------------

/// Builds gzip-compressed tar archives in memory.
pub(crate) struct ArchiveBuilder {
    inner: tar::Builder<GzEncoder<Vec<u8>>>,
}

impl ArchiveBuilder {
    pub(crate) fn new() -> Self {
        Self {
            inner: tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default())),
        }
    }

    /// Adds a pax global header like the ones hosting services prepend.
    pub(crate) fn pax_global_header(mut self) -> Self {
        let body = b"52 comment=0123456789abcdef0123456789abcdef01234567\n";
        let mut header = tar::Header::new_ustar();
        header.set_entry_type(tar::EntryType::XGlobalHeader);
        header
            .set_path("pax_global_header")
            .expect("pax header path");
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        self.inner.append(&header, &body[..]).expect("append pax header");
        self
    }

    pub(crate) fn dir(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        self.inner
            .append_data(&mut header, path, io::empty())
            .expect("append dir");
        self
    }

    pub(crate) fn file(mut self, path: &str, contents: &[u8]) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        self.inner
            .append_data(&mut header, path, contents)
            .expect("append file");
        self
    }

    pub(crate) fn symlink(self, path: &str, target: &str) -> Self {
        self.link(tar::EntryType::Symlink, path, target)
    }

    pub(crate) fn hard_link(self, path: &str, target: &str) -> Self {
        self.link(tar::EntryType::Link, path, target)
    }

    fn link(mut self, kind: tar::EntryType, path: &str, target: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(kind);
        header.set_size(0);
        header.set_mode(0o777);
        header.set_link_name(target).expect("link target");
        self.inner
            .append_data(&mut header, path, io::empty())
            .expect("append link");
        self
    }

    /// Adds a file whose name bypasses the builder's own path checks.
    pub(crate) fn raw_file(mut self, name: &str, contents: &[u8]) -> Self {
        let mut header = tar::Header::new_old();
        let slot = &mut header.as_old_mut().name;
        slot[..name.len()].copy_from_slice(name.as_bytes());
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        self.inner.append(&header, contents).expect("append raw file");
        self
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.inner
            .into_inner()
            .expect("finish tar")
            .finish()
            .expect("finish gzip")
    }
}

/// Manifest shipped by the test boilerplate.
pub(crate) const BOILERPLATE_MANIFEST: &str = r#"{
  "name": "local-addon-boilerplate",
  "productName": "Local Add-on Boilerplate",
  "version": "1.0.0",
  "slug": "local-addon-boilerplate",
  "main": "lib/main.js",
  "scripts": {
    "build": "tsc"
  }
}
"#;

/// A small but realistic boilerplate archive.
pub(crate) fn boilerplate_archive() -> Vec<u8> {
    let root = TEST_ARCHIVE_ROOT;
    ArchiveBuilder::new()
        .pax_global_header()
        .dir(&format!("{root}/"))
        .file(&format!("{root}/{MANIFEST_FILE}"), BOILERPLATE_MANIFEST.as_bytes())
        .dir(&format!("{root}/src/"))
        .file(&format!("{root}/src/main.ts"), b"export default function () {}\n")
        .file(&format!("{root}/README.md"), b"# Boilerplate\n")
        .finish()
}

/// Bytes that gzip cannot shrink much, so truncated streams fail mid-entry.
pub(crate) fn incompressible(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state.to_le_bytes()[0]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Transports
// ---------------------------------------------------------------------------

/// Serves the same bytes for every request and records the URLs asked for.
#[derive(Debug, Default)]
pub(crate) struct StaticTransport {
    body: Vec<u8>,
    requested: RefCell<Vec<String>>,
}

impl StaticTransport {
    pub(crate) fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            requested: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl ArchiveTransport for StaticTransport {
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError> {
        self.requested.borrow_mut().push(url.to_owned());
        Ok(Box::new(Cursor::new(self.body.clone())))
    }
}

/// Refuses every request.
#[derive(Debug, Default)]
pub(crate) struct FailingTransport;

impl ArchiveTransport for FailingTransport {
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError> {
        Err(FetchError::Transport {
            url: url.to_owned(),
            message: "connection refused".to_owned(),
        })
    }
}

/// Delivers a prefix of the body and then fails like a dropped connection.
#[derive(Debug)]
pub(crate) struct InterruptedTransport {
    prefix: Vec<u8>,
}

impl InterruptedTransport {
    pub(crate) fn new(body: &[u8], keep: usize) -> Self {
        Self {
            prefix: body[..keep.min(body.len())].to_vec(),
        }
    }
}

impl ArchiveTransport for InterruptedTransport {
    fn open(&self, _url: &str) -> Result<Box<dyn Read + Send>, FetchError> {
        Ok(Box::new(Cursor::new(self.prefix.clone()).chain(ResetReader)))
    }
}

struct ResetReader;

impl Read for ResetReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ))
    }
}

// ---------------------------------------------------------------------------
// Host trees
// ---------------------------------------------------------------------------

/// A temporary application-support directory with host installations.
pub(crate) struct HostFixture {
    temp: TempDir,
}

impl HostFixture {
    pub(crate) fn new(variants: &[HostVariant]) -> Self {
        let temp = TempDir::new().expect("temp dir");
        let app_support = temp.path().join("Application Support");
        fs::create_dir_all(&app_support).expect("app support");
        for variant in variants {
            fs::create_dir_all(app_support.join(variant.directory_name()).join(ADDONS_DIR))
                .expect("host addons dir");
        }
        Self { temp }
    }

    pub(crate) fn app_support(&self) -> PathBuf {
        self.temp.path().join("Application Support")
    }

    pub(crate) fn host_root(&self, variant: HostVariant) -> PathBuf {
        self.app_support().join(variant.directory_name())
    }

    pub(crate) fn addons_dir(&self, variant: HostVariant) -> PathBuf {
        self.host_root(variant).join(ADDONS_DIR)
    }

    /// A scratch directory outside the host tree, created on demand.
    pub(crate) fn workspace(&self) -> PathBuf {
        let path = self.temp.path().join("workspace");
        fs::create_dir_all(&path).expect("workspace dir");
        path
    }

    /// Installs an add-on directory, with a manifest when `product_name` is
    /// given.
    pub(crate) fn install_addon(
        &self,
        variant: HostVariant,
        directory: &str,
        product_name: Option<&str>,
    ) -> PathBuf {
        let path = self.addons_dir(variant).join(directory);
        fs::create_dir_all(&path).expect("addon dir");
        if let Some(name) = product_name {
            let manifest = serde_json::json!({ "name": directory, "productName": name });
            let mut file = fs::File::create(path.join(MANIFEST_FILE)).expect("manifest");
            file.write_all(manifest.to_string().as_bytes())
                .expect("write manifest");
        }
        path
    }
}

/// Configuration pointing at `fixture` and the test archive.
pub(crate) fn fixture_config(fixture: &HostFixture) -> Config {
    Config {
        app_support_dir: Some(fixture.app_support()),
        archive_url: TEST_ARCHIVE_URL.to_owned(),
        archive_root: TEST_ARCHIVE_ROOT.to_owned(),
        ..Config::default()
    }
}

/// Runs the whole pipeline with the given doubles.
pub(crate) fn run_pipeline(
    config: &Config,
    invocation: Invocation,
    prompter: &mut ScriptedPrompter,
    transport: &dyn ArchiveTransport,
    builder: &dyn BuildRunner,
) -> Result<Completion, PipelineError> {
    Pipeline::new(config, invocation, prompter, transport, builder).run()
}

/// Reads a JSON document from disk.
pub(crate) fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).expect("read json");
    serde_json::from_str(&text).expect("parse json")
}
