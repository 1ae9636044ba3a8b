//! Deterministic build output mapping.
//!
//! Maps each build entry point to a stable path under `<out_dir>/assets/`.
//! The entry named `main` owns the fixed filenames `index.js` and
//! `index.css` that the static-file side of the dev server expects; every
//! other entry emits under a name derived from the entry name. Planning
//! fails on any output path collision before a single byte is written.
//! Writing clears the output directory first.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::error::ConfigError;

/// The entry point that owns the fixed output filenames.
pub const MAIN_ENTRY: &str = "main";

/// One planned artifact: a source file and the output path it will occupy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub entry: String,
    pub source: PathBuf,
    pub output: PathBuf,
}

/// A validated, collision-free mapping from entry points to output paths.
#[derive(Debug)]
pub struct OutputPlan {
    out_dir: PathBuf,
    artifacts: Vec<Artifact>,
}

impl OutputPlan {
    /// Plan output paths for the given entries. Writes nothing; the only
    /// filesystem access is probing for sibling stylesheets.
    ///
    /// Each entry emits a script artifact; an entry whose source has a
    /// sibling stylesheet (same stem, `.css` extension) also emits that
    /// stylesheet next to the script. Collisions are fatal.
    pub fn plan(
        entries: &BTreeMap<String, String>,
        out_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let mut artifacts = Vec::new();
        // output path → entry that claimed it
        let mut seen: HashMap<PathBuf, String> = HashMap::new();

        for (name, source) in entries {
            let source = PathBuf::from(source);
            let stem = if name == MAIN_ENTRY {
                "index".to_string()
            } else {
                derive_name(name)
            };

            let script = out_dir.join("assets").join(format!("{stem}.js"));
            claim(&mut seen, name, &script)?;
            artifacts.push(Artifact {
                entry: name.clone(),
                source: source.clone(),
                output: script,
            });

            let sibling_css = source.with_extension("css");
            if sibling_css.exists() {
                let stylesheet = out_dir.join("assets").join(format!("{stem}.css"));
                claim(&mut seen, name, &stylesheet)?;
                artifacts.push(Artifact {
                    entry: name.clone(),
                    source: sibling_css,
                    output: stylesheet,
                });
            }
        }

        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            artifacts,
        })
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Clear the output directory and write every artifact.
    ///
    /// Destructive: prior contents of the output directory are not
    /// recoverable. Verifies all sources exist before clearing anything.
    pub fn write(&self) -> anyhow::Result<()> {
        for artifact in &self.artifacts {
            if !artifact.source.is_file() {
                return Err(ConfigError::MissingEntrySource {
                    name: artifact.entry.clone(),
                    path: artifact.source.clone(),
                }
                .into());
            }
        }

        if self.out_dir.exists() {
            tracing::warn!(
                out_dir = %self.out_dir.display(),
                "Clearing output directory, prior contents will be lost"
            );
            fs::remove_dir_all(&self.out_dir)?;
        }
        fs::create_dir_all(self.out_dir.join("assets"))?;

        for artifact in &self.artifacts {
            fs::copy(&artifact.source, &artifact.output)?;
            tracing::info!(
                entry = %artifact.entry,
                output = %artifact.output.display(),
                "Wrote artifact"
            );
        }

        Ok(())
    }
}

/// Plan and write the build output for the configured entries.
pub fn run_build(config: &BuildConfig) -> anyhow::Result<()> {
    let plan = OutputPlan::plan(&config.entries, Path::new(&config.out_dir))?;
    plan.write()?;
    tracing::info!(
        out_dir = %config.out_dir,
        artifacts = plan.artifacts().len(),
        "Build complete"
    );
    Ok(())
}

/// Record an output path claim, failing fast on a collision.
fn claim(
    seen: &mut HashMap<PathBuf, String>,
    entry: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(first) = seen.get(path) {
        return Err(ConfigError::OutputCollision {
            first: first.clone(),
            second: entry.to_string(),
            path: path.to_path_buf(),
        });
    }
    seen.insert(path.to_path_buf(), entry.to_string());
    Ok(())
}

/// Derive a filesystem-safe output stem from an entry name.
fn derive_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
