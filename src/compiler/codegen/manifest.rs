use serde::Serialize;
use std::path::{Path, PathBuf};

/// The build manifest written next to the generated sources. Records what
/// was compiled and where each emitted file came from, so an external
/// build driver can consume the output tree without re-deriving it.
#[derive(Debug, Serialize)]
pub struct BuildManifest {
    pub entry: PathBuf,
    pub output_name: String,
    pub output_directory: PathBuf,
    pub compile: bool,
    pub strip_comments: bool,
    pub files: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    /// Canonical path of the SigmaFox module.
    pub module: PathBuf,
    /// Emitted path relative to the output directory.
    pub output: PathBuf,
    pub role: ManifestRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestRole {
    Main,
    Module,
}

impl BuildManifest {
    pub fn add_entry(&mut self, module: &Path, output: &Path, role: ManifestRole) {
        self.files.push(ManifestEntry {
            module: module.to_path_buf(),
            output: output.to_path_buf(),
            role,
        });
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_serializes_with_stable_roles() {
        let mut manifest = BuildManifest {
            entry: PathBuf::from("/src/main.fox"),
            output_name: "main".to_string(),
            output_directory: PathBuf::from("./out"),
            compile: false,
            strip_comments: false,
            files: Vec::new(),
        };
        manifest.add_entry(
            Path::new("/src/main.fox"),
            Path::new("main.cpp"),
            ManifestRole::Main,
        );
        manifest.add_entry(
            Path::new("/src/math.fox"),
            Path::new("math.hpp"),
            ManifestRole::Module,
        );

        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"role\": \"main\""));
        assert!(json.contains("\"role\": \"module\""));
        assert!(json.contains("main.cpp"));
    }
}
