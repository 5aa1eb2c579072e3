use crate::compiler::compiler_messages::compiler_errors::{CompilerError, ErrorLocation};
use crate::return_file_error;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Stable handle to a registered source file. Handles are indices and stay
/// valid for the registry's lifetime, including across release/reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u32);

impl SourceId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
struct SourceEntry {
    path: PathBuf,
    text: Option<Rc<str>>,
}

/// Owns every loaded source buffer for one compilation.
///
/// Paths are canonicalized on registration so path equality is module
/// identity everywhere downstream. Text buffers are handed out as `Rc<str>`
/// clones, letting a tokenizer keep its module text alive while includes
/// pull more files through the registry mid-parse.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceEntry>,
    by_path: FxHashMap<PathBuf, SourceId>,
    memory_limit: Option<u64>,
    reserved_bytes: u64,
}

impl SourceRegistry {
    pub fn new(memory_limit: Option<u64>) -> Self {
        SourceRegistry {
            sources: Vec::new(),
            by_path: FxHashMap::default(),
            memory_limit,
            reserved_bytes: 0,
        }
    }

    /// Register a path, canonicalizing it first. The path must name an
    /// existing file. Registering the same file twice returns the existing
    /// handle.
    pub fn create(&mut self, path: &Path) -> Result<SourceId, CompilerError> {
        let canonical = match fs::canonicalize(path) {
            Ok(canonical) => canonical,
            Err(_) => {
                return_file_error!(
                    MissingFile,
                    format!("Source file does not exist: {}", path.display()),
                    ErrorLocation::new(path.to_path_buf(), 0, 0),
                )
            }
        };

        if !canonical.is_file() {
            return_file_error!(
                MissingFile,
                format!("Source path is not a file: {}", canonical.display()),
                ErrorLocation::new(canonical, 0, 0),
            )
        }

        if let Some(&existing) = self.by_path.get(&canonical) {
            return Ok(existing);
        }

        let id = SourceId(self.sources.len() as u32);
        self.by_path.insert(canonical.clone(), id);
        self.sources.push(SourceEntry {
            path: canonical,
            text: None,
        });

        Ok(id)
    }

    /// Read the file into memory. Idempotent: a loaded buffer is reused.
    pub fn load(&mut self, id: SourceId) -> Result<Rc<str>, CompilerError> {
        let entry = &self.sources[id.0 as usize];
        if let Some(text) = &entry.text {
            return Ok(Rc::clone(text));
        }

        let path = entry.path.clone();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) => {
                return_file_error!(
                    UnreadableSource,
                    format!("Unable to read source file {}: {}", path.display(), error),
                    ErrorLocation::new(path, 0, 0),
                )
            }
        };

        let incoming = raw.len() as u64;
        if let Some(limit) = self.memory_limit
            && self.reserved_bytes + incoming > limit
        {
            return_file_error!(
                MemoryLimit,
                format!(
                    "Loading {} would exceed the configured memory limit of {} bytes",
                    path.display(),
                    limit
                ),
                ErrorLocation::new(path, 0, 0),
            )
        }

        self.reserved_bytes += incoming;
        let shared: Rc<str> = Rc::from(raw.as_str());
        self.sources[id.0 as usize].text = Some(Rc::clone(&shared));

        Ok(shared)
    }

    /// The loaded text, if `load` has run for this handle.
    pub fn text(&self, id: SourceId) -> Option<Rc<str>> {
        self.sources[id.0 as usize].text.as_ref().map(Rc::clone)
    }

    pub fn path(&self, id: SourceId) -> &Path {
        &self.sources[id.0 as usize].path
    }

    pub fn lookup(&self, canonical: &Path) -> Option<SourceId> {
        self.by_path.get(canonical).copied()
    }

    /// Drop a loaded buffer. The handle remains valid and may be reloaded.
    pub fn release(&mut self, id: SourceId) {
        let entry = &mut self.sources[id.0 as usize];
        if let Some(text) = entry.text.take() {
            self.reserved_bytes = self.reserved_bytes.saturating_sub(text.len() as u64);
        }
    }

    pub fn release_all(&mut self) {
        for index in 0..self.sources.len() {
            self.release(SourceId(index as u32));
        }
    }

    pub fn reserved_bytes(&self) -> u64 {
        self.reserved_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compiler_messages::compiler_errors::DiagnosticCode;
    use std::io::Write;

    fn write_temp_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn duplicate_paths_share_a_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_source(&dir, "a.fox", "begin; end;");

        let mut registry = SourceRegistry::new(None);
        let first = registry.create(&path).unwrap();
        let second = registry.create(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = SourceRegistry::new(None);
        let result = registry.create(&dir.path().join("nope.fox"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, DiagnosticCode::MissingFile);
    }

    #[test]
    fn load_is_idempotent_and_release_frees() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_source(&dir, "a.fox", "begin; end;");

        let mut registry = SourceRegistry::new(None);
        let id = registry.create(&path).unwrap();

        let text = registry.load(id).unwrap();
        assert_eq!(&*text, "begin; end;");
        let again = registry.load(id).unwrap();
        assert_eq!(text, again);
        assert_eq!(registry.reserved_bytes(), text.len() as u64);

        registry.release(id);
        assert_eq!(registry.reserved_bytes(), 0);
        assert!(registry.text(id).is_none());
    }

    #[test]
    fn memory_limit_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_source(&dir, "big.fox", "begin; write 6 1; end;");

        let mut registry = SourceRegistry::new(Some(4));
        let id = registry.create(&path).unwrap();
        let result = registry.load(id);
        assert_eq!(result.unwrap_err().code, DiagnosticCode::MemoryLimit);
    }
}
