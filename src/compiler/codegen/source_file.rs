use std::path::{Path, PathBuf};

/// An ordered run of output lines with a current-line cursor.
#[derive(Debug, Default)]
pub struct GeneratedRegion {
    lines: Vec<String>,
}

impl GeneratedRegion {
    pub fn add_line(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn append_to_current_line(&mut self, text: &str) {
        match self.lines.last_mut() {
            Some(line) => line.push_str(text),
            None => self.lines.push(text.to_string()),
        }
    }

    pub fn merge_lines(&self) -> String {
        let mut merged = String::new();
        for line in &self.lines {
            merged.push_str(line);
            merged.push('\n');
        }
        merged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionKind {
    Head,
    Body,
    Foot,
}

/// One emitted file: three line regions (head, body, foot) with a stack
/// selecting the active one, plus push/pop tab depth applied to new lines.
/// Output is always UTF-8 ASCII with LF endings; `generate` concatenates
/// the regions in order.
#[derive(Debug)]
pub struct GeneratedFile {
    filename: PathBuf,
    tabs: usize,
    tab_size: usize,
    region_stack: Vec<RegionKind>,
    head: GeneratedRegion,
    body: GeneratedRegion,
    foot: GeneratedRegion,
}

impl GeneratedFile {
    pub fn new(filename: PathBuf, tab_size: usize) -> GeneratedFile {
        GeneratedFile {
            filename,
            tabs: 0,
            tab_size,
            region_stack: Vec::new(),
            head: GeneratedRegion::default(),
            body: GeneratedRegion::default(),
            foot: GeneratedRegion::default(),
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn push_region_as_head(&mut self) {
        self.region_stack.push(RegionKind::Head);
    }

    pub fn push_region_as_body(&mut self) {
        self.region_stack.push(RegionKind::Body);
    }

    pub fn push_region_as_foot(&mut self) {
        self.region_stack.push(RegionKind::Foot);
    }

    pub fn pop_region(&mut self) {
        self.region_stack.pop();
    }

    fn active(&mut self) -> &mut GeneratedRegion {
        match self.region_stack.last().copied().unwrap_or(RegionKind::Body) {
            RegionKind::Head => &mut self.head,
            RegionKind::Body => &mut self.body,
            RegionKind::Foot => &mut self.foot,
        }
    }

    fn tab_string(&self) -> String {
        " ".repeat(self.tabs)
    }

    /// Start a new line carrying the current indentation and the given
    /// text.
    pub fn insert_line(&mut self, text: &str) {
        let mut line = self.tab_string();
        line.push_str(text);
        self.active().add_line(line);
    }

    pub fn insert_blank_line(&mut self) {
        self.active().add_line(String::new());
    }

    /// Start a new indented line; expression emission appends onto it.
    pub fn begin_line(&mut self) {
        let line = self.tab_string();
        self.active().add_line(line);
    }

    pub fn append(&mut self, text: &str) {
        self.active().append_to_current_line(text);
    }

    pub fn push_tabs(&mut self) {
        self.tabs += self.tab_size;
    }

    pub fn pop_tabs(&mut self) {
        self.tabs = self.tabs.saturating_sub(self.tab_size);
    }

    /// Merge head, body and foot into the final file text.
    pub fn generate(&self) -> String {
        let mut output = self.head.merge_lines();
        output.push_str(&self.body.merge_lines());
        output.push_str(&self.foot.merge_lines());
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_merge_in_head_body_foot_order() {
        let mut file = GeneratedFile::new(PathBuf::from("out.cpp"), 4);

        file.push_region_as_foot();
        file.insert_line("#endif");
        file.pop_region();

        file.push_region_as_head();
        file.insert_line("#include <iostream>");
        file.pop_region();

        file.push_region_as_body();
        file.insert_line("int x = 1;");
        file.pop_region();

        assert_eq!(file.generate(), "#include <iostream>\nint x = 1;\n#endif\n");
    }

    #[test]
    fn tabs_apply_to_new_lines_only() {
        let mut file = GeneratedFile::new(PathBuf::from("out.cpp"), 4);
        file.push_region_as_body();

        file.insert_line("{");
        file.push_tabs();
        file.begin_line();
        file.append("x");
        file.append(" = 1;");
        file.pop_tabs();
        file.insert_line("}");

        assert_eq!(file.generate(), "{\n    x = 1;\n}\n");
    }

    #[test]
    fn pop_tabs_saturates_at_zero() {
        let mut file = GeneratedFile::new(PathBuf::from("out.cpp"), 4);
        file.pop_tabs();
        file.push_region_as_body();
        file.insert_line("flat");
        assert_eq!(file.generate(), "flat\n");
    }
}
