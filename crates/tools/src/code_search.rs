//! Code search tool: regex search across a source tree.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex_lite::{Regex, RegexBuilder};
use termpilot_core::error::ToolError;
use termpilot_core::tool::{Tool, ToolArguments, ToolResult};

use crate::args::{optional_bool, optional_str, required_str, resolve_path};

const MAX_MATCHES: usize = 100;
const MAX_LINE_CHARS: usize = 200;

const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    ".next",
    "dist",
    "build",
    ".eggs",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "pdf", "woff", "woff2", "ttf", "zip", "tar", "gz", "exe",
    "dll", "so", "dylib", "rlib", "pyc",
];

#[derive(Debug, Default)]
pub struct CodeSearchTool;

impl CodeSearchTool {
    pub fn new() -> Self {
        Self
    }
}

fn skip_dir(name: &str) -> bool {
    SKIP_DIRS.contains(&name) || name.ends_with(".egg-info")
}

fn is_binary(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| BINARY_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Shell-style filename match supporting `*` and `?`.
pub(crate) fn glob_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ni < n.len() {
        match p.get(pi) {
            Some('*') => {
                backtrack = Some((pi, ni));
                pi += 1;
            }
            Some(&c) if c == '?' || c == n[ni] => {
                pi += 1;
                ni += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    pi = star + 1;
                    ni = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

struct Search {
    regex: Regex,
    glob: Option<String>,
    root: PathBuf,
    matches: Vec<String>,
}

impl Search {
    fn full(&self) -> bool {
        self.matches.len() >= MAX_MATCHES
    }

    fn visit_dir(&mut self, dir: &Path) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            if self.full() {
                return;
            }
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                if !skip_dir(&entry.file_name().to_string_lossy()) {
                    self.visit_dir(&path);
                }
            } else if file_type.is_file() {
                self.visit_file(&path);
            }
        }
    }

    fn visit_file(&mut self, path: &Path) {
        if is_binary(path) {
            return;
        }
        if let Some(glob) = &self.glob {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            if !glob_match(glob, &name) {
                return;
            }
        }
        let Ok(bytes) = std::fs::read(path) else {
            return;
        };
        let text = String::from_utf8_lossy(&bytes);
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let rel = if rel.as_os_str().is_empty() {
            path.file_name().map(Path::new).unwrap_or(path)
        } else {
            rel
        };

        for (i, line) in text.lines().enumerate() {
            if self.full() {
                return;
            }
            if self.regex.is_match(line) {
                let trimmed: String = line.trim().chars().take(MAX_LINE_CHARS).collect();
                self.matches.push(format!("{}:{}: {trimmed}", rel.display(), i + 1));
            }
        }
    }
}

#[async_trait]
impl Tool for CodeSearchTool {
    fn name(&self) -> &str {
        "code_search"
    }

    fn description(&self) -> &str {
        "Search for a regex pattern across files in a directory. Returns matching \
         lines with file paths and line numbers. Skips VCS, dependency and build \
         directories as well as binary files."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regular expression to search for."
                },
                "path": {
                    "type": "string",
                    "description": "File or directory to search in. Defaults to the current directory."
                },
                "glob": {
                    "type": "string",
                    "description": "Only search files whose name matches this glob, e.g. '*.rs'."
                },
                "case_insensitive": {
                    "type": "boolean",
                    "description": "Match without regard to case. Default false."
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, arguments: ToolArguments) -> Result<ToolResult, ToolError> {
        let pattern = required_str(&arguments, "pattern")?;
        let raw_path = optional_str(&arguments, "path").unwrap_or(".");
        let path = resolve_path(raw_path);

        let regex = match RegexBuilder::new(pattern)
            .case_insensitive(optional_bool(&arguments, "case_insensitive"))
            .build()
        {
            Ok(regex) => regex,
            Err(e) => {
                return Ok(ToolResult::error(format!("Error: Invalid regex pattern: {e}")));
            }
        };

        if !path.exists() {
            return Ok(ToolResult::error(format!("Error: Path not found: {}", path.display())));
        }

        let mut search = Search {
            regex,
            glob: optional_str(&arguments, "glob").map(str::to_string),
            root: path.clone(),
            matches: Vec::new(),
        };

        let matches = tokio::task::spawn_blocking(move || {
            if search.root.is_dir() {
                let root = search.root.clone();
                search.visit_dir(&root);
            } else {
                let file = search.root.clone();
                search.visit_file(&file);
            }
            search.matches
        })
        .await
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: "code_search".into(),
            reason: e.to_string(),
        })?;

        if matches.is_empty() {
            return Ok(ToolResult::success(format!(
                "No matches found for pattern '{pattern}' in {raw_path}"
            )));
        }

        let limited = if matches.len() >= MAX_MATCHES {
            format!(" (limited to {MAX_MATCHES})")
        } else {
            String::new()
        };
        Ok(ToolResult::success(format!(
            "Found {} match(es){limited}\n\n{}",
            matches.len(),
            matches.join("\n")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::test_args;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("target/debug")).unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(
            dir.path().join("src/main.rs"),
            "fn main() {\n    let config = load();\n}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("src/notes.md"), "Config notes\n").unwrap();
        std::fs::write(dir.path().join("target/debug/out.rs"), "let config = 1;\n").unwrap();
        std::fs::write(dir.path().join(".git/config"), "config\n").unwrap();
        std::fs::write(dir.path().join("logo.png"), "config").unwrap();
        dir
    }

    async fn search(args: serde_json::Value) -> ToolResult {
        CodeSearchTool::new().execute(test_args(args)).await.unwrap()
    }

    #[test]
    fn globbing() {
        assert!(glob_match("*.rs", "main.rs"));
        assert!(!glob_match("*.rs", "main.rsx"));
        assert!(glob_match("test_?.py", "test_a.py"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b*c", "axxbyy"));
    }

    #[tokio::test]
    async fn finds_matches_and_skips_build_dirs() {
        let dir = fixture();
        let result = search(serde_json::json!({
            "pattern": "config",
            "path": dir.path().to_str().unwrap()
        }))
        .await;

        assert!(!result.is_error);
        assert!(result.content.starts_with("Found 1 match(es)\n\n"));
        assert!(result.content.contains("main.rs:2: let config = load();"));
        assert!(!result.content.contains("out.rs"));
        assert!(!result.content.contains(".git"));
        assert!(!result.content.contains("logo.png"));
    }

    #[tokio::test]
    async fn case_insensitive_and_glob_filter() {
        let dir = fixture();
        let result = search(serde_json::json!({
            "pattern": "config",
            "path": dir.path().to_str().unwrap(),
            "case_insensitive": true,
            "glob": "*.md"
        }))
        .await;

        assert!(result.content.starts_with("Found 1 match(es)"));
        assert!(result.content.contains("notes.md:1: Config notes"));
    }

    #[tokio::test]
    async fn single_file_path() {
        let dir = fixture();
        let result = search(serde_json::json!({
            "pattern": "fn main",
            "path": dir.path().join("src/main.rs").to_str().unwrap()
        }))
        .await;
        assert!(result.content.contains("main.rs:1: fn main() {"));
    }

    #[tokio::test]
    async fn match_cap() {
        let dir = tempfile::tempdir().unwrap();
        let body: String = (0..150).map(|i| format!("hit {i}\n")).collect();
        std::fs::write(dir.path().join("many.txt"), body).unwrap();

        let result = search(serde_json::json!({
            "pattern": "hit",
            "path": dir.path().to_str().unwrap()
        }))
        .await;
        assert!(result.content.starts_with("Found 100 match(es) (limited to 100)"));
        assert_eq!(result.content.lines().count(), 102);
    }

    #[tokio::test]
    async fn no_matches() {
        let dir = fixture();
        let result = search(serde_json::json!({
            "pattern": "zzz_nothing",
            "path": dir.path().to_str().unwrap()
        }))
        .await;
        assert!(!result.is_error);
        assert!(result.content.starts_with("No matches found for pattern 'zzz_nothing'"));
    }

    #[tokio::test]
    async fn invalid_regex() {
        let result = search(serde_json::json!({ "pattern": "(unclosed" })).await;
        assert!(result.is_error);
        assert!(result.content.starts_with("Error: Invalid regex pattern"));
    }
}
