// src/execution/language.rs

//! User-facing language names and their per-provider tokens.

/// A language the execution providers understand, identified by its
/// canonical (Piston) name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    canonical: &'static str,
}

/// Alias → canonical name. Lookup is case-insensitive.
const ALIASES: &[(&str, &str)] = &[
    ("c", "c"),
    ("cpp", "cpp"),
    ("c++", "cpp"),
    ("python", "python"),
    ("python3", "python"),
    ("java", "java"),
    ("javascript", "javascript"),
    ("js", "javascript"),
    ("nodejs", "javascript"),
    ("php", "php"),
    ("ruby", "ruby"),
    ("go", "go"),
    ("rust", "rust"),
    ("swift", "swift"),
    ("kotlin", "kotlin"),
    ("typescript", "typescript"),
    ("ts", "typescript"),
    ("csharp", "csharp"),
    ("cs", "csharp"),
    ("dart", "dart"),
    ("lua", "lua"),
    ("perl", "perl"),
    ("r", "r"),
    ("scala", "scala"),
];

impl Language {
    /// Resolve a caller-supplied language name.
    pub fn resolve(input: &str) -> Option<Self> {
        let wanted = input.trim().to_ascii_lowercase();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == wanted)
            .map(|(_, canonical)| Language {
                canonical: *canonical,
            })
    }

    /// Every accepted alias, in table order.
    pub fn supported_aliases() -> Vec<&'static str> {
        ALIASES.iter().map(|(alias, _)| *alias).collect()
    }

    /// `(alias, canonical)` pairs for listing.
    pub fn alias_table() -> &'static [(&'static str, &'static str)] {
        ALIASES
    }

    pub fn canonical(&self) -> &'static str {
        self.canonical
    }

    /// Piston accepts the canonical names directly.
    pub fn piston_token(&self) -> &'static str {
        self.canonical
    }

    /// CodeX names two runtimes differently.
    pub fn codex_token(&self) -> &'static str {
        match self.canonical {
            "python" => "python3",
            "javascript" => "nodejs",
            other => other,
        }
    }

    /// Judge0 only gets the small subset it is known to run.
    pub fn judge0_id(&self) -> Option<u32> {
        match self.canonical {
            "c" => Some(50),
            "cpp" => Some(54),
            "python" => Some(71),
            "javascript" => Some(63),
            "java" => Some(62),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_case_insensitively() {
        assert_eq!(Language::resolve("JS").unwrap().canonical(), "javascript");
        assert_eq!(Language::resolve(" Python3 ").unwrap().canonical(), "python");
        assert_eq!(Language::resolve("C++").unwrap().canonical(), "cpp");
        assert!(Language::resolve("py").is_none());
        assert!(Language::resolve("brainfuck").is_none());
    }

    #[test]
    fn provider_tokens() {
        let py = Language::resolve("python").unwrap();
        assert_eq!(py.piston_token(), "python");
        assert_eq!(py.codex_token(), "python3");
        assert_eq!(py.judge0_id(), Some(71));

        let rust = Language::resolve("rust").unwrap();
        assert_eq!(rust.codex_token(), "rust");
        assert_eq!(rust.judge0_id(), None);
    }

    #[test]
    fn every_alias_is_listed() {
        let aliases = Language::supported_aliases();
        assert_eq!(aliases.len(), ALIASES.len());
        assert!(aliases.contains(&"nodejs"));
        for alias in aliases {
            assert!(Language::resolve(alias).is_some(), "{} should resolve", alias);
        }
    }
}
