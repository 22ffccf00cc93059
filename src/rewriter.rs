//! Substitution engine and atomic file replace
//!
//! All mapping keys are compiled into ONE alternation, longest key first,
//! and applied in a single pass. A replacement value is therefore never
//! re-scanned by another key, which a naive per-key loop over the same
//! buffer would do (a second key matching text introduced by the first
//! key's replacement).
//!
//! The engine works on raw bytes, not strings: Java .properties files are
//! ISO 8859-1, so file content is not required to be valid UTF-8. Only the
//! mapping keys and replacement values (which come from JSON) are UTF-8.
//!
//! Files are replaced atomically: full content goes to a temp file in the
//! destination's directory, then one rename. The destination path never
//! holds a partially-written result.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::bytes::{Captures, Regex};
use tempfile::NamedTempFile;

use crate::mapping::JarMapping;

/// Single-pass literal substituter over a jar mapping.
pub struct Substituter {
    // None when the mapping has no usable keys; apply() is then a no-op.
    pattern: Option<Regex>,
    replacements: HashMap<Vec<u8>, Vec<u8>>,
}

impl Substituter {
    pub fn new(mapping: &JarMapping) -> Result<Self> {
        let mut keys: Vec<&str> = mapping
            .keys()
            .map(String::as_str)
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Ok(Self {
                pattern: None,
                replacements: HashMap::new(),
            });
        }

        // Longest key first, so a key that is a prefix of another never
        // shadows it (the regex alternation is tried in branch order).
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&alternation)
            .context("compiling combined jar-mapping pattern")?;

        let replacements = mapping
            .iter()
            .map(|(original, entry)| {
                (original.as_bytes().to_vec(), entry.jar.as_bytes().to_vec())
            })
            .collect();

        Ok(Self {
            pattern: Some(pattern),
            replacements,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    /// Replace every occurrence of every mapping key with its `jar` value.
    /// Replacement text is literal, `$` has no special meaning. Bytes
    /// outside the matched keys pass through untouched, valid UTF-8 or not.
    pub fn apply<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        match &self.pattern {
            Some(re) => re.replace_all(content, |caps: &Captures| {
                self.replacements
                    .get(&caps[0])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_vec())
            }),
            None => Cow::Borrowed(content),
        }
    }
}

/// Rewrite one properties file in place via a temp file in the same
/// directory. Returns the temp path that was renamed over the original.
pub fn rewrite_file(path: &Path, subst: &Substituter) -> Result<PathBuf> {
    let content = fs::read(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let rewritten = subst.apply(&content);

    // Same directory as the destination, so persist() is a same-filesystem
    // rename and cannot fall back to a non-atomic copy.
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))
        .with_context(|| format!("creating temp file beside {}", path.display()))?;
    tmp.write_all(&rewritten)
        .with_context(|| format!("writing temp file for {}", path.display()))?;

    let tmp_path = tmp.path().to_path_buf();
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;

    Ok(tmp_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::JarEntry;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn mapping_of(entries: &[(&str, &str)]) -> JarMapping {
        entries
            .iter()
            .map(|(original, jar)| {
                (
                    original.to_string(),
                    JarEntry {
                        jar: jar.to_string(),
                        package: None,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_single_occurrence_replaced() {
        let mapping = mapping_of(&[("foo.jar", "/usr/share/java/foo.jar")]);
        let subst = Substituter::new(&mapping).unwrap();

        assert_eq!(
            subst.apply(b"classpath=./lib/foo.jar").as_ref(),
            &b"classpath=./lib//usr/share/java/foo.jar"[..]
        );
    }

    #[test]
    fn test_content_without_key_unchanged() {
        let mapping = mapping_of(&[("foo.jar", "/usr/share/java/foo.jar")]);
        let subst = Substituter::new(&mapping).unwrap();

        let content = b"classpath=./lib/bar.jar\nother=value\n";
        assert!(matches!(subst.apply(content), Cow::Borrowed(_)));
    }

    #[test]
    fn test_key_dot_is_literal() {
        // "foo.jar" must not match "fooXjar" via the regex dot
        let mapping = mapping_of(&[("foo.jar", "REPLACED")]);
        let subst = Substituter::new(&mapping).unwrap();

        assert_eq!(
            subst.apply(b"fooXjar foo.jar").as_ref(),
            &b"fooXjar REPLACED"[..]
        );
    }

    #[test]
    fn test_longest_key_wins() {
        let mapping = mapping_of(&[
            ("foo.jar", "SHORT"),
            ("foo.jar.old", "LONG"),
        ]);
        let subst = Substituter::new(&mapping).unwrap();

        assert_eq!(
            subst.apply(b"a=foo.jar.old b=foo.jar").as_ref(),
            &b"a=LONG b=SHORT"[..]
        );
    }

    #[test]
    fn test_no_cross_contamination() {
        // The replacement for a.jar contains the text "b.jar"; a single
        // combined pass must not feed it back into the b.jar rule.
        let mapping = mapping_of(&[
            ("a.jar", "/usr/share/java/b.jar"),
            ("b.jar", "WRONG"),
        ]);
        let subst = Substituter::new(&mapping).unwrap();

        assert_eq!(
            subst.apply(b"cp=a.jar").as_ref(),
            &b"cp=/usr/share/java/b.jar"[..]
        );
    }

    #[test]
    fn test_replacement_dollar_is_literal() {
        let mapping = mapping_of(&[("foo.jar", "${JAVA_HOME}/$1.jar")]);
        let subst = Substituter::new(&mapping).unwrap();

        assert_eq!(
            subst.apply(b"x=foo.jar").as_ref(),
            &b"x=${JAVA_HOME}/$1.jar"[..]
        );
    }

    #[test]
    fn test_empty_mapping_is_noop() {
        let mapping = JarMapping::new();
        let subst = Substituter::new(&mapping).unwrap();

        assert!(subst.is_empty());
        assert_eq!(subst.apply(b"anything=goes").as_ref(), &b"anything=goes"[..]);
    }

    #[test]
    fn test_non_utf8_bytes_pass_through() {
        // ISO 8859-1 bytes around a key survive byte-for-byte
        let mapping = mapping_of(&[("foo.jar", "/usr/share/java/foo.jar")]);
        let subst = Substituter::new(&mapping).unwrap();

        assert_eq!(
            subst.apply(b"# caf\xE9\ncp=foo.jar\n").as_ref(),
            &b"# caf\xE9\ncp=/usr/share/java/foo.jar\n"[..]
        );
    }

    #[test]
    fn test_rewrite_file_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("build.properties");
        std::fs::write(&path, "classpath=./lib/foo.jar:./lib/keep.jar\n").unwrap();

        let mapping = mapping_of(&[("foo.jar", "/usr/share/java/foo.jar")]);
        let subst = Substituter::new(&mapping).unwrap();

        let tmp_path = rewrite_file(&path, &subst).unwrap();
        // temp file was renamed away, destination holds the new content
        assert!(!tmp_path.exists());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "classpath=./lib//usr/share/java/foo.jar:./lib/keep.jar\n"
        );
    }

    #[test]
    fn test_rewrite_latin1_file_in_place() {
        // Java .properties files are ISO 8859-1; a comment with an accented
        // byte must not abort the run, and must survive the rewrite.
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.properties");
        std::fs::write(&path, b"# caf\xE9\ncp=foo.jar\n").unwrap();

        let mapping = mapping_of(&[("foo.jar", "/usr/share/java/foo.jar")]);
        let subst = Substituter::new(&mapping).unwrap();

        rewrite_file(&path, &subst).unwrap();
        assert_eq!(
            std::fs::read(&path).unwrap(),
            b"# caf\xE9\ncp=/usr/share/java/foo.jar\n"
        );
    }

    #[test]
    fn test_rewrite_missing_file_fails() {
        let dir = tempdir().unwrap();
        let mapping = mapping_of(&[("foo.jar", "x")]);
        let subst = Substituter::new(&mapping).unwrap();

        let err = rewrite_file(&dir.path().join("absent.properties"), &subst).unwrap_err();
        assert!(err.to_string().contains("absent.properties"));
    }

    proptest! {
        // Keys below are uppercase, generated content is lowercase-only, so
        // no key can occur and the pass must be byte-for-byte identity.
        #[test]
        fn prop_unrelated_content_unchanged(content in "[a-z0-9=./:\\n -]{0,200}") {
            let mapping = mapping_of(&[
                ("FOO.JAR", "/usr/share/java/foo.jar"),
                ("BAR.JAR", "/usr/share/java/bar.jar"),
            ]);
            let subst = Substituter::new(&mapping).unwrap();
            let applied = subst.apply(content.as_bytes());
            prop_assert_eq!(applied.as_ref(), content.as_bytes());
        }
    }
}
