//! Where dictionaries come from.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

use super::word_list::WordListDictionary;
use crate::error::{DictionaryError, DictionaryResult};
use crate::language::Language;

const ENGLISH_WORDS: &str = include_str!("words/en.txt");
const SPANISH_WORDS: &str = include_str!("words/es.txt");

/// Loads the word list for a language.
///
/// Loading is synchronous; the engine runs it on the blocking pool.
pub trait DictionarySource: Send + Sync + fmt::Debug {
    /// Load the dictionary for `language`.
    fn load(&self, language: Language) -> DictionaryResult<WordListDictionary>;
}

/// Word lists compiled into the binary (English and Spanish).
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledDictionaries;

impl DictionarySource for BundledDictionaries {
    fn load(&self, language: Language) -> DictionaryResult<WordListDictionary> {
        let content = match language {
            Language::English => ENGLISH_WORDS,
            Language::Spanish => SPANISH_WORDS,
            Language::French | Language::German => {
                return Err(DictionaryError::Unavailable(language));
            }
        };
        Ok(WordListDictionary::from_text(language, content))
    }
}

/// Word lists read from `<dir>/<code>.txt`, one word per line, most frequent first.
#[derive(Debug, Clone)]
pub struct DirectoryDictionaries {
    dir: Utf8PathBuf,
}

impl DirectoryDictionaries {
    /// Read dictionaries from `dir`.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory searched for word lists.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }
}

impl DictionarySource for DirectoryDictionaries {
    fn load(&self, language: Language) -> DictionaryResult<WordListDictionary> {
        let path = self.dir.join(format!("{}.txt", language.code()));
        tracing::debug!(path = %path, "reading dictionary");
        let content = std::fs::read_to_string(&path)
            .map_err(|source| DictionaryError::Io { path, source })?;
        Ok(WordListDictionary::from_text(language, &content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::SpellDictionary;

    #[test]
    fn bundled_covers_english_and_spanish() {
        let en = BundledDictionaries.load(Language::English).unwrap();
        assert!(en.len() > 1000);
        assert!(en.is_correct("the"));
        assert!(!en.is_correct("teh"));

        let es = BundledDictionaries.load(Language::Spanish).unwrap();
        assert!(es.is_correct("perro"));
        assert!(es.is_correct("también"));
    }

    #[test]
    fn bundled_rejects_languages_without_lists() {
        let err = BundledDictionaries.load(Language::French).unwrap_err();
        assert!(matches!(err, DictionaryError::Unavailable(Language::French)));
    }

    #[test]
    fn directory_reads_code_named_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("en.txt"), "alpha\nbeta\n").unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let source = DirectoryDictionaries::new(dir.clone());
        assert_eq!(source.dir(), dir);

        let dict = source.load(Language::English).unwrap();
        assert_eq!(dict.len(), 2);
        assert!(dict.is_correct("Beta"));
    }

    #[test]
    fn directory_missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let err = DirectoryDictionaries::new(dir)
            .load(Language::Spanish)
            .unwrap_err();
        match err {
            DictionaryError::Io { path, .. } => assert!(path.as_str().ends_with("es.txt")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
