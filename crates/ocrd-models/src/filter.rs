use crate::error::{Error, Result};
use crate::mimetype;
use regex::Regex;

/// Prefix marking a filter value as a regular expression.
pub const REGEX_PREFIX: &str = "//";

/// Criteria for [`OcrdMets::find_files`](crate::OcrdMets::find_files).
///
/// Unset fields match everything. A value starting with `//` is a regular
/// expression that has to match the whole attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileFilter {
    pub file_grp: Option<String>,
    pub id: Option<String>,
    pub mimetype: Option<String>,
    pub url: Option<String>,
    pub page_id: Option<String>,
}

impl FileFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_grp(mut self, file_grp: impl Into<String>) -> Self {
        self.file_grp = Some(file_grp.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn page_id(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = Some(page_id.into());
        self
    }

    pub(crate) fn compile(&self) -> Result<CompiledFilter> {
        Ok(CompiledFilter {
            file_grp: Matcher::compile(self.file_grp.as_deref())?,
            id: Matcher::compile(self.id.as_deref())?,
            mimetype: Matcher::compile(self.mimetype.as_deref())?,
            url: Matcher::compile(self.url.as_deref())?,
            page_id: Matcher::compile(self.page_id.as_deref())?,
        })
    }
}

#[derive(Debug)]
pub(crate) enum Matcher {
    Any,
    Literal(String),
    Pattern(Regex),
}

impl Matcher {
    fn compile(value: Option<&str>) -> Result<Self> {
        let Some(value) = value else {
            return Ok(Self::Any);
        };
        match value.strip_prefix(REGEX_PREFIX) {
            Some(pattern) => Regex::new(&format!("^(?:{pattern})$"))
                .map(Self::Pattern)
                .map_err(|source| Error::Regex {
                    pattern: pattern.to_string(),
                    source,
                }),
            None => Ok(Self::Literal(value.to_string())),
        }
    }

    pub(crate) fn matches(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (_, None) => false,
            (Self::Literal(expected), Some(value)) => expected == value,
            (Self::Pattern(regex), Some(value)) => regex.is_match(value),
        }
    }

    pub(crate) fn matches_mimetype(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Self::Literal(expected), Some(value)) => mimetype::equivalent(expected, value),
            _ => self.matches(value),
        }
    }
}

#[derive(Debug)]
pub(crate) struct CompiledFilter {
    pub file_grp: Matcher,
    pub id: Matcher,
    pub mimetype: Matcher,
    pub url: Matcher,
    pub page_id: Matcher,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_pattern() {
        let literal = Matcher::compile(Some("OCR-D-IMG")).unwrap();
        assert!(literal.matches(Some("OCR-D-IMG")));
        assert!(!literal.matches(Some("OCR-D-IMG-BIN")));

        let pattern = Matcher::compile(Some("//OCR-D-IMG.*")).unwrap();
        assert!(pattern.matches(Some("OCR-D-IMG-BIN")));
        assert!(!pattern.matches(Some("X-OCR-D-IMG")));
        assert!(!pattern.matches(None));

        assert!(Matcher::compile(None).unwrap().matches(None));
    }

    #[test]
    fn invalid_pattern() {
        let err = FileFilter::new().id("//(").compile().unwrap_err();
        assert!(matches!(err, Error::Regex { .. }));
    }

    #[test]
    fn mimetype_literal_uses_synonyms() {
        let filter = FileFilter::new().mimetype("image/tif").compile().unwrap();
        assert!(filter.mimetype.matches_mimetype(Some("image/tiff")));
        assert!(!filter.mimetype.matches_mimetype(Some("image/png")));
    }
}
