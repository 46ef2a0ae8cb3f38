use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("OcrdFile {file} has no member 'mets' pointing to parent OcrdMets")]
    Ownership { file: String },

    #[error("file ID '{id}' already exists in the descriptor")]
    DuplicateId { id: String },

    #[error("invalid file ID '{id}': expected a letter or '_' followed by [A-Za-z0-9_.-]")]
    InvalidId { id: String },

    #[error("no file with ID '{id}'")]
    FileNotFound { id: String },

    #[error("no file group '{name}'")]
    FileGroupNotFound { name: String },

    #[error("file group '{name}' is not empty ({count} files), pass recursive to remove it")]
    FileGroupNotEmpty { name: String, count: usize },

    #[error("malformed descriptor XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("failed to serialize descriptor: {0}")]
    Serialize(String),

    #[error("invalid descriptor: {0}")]
    InvalidMets(String),

    #[error("invalid pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
