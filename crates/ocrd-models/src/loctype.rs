use std::fmt;
use std::str::FromStr;

/// METS `LOCTYPE` vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Loctype {
    Ark,
    Urn,
    Url,
    Purl,
    Handle,
    Doi,
    #[default]
    Other,
}

impl Loctype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ark => "ARK",
            Self::Urn => "URN",
            Self::Url => "URL",
            Self::Purl => "PURL",
            Self::Handle => "HANDLE",
            Self::Doi => "DOI",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for Loctype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown LOCTYPE: {0}")]
pub struct LoctypeError(pub String);

impl FromStr for Loctype {
    type Err = LoctypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ARK" => Ok(Self::Ark),
            "URN" => Ok(Self::Urn),
            "URL" => Ok(Self::Url),
            "PURL" => Ok(Self::Purl),
            "HANDLE" => Ok(Self::Handle),
            "DOI" => Ok(Self::Doi),
            "OTHER" => Ok(Self::Other),
            other => Err(LoctypeError(other.to_string())),
        }
    }
}
