//! Choosing a backend from the database URL scheme.

use std::path::PathBuf;

use anyhow::bail;

/// Where a database URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  /// A `postgres://` or `postgresql://` URL, passed through unchanged.
  Postgres(String),
  /// `sqlite::memory:` / `sqlite://:memory:`.
  SqliteMemory,
  /// `sqlite://path` or `sqlite:path`.
  SqliteFile(PathBuf),
}

impl Target {
  pub fn parse(url: &str) -> anyhow::Result<Self> {
    let url = url.trim();

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
      return Ok(Target::Postgres(url.to_owned()));
    }

    if let Some(rest) = url
      .strip_prefix("sqlite://")
      .or_else(|| url.strip_prefix("sqlite:"))
    {
      return match rest {
        "" => bail!("sqlite URL {url:?} has no path"),
        ":memory:" => Ok(Target::SqliteMemory),
        path => Ok(Target::SqliteFile(PathBuf::from(path))),
      };
    }

    let scheme = url.split_once("://").map_or(url, |(scheme, _)| scheme);
    bail!(
      "unsupported database URL scheme {scheme:?}; expected postgres://, \
       postgresql:// or sqlite:"
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn postgres_urls() {
    let url = "postgresql://u:p@host:5432/db";
    assert_eq!(Target::parse(url).unwrap(), Target::Postgres(url.into()));
    assert!(matches!(
      Target::parse("postgres://host/db").unwrap(),
      Target::Postgres(_)
    ));
  }

  #[test]
  fn sqlite_urls() {
    assert_eq!(Target::parse("sqlite::memory:").unwrap(), Target::SqliteMemory);
    assert_eq!(
      Target::parse("sqlite://:memory:").unwrap(),
      Target::SqliteMemory
    );
    assert_eq!(
      Target::parse("sqlite://data/docs.db").unwrap(),
      Target::SqliteFile("data/docs.db".into())
    );
    assert_eq!(
      Target::parse("sqlite:///var/lib/docs.db").unwrap(),
      Target::SqliteFile("/var/lib/docs.db".into())
    );
    assert!(Target::parse("sqlite://").is_err());
  }

  #[test]
  fn unknown_scheme_is_rejected() {
    let err = Target::parse("mysql://host/db").unwrap_err();
    assert!(err.to_string().contains("\"mysql\""), "{err}");
  }
}
