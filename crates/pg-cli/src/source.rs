use std::future::Future;

use pg_core::dataset::{DatasetLoadError, DatasetSource, FileSource};

/// Dataset served over HTTP(S).
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: &str) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("phishguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl DatasetSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, DatasetLoadError>> + Send {
        async move {
            let response = self
                .client
                .get(&self.url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| DatasetLoadError::Transport(format!("GET {}: {}", self.url, e)))?;
            let body = response
                .bytes()
                .await
                .map_err(|e| DatasetLoadError::Transport(format!("GET {}: {}", self.url, e)))?;
            Ok(body.to_vec())
        }
    }
}

/// A `--dataset` argument: URL or local path.
pub enum CliSource {
    Http(HttpSource),
    File(FileSource),
}

impl CliSource {
    pub fn parse(location: &str) -> Result<Self, String> {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(Self::Http(HttpSource::new(location)?))
        } else {
            Ok(Self::File(FileSource::new(location)))
        }
    }
}

impl DatasetSource for CliSource {
    fn describe(&self) -> String {
        match self {
            Self::Http(source) => source.describe(),
            Self::File(source) => source.describe(),
        }
    }

    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, DatasetLoadError>> + Send {
        async move {
            match self {
                Self::Http(source) => source.fetch().await,
                Self::File(source) => source.fetch().await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        assert!(matches!(CliSource::parse("https://example.com/data.json"), Ok(CliSource::Http(_))));
        assert!(matches!(CliSource::parse("HTTP://example.com/data.json"), Ok(CliSource::Http(_))));
        assert!(matches!(CliSource::parse("./data.json"), Ok(CliSource::File(_))));
        assert!(matches!(CliSource::parse("/var/lib/phishguard/data.json"), Ok(CliSource::File(_))));
    }

    #[test]
    fn test_describe() {
        let source = CliSource::parse("https://example.com/data.json").unwrap();
        assert_eq!(source.describe(), "https://example.com/data.json");
    }
}
