use std::path::PathBuf;

use url::Url;

/// Where a manifest's candidates come from (§4.3). Classification only
/// distinguishes remote from local; the choice between a single unpacked
/// dist and a directory of dists is made at acquisition time, based on
/// whether `<path>/dist.info` exists.
#[derive(Debug, Clone)]
pub enum Locator {
    Http(Url),
    Local(PathBuf),
}

impl Locator {
    pub fn parse(raw: &str) -> Locator {
        if let Ok(url) = Url::parse(raw) {
            match url.scheme() {
                "http" | "https" => return Locator::Http(url),
                "file" => {
                    if let Ok(path) = url.to_file_path() {
                        return Locator::Local(path);
                    }
                }
                _ => {}
            }
        }
        Locator::Local(PathBuf::from(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_http_url() {
        assert!(matches!(Locator::parse("https://repo.example/dists"), Locator::Http(_)));
    }

    #[test]
    fn classifies_bare_path_as_local() {
        assert!(matches!(Locator::parse("/opt/repo"), Locator::Local(_)));
    }

    #[test]
    fn classifies_file_url_as_local() {
        assert!(matches!(Locator::parse("file:///opt/repo"), Locator::Local(_)));
    }
}
