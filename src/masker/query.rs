// Query-string parameter masker
// Author: kelexine (https://github.com/kelexine)

use super::{mask_secret, Masker, DEFAULT_UNMASKED};
use http::Request;
use regex::{NoExpand, Regex};
use tracing::warn;

/// Masks the values of named query-string parameters.
///
/// The value is taken from the request's raw query. Only the first
/// occurrence of a parameter is used: every `name=value` in the dump is
/// replaced with the masked form of that first value, even when the
/// parameter repeats with different values.
#[derive(Debug, Clone)]
pub struct QueryMasker {
    params: Vec<(String, Regex)>,
    unmasked: usize,
}

impl QueryMasker {
    pub fn new<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params = params
            .into_iter()
            .map(Into::into)
            .filter_map(|name: String| {
                match Regex::new(&format!(r"{}=([^&\s]+)", regex::escape(&name))) {
                    Ok(re) => Some((name, re)),
                    Err(e) => {
                        warn!("Skipping query parameter {:?}: {}", name, e);
                        None
                    }
                }
            })
            .collect();

        Self {
            params,
            unmasked: DEFAULT_UNMASKED,
        }
    }

    /// Sets how many trailing characters of each value stay visible.
    pub fn with_unmasked(mut self, unmasked: usize) -> Self {
        self.unmasked = unmasked;
        self
    }
}

impl Masker for QueryMasker {
    fn mask(&self, request: &Request<()>, dump: &mut String) {
        let query = request.uri().query().unwrap_or_default();

        for (name, re) in &self.params {
            let Some(caps) = re.captures(query) else {
                continue;
            };

            let replacement = format!("{}={}", name, mask_secret(&caps[1], self.unmasked));
            let rewritten = re.replace_all(dump, NoExpand(&replacement)).into_owned();
            *dump = rewritten;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY: &str = "secret=FA2C1234FFD5&password=mega-superPASS&param=10";

    fn request(query: &str) -> Request<()> {
        Request::builder()
            .uri(format!("http://example.com/user/151?{}", query))
            .body(())
            .unwrap()
    }

    fn dump(query: &str) -> String {
        format!("API exchange\nGET /user/151?{} HTTP/1.1\r\nHost: example.com\r\n\r\n\n", query)
    }

    #[test]
    fn test_masks_named_params() {
        let mut text = dump(QUERY);
        QueryMasker::new(["password", "secret"]).mask(&request(QUERY), &mut text);
        assert_eq!(
            text,
            dump("secret=*****234FFD5&password=*******perPASS&param=10")
        );
    }

    #[test]
    fn test_without_matches() {
        let mut text = dump(QUERY);
        QueryMasker::new(["name", "query"]).mask(&request(QUERY), &mut text);
        assert_eq!(text, dump(QUERY));
    }

    #[test]
    fn test_custom_unmasked_lengths() {
        let mut text = dump(QUERY);
        QueryMasker::new(["password", "secret"])
            .with_unmasked(3)
            .mask(&request(QUERY), &mut text);
        assert_eq!(text, dump("secret=*********FD5&password=***********ASS&param=10"));

        let mut text = dump(QUERY);
        QueryMasker::new(["password", "secret"])
            .with_unmasked(0)
            .mask(&request(QUERY), &mut text);
        assert_eq!(text, dump("secret=************&password=**************&param=10"));

        let mut text = dump(QUERY);
        QueryMasker::new(["password", "secret"])
            .with_unmasked(20)
            .mask(&request(QUERY), &mut text);
        assert_eq!(text, dump(QUERY));
    }

    #[test]
    fn test_repeated_param_uses_first_value() {
        let query = "token=AAAAAAAAAA11&token=BBBBBBBBBB22";
        let mut text = dump(query);
        QueryMasker::new(["token"]).mask(&request(query), &mut text);
        assert_eq!(text, dump("token=*****AAAAA11&token=*****AAAAA11"));
    }
}
