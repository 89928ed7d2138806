// JSON scalar field masker
// Author: kelexine (https://github.com/kelexine)

use super::{mask_secret, Masker, DEFAULT_UNMASKED};
use http::Request;
use regex::{NoExpand, Regex};
use tracing::warn;

/// Masks the values of named JSON scalar fields found in the dump text.
///
/// A value is `null`, `true`, `false`, an integer or a string. As with
/// [`super::QueryMasker`], the first match decides the replacement for every
/// occurrence of the field.
#[derive(Debug, Clone)]
pub struct JsonMasker {
    fields: Vec<Regex>,
    unmasked: usize,
}

impl JsonMasker {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(Into::into)
            .filter_map(|name: String| {
                let pattern = format!(
                    r#"("{}"\s*:\s*"?)(null|true|false|\d+|[^"]+)(")?"#,
                    regex::escape(&name)
                );
                match Regex::new(&pattern) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!("Skipping JSON field {:?}: {}", name, e);
                        None
                    }
                }
            })
            .collect();

        Self {
            fields,
            unmasked: DEFAULT_UNMASKED,
        }
    }

    /// Sets how many trailing characters of each value stay visible.
    pub fn with_unmasked(mut self, unmasked: usize) -> Self {
        self.unmasked = unmasked;
        self
    }
}

impl Masker for JsonMasker {
    fn mask(&self, _request: &Request<()>, dump: &mut String) {
        for re in &self.fields {
            let Some(caps) = re.captures(dump) else {
                continue;
            };

            let replacement = format!(
                "{}{}{}",
                &caps[1],
                mask_secret(&caps[2], self.unmasked),
                caps.get(3).map_or("", |m| m.as_str())
            );
            let rewritten = re.replace_all(dump, NoExpand(&replacement)).into_owned();
            *dump = rewritten;
        }
    }
}
