use crate::config::Lang;

/// Identity of one translated chunk: 32 hex chars of MD5 over the chunk,
/// the backend name (case-insensitive), the model and the language pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(chunk: &str, translator: &str, model: &str, source: &Lang, target: &Lang) -> Self {
        let translator = translator.to_lowercase();
        let mut hasher = md5::Context::new();
        for (i, part) in [chunk, translator.as_str(), model, source.as_str(), target.as_str()]
            .into_iter()
            .enumerate()
        {
            // NUL between fields so ("ab", "c") and ("a", "bc") differ
            if i > 0 {
                hasher.consume([0u8]);
            }
            hasher.consume(part.as_bytes());
        }
        Self(format!("{:x}", hasher.compute()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
