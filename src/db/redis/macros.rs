/// Read-through caching around an async block.
///
/// On a hit the cached value is returned; on a miss `$block` is awaited and
/// its value queued for storage with `$ttl` seconds to live. Errors from the
/// block are propagated with `?`, so the caller must return `AppResult`.
///
/// ```rust,ignore
/// let movie: Movie = cached!(self.cache, CacheKey::Movie(id), TITLE_CACHE_TTL, async move {
///     self.fetch_movie(id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get(&key).await {
            Some(hit) => Ok(hit),
            None => {
                let value = $block.await?;
                $cache.put(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
