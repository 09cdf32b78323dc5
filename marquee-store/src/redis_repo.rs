use redis::RedisResult;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

// INCR plus EXPIRE NX: the TTL is set when the counter is created and left
// alone afterwards, so the window ends on schedule for a steadily active
// client instead of sliding forward with every request.
fn rate_limit_pipeline(key: &str, window_seconds: i64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1)
        .cmd("EXPIRE")
        .arg(key)
        .arg(window_seconds)
        .arg("NX")
        .ignore();
    pipe
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Fixed-window counter. Returns true while the caller is under the
    /// limit for the current window.
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = rate_limit_pipeline(key, window_seconds)
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_set_only_when_the_counter_is_created() {
        let packed = rate_limit_pipeline("ratelimit:1.2.3.4", 60).get_packed_pipeline();
        let text = String::from_utf8_lossy(&packed);
        assert!(text.contains("INCR"));
        assert!(text.contains("EXPIRE"));
        assert!(text.contains("NX"));
    }
}
