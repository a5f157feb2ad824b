//! 横切关注点的包装函数
//!
//! 计时、重试都在调用处显式包一层，不依赖注解或反射

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// 超过这个时间的调用记为慢调用
const SLOW_CALL_THRESHOLD: Duration = Duration::from_secs(5);

/// 执行异步操作并记录耗时
pub async fn timed<F: Future>(label: &str, fut: F) -> F::Output {
    let start = Instant::now();
    let output = fut.await;
    let elapsed = start.elapsed();

    if elapsed >= SLOW_CALL_THRESHOLD {
        warn!("🐢 {} 耗时 {:.2?}", label, elapsed);
    } else {
        debug!("⏱ {} 耗时 {:.2?}", label, elapsed);
    }
    output
}

/// 失败后等待 `delay` 重试，最多执行 `attempts` 次
pub async fn with_retry<T, E, F, Fut>(
    label: &str,
    attempts: usize,
    delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(
                    "{} 失败 (尝试 {}/{}): {}，{:?} 后重试...",
                    label, attempt, attempts, e, delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
