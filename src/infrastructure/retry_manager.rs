//! 재시도 관리자 - 레코드 쓰기 재시도 정책과 시도 기록
//!
//! 고정 간격 재시도: 실패 후 마지막 시도가 아니면 `delay` 만큼 기다린 뒤
//! 다시 연결하고 재시도한다. 모든 시도는 쓰기 요청별로 기록된다.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

use crate::infrastructure::config::WriterConfig;

/// 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 첫 시도를 포함한 총 시도 횟수
    pub max_attempts: u32,
    /// 재시도 전 대기 시간
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&WriterConfig::default())
    }
}

impl From<&WriterConfig> for RetryPolicy {
    fn from(config: &WriterConfig) -> Self {
        Self {
            // at least one attempt, whatever the config says
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay(),
        }
    }
}

impl RetryPolicy {
    /// True when another attempt may follow `attempt` (1-based)
    pub const fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// 재시도 시도 기록
#[derive(Debug, Clone)]
pub struct RetryAttempt {
    pub attempt_number: u32,
    pub attempted_at: DateTime<Utc>,
    /// `None` on success
    pub error: Option<String>,
}

impl RetryAttempt {
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// 한 번의 쓰기 요청에 대한 시도 기록
#[derive(Debug, Clone)]
struct ItemHistory {
    item_id: String,
    attempts: Vec<RetryAttempt>,
}

/// 재시도 관리자
///
/// 같은 항목 ID가 여러 번 들어와도 `begin_item` 호출마다 별도의 기록을 만든다.
#[derive(Debug, Clone, Default)]
pub struct RetryManager {
    policy: RetryPolicy,
    retry_history: Vec<ItemHistory>,
}

impl RetryManager {
    /// 새 재시도 관리자 생성
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            retry_history: Vec::new(),
        }
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 새 항목 기록 시작; 반환된 슬롯으로 시도를 기록한다
    pub fn begin_item(&mut self, item_id: &str) -> usize {
        self.retry_history.push(ItemHistory {
            item_id: item_id.to_string(),
            attempts: Vec::new(),
        });
        self.retry_history.len() - 1
    }

    /// 시도 결과 기록
    ///
    /// Unknown slots are ignored and report attempt 0.
    pub fn record_attempt(&mut self, slot: usize, error: Option<String>) -> u32 {
        let max_attempts = self.policy.max_attempts;
        let Some(item) = self.retry_history.get_mut(slot) else {
            return 0;
        };
        let attempt_number = u32::try_from(item.attempts.len()).unwrap_or(u32::MAX - 1) + 1;

        debug!(
            "🔄 {} attempt {}/{}: {}",
            item.item_id,
            attempt_number,
            max_attempts,
            error.as_deref().unwrap_or("ok")
        );

        item.attempts.push(RetryAttempt {
            attempt_number,
            attempted_at: Utc::now(),
            error,
        });
        attempt_number
    }

    /// 슬롯의 시도 기록 조회
    pub fn attempts(&self, slot: usize) -> &[RetryAttempt] {
        self.retry_history
            .get(slot)
            .map(|item| item.attempts.as_slice())
            .unwrap_or(&[])
    }

    /// 재시도 통계 조회
    pub fn stats(&self) -> RetryStats {
        let mut stats = RetryStats {
            max_attempts: self.policy.max_attempts,
            total_items: self.retry_history.len(),
            ..RetryStats::default()
        };

        for ItemHistory { attempts, .. } in &self.retry_history {
            stats.total_attempts += attempts.len();
            stats.failed_attempts += attempts.iter().filter(|a| !a.succeeded()).count();

            match attempts.last() {
                Some(last) if last.succeeded() && attempts.len() > 1 => {
                    stats.recovered_items += 1;
                }
                Some(last) if last.succeeded() => stats.first_try_items += 1,
                Some(_) => stats.exhausted_items += 1,
                None => {}
            }
        }

        stats
    }
}

/// 재시도 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RetryStats {
    pub total_items: usize,
    pub total_attempts: usize,
    pub failed_attempts: usize,
    /// Succeeded on the first attempt
    pub first_try_items: usize,
    /// Succeeded after at least one failure
    pub recovered_items: usize,
    /// Last recorded attempt failed
    pub exhausted_items: usize,
    pub max_attempts: u32,
}
