//! 결과 버퍼.
//!
//! 도착 순 최신 항목이 앞에 오는 용량 제한 버퍼. `VecDeque` 기반.
//! 용량을 넘으면 가장 오래 전에 도착한 항목을 뒤에서 제거한다.

use pingpong_core::models::ping::PingResult;
use std::collections::VecDeque;

/// 용량 제한 결과 버퍼 (최신 순)
#[derive(Debug, Clone)]
pub struct ResultBuffer {
    items: VecDeque<PingResult>,
    capacity: usize,
}

impl ResultBuffer {
    /// 새 버퍼 생성. 용량 0은 1로 취급한다.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 결과 추가 (앞에 삽입). 용량 초과로 제거된 항목을 반환
    pub fn push(&mut self, result: PingResult) -> Option<PingResult> {
        self.items.push_front(result);
        if self.items.len() > self.capacity {
            self.items.pop_back()
        } else {
            None
        }
    }

    /// 버퍼 비우기
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// 최대 용량
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 현재 크기
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 비어있는지
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 가장 최근 도착한 결과
    pub fn latest(&self) -> Option<&PingResult> {
        self.items.front()
    }

    /// 최신 순 순회
    pub fn iter(&self) -> impl Iterator<Item = &PingResult> {
        self.items.iter()
    }

    /// 최신 순 복제본
    pub fn to_vec(&self) -> Vec<PingResult> {
        self.items.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a ResultBuffer {
    type Item = &'a PingResult;
    type IntoIter = std::collections::vec_deque::Iter<'a, PingResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
