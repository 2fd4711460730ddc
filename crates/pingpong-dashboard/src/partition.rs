//! 워커별 분할 뷰.
//!
//! 버퍼 순서를 유지한 채 워커 ID로 결과를 나눈다. 순수 함수이며
//! 같은 버퍼에서 다시 계산하면 같은 결과가 나온다.

use pingpong_core::models::ping::PingResult;
use std::collections::HashMap;

/// 한 워커의 결과 (버퍼 순서)
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerPartition<'a> {
    pub worker_id: &'a str,
    pub results: Vec<&'a PingResult>,
}

/// 첫 등장 순 워커 ID 목록
pub fn distinct_workers<'a, I>(results: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a PingResult>,
{
    partition_all(results)
        .into_iter()
        .map(|p| p.worker_id.to_string())
        .collect()
}

/// 특정 워커의 결과만 추출 (버퍼 순서 유지)
pub fn partition<'a, I>(results: I, worker_id: &str) -> Vec<&'a PingResult>
where
    I: IntoIterator<Item = &'a PingResult>,
{
    results
        .into_iter()
        .filter(|r| r.worker_id == worker_id)
        .collect()
}

/// 모든 워커를 한 번에 분할 (워커는 첫 등장 순)
pub fn partition_all<'a, I>(results: I) -> Vec<WorkerPartition<'a>>
where
    I: IntoIterator<Item = &'a PingResult>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut partitions: Vec<WorkerPartition<'a>> = Vec::new();

    for result in results {
        let worker_id = result.worker_id.as_str();
        let slot = *index.entry(worker_id).or_insert_with(|| {
            partitions.push(WorkerPartition {
                worker_id,
                results: Vec::new(),
            });
            partitions.len() - 1
        });
        partitions[slot].results.push(result);
    }

    partitions
}
