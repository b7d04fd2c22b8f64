// ==========================================
// 考场座位编排系统 - 座位交错编排引擎
// ==========================================
// 阶段二: 把分流到同一考场的各年级考生轮转交错，生成座位号
// 输入: 场次考场顺序 + Distribution 列表 + 年级有序名册
// 输出: SeatAssignment 列表，每个考场座位号 1..=N 连续
// ==========================================
// 红线: 相邻座位轮流来自不同年级（只剩一个年级时除外）
// ==========================================

use crate::domain::allocation::{Distribution, SeatAssignment};
use crate::domain::roster::LevelRoster;
use crate::engine::error::{AllocationError, AllocationResult};
use std::collections::HashMap;
use tracing::{debug, instrument};

// ==========================================
// SeatingInterleaver - 座位交错编排引擎
// ==========================================
pub struct SeatingInterleaver {
    // 无状态引擎
}

impl SeatingInterleaver {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 生成场次座位表
    ///
    /// 每个考场独立处理:
    /// 1) 取属于该考场的分流记录，按记录顺序切出各年级名册的 [start_index, end_index]
    /// 2) 每个非空切片为一条"车道"
    /// 3) 轮转: 每轮按车道顺序各取一人，座位号从 1 递增，取完的车道退出
    ///
    /// # 参数
    /// - `exam_id`: 场次ID
    /// - `hall_ids`: 场次考场ID，顺序即处理顺序
    /// - `distributions`: 分流记录（阶段一输出，保持生成顺序）
    /// - `rosters`: 相关年级的有序名册
    ///
    /// # 返回
    /// - `Ok(Vec<SeatAssignment>)`: 按 (考场顺序, 座位号) 排列
    /// - `Err(InvalidDistribution)`: 分流区间与名册不一致
    #[instrument(skip(self, hall_ids, distributions, rosters), fields(
        exam_id = %exam_id,
        hall_count = hall_ids.len(),
        distribution_count = distributions.len()
    ))]
    pub fn interleave(
        &self,
        exam_id: &str,
        hall_ids: &[String],
        distributions: &[Distribution],
        rosters: &[LevelRoster],
    ) -> AllocationResult<Vec<SeatAssignment>> {
        let roster_by_level: HashMap<&str, &LevelRoster> = rosters
            .iter()
            .map(|r| (r.level_id.as_str(), r))
            .collect();

        check_roster_coverage(distributions, rosters)?;

        let mut seats = Vec::new();

        for hall_id in hall_ids {
            let lanes = collect_lanes(hall_id, distributions, &roster_by_level)?;
            let before = seats.len();
            interleave_lanes(exam_id, hall_id, &lanes, &mut seats);

            debug!(
                hall_id = %hall_id,
                lane_count = lanes.len(),
                seat_count = seats.len() - before,
                "考场座位编排完成"
            );
        }

        Ok(seats)
    }
}

impl Default for SeatingInterleaver {
    fn default() -> Self {
        Self::new()
    }
}

/// 每个年级的分流人数合计必须等于当前名册人数
///
/// 分流后增减考生都会使区间与名册错位，必须重新分流
fn check_roster_coverage(
    distributions: &[Distribution],
    rosters: &[LevelRoster],
) -> AllocationResult<()> {
    let mut allocated: HashMap<&str, u64> = HashMap::new();
    for dist in distributions {
        *allocated.entry(dist.level_id.as_str()).or_default() += u64::from(dist.allocated_count);
    }

    for roster in rosters {
        let total = allocated.get(roster.level_id.as_str()).copied().unwrap_or(0);
        if total != roster.len() as u64 {
            return Err(AllocationError::InvalidDistribution(format!(
                "分流人数与名册不一致: level_id={}, allocated={}, roster_size={}",
                roster.level_id,
                total,
                roster.len()
            )));
        }
    }

    Ok(())
}

/// 切出某考场的全部车道（按分流记录顺序）
fn collect_lanes<'a>(
    hall_id: &str,
    distributions: &[Distribution],
    roster_by_level: &HashMap<&str, &'a LevelRoster>,
) -> AllocationResult<Vec<&'a [String]>> {
    let mut lanes = Vec::new();

    for dist in distributions.iter().filter(|d| d.hall_id == hall_id) {
        if dist.allocated_count == 0 {
            continue;
        }

        let roster = roster_by_level
            .get(dist.level_id.as_str())
            .copied()
            .ok_or_else(|| {
                AllocationError::InvalidDistribution(format!(
                    "年级名册缺失: level_id={}, hall_id={}",
                    dist.level_id, hall_id
                ))
            })?;

        let start = dist.start_index as usize;
        let end = dist.end_index as usize;
        if end < start
            || end - start + 1 != dist.allocated_count as usize
            || end >= roster.len()
        {
            return Err(AllocationError::InvalidDistribution(format!(
                "区间越界: level_id={}, hall_id={}, range=[{}, {}], allocated={}, roster_size={}",
                dist.level_id,
                hall_id,
                dist.start_index,
                dist.end_index,
                dist.allocated_count,
                roster.len()
            )));
        }

        lanes.push(&roster.student_ids[start..=end]);
    }

    Ok(lanes)
}

/// 轮转交错: lane0, lane1, ..., laneK, lane0, ...
fn interleave_lanes(
    exam_id: &str,
    hall_id: &str,
    lanes: &[&[String]],
    seats: &mut Vec<SeatAssignment>,
) {
    let mut cursors = vec![0usize; lanes.len()];
    let mut exhausted = lanes.iter().filter(|lane| lane.is_empty()).count();
    let mut seat_number: u32 = 1;

    while exhausted < lanes.len() {
        for (lane, cursor) in lanes.iter().zip(cursors.iter_mut()) {
            if *cursor >= lane.len() {
                continue;
            }

            seats.push(SeatAssignment {
                exam_id: exam_id.to_string(),
                hall_id: hall_id.to_string(),
                student_id: lane[*cursor].clone(),
                seat_number,
            });
            seat_number += 1;
            *cursor += 1;

            if *cursor == lane.len() {
                exhausted += 1;
            }
        }
    }
}
