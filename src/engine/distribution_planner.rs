// ==========================================
// 考场座位编排系统 - 分流规划引擎
// ==========================================
// 阶段一: 按考场容量占比，把每个年级的考生切分到各考场
// 输入: 场次考场容量 (有序) + 场次年级人数 (有序)
// 输出: Distribution 列表，每行是一个年级名册上的连续闭区间
// ==========================================
// 红线: 余数分配顺序固定为考场顺序（先有空位者先得），不做"更公平"的调整
// ==========================================

use crate::domain::allocation::{Distribution, HallCapacity, LevelRosterSize};
use crate::domain::hall::SeatCapacity;
use crate::engine::error::{AllocationError, AllocationResult};
use tracing::{debug, instrument};

impl SeatCapacity for HallCapacity {
    fn seat_capacity(&self) -> u32 {
        self.capacity
    }
}

// ==========================================
// DistributionPlanner - 分流规划引擎
// ==========================================
pub struct DistributionPlanner {
    // 无状态引擎，累加器均为单次调用内的局部变量
}

impl DistributionPlanner {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 计算场次分流方案
    ///
    /// 规则:
    /// 1) 暂定人数 = floor(年级人数 × 考场容量 / 总容量)
    /// 2) 累计每个考场已分配人数、每个年级已分配人数
    /// 3) 余数按年级顺序逐个处理，按考场顺序填入有空位的考场
    /// 4) 按考场顺序为每个年级生成连续下标区间，人数为 0 的组合不产生记录
    ///
    /// # 参数
    /// - `exam_id`: 场次ID
    /// - `halls`: 考场容量，顺序即场次考场顺序
    /// - `levels`: 年级人数，顺序即场次年级顺序
    ///
    /// # 返回
    /// - `Ok(Vec<Distribution>)`: 按 (年级顺序, 考场顺序) 排列的分流记录
    /// - `Err(InsufficientCapacity)`: 总容量小于总人数，不产生任何记录
    #[instrument(skip(self, halls, levels), fields(
        exam_id = %exam_id,
        hall_count = halls.len(),
        level_count = levels.len()
    ))]
    pub fn plan(
        &self,
        exam_id: &str,
        halls: &[HallCapacity],
        levels: &[LevelRosterSize],
    ) -> AllocationResult<Vec<Distribution>> {
        let total_capacity: u64 = halls.iter().map(|h| u64::from(h.capacity)).sum();
        let total_students: u64 = levels.iter().map(|l| u64::from(l.student_count)).sum();

        if total_capacity < total_students {
            return Err(AllocationError::InsufficientCapacity {
                total_capacity,
                total_students,
            });
        }

        // 没有考生（含没有考场、没有年级）是合法的空结果
        if total_students == 0 {
            return Ok(Vec::new());
        }

        // plan[l][h]: 年级 l 分到考场 h 的人数
        let mut hall_allocated_total: Vec<u32> = vec![0; halls.len()];
        let mut plan: Vec<Vec<u32>> = Vec::with_capacity(levels.len());

        // 1. 按容量占比取整
        for level in levels {
            let mut row = Vec::with_capacity(halls.len());
            for (h, hall) in halls.iter().enumerate() {
                let count = provisional_share(level.student_count, hall.capacity, total_capacity);
                hall_allocated_total[h] += count;
                row.push(count);
            }
            plan.push(row);
        }

        // 2. 分配余数
        for (l, level) in levels.iter().enumerate() {
            let allocated_so_far: u32 = plan[l].iter().sum();
            let mut remaining = level.student_count - allocated_so_far;

            for (h, hall) in halls.iter().enumerate() {
                if remaining == 0 {
                    break;
                }

                let spare = hall.spare_seats(hall_allocated_total[h]);
                if spare > 0 {
                    let to_add = remaining.min(spare);
                    plan[l][h] += to_add;
                    hall_allocated_total[h] += to_add;
                    remaining -= to_add;
                }
            }

            // 总容量 >= 总人数时一轮必然分完，这里只兜底
            if remaining > 0 {
                return Err(AllocationError::InsufficientCapacity {
                    total_capacity,
                    total_students,
                });
            }

            debug!(
                level_id = %level.level_id,
                student_count = level.student_count,
                provisional = allocated_so_far,
                "年级余数分配完成"
            );
        }

        // 3. 生成连续下标区间
        let mut distributions = Vec::new();
        for (l, level) in levels.iter().enumerate() {
            let mut cursor: u32 = 0;
            for (h, hall) in halls.iter().enumerate() {
                let count = plan[l][h];
                if count == 0 {
                    continue;
                }

                distributions.push(Distribution {
                    exam_id: exam_id.to_string(),
                    hall_id: hall.hall_id.clone(),
                    level_id: level.level_id.clone(),
                    allocated_count: count,
                    start_index: cursor,
                    end_index: cursor + count - 1,
                });
                cursor += count;
            }
        }

        debug!(
            total_capacity,
            total_students,
            distribution_count = distributions.len(),
            "分流规划完成"
        );

        Ok(distributions)
    }
}

impl Default for DistributionPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// floor(student_count × capacity / total_capacity)，整数运算
///
/// capacity <= total_capacity，结果不超过 student_count
fn provisional_share(student_count: u32, capacity: u32, total_capacity: u64) -> u32 {
    let share = u64::from(student_count) * u64::from(capacity) / total_capacity;
    share as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn halls(caps: &[(&str, u32)]) -> Vec<HallCapacity> {
        caps.iter().map(|(id, c)| HallCapacity::new(*id, *c)).collect()
    }

    fn levels(sizes: &[(&str, u32)]) -> Vec<LevelRosterSize> {
        sizes.iter().map(|(id, n)| LevelRosterSize::new(*id, *n)).collect()
    }

    #[test]
    fn test_provisional_share_floors() {
        assert_eq!(provisional_share(15, 10, 20), 7);
        assert_eq!(provisional_share(100, 29, 100), 29);
        assert_eq!(provisional_share(0, 10, 20), 0);
    }

    #[test]
    fn test_remainder_goes_to_first_hall_with_spare_seats() {
        let planner = DistributionPlanner::new();
        let rows = planner
            .plan("E1", &halls(&[("A", 10), ("B", 10)]), &levels(&[("L", 15)]))
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].hall_id.as_str(), rows[0].allocated_count), ("A", 8));
        assert_eq!((rows[0].start_index, rows[0].end_index), (0, 7));
        assert_eq!((rows[1].hall_id.as_str(), rows[1].allocated_count), ("B", 7));
        assert_eq!((rows[1].start_index, rows[1].end_index), (8, 14));
    }

    #[test]
    fn test_remainder_skips_full_hall() {
        // L1 的余数占满 A，L2 的余数只能进入 B
        let planner = DistributionPlanner::new();
        let rows = planner
            .plan(
                "E1",
                &halls(&[("A", 2), ("B", 3)]),
                &levels(&[("L1", 3), ("L2", 2)]),
            )
            .unwrap();

        // 取整: L1 -> A=1,B=1 ; L2 -> A=0,B=1 ; A 用 1/2, B 用 2/3
        // L1 余 1 -> A ; L2 余 1 -> B
        let a_total: u32 = rows.iter().filter(|r| r.hall_id == "A").map(|r| r.allocated_count).sum();
        let b_total: u32 = rows.iter().filter(|r| r.hall_id == "B").map(|r| r.allocated_count).sum();
        assert_eq!(a_total, 2);
        assert_eq!(b_total, 3);
    }

    #[test]
    fn test_insufficient_capacity_produces_no_rows() {
        let planner = DistributionPlanner::new();
        let err = planner
            .plan("E1", &halls(&[("A", 40)]), &levels(&[("L1", 25), ("L2", 20)]))
            .unwrap_err();

        match err {
            AllocationError::InsufficientCapacity {
                total_capacity,
                total_students,
            } => {
                assert_eq!(total_capacity, 40);
                assert_eq!(total_students, 45);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_inputs_are_valid() {
        let planner = DistributionPlanner::new();
        assert!(planner.plan("E1", &[], &[]).unwrap().is_empty());
        assert!(planner
            .plan("E1", &halls(&[("A", 10)]), &levels(&[("L1", 0)]))
            .unwrap()
            .is_empty());
    }
}
