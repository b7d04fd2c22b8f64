// ==========================================
// DistributionPlanner 引擎集成测试
// ==========================================
// 测试目标: 验证按容量占比分流 + 余数贪心填充
// 覆盖范围: 人数守恒、区间划分、考场容量、余数确定性、容量校验
// ==========================================

use std::collections::HashMap;

use exam_seating::domain::{Distribution, HallCapacity, LevelRosterSize};
use exam_seating::engine::{AllocationError, DistributionPlanner};

// ==========================================
// 测试辅助函数
// ==========================================

fn halls(capacities: &[u32]) -> Vec<HallCapacity> {
    capacities
        .iter()
        .enumerate()
        .map(|(i, c)| HallCapacity::new(format!("H{}", i), *c))
        .collect()
}

fn levels(sizes: &[u32]) -> Vec<LevelRosterSize> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, n)| LevelRosterSize::new(format!("L{}", i), *n))
        .collect()
}

fn rows_for<'a>(rows: &'a [Distribution], level_id: &str) -> Vec<&'a Distribution> {
    rows.iter().filter(|d| d.level_id == level_id).collect()
}

fn count_of(rows: &[Distribution], level_id: &str, hall_id: &str) -> u32 {
    rows.iter()
        .filter(|d| d.level_id == level_id && d.hall_id == hall_id)
        .map(|d| d.allocated_count)
        .sum()
}

/// 校验守恒、区间划分和容量上限
fn assert_plan_invariants(hall_caps: &[u32], level_sizes: &[u32]) {
    let planner = DistributionPlanner::new();
    let hall_list = halls(hall_caps);
    let level_list = levels(level_sizes);

    let rows = planner
        .plan("EXAM", &hall_list, &level_list)
        .expect("容量足够时应成功");

    for level in &level_list {
        let level_rows = rows_for(&rows, &level.level_id);

        // 守恒
        let total: u32 = level_rows.iter().map(|d| d.allocated_count).sum();
        assert_eq!(total, level.student_count, "年级 {} 人数不守恒", level.level_id);

        // 区间从 0 起连续覆盖 [0, n-1]
        let mut cursor = 0;
        for d in &level_rows {
            assert!(d.allocated_count > 0, "不应产生 0 人记录");
            assert_eq!(d.start_index, cursor, "年级 {} 区间不连续", level.level_id);
            assert_eq!(d.allocated_count, d.end_index - d.start_index + 1);
            cursor = d.end_index + 1;
        }
        assert_eq!(cursor, level.student_count);
    }

    // 考场容量
    let mut per_hall: HashMap<&str, u32> = HashMap::new();
    for d in &rows {
        *per_hall.entry(d.hall_id.as_str()).or_default() += d.allocated_count;
    }
    for hall in &hall_list {
        let used = per_hall.get(hall.hall_id.as_str()).copied().unwrap_or(0);
        assert!(
            used <= hall.capacity,
            "考场 {} 超员: {} > {}",
            hall.hall_id,
            used,
            hall.capacity
        );
    }
}

// ==========================================
// 不变量
// ==========================================

#[test]
fn test_plan_invariants_多种配置() {
    let cases: &[(&[u32], &[u32])] = &[
        (&[10, 10], &[15]),
        (&[40, 35, 25], &[33, 20, 17, 0]),
        (&[7], &[7]),
        (&[3, 50, 8], &[1, 1, 1, 1]),
        (&[100, 1], &[50, 30, 20]),
        (&[5, 5], &[5, 5]),
        (&[13, 29, 31, 7], &[19, 23, 11, 17, 9]),
    ];

    for (hall_caps, level_sizes) in cases {
        println!("配置: halls={:?}, levels={:?}", hall_caps, level_sizes);
        assert_plan_invariants(hall_caps, level_sizes);
    }
}

#[test]
fn test_plan_rows_按年级再按考场排列() {
    let planner = DistributionPlanner::new();
    let rows = planner
        .plan("EXAM", &halls(&[20, 20]), &levels(&[10, 10]))
        .unwrap();

    let order: Vec<(&str, &str)> = rows
        .iter()
        .map(|d| (d.level_id.as_str(), d.hall_id.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![("L0", "H0"), ("L0", "H1"), ("L1", "H0"), ("L1", "H1")]
    );
    assert!(rows.iter().all(|d| d.exam_id == "EXAM"));
}

// ==========================================
// 余数确定性
// ==========================================

#[test]
fn test_remainder_determinism_首个有空位考场优先() {
    let planner = DistributionPlanner::new();
    let rows = planner
        .plan("EXAM", &halls(&[10, 10]), &levels(&[15]))
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].hall_id.as_str(), rows[0].allocated_count), ("H0", 8));
    assert_eq!((rows[0].start_index, rows[0].end_index), (0, 7));
    assert_eq!((rows[1].hall_id.as_str(), rows[1].allocated_count), ("H1", 7));
    assert_eq!((rows[1].start_index, rows[1].end_index), (8, 14));

    // 同样输入重复规划结果一致
    let again = planner
        .plan("EXAM", &halls(&[10, 10]), &levels(&[15]))
        .unwrap();
    assert_eq!(rows, again);
}

#[test]
fn test_remainder_满员考场被跳过() {
    // 取整后每个考场 4 人；L0 余数进 H0 (满 5)，L1 余数只能进 H1
    let planner = DistributionPlanner::new();
    let rows = planner
        .plan("EXAM", &halls(&[5, 5]), &levels(&[5, 5]))
        .unwrap();

    assert_eq!(count_of(&rows, "L0", "H0"), 3);
    assert_eq!(count_of(&rows, "L0", "H1"), 2);
    assert_eq!(count_of(&rows, "L1", "H0"), 2);
    assert_eq!(count_of(&rows, "L1", "H1"), 3);
}

// ==========================================
// 容量校验与退化输入
// ==========================================

#[test]
fn test_capacity_guard_总容量不足() {
    let planner = DistributionPlanner::new();
    let result = planner.plan("EXAM", &halls(&[20, 20]), &levels(&[25, 20]));

    match result {
        Err(AllocationError::InsufficientCapacity {
            total_capacity,
            total_students,
        }) => {
            assert_eq!(total_capacity, 40);
            assert_eq!(total_students, 45);
        }
        other => panic!("应返回 InsufficientCapacity，实际: {:?}", other),
    }
}

#[test]
fn test_capacity_恰好满员() {
    assert_plan_invariants(&[12, 8], &[11, 9]);

    let rows = DistributionPlanner::new()
        .plan("EXAM", &halls(&[12, 8]), &levels(&[11, 9]))
        .unwrap();
    let used: u32 = rows.iter().map(|d| d.allocated_count).sum();
    assert_eq!(used, 20);
}

#[test]
fn test_zero_size_level_不产生记录() {
    let rows = DistributionPlanner::new()
        .plan("EXAM", &halls(&[10]), &levels(&[0, 4]))
        .unwrap();

    assert!(rows_for(&rows, "L0").is_empty());
    assert_eq!(count_of(&rows, "L1", "H0"), 4);
}

#[test]
fn test_no_halls_no_levels_空结果() {
    let planner = DistributionPlanner::new();
    assert!(planner.plan("EXAM", &[], &[]).unwrap().is_empty());
    assert!(planner.plan("EXAM", &halls(&[10]), &[]).unwrap().is_empty());

    // 有考生没有考场: 容量 0 < 人数
    assert!(matches!(
        planner.plan("EXAM", &[], &levels(&[3])),
        Err(AllocationError::InsufficientCapacity { .. })
    ));
}
