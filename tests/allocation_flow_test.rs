// ==========================================
// 分配流程端到端测试
// ==========================================
// 测试范围:
// 1. 分流 + 排座: 守恒、座位连续、交错顺序、重复生成幂等
// 2. 失败路径: 容量不足、场次不存在、名册变更后的过期分流
// 3. 事务: 整体替换失败时保留原记录
// 4. 周边功能: 删除级联、考生座位查询、学院统计、配置开关、操作日志
// ==========================================


use std::collections::HashMap;

use chrono::NaiveDate;
use exam_seating::api::{ApiError, CreateExamRequest, CreateHallRequest, EnrollmentEntry};
use exam_seating::config::config_keys;
use exam_seating::domain::SeatAssignment;
use exam_seating::repository::RepositoryError;
use test_helpers::TestEnv;

// ==========================================
// 正常流程
// ==========================================

#[test]
fn test_allocate_分流与排座() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10, 10], &[15]).expect("种子数据失败");

    println!("步骤1: 一键分配");
    let outcome = env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    assert_eq!(outcome.distribution.distribution_count, 2);
    assert_eq!(outcome.distribution.total_capacity, 20);
    assert_eq!(outcome.distribution.total_students, 15);
    let seating = outcome.seating.expect("默认配置应自动排座");
    assert_eq!(seating.seat_count, 15);

    println!("步骤2: 校验分流区间");
    let distributions = env.allocation_repo.find_distributions(&fixture.exam_id).unwrap();
    assert_eq!(distributions.len(), 2);
    assert_eq!(distributions[0].hall_id, fixture.hall_ids[0]);
    assert_eq!((distributions[0].start_index, distributions[0].end_index), (0, 7));
    assert_eq!(distributions[1].hall_id, fixture.hall_ids[1]);
    assert_eq!((distributions[1].start_index, distributions[1].end_index), (8, 14));

    println!("步骤3: 校验座位按名册顺序落座");
    let students = env.roster_repo.list_students(&fixture.level_ids[0]).unwrap();
    let seats = env.allocation_repo.find_seat_assignments(&fixture.exam_id).unwrap();
    assert_eq!(seats.len(), 15);

    // 单年级时每个考场内按名册切片顺序依次入座
    for (i, seat) in seats.iter().enumerate() {
        assert_eq!(seat.student_id, students[i].id);
        let expected_hall = if i < 8 { 0 } else { 1 };
        assert_eq!(seat.hall_id, fixture.hall_ids[expected_hall]);
        let expected_seat = if i < 8 { i + 1 } else { i - 7 };
        assert_eq!(seat.seat_number as usize, expected_seat);
    }
}

#[test]
fn test_allocate_多年级交错() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[15], &[5, 5, 5]).unwrap();

    env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();

    let level_of: HashMap<String, usize> = fixture
        .level_ids
        .iter()
        .enumerate()
        .flat_map(|(i, level_id)| {
            env.roster_repo
                .list_students(level_id)
                .unwrap()
                .into_iter()
                .map(move |s| (s.id, i))
        })
        .collect();

    let seats = env.allocation_repo.find_seat_assignments(&fixture.exam_id).unwrap();
    assert_eq!(seats.len(), 15);
    for (i, seat) in seats.iter().enumerate() {
        assert_eq!(seat.seat_number as usize, i + 1);
        assert_eq!(level_of[&seat.student_id], i % 3, "座位 {} 未按年级轮转", i + 1);
    }
}

#[test]
fn test_roster_order_按序号而非登记顺序() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let faculty = env.registry_api.create_faculty("工学院").unwrap();
    let department = env.registry_api.create_department(&faculty.id, "计算机系").unwrap();
    let level = env
        .registry_api
        .create_level(&department.id, "2021级", "CSC/2021/")
        .unwrap();
    let hall = env
        .registry_api
        .create_hall(CreateHallRequest {
            faculty_id: faculty.id.clone(),
            name: "主楼101".to_string(),
            code: "A101".to_string(),
            capacity: 10,
        })
        .unwrap();

    let entries = vec![
        EnrollmentEntry::new("03", "丙"),
        EnrollmentEntry::new("01", "甲"),
        EnrollmentEntry::new("02", "乙"),
    ];
    assert_eq!(env.registry_api.enroll_students(&level.id, &entries).unwrap(), 3);

    let exam = env
        .exam_api
        .create_exam(
            CreateExamRequest {
                title: "数据结构".to_string(),
                exam_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                faculty_id: faculty.id.clone(),
                hall_ids: vec![hall.id.clone()],
                level_ids: vec![level.id.clone()],
            },
            "admin",
        )
        .unwrap();

    env.exam_api.allocate(&exam.id, "admin").unwrap();

    let seats = env.allocation_repo.find_seat_assignments(&exam.id).unwrap();
    let names: Vec<String> = seats
        .iter()
        .map(|s| {
            env.roster_repo
                .list_students(&level.id)
                .unwrap()
                .into_iter()
                .find(|st| st.id == s.student_id)
                .unwrap()
                .name
        })
        .collect();
    assert_eq!(names, vec!["甲", "乙", "丙"]);
}

#[test]
fn test_regeneration_幂等() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[13, 29, 31], &[19, 23, 11]).unwrap();

    env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    let first_dist = env.allocation_repo.find_distributions(&fixture.exam_id).unwrap();
    let first_seats = env.allocation_repo.find_seat_assignments(&fixture.exam_id).unwrap();

    env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    let second_dist = env.allocation_repo.find_distributions(&fixture.exam_id).unwrap();
    let second_seats = env.allocation_repo.find_seat_assignments(&fixture.exam_id).unwrap();

    assert_eq!(first_dist, second_dist);
    assert_eq!(first_seats, second_seats);
    assert_eq!(second_seats.len(), 53);
}

// ==========================================
// 失败路径
// ==========================================

#[test]
fn test_capacity_guard_保留原有记录() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[20, 20], &[10, 10]).unwrap();

    env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    let before_dist = env.allocation_repo.find_distributions(&fixture.exam_id).unwrap();
    let before_seats = env.allocation_repo.find_seat_assignments(&fixture.exam_id).unwrap();

    // 第一个年级扩招到 25 人，总人数 45 > 40
    let extra: Vec<EnrollmentEntry> = (100..115)
        .map(|n| EnrollmentEntry::new(n.to_string(), format!("补录{}", n)))
        .collect();
    env.registry_api
        .enroll_students(&fixture.level_ids[0], &extra)
        .unwrap();

    let err = env
        .exam_api
        .generate_distribution(&fixture.exam_id, "admin")
        .unwrap_err();
    match err {
        ApiError::InsufficientCapacity {
            total_capacity,
            total_students,
        } => {
            assert_eq!(total_capacity, 40);
            assert_eq!(total_students, 45);
        }
        other => panic!("应返回容量不足，实际: {:?}", other),
    }

    assert_eq!(
        env.allocation_repo.find_distributions(&fixture.exam_id).unwrap(),
        before_dist
    );
    assert_eq!(
        env.allocation_repo.find_seat_assignments(&fixture.exam_id).unwrap(),
        before_seats
    );
}

#[test]
fn test_exam_not_found_无副作用() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let err = env
        .exam_api
        .generate_distribution("NO-SUCH-EXAM", "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = env.exam_api.generate_seating("NO-SUCH-EXAM", "admin").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    assert!(env.action_log_repo.find_recent(10).unwrap().is_empty());
}

#[test]
fn test_empty_exam_空结果() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[], &[]).unwrap();

    let outcome = env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    assert_eq!(outcome.distribution.distribution_count, 0);
    assert_eq!(outcome.seating.map(|s| s.seat_count), Some(0));
}

#[test]
fn test_stale_distribution_名册变更后排座失败() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10, 10], &[10, 10]).unwrap();

    env.exam_api.generate_distribution(&fixture.exam_id, "admin").unwrap();

    // 分流后删除一名考生，名册变短
    let students = env.roster_repo.list_students(&fixture.level_ids[0]).unwrap();
    env.registry_api.remove_student(&students[0].id).unwrap();

    let err = env
        .exam_api
        .generate_seating(&fixture.exam_id, "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    assert_eq!(
        env.allocation_repo.count_seat_assignments(&fixture.exam_id).unwrap(),
        0
    );

    // 重新分流后可以排座
    env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    assert_eq!(
        env.allocation_repo.count_seat_assignments(&fixture.exam_id).unwrap(),
        19
    );
}

#[test]
fn test_late_enrollment_分流后补录考生排座失败() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10, 10], &[10]).unwrap();

    env.exam_api.generate_distribution(&fixture.exam_id, "admin").unwrap();

    // 补录考生排在序号 000 之后，名册末尾的 009 被挤出原区间
    env.registry_api
        .enroll_students(&fixture.level_ids[0], &[EnrollmentEntry::new("000a", "补录")])
        .unwrap();

    let err = env
        .exam_api
        .generate_seating(&fixture.exam_id, "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    assert_eq!(
        env.allocation_repo.count_seat_assignments(&fixture.exam_id).unwrap(),
        0
    );

    // 重新分流后全部 11 人都有座位
    env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    let seats = env.allocation_repo.find_seat_assignments(&fixture.exam_id).unwrap();
    assert_eq!(seats.len(), 11);
    let students = env.roster_repo.list_students(&fixture.level_ids[0]).unwrap();
    for student in &students {
        assert!(
            seats.iter().any(|s| s.student_id == student.id),
            "考生 {} 没有座位",
            student.matric_no
        );
    }
}

#[test]
fn test_late_enrollment_空年级补录后排座失败() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10], &[4, 0]).unwrap();

    env.exam_api.generate_distribution(&fixture.exam_id, "admin").unwrap();
    env.registry_api
        .enroll_student(&fixture.level_ids[1], "001", "补录")
        .unwrap();

    let err = env
        .exam_api
        .generate_seating(&fixture.exam_id, "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
}

// ==========================================
// 事务
// ==========================================

#[test]
fn test_replace_seats_失败回滚() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[5], &[3]).unwrap();

    env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    let before = env.allocation_repo.find_seat_assignments(&fixture.exam_id).unwrap();
    assert_eq!(before.len(), 3);

    // 第二条记录引用不存在的考生，外键失败
    let bad = vec![
        before[0].clone(),
        SeatAssignment {
            exam_id: fixture.exam_id.clone(),
            hall_id: fixture.hall_ids[0].clone(),
            student_id: "GHOST".to_string(),
            seat_number: 2,
        },
    ];
    assert!(env
        .allocation_repo
        .replace_seat_assignments(&fixture.exam_id, &bad)
        .is_err());

    let after = env.allocation_repo.find_seat_assignments(&fixture.exam_id).unwrap();
    assert_eq!(after, before);
}

#[test]
fn test_transaction_begin_失败报告事务错误() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[5], &[3]).unwrap();

    // 连接已处于事务中，仓储无法再开启事务
    env.conn.lock().unwrap().execute_batch("BEGIN").unwrap();

    let result = env
        .allocation_repo
        .replace_distributions(&fixture.exam_id, &[]);
    assert!(matches!(
        result,
        Err(RepositoryError::DatabaseTransactionError(_))
    ));

    env.conn.lock().unwrap().execute_batch("ROLLBACK").unwrap();
}

// ==========================================
// 周边功能
// ==========================================

#[test]
fn test_delete_exam_级联删除() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10], &[4]).unwrap();

    env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    env.exam_api.delete_exam(&fixture.exam_id, "admin").unwrap();

    assert!(env.exam_repo.find_by_id(&fixture.exam_id).unwrap().is_none());
    assert!(env.allocation_repo.find_distributions(&fixture.exam_id).unwrap().is_empty());
    assert_eq!(
        env.allocation_repo.count_seat_assignments(&fixture.exam_id).unwrap(),
        0
    );
    assert!(env.exam_repo.list_halls(&fixture.exam_id).unwrap().is_empty());

    // 考场与考生不受影响
    assert_eq!(env.roster_repo.count_students(&fixture.level_ids[0]).unwrap(), 4);

    let err = env.exam_api.get_exam_detail(&fixture.exam_id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_check_seat_allocation_考生查询() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10], &[4]).unwrap();
    env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();

    // 学号 = 前缀 L1 + 分隔串 0 + 序号 002
    let lookup = env.portal_api.check_seat_allocation(" L10002 ").unwrap();
    assert_eq!(lookup.student.matric_no, "002");
    assert_eq!(lookup.level.id, fixture.level_ids[0]);
    assert_eq!(lookup.department.id, fixture.department_id);
    assert_eq!(lookup.seats.len(), 1);
    assert_eq!(lookup.seats[0].exam_id, fixture.exam_id);
    assert_eq!(lookup.seats[0].hall_code, "H01");
    assert_eq!(lookup.seats[0].seat_number, 3);

    assert!(matches!(
        env.portal_api.check_seat_allocation("  "),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        env.portal_api.check_seat_allocation("UNKNOWN"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_dashboard_stats_学院统计() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10, 20, 30], &[4, 6]).unwrap();

    let stats = env.dashboard_api.get_dashboard_stats(&fixture.faculty_id).unwrap();
    assert_eq!(stats.hall_count, 3);
    assert_eq!(stats.department_count, 1);
    assert_eq!(stats.student_count, 10);
    assert_eq!(stats.exam_count, 1);
}

#[test]
fn test_auto_seat_关闭时只分流() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10], &[4]).unwrap();
    env.config
        .update_config(config_keys::AUTO_SEAT_AFTER_DISTRIBUTION, "false")
        .unwrap();

    let outcome = env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    assert!(outcome.seating.is_none());
    assert_eq!(outcome.distribution.distribution_count, 1);
    assert_eq!(
        env.allocation_repo.count_seat_assignments(&fixture.exam_id).unwrap(),
        0
    );

    let seating = env.exam_api.generate_seating(&fixture.exam_id, "admin").unwrap();
    assert_eq!(seating.summary.seat_count, 4);
}

#[test]
fn test_create_hall_容量上限() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let faculty = env.registry_api.create_faculty("文学院").unwrap();
    env.config
        .update_config(config_keys::MAX_HALL_CAPACITY, "50")
        .unwrap();

    let request = |capacity: u32| CreateHallRequest {
        faculty_id: faculty.id.clone(),
        name: "阶梯教室".to_string(),
        code: format!("T{}", capacity),
        capacity,
    };

    assert!(env.registry_api.create_hall(request(50)).is_ok());
    assert!(matches!(
        env.registry_api.create_hall(request(51)),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        env.registry_api.create_hall(request(0)),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_action_log_记录生成操作() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10], &[4]).unwrap();
    env.exam_api.allocate(&fixture.exam_id, "operator").unwrap();

    let logs = env.exam_api.list_action_logs(&fixture.exam_id).unwrap();
    let types: Vec<&str> = logs.iter().map(|l| l.action_type.as_str()).collect();
    assert!(types.contains(&"CREATE_EXAM"));
    assert!(types.contains(&"GENERATE_DISTRIBUTION"));
    assert!(types.contains(&"GENERATE_SEATING"));

    let seating_log = logs
        .iter()
        .find(|l| l.action_type == "GENERATE_SEATING")
        .unwrap();
    assert_eq!(seating_log.actor, "operator");
    let payload = seating_log.payload_json.as_ref().unwrap();
    assert_eq!(payload["seat_count"], 4);
}

#[test]
fn test_update_hall_capacity_校验上限() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10], &[4]).unwrap();
    env.config
        .update_config(config_keys::MAX_HALL_CAPACITY, "60")
        .unwrap();

    let hall_id = &fixture.hall_ids[0];
    assert!(matches!(
        env.registry_api.update_hall_capacity(hall_id, 61),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        env.registry_api.update_hall_capacity(hall_id, 0),
        Err(ApiError::InvalidInput(_))
    ));

    env.registry_api.update_hall_capacity(hall_id, 60).unwrap();
    let halls = env.registry_api.list_halls(&fixture.faculty_id).unwrap();
    assert_eq!(halls[0].capacity, 60);

    assert!(matches!(
        env.registry_api.update_hall_capacity("NO-SUCH-HALL", 20),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_delete_department_级联删除年级与考生() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10], &[4, 3]).unwrap();

    env.registry_api.delete_department(&fixture.department_id).unwrap();

    assert!(env
        .registry_api
        .list_departments(&fixture.faculty_id)
        .unwrap()
        .is_empty());
    assert!(env
        .registry_api
        .list_levels(&fixture.department_id)
        .unwrap()
        .is_empty());
    for level_id in &fixture.level_ids {
        assert_eq!(env.roster_repo.count_students(level_id).unwrap(), 0);
    }
    assert!(env.exam_repo.list_levels(&fixture.exam_id).unwrap().is_empty());

    assert!(matches!(
        env.registry_api.delete_department(&fixture.department_id),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_delete_level_级联删除考生() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let fixture = env.seed_exam(&[10], &[4, 3]).unwrap();

    env.registry_api.delete_level(&fixture.level_ids[0]).unwrap();

    let remaining = env.registry_api.list_levels(&fixture.department_id).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, fixture.level_ids[1]);
    assert_eq!(env.roster_repo.count_students(&fixture.level_ids[0]).unwrap(), 0);
    assert_eq!(env.roster_repo.count_students(&fixture.level_ids[1]).unwrap(), 3);

    // 场次只剩一个年级，重新分配只排剩余考生
    let outcome = env.exam_api.allocate(&fixture.exam_id, "admin").unwrap();
    assert_eq!(outcome.distribution.level_count, 1);
    assert_eq!(outcome.seating.map(|s| s.seat_count), Some(3));

    assert!(matches!(
        env.registry_api.delete_level(&fixture.level_ids[0]),
        Err(ApiError::NotFound(_))
    ));
}
