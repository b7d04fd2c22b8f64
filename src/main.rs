// ==========================================
// 考场座位编排系统 - 命令行入口
// ==========================================
// 用法:
//   exam-seating [db_path] <command> <arg>
//
// 命令:
//   allocate   <exam_id>      分流 + 排座（排座是否自动执行由配置决定）
//   distribute <exam_id>      仅生成分流
//   seat       <exam_id>      基于已持久化分流生成座位
//   lookup     <real_matric>  查询考生座位
//   stats      <faculty_id>   学院统计
//
// 结果以 JSON 输出到 stdout，日志写入 stderr
// ==========================================

use exam_seating::app::{get_default_db_path, AppState};
use exam_seating::logging;

const USAGE: &str = "usage: exam-seating [db_path] <allocate|distribute|seat|lookup|stats> <arg>";

const OPERATOR: &str = "cli";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (db_path, command, arg) = match args.as_slice() {
        [command, arg] => (get_default_db_path(), command.as_str(), arg.trim()),
        [db_path, command, arg] => (db_path.clone(), command.as_str(), arg.trim()),
        _ => return Err(USAGE.into()),
    };

    tracing::info!("系统版本: {}", exam_seating::VERSION);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)?;

    let output = match command {
        "allocate" => serde_json::to_string_pretty(&state.exam_api.allocate(arg, OPERATOR)?)?,
        "distribute" => {
            serde_json::to_string_pretty(&state.exam_api.generate_distribution(arg, OPERATOR)?)?
        }
        "seat" => serde_json::to_string_pretty(&state.exam_api.generate_seating(arg, OPERATOR)?)?,
        "lookup" => serde_json::to_string_pretty(&state.portal_api.check_seat_allocation(arg)?)?,
        "stats" => serde_json::to_string_pretty(&state.dashboard_api.get_dashboard_stats(arg)?)?,
        other => return Err(format!("unknown command: {}\n{}", other, USAGE).into()),
    };

    println!("{}", output);
    Ok(())
}
