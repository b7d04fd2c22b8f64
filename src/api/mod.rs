// ==========================================
// 考场座位编排系统 - API 层
// ==========================================
// 职责: 参数校验、错误转换、操作日志，业务规则委托给引擎
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod exam_api;
pub mod portal_api;
pub mod registry_api;

pub use dashboard_api::{DashboardApi, DashboardStats};
pub use error::{ApiError, ApiResult};
pub use exam_api::{AllocationOutcome, CreateExamRequest, ExamApi, ExamDetail, ExamListItem};
pub use portal_api::{PortalApi, StudentSeatLookup};
pub use registry_api::{CreateHallRequest, EnrollmentEntry, RegistryApi};
